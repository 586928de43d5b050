//! Wabbit Compiler CLI
//!
//! The `wbc` command is the main entry point for the Wabbit compiler.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wabbit::lexer::{self, LexError};
use wabbit::{parser, CompileError};

#[derive(Parser)]
#[command(name = "wbc")]
#[command(version = wabbit::VERSION)]
#[command(about = "The Wabbit Compiler", long_about = None)]
struct Cli {
    /// Log pipeline stages (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Wabbit source file to WebAssembly text
    Build {
        /// Input file to compile
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to the input with a .wat extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit tokens (for debugging)
        #[arg(long)]
        emit_tokens: bool,

        /// Emit AST (for debugging)
        #[arg(long)]
        emit_ast: bool,
    },

    /// Check a file for errors without compiling
    Check {
        /// Input file to check
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Tokenize a file and print tokens
    Tokenize {
        /// Input file to tokenize
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parse a file and print AST
    Parse {
        /// Input file to parse
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            input,
            output,
            emit_tokens,
            emit_ast,
        } => {
            let source = read_source(&input)?;

            if emit_tokens {
                println!("=== Tokens ===");
                print_tokens(&source)?;
            }

            if emit_ast {
                println!("=== AST ===");
                // On failure the build below reports the errors
                if let (Ok(ast), _) = parser::parse_with_lex_errors(&source) {
                    println!("{:#?}", ast);
                }
            }

            let wat = wabbit::compile(&source).map_err(report)?;
            let out_path = output.unwrap_or_else(|| input.with_extension("wat"));
            fs::write(&out_path, wat)
                .map_err(|e| miette::miette!("Failed to write {}: {}", out_path.display(), e))?;
            println!("Wrote {}", out_path.display());
            Ok(())
        }

        Commands::Check { input } => {
            let source = read_source(&input)?;
            wabbit::check(&source).map_err(report)?;
            println!("No errors found in {}", input.display());
            Ok(())
        }

        Commands::Tokenize { input } => {
            let source = read_source(&input)?;
            print_tokens(&source)
        }

        Commands::Parse { input } => {
            let source = read_source(&input)?;
            let (ast, errors) = parser::parse_with_lex_errors(&source);
            print_lex_errors(&errors);
            let ast = ast.map_err(|e| miette::miette!("{}", e))?;

            println!("{:#?}", ast);
            Ok(())
        }
    }
}

fn read_source(path: &Path) -> miette::Result<String> {
    fs::read_to_string(path).map_err(|e| miette::miette!("Failed to read file: {}", e))
}

fn print_tokens(source: &str) -> miette::Result<()> {
    let (tokens, errors) = lexer::lex(source).map_err(|e| miette::miette!("{}", e))?;

    for token in &tokens {
        println!(
            "{:>4} {:20} {:?}",
            token.line,
            format!("{:?}", token.kind),
            token.text
        );
    }

    print_lex_errors(&errors);
    Ok(())
}

fn print_lex_errors(errors: &[LexError]) {
    if !errors.is_empty() {
        eprintln!("\nLexer errors:");
        for err in errors {
            eprintln!("  {}", err);
        }
    }
}

/// Print every diagnostic, then fail with a summary
fn report(err: CompileError) -> miette::Report {
    match &err {
        CompileError::Syntax { lexical, .. } => {
            for e in lexical {
                eprintln!("{}", e);
            }
        }
        CompileError::Rejected { .. } => {
            for (_, message) in err.diagnostics() {
                eprintln!("{}", message);
            }
        }
    }
    miette::miette!("{}", err)
}
