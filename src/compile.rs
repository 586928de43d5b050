//! Compilation pipeline
//!
//! source → [`parse_with_lex_errors`] → [`check_program`] → [`lower_program`] → WAT text.
//! Syntax errors abort at once, reported after any illegal characters met
//! before them. Illegal characters and semantic diagnostics are collected,
//! and any of them stops the pipeline before code generation.

use thiserror::Error;

use crate::ast::{Line, Statements};
use crate::lexer::LexError;
use crate::parser::{parse_with_lex_errors, ParseError};
use crate::typeck::{check_program, TypeError};
use crate::wasm::{lower_program, print_module, Module};

/// Why a compilation produced no module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Fatal lexical or syntax error, with the illegal characters skipped
    /// before it
    #[error("{error}")]
    Syntax {
        error: ParseError,
        lexical: Vec<LexError>,
    },

    /// The program parsed but has diagnostics
    #[error("found {} error(s)", .lexical.len() + .semantic.len())]
    Rejected {
        lexical: Vec<LexError>,
        semantic: Vec<TypeError>,
    },
}

impl CompileError {
    /// Every problem as a `(line, message)` pair, illegal characters first
    pub fn diagnostics(&self) -> Vec<(Line, String)> {
        match self {
            CompileError::Syntax { error, lexical } => lexical
                .iter()
                .map(|e| (e.line, e.to_string()))
                .chain(std::iter::once((error.line(), error.to_string())))
                .collect(),
            CompileError::Rejected { lexical, semantic } => lexical
                .iter()
                .map(|e| (e.line, e.to_string()))
                .chain(semantic.iter().map(|e| (e.line, e.to_string())))
                .collect(),
        }
    }
}

/// Parse and type check without generating code
pub fn check(source: &str) -> Result<Statements, CompileError> {
    let (program, lexical) = parse_with_lex_errors(source);
    let program = match program {
        Ok(program) => program,
        Err(error) => return Err(CompileError::Syntax { error, lexical }),
    };
    let semantic = check_program(&program).err().unwrap_or_default();
    if lexical.is_empty() && semantic.is_empty() {
        Ok(program)
    } else {
        Err(CompileError::Rejected { lexical, semantic })
    }
}

/// Compile source into a module
pub fn compile_module(source: &str) -> Result<Module, CompileError> {
    let program = check(source)?;
    Ok(lower_program(&program))
}

/// Compile source into WebAssembly text
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_module(source).map(|module| print_module(&module))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_program_compiles() {
        let wat = compile("var x int = 0; while x < 3 { print x; x = x + 1; }").unwrap();
        assert!(wat.starts_with("(module\n"));
        assert!(wat.contains("(global $x (mut i32) (i32.const 0))"));
        assert!(wat.contains("(func $_init (export \"_init\")"));
        assert!(wat.contains("br_if $exit1"));
    }

    #[test]
    fn test_syntax_error_aborts() {
        let err = compile("print 1 +;").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
        assert_eq!(err.diagnostics().len(), 1);
    }

    #[test]
    fn test_illegal_character_reported_with_syntax_error() {
        let err = compile("var x = 1 $ 2;").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0], (1, "line 1: illegal character \"$\"".to_string()));
        assert_eq!(diagnostics[1], (1, "line 1: expected `;`, found `2`".to_string()));
        assert_eq!(err.to_string(), "line 1: expected `;`, found `2`");
    }

    #[test]
    fn test_escaped_newline_in_char_keeps_lines() {
        let err = compile("print '\\\n';\nvar x int = 1.0;").unwrap_err();
        let lines: Vec<Line> = err.diagnostics().into_iter().map(|(line, _)| line).collect();
        assert_eq!(lines, vec![3]);
    }

    #[test]
    fn test_semantic_errors_suppress_output() {
        let err = compile("var x int = 1.0;\nbreak;").unwrap_err();
        let lines: Vec<Line> = err.diagnostics().into_iter().map(|(line, _)| line).collect();
        assert_eq!(lines, vec![1, 2]);
        assert_eq!(err.to_string(), "found 2 error(s)");
    }

    #[test]
    fn test_illegal_character_suppresses_output() {
        let err = compile("print 1; #").unwrap_err();
        let CompileError::Rejected { lexical, semantic } = err else {
            panic!("expected rejection");
        };
        assert_eq!(lexical.len(), 1);
        assert!(semantic.is_empty());
    }
}
