//! Wabbit Compiler
//!
//! A compiler for Wabbit, a small statically typed imperative language,
//! targeting the WebAssembly text format.
//!
//! # Architecture
//!
//! ```text
//! Source Code (.wb)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → AST
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Type Check │  → Diagnostics (must be empty)
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Lowering   │  → WebAssembly module
//! └─────────────┘
//!       │
//!       ▼
//!   WAT text (.wat)
//! ```
//!
//! The generated module imports `_printi`, `_printf`, `_printb` and `_printc`
//! from `env` and exports `_init`, which runs the program.

pub mod lexer;
pub mod token;
pub mod ast;
pub mod parser;
pub mod scope;
pub mod typeck;
pub mod wasm;
pub mod compile;

// Re-exports for convenience
pub use compile::{check, compile, compile_module, CompileError};
pub use lexer::Lexer;
pub use token::{Token, TokenKind};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension for Wabbit source files
pub const FILE_EXTENSION: &str = "wb";
