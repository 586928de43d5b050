//! WebAssembly text backend
//!
//! Lowers a type-checked AST into an in-memory module model and prints it as
//! WebAssembly text (WAT).

mod builder;
mod instr;
mod lower;
mod types;

pub use builder::*;
pub use instr::*;
pub use lower::*;
pub use types::*;
