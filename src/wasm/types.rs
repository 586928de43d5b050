//! Module Model
//!
//! In-memory form of a WebAssembly text module and its printing.

use std::fmt;

use super::instr::Instr;
use crate::typeck::Ty;

/// A WebAssembly value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    I32,
    F64,
}

impl ValType {
    /// Lowered representation of a source type
    pub fn of(ty: Ty) -> Self {
        match ty {
            Ty::Float => ValType::F64,
            Ty::Int | Ty::Char | Ty::Bool | Ty::Error => ValType::I32,
        }
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValType::I32 => write!(f, "i32"),
            ValType::F64 => write!(f, "f64"),
        }
    }
}

/// An imported host function taking one argument
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub param: ValType,
}

impl Import {
    pub fn new(module: impl Into<String>, name: impl Into<String>, param: ValType) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            param,
        }
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(import \"{}\" \"{}\" (func ${} (param {})))",
            self.module, self.name, self.name, self.param
        )
    }
}

/// A mutable, zero-initialized global
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    pub ty: ValType,
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(global ${} (mut {}) ({}))",
            self.name,
            self.ty,
            Instr::zero(self.ty)
        )
    }
}

/// A function, exported under its own name
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, ValType)>,
    pub result: Option<ValType>,
    pub locals: Vec<(String, ValType)>,
    pub body: Vec<Instr>,
}

impl Function {
    pub fn new(name: impl Into<String>, result: Option<ValType>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            result,
            locals: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(func ${} (export \"{}\")", self.name, self.name)?;
        for (name, ty) in &self.params {
            write!(f, " (param ${} {})", name, ty)?;
        }
        if let Some(ty) = self.result {
            write!(f, " (result {})", ty)?;
        }
        writeln!(f)?;

        for (name, ty) in &self.locals {
            writeln!(f, "  (local ${} {})", name, ty)?;
        }

        let mut depth = 1usize;
        for instr in &self.body {
            if instr.closes_block() {
                depth = depth.saturating_sub(1);
            }
            writeln!(f, "{}{}", "  ".repeat(depth), instr)?;
            if instr.opens_block() {
                depth += 1;
            }
        }
        write!(f, ")")
    }
}

/// A module contains imports, globals and functions
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub imports: Vec<Import>,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl Module {
    /// An empty module importing the four print intrinsics
    pub fn new() -> Self {
        let imports = [
            ("_printi", ValType::I32),
            ("_printf", ValType::F64),
            ("_printb", ValType::I32),
            ("_printc", ValType::I32),
        ]
        .into_iter()
        .map(|(name, param)| Import::new("env", name, param))
        .collect();

        Self {
            imports,
            globals: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(module")?;
        for import in &self.imports {
            writeln!(f, "  {}", import)?;
        }
        for global in &self.globals {
            writeln!(f, "  {}", global)?;
        }
        for func in &self.functions {
            for line in func.to_string().lines() {
                writeln!(f, "  {}", line)?;
            }
        }
        writeln!(f, ")")
    }
}

/// Render a module as WebAssembly text
pub fn print_module(module: &Module) -> String {
    module.to_string()
}
