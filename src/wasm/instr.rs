//! Instructions
//!
//! The subset of WebAssembly instructions the code generator emits. Labels
//! and variable names are stored without the leading `$`.

use super::types::ValType;
use std::fmt;

/// A stack machine instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    // ============ Constants ============
    I32Const(i32),
    F64Const(f64),

    // ============ Variables ============
    LocalGet(String),
    LocalSet(String),
    GlobalGet(String),
    GlobalSet(String),

    // ============ Calls ============
    Call(String),
    Drop,

    // ============ Integer ============
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LeS,
    I32GtS,
    I32GeS,
    I32And,
    I32Or,
    I32Xor,
    I32Eqz,

    // ============ Floating Point ============
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Eq,
    F64Ne,
    F64Lt,
    F64Le,
    F64Gt,
    F64Ge,

    // ============ Conversions ============
    /// Float to signed int
    I32TruncF64S,
    /// Signed int to float
    F64ConvertI32S,

    // ============ Control Flow ============
    Block(String),
    Loop(String),
    /// Pops an `i32` test; no result value
    If,
    Else,
    End,
    Br(String),
    BrIf(String),
}

impl Instr {
    /// The zero constant of a value type
    pub fn zero(ty: ValType) -> Self {
        match ty {
            ValType::I32 => Instr::I32Const(0),
            ValType::F64 => Instr::F64Const(0.0),
        }
    }

    /// Instructions after this one are nested one level deeper
    pub fn opens_block(&self) -> bool {
        matches!(self, Instr::Block(_) | Instr::Loop(_) | Instr::If | Instr::Else)
    }

    /// This instruction sits one level shallower than the one before
    pub fn closes_block(&self) -> bool {
        matches!(self, Instr::Else | Instr::End)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::I32Const(v) => write!(f, "i32.const {}", v),
            Instr::F64Const(v) => write!(f, "f64.const {:?}", v),
            Instr::LocalGet(name) => write!(f, "local.get ${}", name),
            Instr::LocalSet(name) => write!(f, "local.set ${}", name),
            Instr::GlobalGet(name) => write!(f, "global.get ${}", name),
            Instr::GlobalSet(name) => write!(f, "global.set ${}", name),
            Instr::Call(name) => write!(f, "call ${}", name),
            Instr::Drop => write!(f, "drop"),
            Instr::I32Add => write!(f, "i32.add"),
            Instr::I32Sub => write!(f, "i32.sub"),
            Instr::I32Mul => write!(f, "i32.mul"),
            Instr::I32DivS => write!(f, "i32.div_s"),
            Instr::I32Eq => write!(f, "i32.eq"),
            Instr::I32Ne => write!(f, "i32.ne"),
            Instr::I32LtS => write!(f, "i32.lt_s"),
            Instr::I32LeS => write!(f, "i32.le_s"),
            Instr::I32GtS => write!(f, "i32.gt_s"),
            Instr::I32GeS => write!(f, "i32.ge_s"),
            Instr::I32And => write!(f, "i32.and"),
            Instr::I32Or => write!(f, "i32.or"),
            Instr::I32Xor => write!(f, "i32.xor"),
            Instr::I32Eqz => write!(f, "i32.eqz"),
            Instr::F64Add => write!(f, "f64.add"),
            Instr::F64Sub => write!(f, "f64.sub"),
            Instr::F64Mul => write!(f, "f64.mul"),
            Instr::F64Div => write!(f, "f64.div"),
            Instr::F64Eq => write!(f, "f64.eq"),
            Instr::F64Ne => write!(f, "f64.ne"),
            Instr::F64Lt => write!(f, "f64.lt"),
            Instr::F64Le => write!(f, "f64.le"),
            Instr::F64Gt => write!(f, "f64.gt"),
            Instr::F64Ge => write!(f, "f64.ge"),
            Instr::I32TruncF64S => write!(f, "i32.trunc_f64_s"),
            Instr::F64ConvertI32S => write!(f, "f64.convert_i32_s"),
            Instr::Block(label) => write!(f, "block ${}", label),
            Instr::Loop(label) => write!(f, "loop ${}", label),
            Instr::If => write!(f, "if"),
            Instr::Else => write!(f, "else"),
            Instr::End => write!(f, "end"),
            Instr::Br(label) => write!(f, "br ${}", label),
            Instr::BrIf(label) => write!(f, "br_if ${}", label),
        }
    }
}
