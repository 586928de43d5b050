//! Function Builder
//!
//! Per-function emission state: parameters, locals and the instruction list.

use std::collections::HashMap;

use super::instr::Instr;
use super::types::{Function, ValType};

/// Label of the block wrapping every function body, and the name of the
/// local holding a function's result
pub const RETURN_LABEL: &str = "return";

/// Hands out unique names within one namespace: `x`, then `x.1`, `x.2`, ...
#[derive(Debug, Default)]
pub struct NameAllocator {
    counts: HashMap<String, u32>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A name not handed out before, derived from `base`
    pub fn fresh(&mut self, base: &str) -> String {
        let count = self.counts.entry(base.to_string()).or_insert(0);
        let name = if *count == 0 {
            base.to_string()
        } else {
            format!("{}.{}", base, count)
        };
        *count += 1;
        name
    }
}

/// Builder for a single function
#[derive(Debug)]
pub struct FunctionBuilder {
    func: Function,
    /// Params and locals share one namespace
    names: NameAllocator,
}

impl FunctionBuilder {
    /// Start a function. A function with a result gets a `$return` local.
    pub fn new(name: impl Into<String>, result: Option<ValType>) -> Self {
        let mut builder = Self {
            func: Function::new(name, result),
            names: NameAllocator::new(),
        };
        if let Some(ty) = result {
            builder.add_local(RETURN_LABEL, ty);
        }
        builder
    }

    pub fn name(&self) -> &str {
        &self.func.name
    }

    pub fn has_result(&self) -> bool {
        self.func.result.is_some()
    }

    /// Add a parameter, returning its emitted name
    pub fn add_param(&mut self, base: &str, ty: ValType) -> String {
        let name = self.names.fresh(base);
        self.func.params.push((name.clone(), ty));
        name
    }

    /// Add a local, returning its emitted name
    pub fn add_local(&mut self, base: &str, ty: ValType) -> String {
        let name = self.names.fresh(base);
        self.func.locals.push((name.clone(), ty));
        name
    }

    pub fn emit(&mut self, instr: Instr) {
        self.func.body.push(instr);
    }

    /// Index the next emitted instruction will land at
    pub fn next_index(&self) -> usize {
        self.func.body.len()
    }

    /// Insert an instruction before already emitted ones
    pub fn insert(&mut self, index: usize, instr: Instr) {
        self.func.body.insert(index, instr);
    }

    pub fn finish(self) -> Function {
        self.func
    }
}
