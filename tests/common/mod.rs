//! Reference interpreter for generated modules
//!
//! Executes a `wabbit::wasm::Module` directly so integration tests can check
//! what a program prints. Operand types are checked on every pop, so a
//! module that would fail WebAssembly validation panics here too.

#![allow(dead_code)]

use std::collections::HashMap;

use wabbit::wasm::{Function, Instr, Module, ValType};

const FUEL: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    F64(f64),
}

impl Value {
    fn zero(ty: ValType) -> Self {
        match ty {
            ValType::I32 => Value::I32(0),
            ValType::F64 => Value::F64(0.0),
        }
    }

    fn ty(&self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
            Value::F64(_) => ValType::F64,
        }
    }
}

/// An open block, loop or if
#[derive(Debug, Clone)]
struct Ctrl {
    label: Option<String>,
    is_loop: bool,
    start: usize,
    end: usize,
}

/// Matching `else`/`end` positions for every structured instruction
struct Layout {
    ends: HashMap<usize, usize>,
    elses: HashMap<usize, usize>,
}

impl Layout {
    fn of(body: &[Instr]) -> Self {
        let mut ends = HashMap::new();
        let mut elses = HashMap::new();
        let mut open = Vec::new();
        for (pc, instr) in body.iter().enumerate() {
            match instr {
                Instr::Block(_) | Instr::Loop(_) | Instr::If => open.push(pc),
                Instr::Else => {
                    let start = *open.last().expect("else without if");
                    elses.insert(start, pc);
                }
                Instr::End => {
                    let start = open.pop().expect("unbalanced end");
                    ends.insert(start, pc);
                }
                _ => {}
            }
        }
        assert!(open.is_empty(), "unterminated block");
        Self { ends, elses }
    }
}

pub struct Machine<'m> {
    module: &'m Module,
    globals: HashMap<String, Value>,
    pub output: Vec<String>,
    fuel: usize,
}

impl<'m> Machine<'m> {
    pub fn new(module: &'m Module) -> Self {
        let globals = module
            .globals
            .iter()
            .map(|g| (g.name.clone(), Value::zero(g.ty)))
            .collect();
        Self {
            module,
            globals,
            output: Vec::new(),
            fuel: FUEL,
        }
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    /// Call an exported function by name
    pub fn invoke(&mut self, name: &str, args: Vec<Value>) -> Option<Value> {
        if self.call_import(name, &args) {
            return None;
        }
        let module = self.module;
        let func = module
            .function(name)
            .unwrap_or_else(|| panic!("no function ${}", name));
        self.execute(func, args)
    }

    fn call_import(&mut self, name: &str, args: &[Value]) -> bool {
        let line = match (name, args) {
            ("_printi", [Value::I32(v)]) => v.to_string(),
            ("_printf", [Value::F64(v)]) => v.to_string(),
            ("_printb", [Value::I32(v)]) => (*v != 0).to_string(),
            ("_printc", [Value::I32(v)]) => char::from_u32(*v as u32)
                .expect("invalid char")
                .to_string(),
            (name, args) if name.starts_with("_print") => {
                panic!("bad arguments to ${}: {:?}", name, args)
            }
            _ => return false,
        };
        self.output.push(line);
        true
    }

    fn execute(&mut self, func: &'m Function, args: Vec<Value>) -> Option<Value> {
        assert_eq!(args.len(), func.params.len(), "arity of ${}", func.name);
        let mut locals: HashMap<&str, Value> = HashMap::new();
        for ((name, ty), arg) in func.params.iter().zip(args) {
            assert_eq!(*ty, arg.ty(), "param ${} of ${}", name, func.name);
            locals.insert(name, arg);
        }
        for (name, ty) in &func.locals {
            locals.insert(name, Value::zero(*ty));
        }

        let body = &func.body;
        let layout = Layout::of(body);
        let mut stack: Vec<Value> = Vec::new();
        let mut ctrl: Vec<Ctrl> = Vec::new();
        let mut pc = 0;

        while pc < body.len() {
            self.fuel = self.fuel.checked_sub(1).expect("out of fuel");
            let instr = &body[pc];
            pc += 1;
            match instr {
                Instr::I32Const(v) => stack.push(Value::I32(*v)),
                Instr::F64Const(v) => stack.push(Value::F64(*v)),

                Instr::LocalGet(name) => stack.push(
                    *locals
                        .get(name.as_str())
                        .unwrap_or_else(|| panic!("no local ${}", name)),
                ),
                Instr::LocalSet(name) => {
                    let value = pop(&mut stack);
                    let slot = locals
                        .get_mut(name.as_str())
                        .unwrap_or_else(|| panic!("no local ${}", name));
                    assert_eq!(slot.ty(), value.ty(), "local.set ${}", name);
                    *slot = value;
                }
                Instr::GlobalGet(name) => stack.push(
                    self.global(name)
                        .unwrap_or_else(|| panic!("no global ${}", name)),
                ),
                Instr::GlobalSet(name) => {
                    let value = pop(&mut stack);
                    let slot = self
                        .globals
                        .get_mut(name)
                        .unwrap_or_else(|| panic!("no global ${}", name));
                    assert_eq!(slot.ty(), value.ty(), "global.set ${}", name);
                    *slot = value;
                }

                Instr::Call(name) => {
                    let arity = match self.module.function(name) {
                        Some(callee) => callee.params.len(),
                        None => 1,
                    };
                    let args = stack.split_off(stack.len() - arity);
                    if let Some(result) = self.invoke(name, args) {
                        stack.push(result);
                    }
                }
                Instr::Drop => {
                    pop(&mut stack);
                }

                Instr::I32Add => int_op(&mut stack, |a, b| a.wrapping_add(b)),
                Instr::I32Sub => int_op(&mut stack, |a, b| a.wrapping_sub(b)),
                Instr::I32Mul => int_op(&mut stack, |a, b| a.wrapping_mul(b)),
                Instr::I32DivS => int_op(&mut stack, |a, b| {
                    a.checked_div(b).expect("integer divide by zero")
                }),
                Instr::I32And => int_op(&mut stack, |a, b| a & b),
                Instr::I32Or => int_op(&mut stack, |a, b| a | b),
                Instr::I32Xor => int_op(&mut stack, |a, b| a ^ b),
                Instr::I32Eq => int_op(&mut stack, |a, b| (a == b) as i32),
                Instr::I32Ne => int_op(&mut stack, |a, b| (a != b) as i32),
                Instr::I32LtS => int_op(&mut stack, |a, b| (a < b) as i32),
                Instr::I32LeS => int_op(&mut stack, |a, b| (a <= b) as i32),
                Instr::I32GtS => int_op(&mut stack, |a, b| (a > b) as i32),
                Instr::I32GeS => int_op(&mut stack, |a, b| (a >= b) as i32),
                Instr::I32Eqz => {
                    let v = pop_i32(&mut stack);
                    stack.push(Value::I32((v == 0) as i32));
                }

                Instr::F64Add => float_op(&mut stack, |a, b| Value::F64(a + b)),
                Instr::F64Sub => float_op(&mut stack, |a, b| Value::F64(a - b)),
                Instr::F64Mul => float_op(&mut stack, |a, b| Value::F64(a * b)),
                Instr::F64Div => float_op(&mut stack, |a, b| Value::F64(a / b)),
                Instr::F64Eq => float_op(&mut stack, |a, b| Value::I32((a == b) as i32)),
                Instr::F64Ne => float_op(&mut stack, |a, b| Value::I32((a != b) as i32)),
                Instr::F64Lt => float_op(&mut stack, |a, b| Value::I32((a < b) as i32)),
                Instr::F64Le => float_op(&mut stack, |a, b| Value::I32((a <= b) as i32)),
                Instr::F64Gt => float_op(&mut stack, |a, b| Value::I32((a > b) as i32)),
                Instr::F64Ge => float_op(&mut stack, |a, b| Value::I32((a >= b) as i32)),

                Instr::I32TruncF64S => {
                    let v = pop_f64(&mut stack);
                    stack.push(Value::I32(v.trunc() as i32));
                }
                Instr::F64ConvertI32S => {
                    let v = pop_i32(&mut stack);
                    stack.push(Value::F64(f64::from(v)));
                }

                Instr::Block(label) | Instr::Loop(label) => {
                    let start = pc - 1;
                    ctrl.push(Ctrl {
                        label: Some(label.clone()),
                        is_loop: matches!(instr, Instr::Loop(_)),
                        start,
                        end: layout.ends[&start],
                    });
                }
                Instr::If => {
                    let start = pc - 1;
                    let end = layout.ends[&start];
                    let test = pop_i32(&mut stack);
                    ctrl.push(Ctrl {
                        label: None,
                        is_loop: false,
                        start,
                        end,
                    });
                    if test == 0 {
                        // Continue after `else`, or at `end` which closes the if
                        pc = layout.elses.get(&start).map_or(end, |e| e + 1);
                    }
                }
                Instr::Else => {
                    let top = ctrl.last().expect("else outside if");
                    pc = top.end;
                }
                Instr::End => {
                    ctrl.pop().expect("unbalanced end");
                }
                Instr::Br(label) => pc = branch(&mut ctrl, label),
                Instr::BrIf(label) => {
                    if pop_i32(&mut stack) != 0 {
                        pc = branch(&mut ctrl, label);
                    }
                }
            }
        }

        let result = func.result.map(|ty| {
            let value = pop(&mut stack);
            assert_eq!(value.ty(), ty, "result of ${}", func.name);
            value
        });
        assert!(stack.is_empty(), "${} left {:?} on the stack", func.name, stack);
        result
    }
}

/// Resolve a branch: loops restart, blocks exit past their `end`
fn branch(ctrl: &mut Vec<Ctrl>, label: &str) -> usize {
    let depth = ctrl
        .iter()
        .rposition(|c| c.label.as_deref() == Some(label))
        .unwrap_or_else(|| panic!("no label ${}", label));
    let target = ctrl[depth].clone();
    if target.is_loop {
        ctrl.truncate(depth + 1);
        target.start + 1
    } else {
        ctrl.truncate(depth);
        target.end + 1
    }
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().expect("stack underflow")
}

fn pop_i32(stack: &mut Vec<Value>) -> i32 {
    match pop(stack) {
        Value::I32(v) => v,
        other => panic!("expected i32, found {:?}", other),
    }
}

fn pop_f64(stack: &mut Vec<Value>) -> f64 {
    match pop(stack) {
        Value::F64(v) => v,
        other => panic!("expected f64, found {:?}", other),
    }
}

fn int_op(stack: &mut Vec<Value>, op: impl Fn(i32, i32) -> i32) {
    let b = pop_i32(stack);
    let a = pop_i32(stack);
    stack.push(Value::I32(op(a, b)));
}

fn float_op(stack: &mut Vec<Value>, op: impl Fn(f64, f64) -> Value) {
    let b = pop_f64(stack);
    let a = pop_f64(stack);
    stack.push(op(a, b));
}

/// Compile and run a program, returning the printed lines
pub fn run_source(source: &str) -> Vec<String> {
    let module = match wabbit::compile_module(source) {
        Ok(module) => module,
        Err(err) => panic!("compile failed: {:?}", err.diagnostics()),
    };
    let mut machine = Machine::new(&module);
    machine.invoke("_init", Vec::new());
    machine.output
}
