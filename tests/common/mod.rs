//! A small reference interpreter for the generated IR.
//!
//! End-to-end tests lower a program and then execute the module here,
//! asserting on the text it would print. The interpreter is deliberately
//! strict: any malformed module panics instead of improvising, so a test
//! failure points at the emitter.

use hashbrown::HashMap;

use liltc::ir::{
    BinaryOperator, BlockId, CastKind, Comparison, Immediate, Instruction, Module, Operand,
    RegisterId, RuntimeFunction, SlotId, UnaryOperator,
};

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i32),
    Float(f32),
    Double(f64),
    Bool(bool),
    Char(u8),
    Str(Option<String>),
}

pub struct Evaluation {
    pub stdout: String,
}

/// Executes a module from its entry block until it returns.
pub fn run(module: &Module) -> Evaluation {
    let function = &module.entry;

    let mut registers: HashMap<RegisterId, Value> = HashMap::new();
    let mut slots: HashMap<SlotId, Value> = HashMap::new();
    let mut stdout = String::new();

    let mut block = BlockId::ENTRY;

    'blocks: loop {
        for instruction in &function.blocks[block].instructions {
            let resolve = |registers: &HashMap<RegisterId, Value>, operand: Operand| -> Value {
                match operand {
                    Operand::Immediate(Immediate::Int(v)) => Value::Int(v),
                    Operand::Immediate(Immediate::Float(v)) => Value::Float(v),
                    Operand::Immediate(Immediate::Bool(v)) => Value::Bool(v),
                    Operand::Immediate(Immediate::Char(v)) => Value::Char(v),
                    Operand::Immediate(Immediate::Str(id)) => {
                        Value::Str(Some(module.strings[id].clone()))
                    }
                    Operand::Immediate(Immediate::NullStr) => Value::Str(None),
                    Operand::Register(id) => registers
                        .get(&id)
                        .unwrap_or_else(|| panic!("read of unwritten register %{id:?}"))
                        .clone(),
                }
            };

            match instruction {
                Instruction::Load { destination, slot } => {
                    let value = slots
                        .get(slot)
                        .unwrap_or_else(|| panic!("load from unwritten slot {slot:?}"))
                        .clone();
                    registers.insert(*destination, value);
                }
                Instruction::Store { slot, source } => {
                    let value = resolve(&registers, *source);
                    slots.insert(*slot, value);
                }
                Instruction::UnaryOperation {
                    operator,
                    destination,
                    operand,
                } => {
                    let value = match (operator, resolve(&registers, *operand)) {
                        (UnaryOperator::Neg, Value::Int(v)) => Value::Int(-v),
                        (UnaryOperator::FNeg, Value::Float(v)) => Value::Float(-v),
                        (operator, value) => panic!("{operator} applied to {value:?}"),
                    };
                    registers.insert(*destination, value);
                }
                Instruction::BinaryOperation {
                    operator,
                    destination,
                    lhs,
                    rhs,
                } => {
                    let lhs = resolve(&registers, *lhs);
                    let rhs = resolve(&registers, *rhs);
                    registers.insert(*destination, apply_binary(*operator, lhs, rhs));
                }
                Instruction::Cast {
                    kind,
                    destination,
                    operand,
                } => {
                    let value = match (kind, resolve(&registers, *operand)) {
                        (CastKind::BoolToInt, Value::Bool(v)) => Value::Int(v as i32),
                        (CastKind::CharToInt, Value::Char(v)) => Value::Int(v as i32),
                        (CastKind::IntToFloat, Value::Int(v)) => Value::Float(v as f32),
                        (CastKind::FloatToDouble, Value::Float(v)) => Value::Double(v as f64),
                        (kind, value) => panic!("{kind} applied to {value:?}"),
                    };
                    registers.insert(*destination, value);
                }
                Instruction::Select {
                    destination,
                    condition,
                    positive,
                    negative,
                } => {
                    let Value::Bool(condition) = resolve(&registers, *condition) else {
                        panic!("select on a non-bool condition");
                    };

                    let value = if condition {
                        resolve(&registers, *positive)
                    } else {
                        resolve(&registers, *negative)
                    };
                    registers.insert(*destination, value);
                }
                Instruction::Call {
                    target,
                    arguments,
                    destination,
                } => {
                    let arguments: Vec<Value> = arguments
                        .iter()
                        .map(|arg| resolve(&registers, *arg))
                        .collect();

                    match target {
                        RuntimeFunction::Printf => {
                            stdout.push_str(&format_printf(&arguments));
                        }
                        RuntimeFunction::ConcatStrings => {
                            let [Value::Str(Some(lhs)), Value::Str(Some(rhs))] = &arguments[..]
                            else {
                                panic!("concat_strings expects two non-null strings");
                            };

                            let destination =
                                destination.expect("concat_strings discards its result");
                            registers.insert(destination, Value::Str(Some(format!("{lhs}{rhs}"))));
                        }
                    }
                }
                Instruction::Branch {
                    condition,
                    positive,
                    negative,
                } => {
                    let Value::Bool(condition) = resolve(&registers, *condition) else {
                        panic!("branch on a non-bool condition");
                    };

                    block = if condition { *positive } else { *negative };
                    continue 'blocks;
                }
                Instruction::Jump { destination } => {
                    block = *destination;
                    continue 'blocks;
                }
                Instruction::Return { .. } => {
                    return Evaluation { stdout };
                }
            }
        }

        panic!("block {block:?} ran past its end without a terminator");
    }
}

fn format_printf(arguments: &[Value]) -> String {
    let [Value::Str(Some(format)), argument] = arguments else {
        panic!("printf expects a format string and one value");
    };

    match (format.as_str(), argument) {
        ("%d\n", Value::Int(v)) => format!("{v}\n"),
        ("%.1f\n", Value::Double(v)) => format!("{v:.1}\n"),
        ("%c\n", Value::Char(v)) => format!("{}\n", *v as char),
        ("%s\n", Value::Str(Some(v))) => format!("{v}\n"),
        ("%s\n", Value::Str(None)) => "(null)\n".to_owned(),
        (format, argument) => panic!("printf called with {format:?} and {argument:?}"),
    }
}

fn apply_binary(operator: BinaryOperator, lhs: Value, rhs: Value) -> Value {
    use BinaryOperator::*;

    match (operator, lhs, rhs) {
        (Add, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(b)),
        (Sub, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(b)),
        (Mul, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(b)),
        (Div, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_div(b)),
        (FAdd, Value::Float(a), Value::Float(b)) => Value::Float(a + b),
        (FSub, Value::Float(a), Value::Float(b)) => Value::Float(a - b),
        (FMul, Value::Float(a), Value::Float(b)) => Value::Float(a * b),
        (FDiv, Value::Float(a), Value::Float(b)) => Value::Float(a / b),
        (And, Value::Bool(a), Value::Bool(b)) => Value::Bool(a && b),
        (Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(a || b),
        (ICmp(comparison), lhs, rhs) => {
            let (a, b) = match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => (a, b),
                (Value::Char(a), Value::Char(b)) => (a as i32, b as i32),
                (Value::Bool(a), Value::Bool(b)) => (a as i32, b as i32),
                (lhs, rhs) => panic!("icmp applied to {lhs:?} and {rhs:?}"),
            };
            Value::Bool(compare(comparison, &a, &b))
        }
        (FCmp(comparison), Value::Float(a), Value::Float(b)) => {
            Value::Bool(compare(comparison, &a, &b))
        }
        (operator, lhs, rhs) => panic!("{operator} applied to {lhs:?} and {rhs:?}"),
    }
}

fn compare<T: PartialOrd>(comparison: Comparison, a: &T, b: &T) -> bool {
    match comparison {
        Comparison::Lt => a < b,
        Comparison::Gt => a > b,
        Comparison::Le => a <= b,
        Comparison::Ge => a >= b,
        Comparison::Eq => a == b,
        Comparison::Ne => a != b,
    }
}
