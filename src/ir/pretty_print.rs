//! Human-readable rendering of a lowered module.
//!
//! The output is colored for terminal use; callers writing to a file strip
//! the escape sequences first. The layout is string constants, then stack
//! slots, then the entry function block by block.

use core::fmt::Write;

use colored::Colorize;
use itertools::Itertools;

use crate::{
    index::Index,
    ir::{
        BinaryOperator, BlockId, Comparison, FloatWidth, Immediate, Instruction, IntegerWidth,
        Module, Operand, RegisterId, SlotId, StringId, Type,
    },
};

pub fn render_module(module: &Module) -> String {
    let mut out = String::new();

    for (id, value) in module.strings.enumerate() {
        let _ = writeln!(
            out,
            "{id} {} {}",
            "=".white(),
            format!("{value:?}").purple()
        );
    }

    if !module.strings.is_empty() {
        out.push('\n');
    }

    let function = &module.entry;

    for slot in function.slots.iter() {
        let _ = writeln!(
            out,
            "{} {} {}{} {}",
            slot.id,
            "=".white(),
            "slot".magenta(),
            format!(" {}:", slot.name).white(),
            slot.ty
        );
    }

    if !function.slots.is_empty() {
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{} {}{} {}",
        "fn".magenta(),
        function.name.blue(),
        "()".white(),
        "{".white()
    );

    for block in function.blocks.iter() {
        let _ = writeln!(out, "{}", format!("{}:", block.id).bright_red());

        for instruction in &block.instructions {
            let _ = writeln!(out, "    {instruction}");
        }
    }

    let _ = writeln!(out, "{}", "}".white());

    out
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Load { destination, slot } => {
                write!(f, "{destination} {} {} {slot}", "=".white(), "load".cyan())
            }
            Instruction::Store { slot, source } => {
                write!(f, "{} {slot}, {source}", "store".cyan())
            }
            Instruction::UnaryOperation {
                operator,
                destination,
                operand,
            } => {
                write!(
                    f,
                    "{destination} {} {} {operand}",
                    "=".white(),
                    operator.to_string().white()
                )
            }
            Instruction::BinaryOperation {
                operator,
                destination,
                lhs,
                rhs,
            } => {
                write!(
                    f,
                    "{destination} {} {} {lhs}, {rhs}",
                    "=".white(),
                    operator.to_string().white()
                )
            }
            Instruction::Cast {
                kind,
                destination,
                operand,
            } => {
                write!(
                    f,
                    "{destination} {} {} {operand}",
                    "=".white(),
                    kind.to_string().white()
                )
            }
            Instruction::Select {
                destination,
                condition,
                positive,
                negative,
            } => {
                write!(
                    f,
                    "{destination} {} {} {condition}, {positive}, {negative}",
                    "=".white(),
                    "select".bright_green()
                )
            }
            Instruction::Call {
                target,
                arguments,
                destination,
            } => {
                if let Some(destination) = destination {
                    write!(f, "{destination} {} ", "=".white())?;
                }

                write!(
                    f,
                    "{} {}{}{}{}",
                    "call".cyan(),
                    target.to_string().blue(),
                    "(".white(),
                    arguments.iter().map(|arg| arg.to_string()).join(", "),
                    ")".white()
                )
            }
            Instruction::Branch {
                condition,
                positive,
                negative,
            } => {
                write!(
                    f,
                    "{} {condition} {} {}",
                    "br".cyan(),
                    positive.to_string().blue(),
                    negative.to_string().blue()
                )
            }
            Instruction::Jump { destination } => {
                write!(f, "{} {}", "jmp".cyan(), destination.to_string().blue())
            }
            Instruction::Return { value: Some(value) } => {
                write!(f, "{} {value}", "ret".cyan())
            }
            Instruction::Return { value: _ } => write!(f, "{}", "ret".cyan()),
        }
    }
}

impl core::fmt::Display for RegisterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("%{}", self.index()).yellow())
    }
}

impl core::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".label_{}", self.index())
    }
}

impl core::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("${}", self.index()).bright_yellow())
    }
}

impl core::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("@str_{}", self.index()).green())
    }
}

impl core::fmt::Display for Immediate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Immediate::Int(value) => write!(f, "{}", format!("{value}").purple()),
            Immediate::Float(value) => write!(f, "{}", format!("{value:?}").purple()),
            Immediate::Bool(value) => write!(f, "{}", format!("{value}").purple()),
            Immediate::Char(value) => write!(f, "{}", format!("{value}").purple()),
            Immediate::Str(id) => write!(f, "{id}"),
            Immediate::NullStr => write!(f, "{}", "null".purple()),
        }
    }
}

impl core::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Immediate(immediate) => write!(f, "{immediate}"),
            Operand::Register(register_id) => write!(f, "{register_id}"),
        }
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer(IntegerWidth::I1) => write!(f, "i1"),
            Type::Integer(IntegerWidth::I8) => write!(f, "i8"),
            Type::Integer(IntegerWidth::I32) => write!(f, "i32"),
            Type::Float(FloatWidth::F32) => write!(f, "f32"),
            Type::Float(FloatWidth::F64) => write!(f, "f64"),
            Type::Pointer => write!(f, "ptr"),
        }
    }
}

impl core::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mnemonic = match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::Div => "div",
            BinaryOperator::FAdd => "fadd",
            BinaryOperator::FSub => "fsub",
            BinaryOperator::FMul => "fmul",
            BinaryOperator::FDiv => "fdiv",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::ICmp(comparison) => match comparison {
                Comparison::Lt => "icmp_slt",
                Comparison::Gt => "icmp_sgt",
                Comparison::Le => "icmp_sle",
                Comparison::Ge => "icmp_sge",
                Comparison::Eq => "icmp_eq",
                Comparison::Ne => "icmp_ne",
            },
            BinaryOperator::FCmp(comparison) => match comparison {
                Comparison::Lt => "fcmp_olt",
                Comparison::Gt => "fcmp_ogt",
                Comparison::Le => "fcmp_ole",
                Comparison::Ge => "fcmp_oge",
                Comparison::Eq => "fcmp_oeq",
                Comparison::Ne => "fcmp_one",
            },
        };

        write!(f, "{mnemonic}")
    }
}
