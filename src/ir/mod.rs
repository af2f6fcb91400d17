//! The register IR emitted by the code generator.
//!
//! In this form, the language's loops and conditionals have been simplified
//! to basic blocks connected by branches, and expression trees have been
//! flattened into instructions over virtual registers. A module holds one
//! implicit entry function (Lilt has no user-defined procedures) plus the
//! read-only string constants the program references; the external backend
//! consumes the module wholesale.

use std::collections::BTreeSet;

use crate::{
    index::{IndexVec, simple_index},
    ty,
};

pub mod ast_lowering;
pub mod pretty_print;
pub mod verify;

simple_index! {
    /// Identifies a basic block within the entry function
    pub struct BlockId;
}

impl BlockId {
    pub const ENTRY: Self = Self(0);
}

simple_index! {
    /// Identifies a virtual register which holds a temporary value
    pub struct RegisterId;
}

simple_index! {
    /// Identifies a mutable stack slot allocated for a variable
    pub struct SlotId;
}

simple_index! {
    /// Identifies an interned read-only string constant
    pub struct StringId;
}

#[derive(Debug)]
pub struct Module {
    pub entry: Function,
    /// Read-only string constants referenced by [`Immediate::Str`]
    pub strings: IndexVec<StringId, String>,
}

#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub registers: IndexVec<RegisterId, Register>,
    pub slots: IndexVec<SlotId, StackSlot>,
    pub blocks: IndexVec<BlockId, Block>,
}

/// A temporary virtual register of some machine type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub id: RegisterId,
    pub ty: Type,
}

/// A mutable memory slot backing one declared variable (or one implicit loop
/// counter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSlot {
    pub id: SlotId,
    pub name: String,
    pub ty: Type,
}

#[derive(Debug)]
pub struct Block {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
    pub predecessors: BTreeSet<BlockId>,
}

impl Block {
    /// Whether this block has been sealed with a terminator. Sealed blocks
    /// are never reopened.
    pub fn is_terminated(&self) -> bool {
        self.instructions
            .last()
            .is_some_and(Instruction::is_terminator)
    }
}

/// The machine-level type of a register or stack slot.
///
/// Language types map onto these as int -> i32, bool -> i1, char -> i8,
/// float -> f32, and string -> ptr. `f64` only ever appears as the result of
/// the widening cast in front of a float print call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Integer(IntegerWidth),
    Float(FloatWidth),
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    I1,
    I8,
    I32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

impl From<ty::Type> for Type {
    fn from(ty: ty::Type) -> Self {
        match ty {
            ty::Type::Int => Type::Integer(IntegerWidth::I32),
            ty::Type::Float => Type::Float(FloatWidth::F32),
            ty::Type::Bool => Type::Integer(IntegerWidth::I1),
            ty::Type::Char => Type::Integer(IntegerWidth::I8),
            ty::Type::String => Type::Pointer,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Reads the current value of a stack slot
    Load {
        destination: RegisterId,
        slot: SlotId,
    },
    /// Overwrites a stack slot
    Store { slot: SlotId, source: Operand },
    UnaryOperation {
        operator: UnaryOperator,
        destination: RegisterId,
        operand: Operand,
    },
    BinaryOperation {
        operator: BinaryOperator,
        destination: RegisterId,
        lhs: Operand,
        rhs: Operand,
    },
    Cast {
        kind: CastKind,
        destination: RegisterId,
        operand: Operand,
    },
    /// Branchless choice between two operands of the same machine type
    Select {
        destination: RegisterId,
        condition: Operand,
        positive: Operand,
        negative: Operand,
    },
    /// Call into the runtime support library
    Call {
        target: RuntimeFunction,
        arguments: Vec<Operand>,
        destination: Option<RegisterId>,
    },
    Branch {
        condition: Operand,
        positive: BlockId,
        negative: BlockId,
    },
    Jump { destination: BlockId },
    Return { value: Option<Operand> },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Branch { .. } | Instruction::Jump { .. } | Instruction::Return { .. }
        )
    }

    /// Every operand this instruction reads
    pub fn operands(&self) -> Vec<Operand> {
        match self {
            Instruction::Load { .. } => Vec::new(),
            Instruction::Store { source, .. } => vec![*source],
            Instruction::UnaryOperation { operand, .. } => vec![*operand],
            Instruction::BinaryOperation { lhs, rhs, .. } => vec![*lhs, *rhs],
            Instruction::Cast { operand, .. } => vec![*operand],
            Instruction::Select {
                condition,
                positive,
                negative,
                ..
            } => vec![*condition, *positive, *negative],
            Instruction::Call { arguments, .. } => arguments.clone(),
            Instruction::Branch { condition, .. } => vec![*condition],
            Instruction::Jump { .. } => Vec::new(),
            Instruction::Return { value } => value.iter().copied().collect(),
        }
    }

    /// The register this instruction writes, if any
    pub fn destination(&self) -> Option<RegisterId> {
        match self {
            Instruction::Load { destination, .. }
            | Instruction::UnaryOperation { destination, .. }
            | Instruction::BinaryOperation { destination, .. }
            | Instruction::Cast { destination, .. }
            | Instruction::Select { destination, .. } => Some(*destination),
            Instruction::Call { destination, .. } => *destination,
            Instruction::Store { .. }
            | Instruction::Branch { .. }
            | Instruction::Jump { .. }
            | Instruction::Return { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum UnaryOperator {
    Neg,
    FNeg,
}

/// Comparison predicate shared by the integer (signed) and float (ordered)
/// compare instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    /// Only emitted by the "not equal to zero" condition coercion
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    /// Signed truncating division
    Div,
    FAdd,
    FSub,
    FMul,
    FDiv,
    And,
    Or,
    /// Signed integer comparison, producing an i1
    ICmp(Comparison),
    /// Ordered float comparison, producing an i1
    FCmp(Comparison),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CastKind {
    BoolToInt,
    CharToInt,
    IntToFloat,
    FloatToDouble,
}

/// The runtime support functions a generated program may call. The backend
/// links these against the Lilt runtime library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RuntimeFunction {
    /// Variadic formatted output: one format string, one value
    #[strum(serialize = "printf")]
    Printf,
    /// Two string pointers in, newly allocated concatenation out
    #[strum(serialize = "concat_strings")]
    ConcatStrings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    Int(i32),
    Float(f32),
    Bool(bool),
    Char(u8),
    /// Pointer to an interned string constant
    Str(StringId),
    /// The null string pointer (zero value of `string`)
    NullStr,
}

impl Immediate {
    pub fn ty(self) -> Type {
        match self {
            Immediate::Int(_) => Type::Integer(IntegerWidth::I32),
            Immediate::Float(_) => Type::Float(FloatWidth::F32),
            Immediate::Bool(_) => Type::Integer(IntegerWidth::I1),
            Immediate::Char(_) => Type::Integer(IntegerWidth::I8),
            Immediate::Str(_) | Immediate::NullStr => Type::Pointer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Immediate(Immediate),
    Register(RegisterId),
}

impl Function {
    /// The machine type an operand evaluates to, if its register exists
    pub fn operand_type(&self, operand: Operand) -> Option<Type> {
        match operand {
            Operand::Immediate(immediate) => Some(immediate.ty()),
            Operand::Register(id) => self.registers.get(id).map(|r| r.ty),
        }
    }
}
