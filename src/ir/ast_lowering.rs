//! AST -> IR lowering
//!
//! This is the heart of the code generator: a single depth-first traversal
//! that discovers types value-by-value, applies the int-to-float promotion
//! rule, and flattens control flow into basic blocks as it goes. Children
//! are lowered before their parent combines them; declarations create
//! storage before their initializer's value is stored.
//!
//! Errors come in two tiers. Anything that makes the program unsound
//! (unknown names, duplicate declarations, type mismatches) aborts the run
//! as an `Err`. Cosmetic problems (a malformed char literal, a `TYPE` query
//! on an unknown name) degrade to a safe placeholder, record a warning, and
//! let generation continue.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::{
    ast::{AstNode, NodeKind},
    index::IndexVec,
    ir::{
        BinaryOperator, Block, BlockId, CastKind, Comparison, FloatWidth, Function, Immediate,
        Instruction, IntegerWidth, Module, Operand, Register, RegisterId, RuntimeFunction, SlotId,
        StackSlot, StringId, Type, UnaryOperator,
    },
    symbol_table::{Binding, SymbolTable},
    ty,
};

/// The conventional name the implicit loop counter is visible under inside a
/// counted loop's body.
const LOOP_COUNTER_NAME: &str = "i";

#[derive(Debug)]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    #[cfg(feature = "error-backtrace")]
    backtrace: std::backtrace::Backtrace,
}

impl CodegenError {
    #[cfg(feature = "error-backtrace")]
    pub fn backtrace(&self) -> &std::backtrace::Backtrace {
        &self.backtrace
    }
}

impl From<CodegenErrorKind> for CodegenError {
    fn from(kind: CodegenErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "error-backtrace")]
            backtrace: std::backtrace::Backtrace::capture(),
        }
    }
}

impl core::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for CodegenError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenErrorKind {
    DuplicateDeclaration {
        name: String,
    },
    UndeclaredVariable {
        name: String,
    },
    MixedOperandTypes {
        operator: NodeKind,
        lhs: ty::Type,
        rhs: ty::Type,
    },
    InvalidOperandType {
        operator: NodeKind,
        operand: ty::Type,
    },
    StorageTypeMismatch {
        name: String,
        declared: ty::Type,
        value: ty::Type,
    },
    InvalidConditionType {
        ty: ty::Type,
    },
    InvalidLoopCount {
        ty: ty::Type,
    },
    MissingInitializer {
        name: String,
    },
}

impl core::fmt::Display for CodegenErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenErrorKind::DuplicateDeclaration { name } => {
                write!(f, "variable `{name}` is already declared")
            }
            CodegenErrorKind::UndeclaredVariable { name } => {
                write!(f, "unknown variable `{name}`")
            }
            CodegenErrorKind::MixedOperandTypes { operator, lhs, rhs } => {
                write!(
                    f,
                    "cannot apply {operator} to operands of type {lhs} and {rhs}"
                )
            }
            CodegenErrorKind::InvalidOperandType { operator, operand } => {
                write!(f, "cannot apply {operator} to an operand of type {operand}")
            }
            CodegenErrorKind::StorageTypeMismatch {
                name,
                declared,
                value,
            } => {
                write!(
                    f,
                    "cannot store a value of type {value} into `{name}` which was declared as {declared}"
                )
            }
            CodegenErrorKind::InvalidConditionType { ty } => {
                write!(f, "cannot use a value of type {ty} as a branch condition")
            }
            CodegenErrorKind::InvalidLoopCount { ty } => {
                write!(f, "cannot use a value of type {ty} as a loop count")
            }
            CodegenErrorKind::MissingInitializer { name } => {
                write!(f, "declaration of `{name}` has no initializer value")
            }
        }
    }
}

/// A recoverable diagnostic: generation continued with a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenWarning {
    InvalidCharLiteral { literal: String },
    UnknownTypeQuery { name: String },
}

impl core::fmt::Display for CodegenWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenWarning::InvalidCharLiteral { literal } => {
                write!(f, "invalid char literal {literal}, using '\\0' instead")
            }
            CodegenWarning::UnknownTypeQuery { name } => {
                write!(f, "cannot resolve the type of unknown variable `{name}`")
            }
        }
    }
}

/// The result of lowering an expression node: where the value lives and
/// which of the five language types it has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypedValue {
    pub operand: Operand,
    pub ty: ty::Type,
}

#[derive(Debug)]
pub struct LoweredProgram {
    pub module: Module,
    pub warnings: Vec<CodegenWarning>,
}

/// Lowers a whole program into the implicit entry procedure.
///
/// The final basic block is sealed with `ret 0` (the program's success
/// status) once the tree has been fully traversed.
pub fn lower_program(root: &AstNode) -> Result<LoweredProgram, CodegenError> {
    let mut ctx = LoweringContext::new();

    ctx.lower(root)?;

    ctx.push_instruction(Instruction::Return {
        value: Some(Operand::Immediate(Immediate::Int(0))),
    });

    Ok(ctx.into_output())
}

struct LoweringContext {
    symbols: SymbolTable,
    registers: IndexVec<RegisterId, Register>,
    slots: IndexVec<SlotId, StackSlot>,
    blocks: IndexVec<BlockId, Block>,
    strings: IndexVec<StringId, String>,
    interned_strings: HashMap<String, StringId>,
    /// Insertion point: instructions are appended here until the block is
    /// sealed with a terminator
    current_block: BlockId,
    warnings: Vec<CodegenWarning>,
}

impl LoweringContext {
    fn new() -> Self {
        let mut blocks = IndexVec::new();
        let entry = blocks.push(Block {
            id: BlockId::ENTRY,
            instructions: Vec::new(),
            predecessors: BTreeSet::new(),
        });

        Self {
            symbols: SymbolTable::new(),
            registers: IndexVec::new(),
            slots: IndexVec::new(),
            blocks,
            strings: IndexVec::new(),
            interned_strings: HashMap::new(),
            current_block: entry,
            warnings: Vec::new(),
        }
    }

    fn into_output(self) -> LoweredProgram {
        LoweredProgram {
            module: Module {
                entry: Function {
                    name: "main".to_owned(),
                    registers: self.registers,
                    slots: self.slots,
                    blocks: self.blocks,
                },
                strings: self.strings,
            },
            warnings: self.warnings,
        }
    }

    /* Emission helpers */

    fn create_register(&mut self, ty: Type) -> RegisterId {
        let id = self.registers.next_index();
        self.registers.push(Register { id, ty })
    }

    fn create_slot(&mut self, name: impl Into<String>, ty: Type) -> SlotId {
        let id = self.slots.next_index();
        self.slots.push(StackSlot {
            id,
            name: name.into(),
            ty,
        })
    }

    fn create_block(&mut self) -> BlockId {
        let id = self.blocks.next_index();
        self.blocks.push(Block {
            id,
            instructions: Vec::new(),
            predecessors: BTreeSet::new(),
        })
    }

    fn push_instruction(&mut self, instruction: Instruction) {
        let block = &mut self.blocks[self.current_block];
        debug_assert!(
            !block.is_terminated(),
            "instruction appended to a sealed block"
        );
        block.instructions.push(instruction);
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current_block = block;
    }

    /// Seals the current block with an unconditional jump
    fn jump(&mut self, destination: BlockId) {
        let source = self.current_block;
        self.push_instruction(Instruction::Jump { destination });
        self.blocks[destination].predecessors.insert(source);
    }

    /// Seals the current block with a conditional branch
    fn branch(&mut self, condition: Operand, positive: BlockId, negative: BlockId) {
        let source = self.current_block;
        self.push_instruction(Instruction::Branch {
            condition,
            positive,
            negative,
        });
        self.blocks[positive].predecessors.insert(source);
        self.blocks[negative].predecessors.insert(source);
    }

    fn intern_string(&mut self, value: &str) -> StringId {
        if let Some(id) = self.interned_strings.get(value) {
            return *id;
        }

        let id = self.strings.push(value.to_owned());
        self.interned_strings.insert(value.to_owned(), id);
        id
    }

    fn load_slot(&mut self, binding: Binding) -> TypedValue {
        let destination = self.create_register(binding.ty.into());
        self.push_instruction(Instruction::Load {
            destination,
            slot: binding.slot,
        });

        TypedValue {
            operand: Operand::Register(destination),
            ty: binding.ty,
        }
    }

    fn store_slot(&mut self, slot: SlotId, source: Operand) {
        self.push_instruction(Instruction::Store { slot, source });
    }

    fn cast(&mut self, kind: CastKind, operand: Operand, ty: ty::Type) -> TypedValue {
        let destination = self.create_register(ty.into());
        self.push_instruction(Instruction::Cast {
            kind,
            destination,
            operand,
        });

        TypedValue {
            operand: Operand::Register(destination),
            ty,
        }
    }

    /// Allocates storage for a newly declared name
    fn declare(&mut self, name: &str, ty: ty::Type) -> Result<SlotId, CodegenError> {
        if self.symbols.lookup(name).is_some() {
            return Err(CodegenErrorKind::DuplicateDeclaration {
                name: name.to_owned(),
            }
            .into());
        }

        let slot = self.create_slot(name, ty.into());
        let declared = self.symbols.declare(name, Binding { slot, ty });
        debug_assert!(declared);

        Ok(slot)
    }

    fn lookup(&self, name: &str) -> Result<Binding, CodegenError> {
        self.symbols
            .lookup(name)
            .ok_or_else(|| {
                CodegenErrorKind::UndeclaredVariable {
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /* Coercions */

    /// `value != 0` for the non-bool integer types
    fn compare_nonzero(&mut self, value: TypedValue) -> TypedValue {
        let zero = match value.ty {
            ty::Type::Int => Immediate::Int(0),
            ty::Type::Char => Immediate::Char(0),
            _ => unreachable!("non-integer value compared against zero"),
        };

        let destination = self.create_register(Type::Integer(IntegerWidth::I1));
        self.push_instruction(Instruction::BinaryOperation {
            operator: BinaryOperator::ICmp(Comparison::Ne),
            destination,
            lhs: value.operand,
            rhs: Operand::Immediate(zero),
        });

        TypedValue {
            operand: Operand::Register(destination),
            ty: ty::Type::Bool,
        }
    }

    /// Coerces a value for use as a branch condition. Bools pass through,
    /// non-bool integers become `value != 0`, floats and strings are
    /// rejected.
    fn coerce_condition(&mut self, value: TypedValue) -> Result<TypedValue, CodegenError> {
        match value.ty {
            ty::Type::Bool => Ok(value),
            ty::Type::Int | ty::Type::Char => Ok(self.compare_nonzero(value)),
            other => Err(CodegenErrorKind::InvalidConditionType { ty: other }.into()),
        }
    }

    /// Checks a value against the declared type of the slot it is about to
    /// be written to, applying the int-to-float promotion. A stored value's
    /// type must exactly match its slot's type after this.
    fn coerce_for_storage(
        &mut self,
        name: &str,
        value: TypedValue,
        declared: ty::Type,
    ) -> Result<TypedValue, CodegenError> {
        match (value.ty, declared) {
            (found, expected) if found == expected => Ok(value),
            (ty::Type::Int, ty::Type::Float) => {
                Ok(self.cast(CastKind::IntToFloat, value.operand, ty::Type::Float))
            }
            (found, expected) => Err(CodegenErrorKind::StorageTypeMismatch {
                name: name.to_owned(),
                declared: expected,
                value: found,
            }
            .into()),
        }
    }

    /// Applies the promotion rule to a binary operator's operand pair,
    /// returning the final operands and their common numeric type.
    fn promote_pair(
        &mut self,
        operator: NodeKind,
        lhs: TypedValue,
        rhs: TypedValue,
    ) -> Result<(Operand, Operand, ty::Type), CodegenError> {
        let ty = lhs.ty.promoted_with(rhs.ty).ok_or_else(|| {
            CodegenError::from(CodegenErrorKind::MixedOperandTypes {
                operator,
                lhs: lhs.ty,
                rhs: rhs.ty,
            })
        })?;

        let mut widen = |value: TypedValue| {
            if value.ty == ty {
                value.operand
            } else {
                self.cast(CastKind::IntToFloat, value.operand, ty).operand
            }
        };

        let lhs = widen(lhs);
        let rhs = widen(rhs);

        Ok((lhs, rhs, ty))
    }

    /// Lowers a node that must produce a value (an operand position)
    fn lower_operand(&mut self, node: &AstNode) -> Result<TypedValue, CodegenError> {
        let value = self.lower(node)?;
        Ok(value.unwrap_or_else(|| panic!("{} node used where a value is required", node.kind)))
    }

    /* The emitter itself */

    fn lower(&mut self, node: &AstNode) -> Result<Option<TypedValue>, CodegenError> {
        match node.kind {
            /* Literals */
            NodeKind::Number => {
                let value = node.payload().trim().parse::<i32>().unwrap_or(0);

                Ok(Some(TypedValue {
                    operand: Operand::Immediate(Immediate::Int(value)),
                    ty: ty::Type::Int,
                }))
            }
            NodeKind::Float => {
                let value = node.payload().trim().parse::<f32>().unwrap_or(0.0);

                Ok(Some(TypedValue {
                    operand: Operand::Immediate(Immediate::Float(value)),
                    ty: ty::Type::Float,
                }))
            }
            NodeKind::Boolean => {
                let value = matches!(node.payload(), "true" | "1");

                Ok(Some(TypedValue {
                    operand: Operand::Immediate(Immediate::Bool(value)),
                    ty: ty::Type::Bool,
                }))
            }
            NodeKind::Char => {
                let literal = node.payload();

                // the payload must be at least a single character between
                // quote delimiters ('a')
                let value = if literal.len() < 3 {
                    self.warnings.push(CodegenWarning::InvalidCharLiteral {
                        literal: literal.to_owned(),
                    });
                    0
                } else {
                    literal.as_bytes()[1]
                };

                Ok(Some(TypedValue {
                    operand: Operand::Immediate(Immediate::Char(value)),
                    ty: ty::Type::Char,
                }))
            }
            NodeKind::String => {
                let mut literal = node.payload();

                if literal.len() >= 2 && literal.starts_with('"') && literal.ends_with('"') {
                    literal = &literal[1..literal.len() - 1];
                }

                let id = self.intern_string(literal);

                Ok(Some(TypedValue {
                    operand: Operand::Immediate(Immediate::Str(id)),
                    ty: ty::Type::String,
                }))
            }

            /* References */
            NodeKind::Identifier => {
                let binding = self.lookup(node.payload())?;
                Ok(Some(self.load_slot(binding)))
            }

            /* Operators */
            NodeKind::Neg => {
                let operand = self.lower_operand(node.expect_left())?;

                let operator = match operand.ty {
                    ty::Type::Int => UnaryOperator::Neg,
                    ty::Type::Float => UnaryOperator::FNeg,
                    other => {
                        return Err(CodegenErrorKind::InvalidOperandType {
                            operator: node.kind,
                            operand: other,
                        }
                        .into());
                    }
                };

                let destination = self.create_register(operand.ty.into());
                self.push_instruction(Instruction::UnaryOperation {
                    operator,
                    destination,
                    operand: operand.operand,
                });

                Ok(Some(TypedValue {
                    operand: Operand::Register(destination),
                    ty: operand.ty,
                }))
            }
            NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div => {
                let lhs = self.lower_operand(node.expect_left())?;
                let rhs = self.lower_operand(node.expect_right())?;

                // ADD on two strings is concatenation, not arithmetic
                if node.kind == NodeKind::Add
                    && lhs.ty == ty::Type::String
                    && rhs.ty == ty::Type::String
                {
                    let destination = self.create_register(Type::Pointer);
                    self.push_instruction(Instruction::Call {
                        target: RuntimeFunction::ConcatStrings,
                        arguments: vec![lhs.operand, rhs.operand],
                        destination: Some(destination),
                    });

                    return Ok(Some(TypedValue {
                        operand: Operand::Register(destination),
                        ty: ty::Type::String,
                    }));
                }

                let (lhs, rhs, ty) = self.promote_pair(node.kind, lhs, rhs)?;

                let operator = match (node.kind, ty) {
                    (NodeKind::Add, ty::Type::Int) => BinaryOperator::Add,
                    (NodeKind::Sub, ty::Type::Int) => BinaryOperator::Sub,
                    (NodeKind::Mul, ty::Type::Int) => BinaryOperator::Mul,
                    (NodeKind::Div, ty::Type::Int) => BinaryOperator::Div,
                    (NodeKind::Add, ty::Type::Float) => BinaryOperator::FAdd,
                    (NodeKind::Sub, ty::Type::Float) => BinaryOperator::FSub,
                    (NodeKind::Mul, ty::Type::Float) => BinaryOperator::FMul,
                    (NodeKind::Div, ty::Type::Float) => BinaryOperator::FDiv,
                    _ => unreachable!("promote_pair only yields numeric types"),
                };

                let destination = self.create_register(ty.into());
                self.push_instruction(Instruction::BinaryOperation {
                    operator,
                    destination,
                    lhs,
                    rhs,
                });

                Ok(Some(TypedValue {
                    operand: Operand::Register(destination),
                    ty,
                }))
            }
            NodeKind::Lt | NodeKind::Gt | NodeKind::Le | NodeKind::Ge | NodeKind::Eq => {
                let lhs = self.lower_operand(node.expect_left())?;
                let rhs = self.lower_operand(node.expect_right())?;

                let comparison = match node.kind {
                    NodeKind::Lt => Comparison::Lt,
                    NodeKind::Gt => Comparison::Gt,
                    NodeKind::Le => Comparison::Le,
                    NodeKind::Ge => Comparison::Ge,
                    NodeKind::Eq => Comparison::Eq,
                    _ => unreachable!(),
                };

                let (lhs_op, rhs_op, ty) = match (lhs.ty, rhs.ty) {
                    (ty::Type::String, ty::Type::String) => {
                        return Err(CodegenErrorKind::InvalidOperandType {
                            operator: node.kind,
                            operand: ty::Type::String,
                        }
                        .into());
                    }
                    (l, r) if l == r => (lhs.operand, rhs.operand, l),
                    _ => self.promote_pair(node.kind, lhs, rhs)?,
                };

                let operator = if ty == ty::Type::Float {
                    BinaryOperator::FCmp(comparison)
                } else {
                    BinaryOperator::ICmp(comparison)
                };

                let destination = self.create_register(Type::Integer(IntegerWidth::I1));
                self.push_instruction(Instruction::BinaryOperation {
                    operator,
                    destination,
                    lhs: lhs_op,
                    rhs: rhs_op,
                });

                Ok(Some(TypedValue {
                    operand: Operand::Register(destination),
                    ty: ty::Type::Bool,
                }))
            }
            NodeKind::And | NodeKind::Or => {
                // no short-circuit: both sides are always evaluated
                let lhs = self.lower_operand(node.expect_left())?;
                let rhs = self.lower_operand(node.expect_right())?;

                for operand in [&lhs, &rhs] {
                    if operand.ty != ty::Type::Bool {
                        return Err(CodegenErrorKind::InvalidOperandType {
                            operator: node.kind,
                            operand: operand.ty,
                        }
                        .into());
                    }
                }

                let operator = match node.kind {
                    NodeKind::And => BinaryOperator::And,
                    NodeKind::Or => BinaryOperator::Or,
                    _ => unreachable!(),
                };

                let destination = self.create_register(Type::Integer(IntegerWidth::I1));
                self.push_instruction(Instruction::BinaryOperation {
                    operator,
                    destination,
                    lhs: lhs.operand,
                    rhs: rhs.operand,
                });

                Ok(Some(TypedValue {
                    operand: Operand::Register(destination),
                    ty: ty::Type::Bool,
                }))
            }

            /* Declarations */
            NodeKind::DeclInt
            | NodeKind::DeclFloat
            | NodeKind::DeclBool
            | NodeKind::DeclChar
            | NodeKind::DeclString => {
                let ty = match node.kind {
                    NodeKind::DeclInt => ty::Type::Int,
                    NodeKind::DeclFloat => ty::Type::Float,
                    NodeKind::DeclBool => ty::Type::Bool,
                    NodeKind::DeclChar => ty::Type::Char,
                    NodeKind::DeclString => ty::Type::String,
                    _ => unreachable!(),
                };

                let zero = match ty {
                    ty::Type::Int => Immediate::Int(0),
                    ty::Type::Float => Immediate::Float(0.0),
                    ty::Type::Bool => Immediate::Bool(false),
                    ty::Type::Char => Immediate::Char(0),
                    ty::Type::String => Immediate::NullStr,
                };

                let slot = self.declare(node.payload(), ty)?;
                self.store_slot(slot, Operand::Immediate(zero));

                Ok(None)
            }
            NodeKind::VarDecl => {
                let name = node.payload();

                let value = self.lower(node.expect_left())?.ok_or_else(|| {
                    CodegenError::from(CodegenErrorKind::MissingInitializer {
                        name: name.to_owned(),
                    })
                })?;

                let slot = self.declare(name, value.ty)?;
                self.store_slot(slot, value.operand);

                Ok(None)
            }

            /* Assignments */
            NodeKind::AssignInt
            | NodeKind::AssignFloat
            | NodeKind::AssignBool
            | NodeKind::AssignChar
            | NodeKind::AssignString => {
                let target_ty = match node.kind {
                    NodeKind::AssignInt => ty::Type::Int,
                    NodeKind::AssignFloat => ty::Type::Float,
                    NodeKind::AssignBool => ty::Type::Bool,
                    NodeKind::AssignChar => ty::Type::Char,
                    NodeKind::AssignString => ty::Type::String,
                    _ => unreachable!(),
                };

                let name = node.payload();
                let mut value = self.lower_operand(node.expect_left())?;

                // assignment requires a prior declaration, same as REASSIGN
                let binding = self.lookup(name)?;

                if binding.ty != target_ty {
                    return Err(CodegenErrorKind::StorageTypeMismatch {
                        name: name.to_owned(),
                        declared: binding.ty,
                        value: target_ty,
                    }
                    .into());
                }

                // bool assignment accepts any int and compares it against
                // zero
                if node.kind == NodeKind::AssignBool && value.ty == ty::Type::Int {
                    value = self.compare_nonzero(value);
                }

                let value = self.coerce_for_storage(name, value, binding.ty)?;
                self.store_slot(binding.slot, value.operand);

                Ok(Some(value))
            }
            NodeKind::Reassign => {
                let name = node.payload();
                let binding = self.lookup(name)?;

                let value = self.lower_operand(node.expect_left())?;

                // reassignment may promote int to float but never changes
                // the slot's declared type
                let value = self.coerce_for_storage(name, value, binding.ty)?;
                self.store_slot(binding.slot, value.operand);

                Ok(Some(value))
            }

            /* Output */
            NodeKind::Print => {
                let value = self.lower_operand(node.expect_left())?;

                let (format, argument) = match value.ty {
                    ty::Type::Bool => {
                        // branchless choice between the two constant words
                        let positive = Immediate::Str(self.intern_string("true"));
                        let negative = Immediate::Str(self.intern_string("false"));

                        let destination = self.create_register(Type::Pointer);
                        self.push_instruction(Instruction::Select {
                            destination,
                            condition: value.operand,
                            positive: Operand::Immediate(positive),
                            negative: Operand::Immediate(negative),
                        });

                        ("%s\n", Operand::Register(destination))
                    }
                    ty::Type::Float => {
                        // printf takes floats at double precision
                        let destination = self.create_register(Type::Float(FloatWidth::F64));
                        self.push_instruction(Instruction::Cast {
                            kind: CastKind::FloatToDouble,
                            destination,
                            operand: value.operand,
                        });

                        ("%.1f\n", Operand::Register(destination))
                    }
                    ty::Type::Char => ("%c\n", value.operand),
                    ty::Type::String => ("%s\n", value.operand),
                    ty::Type::Int => ("%d\n", value.operand),
                };

                let format = Immediate::Str(self.intern_string(format));
                self.push_instruction(Instruction::Call {
                    target: RuntimeFunction::Printf,
                    arguments: vec![Operand::Immediate(format), argument],
                    destination: None,
                });

                Ok(None)
            }

            /* Type queries */
            NodeKind::Type => {
                let operand = node.expect_left();

                let name = match operand.kind {
                    // identifiers resolve through the symbol table without
                    // re-evaluating the expression
                    NodeKind::Identifier => match self.symbols.lookup(operand.payload()) {
                        Some(binding) => binding.ty.to_string(),
                        None => {
                            self.warnings.push(CodegenWarning::UnknownTypeQuery {
                                name: operand.payload().to_owned(),
                            });
                            "unknown".to_owned()
                        }
                    },
                    _ => self.lower_operand(operand)?.ty.to_string(),
                };

                let id = self.intern_string(&name);

                Ok(Some(TypedValue {
                    operand: Operand::Immediate(Immediate::Str(id)),
                    ty: ty::Type::String,
                }))
            }

            /* Control flow */
            NodeKind::If => {
                let condition = self.lower_operand(node.expect_left())?;
                let condition = self.coerce_condition(condition)?;

                let then_block = self.create_block();
                let merge_block = self.create_block();

                self.branch(condition.operand, then_block, merge_block);

                self.switch_to(then_block);
                self.lower(node.expect_right())?;
                self.jump(merge_block);

                self.switch_to(merge_block);

                Ok(None)
            }
            NodeKind::Loop => {
                let count = self.lower_operand(node.expect_left())?;
                let count = match count.ty {
                    ty::Type::Int => count.operand,
                    ty::Type::Char => {
                        self.cast(CastKind::CharToInt, count.operand, ty::Type::Int)
                            .operand
                    }
                    ty::Type::Bool => {
                        self.cast(CastKind::BoolToInt, count.operand, ty::Type::Int)
                            .operand
                    }
                    other => return Err(CodegenErrorKind::InvalidLoopCount { ty: other }.into()),
                };

                // each loop gets its own counter slot so that nested and
                // sibling loops never alias; the counter is visible inside
                // the body under the conventional name, and whatever that
                // name meant before is restored afterwards
                let counter = self.create_slot(
                    format!("{LOOP_COUNTER_NAME}.{}", self.slots.len()),
                    Type::Integer(IntegerWidth::I32),
                );
                self.store_slot(counter, Operand::Immediate(Immediate::Int(0)));

                let shadowed = self.symbols.shadow(
                    LOOP_COUNTER_NAME,
                    Binding {
                        slot: counter,
                        ty: ty::Type::Int,
                    },
                );

                let cond_block = self.create_block();
                let body_block = self.create_block();
                let after_block = self.create_block();

                self.jump(cond_block);

                self.switch_to(cond_block);
                let current = self.load_slot(Binding {
                    slot: counter,
                    ty: ty::Type::Int,
                });
                let repeat = self.create_register(Type::Integer(IntegerWidth::I1));
                self.push_instruction(Instruction::BinaryOperation {
                    operator: BinaryOperator::ICmp(Comparison::Lt),
                    destination: repeat,
                    lhs: current.operand,
                    rhs: count,
                });
                self.branch(Operand::Register(repeat), body_block, after_block);

                self.switch_to(body_block);
                self.lower(node.expect_right())?;

                let current = self.load_slot(Binding {
                    slot: counter,
                    ty: ty::Type::Int,
                });
                let next = self.create_register(Type::Integer(IntegerWidth::I32));
                self.push_instruction(Instruction::BinaryOperation {
                    operator: BinaryOperator::Add,
                    destination: next,
                    lhs: current.operand,
                    rhs: Operand::Immediate(Immediate::Int(1)),
                });
                self.store_slot(counter, Operand::Register(next));
                self.jump(cond_block);

                self.switch_to(after_block);
                self.symbols.restore(LOOP_COUNTER_NAME, shadowed);

                Ok(None)
            }
            NodeKind::LoopUntil => {
                let cond_block = self.create_block();
                let body_block = self.create_block();
                let after_block = self.create_block();

                self.jump(cond_block);

                // the condition is re-evaluated before every iteration and
                // the body repeats until it becomes true
                self.switch_to(cond_block);
                let condition = self.lower_operand(node.expect_left())?;
                let condition = self.coerce_condition(condition)?;
                self.branch(condition.operand, after_block, body_block);

                self.switch_to(body_block);
                self.lower(node.expect_right())?;
                self.jump(cond_block);

                self.switch_to(after_block);

                Ok(None)
            }

            /* Sequencing */
            NodeKind::StatementList => {
                if let Some(left) = &node.left {
                    self.lower(left)?;
                }

                if let Some(right) = &node.right {
                    return self.lower(right);
                }

                Ok(None)
            }
        }
    }
}
