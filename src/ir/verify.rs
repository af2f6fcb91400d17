//! Structural well-formedness checks over a lowered module.
//!
//! The emitter is supposed to uphold these properties by construction; the
//! verifier re-checks them before the module is handed to the backend so
//! that an emitter bug surfaces here instead of as a miscompile. All
//! violations are collected rather than stopping at the first one.

use hashbrown::HashSet;

use crate::ir::{BlockId, Instruction, Module, Operand, RegisterId, SlotId, StringId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// A block's last instruction is not a branch, jump, or return
    MissingTerminator { block: BlockId },
    /// A terminator appears before the end of a block
    InteriorTerminator { block: BlockId },
    UnknownRegister { block: BlockId, register: RegisterId },
    UnknownSlot { block: BlockId, slot: SlotId },
    UnknownBlock { block: BlockId, target: BlockId },
    UnknownString { block: BlockId, string: StringId },
    /// A store's value type does not match its slot's declared type
    StoreTypeMismatch { block: BlockId, slot: SlotId },
    /// A branch or jump edge exists that the target block does not record
    MissingPredecessor { block: BlockId, target: BlockId },
}

impl core::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyError::MissingTerminator { block } => {
                write!(f, "block {block} does not end with a terminator")
            }
            VerifyError::InteriorTerminator { block } => {
                write!(f, "block {block} has a terminator before its last instruction")
            }
            VerifyError::UnknownRegister { block, register } => {
                write!(f, "block {block} references undefined register {register}")
            }
            VerifyError::UnknownSlot { block, slot } => {
                write!(f, "block {block} references undefined slot {slot}")
            }
            VerifyError::UnknownBlock { block, target } => {
                write!(f, "block {block} targets undefined block {target}")
            }
            VerifyError::UnknownString { block, string } => {
                write!(f, "block {block} references undefined string {string}")
            }
            VerifyError::StoreTypeMismatch { block, slot } => {
                write!(
                    f,
                    "block {block} stores a value of the wrong type into slot {slot}"
                )
            }
            VerifyError::MissingPredecessor { block, target } => {
                write!(
                    f,
                    "block {block} jumps to block {target} which does not record the edge"
                )
            }
        }
    }
}

pub fn verify_module(module: &Module) -> Result<(), Vec<VerifyError>> {
    let mut errors = Vec::new();
    let function = &module.entry;

    let registers: HashSet<RegisterId> = function.registers.iter().map(|r| r.id).collect();
    let slots: HashSet<SlotId> = function.slots.iter().map(|s| s.id).collect();
    let blocks: HashSet<BlockId> = function.blocks.iter().map(|b| b.id).collect();

    for block in function.blocks.iter() {
        if !block.is_terminated() {
            errors.push(VerifyError::MissingTerminator { block: block.id });
        }

        for (position, instruction) in block.instructions.iter().enumerate() {
            if instruction.is_terminator() && position + 1 != block.instructions.len() {
                errors.push(VerifyError::InteriorTerminator { block: block.id });
            }

            for operand in instruction.operands() {
                match operand {
                    Operand::Register(register) if !registers.contains(&register) => {
                        errors.push(VerifyError::UnknownRegister {
                            block: block.id,
                            register,
                        });
                    }
                    Operand::Immediate(crate::ir::Immediate::Str(string)) => {
                        if module.strings.get(string).is_none() {
                            errors.push(VerifyError::UnknownString {
                                block: block.id,
                                string,
                            });
                        }
                    }
                    _ => {}
                }
            }

            if let Some(destination) = instruction.destination()
                && !registers.contains(&destination)
            {
                errors.push(VerifyError::UnknownRegister {
                    block: block.id,
                    register: destination,
                });
            }

            match instruction {
                Instruction::Load { slot, .. } => {
                    if !slots.contains(slot) {
                        errors.push(VerifyError::UnknownSlot {
                            block: block.id,
                            slot: *slot,
                        });
                    }
                }
                Instruction::Store { slot, source } => {
                    let Some(declared) = function.slots.get(*slot) else {
                        errors.push(VerifyError::UnknownSlot {
                            block: block.id,
                            slot: *slot,
                        });
                        continue;
                    };

                    // a missing register was already reported above, so an
                    // unresolvable type is not double-counted here
                    if let Some(ty) = function.operand_type(*source)
                        && ty != declared.ty
                    {
                        errors.push(VerifyError::StoreTypeMismatch {
                            block: block.id,
                            slot: *slot,
                        });
                    }
                }
                Instruction::Branch {
                    positive, negative, ..
                } => {
                    for target in [*positive, *negative] {
                        check_edge(function, block.id, target, &blocks, &mut errors);
                    }
                }
                Instruction::Jump { destination } => {
                    check_edge(function, block.id, *destination, &blocks, &mut errors);
                }
                _ => {}
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_edge(
    function: &crate::ir::Function,
    source: BlockId,
    target: BlockId,
    blocks: &HashSet<BlockId>,
    errors: &mut Vec<VerifyError>,
) {
    if !blocks.contains(&target) {
        errors.push(VerifyError::UnknownBlock {
            block: source,
            target,
        });
        return;
    }

    if !function.blocks[target].predecessors.contains(&source) {
        errors.push(VerifyError::MissingPredecessor {
            block: source,
            target,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        index::{Index, IndexVec},
        ir::{Block, Function, Immediate, IntegerWidth, Register, StackSlot, Type},
    };

    fn empty_module() -> Module {
        Module {
            entry: Function {
                name: "main".to_owned(),
                registers: IndexVec::new(),
                slots: IndexVec::new(),
                blocks: IndexVec::new(),
            },
            strings: IndexVec::new(),
        }
    }

    fn block(id: usize, instructions: Vec<Instruction>) -> Block {
        Block {
            id: BlockId::new(id),
            instructions,
            predecessors: BTreeSet::new(),
        }
    }

    #[test]
    fn accepts_a_minimal_module() {
        let mut module = empty_module();
        module.entry.blocks.push(block(
            0,
            vec![Instruction::Return {
                value: Some(Operand::Immediate(Immediate::Int(0))),
            }],
        ));

        assert_eq!(verify_module(&module), Ok(()));
    }

    #[test]
    fn rejects_an_unterminated_block() {
        let mut module = empty_module();
        module.entry.registers.push(Register {
            id: RegisterId::new(0),
            ty: Type::Integer(IntegerWidth::I32),
        });
        module.entry.slots.push(StackSlot {
            id: SlotId::new(0),
            name: "x".to_owned(),
            ty: Type::Integer(IntegerWidth::I32),
        });
        module.entry.blocks.push(block(
            0,
            vec![Instruction::Load {
                destination: RegisterId::new(0),
                slot: SlotId::new(0),
            }],
        ));

        assert_eq!(
            verify_module(&module),
            Err(vec![VerifyError::MissingTerminator {
                block: BlockId::ENTRY
            }])
        );
    }

    #[test]
    fn rejects_a_terminator_in_the_middle_of_a_block() {
        let mut module = empty_module();
        module.entry.blocks.push(block(
            0,
            vec![
                Instruction::Return { value: None },
                Instruction::Return { value: None },
            ],
        ));

        assert_eq!(
            verify_module(&module),
            Err(vec![VerifyError::InteriorTerminator {
                block: BlockId::ENTRY
            }])
        );
    }

    #[test]
    fn rejects_references_to_undefined_ids() {
        let mut module = empty_module();
        module.entry.blocks.push(block(
            0,
            vec![
                Instruction::Store {
                    slot: SlotId::new(7),
                    source: Operand::Immediate(Immediate::Int(1)),
                },
                Instruction::Jump {
                    destination: BlockId::new(9),
                },
            ],
        ));

        let errors = verify_module(&module).unwrap_err();

        assert!(errors.contains(&VerifyError::UnknownSlot {
            block: BlockId::ENTRY,
            slot: SlotId::new(7)
        }));
        assert!(errors.contains(&VerifyError::UnknownBlock {
            block: BlockId::ENTRY,
            target: BlockId::new(9)
        }));
    }

    #[test]
    fn rejects_a_store_of_the_wrong_type() {
        let mut module = empty_module();
        module.entry.slots.push(StackSlot {
            id: SlotId::new(0),
            name: "flag".to_owned(),
            ty: Type::Integer(IntegerWidth::I1),
        });
        module.entry.blocks.push(block(
            0,
            vec![
                Instruction::Store {
                    slot: SlotId::new(0),
                    source: Operand::Immediate(Immediate::Int(1)),
                },
                Instruction::Return { value: None },
            ],
        ));

        assert_eq!(
            verify_module(&module),
            Err(vec![VerifyError::StoreTypeMismatch {
                block: BlockId::ENTRY,
                slot: SlotId::new(0)
            }])
        );
    }

    #[test]
    fn rejects_an_unrecorded_control_flow_edge() {
        let mut module = empty_module();
        module.entry.blocks.push(block(
            0,
            vec![Instruction::Jump {
                destination: BlockId::new(1),
            }],
        ));
        // the target exists but never recorded .label_0 as a predecessor
        module
            .entry
            .blocks
            .push(block(1, vec![Instruction::Return { value: None }]));

        assert_eq!(
            verify_module(&module),
            Err(vec![VerifyError::MissingPredecessor {
                block: BlockId::ENTRY,
                target: BlockId::new(1)
            }])
        );
    }
}
