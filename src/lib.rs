//! Code generation for the Lilt language.
//!
//! The crate sits between an external parser and an external backend: it
//! consumes a finished AST (see [`ast::reader`] for the interchange format)
//! and produces a verified register IR module in one traversal, inferring
//! types and lowering control flow as it walks.

pub mod ast;
pub mod index;
pub mod ir;
pub mod symbol_table;
pub mod ty;

use crate::ir::{
    Module,
    ast_lowering::{self, CodegenError, CodegenWarning},
    verify::{self, VerifyError},
};

#[derive(Debug)]
pub struct CompileOutput {
    pub module: Module,
    pub warnings: Vec<CodegenWarning>,
}

#[derive(Debug)]
pub enum CompileError {
    Codegen(CodegenError),
    /// The emitter produced a structurally broken module; always a bug in
    /// this crate rather than in the input program
    Verify(Vec<VerifyError>),
}

impl core::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Codegen(error) => error.fmt(f),
            CompileError::Verify(errors) => {
                writeln!(f, "generated module failed verification:")?;

                for error in errors {
                    writeln!(f, "  {error}")?;
                }

                Ok(())
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<CodegenError> for CompileError {
    fn from(error: CodegenError) -> Self {
        CompileError::Codegen(error)
    }
}

/// Lowers a parsed program into a verified IR module.
pub fn compile(root: &ast::AstNode) -> Result<CompileOutput, CompileError> {
    let lowered = ast_lowering::lower_program(root)?;

    verify::verify_module(&lowered.module).map_err(CompileError::Verify)?;

    Ok(CompileOutput {
        module: lowered.module,
        warnings: lowered.warnings,
    })
}
