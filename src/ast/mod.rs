//! The abstract syntax tree handed to the code generator by the upstream
//! parser.
//!
//! The parser is an external collaborator: this crate never tokenizes Lilt
//! source, it only consumes the finished tree (see [`reader`] for the textual
//! interchange format). Each node carries a kind tag, an optional payload
//! (a literal's text or an identifier name), and up to two ordered children.
//! The child arity of every kind is fixed; the generator trusts the shape and
//! panics on malformed trees rather than validating them.

use strum::{Display, EnumString};

pub mod reader;

/// The closed set of node kinds the parser can produce.
///
/// The `strum` serialization is the exact tag spelling used by the parser's
/// AST dump format (`DECL_INT`, `STATEMENT_LIST`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /* Literals */
    Number,
    Float,
    Boolean,
    Char,
    String,

    /* References */
    Identifier,

    /* Operators */
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    And,
    Or,

    /* Statements */
    DeclInt,
    DeclFloat,
    DeclBool,
    DeclChar,
    DeclString,
    AssignInt,
    AssignFloat,
    AssignBool,
    AssignChar,
    AssignString,
    Reassign,
    VarDecl,
    Print,
    If,
    Loop,
    LoopUntil,
    StatementList,
    Type,
}

/// One node of the parsed program.
///
/// The tree is immutable once built and every node exclusively owns its
/// children.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: NodeKind,
    pub value: Option<String>,
    pub left: Option<Box<AstNode>>,
    pub right: Option<Box<AstNode>>,
}

impl AstNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            value: None,
            left: None,
            right: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_left(mut self, child: AstNode) -> Self {
        self.left = Some(Box::new(child));
        self
    }

    pub fn with_right(mut self, child: AstNode) -> Self {
        self.right = Some(Box::new(child));
        self
    }

    /// The payload of a node kind whose shape requires one.
    pub(crate) fn payload(&self) -> &str {
        self.value
            .as_deref()
            .unwrap_or_else(|| panic!("{} node is missing its payload", self.kind))
    }

    /// The left child of a node kind whose shape requires one.
    pub(crate) fn expect_left(&self) -> &AstNode {
        self.left
            .as_deref()
            .unwrap_or_else(|| panic!("{} node is missing its left child", self.kind))
    }

    /// The right child of a node kind whose shape requires one.
    pub(crate) fn expect_right(&self) -> &AstNode {
        self.right
            .as_deref()
            .unwrap_or_else(|| panic!("{} node is missing its right child", self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_tags_round_trip_the_wire_spelling() {
        assert_eq!(NodeKind::DeclInt.to_string(), "DECL_INT");
        assert_eq!(NodeKind::StatementList.to_string(), "STATEMENT_LIST");
        assert_eq!(NodeKind::LoopUntil.to_string(), "LOOP_UNTIL");
        assert_eq!("VAR_DECL".parse::<NodeKind>().unwrap(), NodeKind::VarDecl);
        assert_eq!("NUMBER".parse::<NodeKind>().unwrap(), NodeKind::Number);
        assert!("WHATEVER".parse::<NodeKind>().is_err());
    }
}
