//! The Lilt runtime type model.
//!
//! Lilt programs only ever manipulate five kinds of values. Types are not
//! checked ahead of time; they are discovered value-by-value while the AST is
//! lowered, and the only implicit conversion between them is the int-to-float
//! promotion applied at arithmetic, comparison, and storage sites.

use strum::Display;

/// One of the five runtime types a Lilt value can have.
///
/// The `Display` form ("int", "float", ...) is the constant returned by the
/// language's `TYPE` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Type {
    /// 32-bit signed integer
    Int,
    /// 32-bit IEEE float
    Float,
    /// 1-bit truth value
    Bool,
    /// 8-bit character
    Char,
    /// Pointer to a byte sequence
    String,
}

impl Type {
    /// Whether the int-to-float promotion rule applies to this type.
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Result type of combining two operands under the promotion rule: equal
    /// numeric types combine as themselves, a mixed int/float pair combines
    /// as float, and everything else has no arithmetic meaning.
    pub fn promoted_with(self, other: Type) -> Option<Type> {
        match (self, other) {
            (lhs, rhs) if lhs == rhs && lhs.is_numeric() => Some(lhs),
            (Type::Int, Type::Float) | (Type::Float, Type::Int) => Some(Type::Float),
            _ => None,
        }
    }
}
