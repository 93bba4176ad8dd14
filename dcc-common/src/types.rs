//! The Drift C type system
//!
//! A closed set of value types with structural equality. Pointer types are
//! compared by their base type, so `int*` equals `int*` regardless of where
//! the two values were constructed. Types are immutable values; the semantic
//! analyzer constructs them during resolution and hands them around by clone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Drift C value types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
    /// Only valid as a function return type or a pointer base
    Void,
    /// Pointer to another type
    Pointer(Box<Type>),
}

impl Type {
    /// Canonical pointer-to-`base` constructor
    pub fn pointer_to(base: Type) -> Self {
        Type::Pointer(Box::new(base))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Get the pointed-to type, if this is a pointer
    pub fn pointer_base(&self) -> Option<&Type> {
        match self {
            Type::Pointer(base) => Some(base),
            _ => None,
        }
    }

    /// Check whether a value of type `from` may initialize or be assigned
    /// to a slot of this type.
    ///
    /// Beyond structural equality two coercions are allowed: an `int` may be
    /// stored into any pointer (raw-address semantics), and `void*` is
    /// compatible with every pointer type in either direction. The reverse
    /// pointer-to-int direction is never allowed.
    pub fn coercible_from(&self, from: &Type) -> bool {
        if self == from {
            return true;
        }
        match (self, from) {
            (Type::Pointer(_), Type::Int) => true,
            (Type::Pointer(base), Type::Pointer(_)) if **base == Type::Void => true,
            (Type::Pointer(_), Type::Pointer(base)) if **base == Type::Void => true,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Void => write!(f, "void"),
            Type::Pointer(base) => write!(f, "{}*", base),
        }
    }
}

/// A function's resolved signature: return type plus ordered parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub return_type: Type,
    pub parameters: Vec<(String, Type)>,
}

impl FunctionSignature {
    pub fn new(return_type: Type, parameters: Vec<(String, Type)>) -> Self {
        Self {
            return_type,
            parameters,
        }
    }
}

/// Label generator for code generation
///
/// Counter-based so that compiling the same program twice yields identical
/// labels (and therefore byte-identical assembly).
#[derive(Debug, Clone, Default)]
pub struct LabelGenerator {
    next_id: u32,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate a new label with a prefix, e.g. `while_3`
    pub fn new_label(&mut self, prefix: &str) -> String {
        let label = format!("{}_{}", prefix, self.next_id);
        self.next_id += 1;
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_equality_is_structural() {
        let a = Type::pointer_to(Type::Int);
        let b = Type::pointer_to(Type::Int);
        assert_eq!(a, b);
        assert_ne!(a, Type::pointer_to(Type::Bool));
        assert_ne!(a, Type::Int);
    }

    #[test]
    fn test_int_to_pointer_coercion_is_one_way() {
        let ptr = Type::pointer_to(Type::Int);
        assert!(ptr.coercible_from(&Type::Int));
        assert!(!Type::Int.coercible_from(&ptr));
        assert!(!Type::Int.coercible_from(&Type::Bool));
    }

    #[test]
    fn test_void_pointer_is_a_wildcard() {
        let void_ptr = Type::pointer_to(Type::Void);
        let int_ptr = Type::pointer_to(Type::Int);
        assert!(void_ptr.coercible_from(&int_ptr));
        assert!(int_ptr.coercible_from(&void_ptr));
        // but void* is still not interchangeable with plain int targets
        assert!(!Type::Int.coercible_from(&void_ptr));
    }

    #[test]
    fn test_type_display() {
        assert_eq!(format!("{}", Type::Int), "int");
        assert_eq!(format!("{}", Type::pointer_to(Type::Void)), "void*");
        assert_eq!(
            format!("{}", Type::pointer_to(Type::pointer_to(Type::Int))),
            "int**"
        );
    }

    #[test]
    fn test_label_generator_is_deterministic() {
        let mut gen = LabelGenerator::new();
        assert_eq!(gen.new_label("while"), "while_0");
        assert_eq!(gen.new_label("end"), "end_1");

        let mut again = LabelGenerator::new();
        assert_eq!(again.new_label("while"), "while_0");
    }
}
