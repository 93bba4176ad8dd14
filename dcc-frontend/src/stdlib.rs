//! The Drift standard library
//!
//! A fixed table mapping function names to a signature (consumed during
//! signature collection) and a hand-written assembly body (emitted verbatim
//! by the code generator for imported names). The compiler does not validate
//! the bodies.

use dcc_common::{FunctionSignature, Type};

/// One standard-library entry
#[derive(Debug, Clone, PartialEq)]
pub struct StandardFunction {
    pub signature: FunctionSignature,
    /// Assembly body, excluding the leading `label <name>` line
    pub body: &'static [&'static str],
}

/// Names of every standard-library function, in registration order
pub const STANDARD_FUNCTION_NAMES: &[&str] = &["print", "printBool", "printPtr"];

/// Look up a standard-library function by name
pub fn lookup(name: &str) -> Option<StandardFunction> {
    match name {
        "print" => Some(StandardFunction {
            signature: FunctionSignature::new(
                Type::Void,
                vec![("value".to_string(), Type::Int)],
            ),
            body: &["mov r0 _ out", "return _ _ _"],
        }),
        "printBool" => Some(StandardFunction {
            signature: FunctionSignature::new(
                Type::Void,
                vec![("value".to_string(), Type::Bool)],
            ),
            body: &["mov r0 _ out", "return _ _ _"],
        }),
        "printPtr" => Some(StandardFunction {
            signature: FunctionSignature::new(
                Type::Void,
                vec![(
                    "pointer".to_string(),
                    Type::pointer_to(Type::Void),
                )],
            ),
            body: &["mov r0 _ out", "return _ _ _"],
        }),
        _ => None,
    }
}

/// All standard-library functions, in registration order
pub fn functions() -> impl Iterator<Item = (&'static str, StandardFunction)> {
    STANDARD_FUNCTION_NAMES
        .iter()
        .filter_map(|name| lookup(name).map(|func| (*name, func)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_function_resolves() {
        assert_eq!(functions().count(), STANDARD_FUNCTION_NAMES.len());
    }

    #[test]
    fn test_print_bool_signature() {
        let func = lookup("printBool").unwrap();
        assert_eq!(func.signature.return_type, Type::Void);
        assert_eq!(func.signature.parameters.len(), 1);
        assert_eq!(func.signature.parameters[0].1, Type::Bool);
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(lookup("frobnicate"), None);
    }
}
