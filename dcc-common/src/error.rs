//! Error handling for the Drift C compiler
//!
//! All compiler errors are static and fatal: the first error aborts the
//! current phase and is surfaced to the driver through [`CompilerError`].
//! Phase-specific error enums (semantic analysis, register allocation)
//! convert into this umbrella type via `From` implementations.

use crate::source_loc::SourceLocation;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Semantic error{}: {message}", fmt_location(.location))]
    SemanticError {
        message: String,
        location: Option<SourceLocation>,
    },

    #[error("Code generation error{}: {message}", fmt_location(.location))]
    CodegenError {
        message: String,
        location: Option<SourceLocation>,
    },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

fn fmt_location(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(" at {}", loc),
        None => String::new(),
    }
}

impl CompilerError {
    /// Create a semantic error
    pub fn semantic_error(message: String, location: Option<SourceLocation>) -> Self {
        CompilerError::SemanticError { message, location }
    }

    /// Create a codegen error
    pub fn codegen_error(message: String, location: Option<SourceLocation>) -> Self {
        CompilerError::CodegenError { message, location }
    }

    /// Create an internal compiler error (invariant violation, not user-facing)
    pub fn internal_error(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_error_display() {
        let err = CompilerError::semantic_error(
            "Use of undeclared variable 'x'".to_string(),
            Some(SourceLocation::new(3, 5)),
        );
        assert_eq!(
            format!("{}", err),
            "Semantic error at line 3:5: Use of undeclared variable 'x'"
        );
    }

    #[test]
    fn test_error_without_location() {
        let err = CompilerError::semantic_error("Condition operands must be int or bool".to_string(), None);
        assert_eq!(
            format!("{}", err),
            "Semantic error: Condition operands must be int or bool"
        );
    }

    #[test]
    fn test_internal_error_display() {
        let err = CompilerError::internal_error("register leak".to_string());
        assert_eq!(format!("{}", err), "Internal compiler error: register leak");
    }
}
