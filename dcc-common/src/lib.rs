//! Drift C Compiler - Common Types and Utilities
//!
//! This crate contains shared types, error definitions, and utilities
//! used across all components of the Drift C compiler.

pub mod error;
pub mod options;
pub mod source_loc;
pub mod target;
pub mod types;

pub use error::CompilerError;
pub use options::CompilerOptions;
pub use source_loc::SourceLocation;
pub use target::{MAX_RAM_VALUE, RESERVED_MNEMONICS};
pub use types::{FunctionSignature, LabelGenerator, Type};
