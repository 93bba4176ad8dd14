//! Drift C Compiler - Frontend
//!
//! This crate defines the AST handed off by the external parser and the
//! semantic analyzer that type-checks it. The standard-library signature
//! table also lives here since signature collection consumes it.

pub mod ast;
pub mod semantic;
pub mod stdlib;

pub use ast::{AssignOp, AstNode, BinaryOp, ConditionOp, Parameter, TypeName};
pub use semantic::{SemanticAnalyzer, SemanticError};
pub use stdlib::StandardFunction;
