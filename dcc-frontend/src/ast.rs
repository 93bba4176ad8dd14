//! Abstract Syntax Tree definitions for Drift C
//!
//! The AST is the compiler's input contract: the external parser produces it
//! (the driver accepts it as JSON) and the semantic analyzer and code
//! generator consume it. The node set is closed, so both consumers match
//! exhaustively. Every node carries a source location for error reporting.
//!
//! Two fields are written by the semantic analyzer rather than the parser:
//! the `is_pointer` flags on `ArrayAccess` and `ArrayAssignment`, which tell
//! the code generator to index through the pointer's runtime value instead
//! of a static frame offset.

use dcc_common::SourceLocation;
use serde::{Deserialize, Serialize};

/// A syntactic type name, resolved to a `dcc_common::Type` during analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeName {
    Named(String),
    Pointer(Box<TypeName>),
}

/// A function parameter: name plus syntactic type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: TypeName,
}

/// Arithmetic and bitwise binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    BitAnd,
    BitOr,
    BitXor,
}

/// Comparison operators (binary conditions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Assignment forms. The parser lowers `x++`/`x--` to `Add`/`Sub` with a
/// literal `1` value, and `x op= e` to the matching operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    BitAnd,
    BitOr,
    BitXor,
}

/// One AST node. Statements and expressions share the enum; the semantic
/// analyzer yields a type for expression nodes and `None` for statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstNode {
    NumberLiteral {
        value: i64,
        loc: SourceLocation,
    },
    BooleanLiteral {
        value: bool,
        loc: SourceLocation,
    },
    Identifier {
        name: String,
        loc: SourceLocation,
    },
    Binary {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        loc: SourceLocation,
    },
    Condition {
        op: ConditionOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        loc: SourceLocation,
    },
    VariableDeclaration {
        type_name: TypeName,
        name: String,
        initializer: Option<Box<AstNode>>,
        loc: SourceLocation,
    },
    Assignment {
        name: String,
        op: AssignOp,
        value: Box<AstNode>,
        loc: SourceLocation,
    },
    ArrayDeclaration {
        type_name: TypeName,
        name: String,
        size: Box<AstNode>,
        initializer: Option<Box<AstNode>>,
        loc: SourceLocation,
    },
    ArrayLiteral {
        elements: Vec<AstNode>,
        loc: SourceLocation,
    },
    ArrayAccess {
        name: String,
        index: Box<AstNode>,
        /// Filled in by the semantic analyzer
        is_pointer: bool,
        loc: SourceLocation,
    },
    ArrayAssignment {
        name: String,
        index: Box<AstNode>,
        value: Box<AstNode>,
        /// Filled in by the semantic analyzer
        is_pointer: bool,
        loc: SourceLocation,
    },
    Dereference {
        operand: Box<AstNode>,
        loc: SourceLocation,
    },
    AddressOf {
        operand: Box<AstNode>,
        loc: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        else_body: Option<Vec<AstNode>>,
        loc: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        loc: SourceLocation,
    },
    For {
        init: Box<AstNode>,
        condition: Box<AstNode>,
        increment: Box<AstNode>,
        body: Vec<AstNode>,
        loc: SourceLocation,
    },
    FunctionDeclaration {
        name: String,
        return_type: TypeName,
        parameters: Vec<Parameter>,
        body: Vec<AstNode>,
        loc: SourceLocation,
    },
    Return {
        value: Option<Box<AstNode>>,
        loc: SourceLocation,
    },
    Call {
        callee: String,
        arguments: Vec<AstNode>,
        loc: SourceLocation,
    },
    /// `import <name>;` — selects a standard-library body for emission
    Import {
        name: String,
        loc: SourceLocation,
    },
}

impl AstNode {
    /// The node's source location
    pub fn loc(&self) -> SourceLocation {
        match self {
            AstNode::NumberLiteral { loc, .. }
            | AstNode::BooleanLiteral { loc, .. }
            | AstNode::Identifier { loc, .. }
            | AstNode::Binary { loc, .. }
            | AstNode::Condition { loc, .. }
            | AstNode::VariableDeclaration { loc, .. }
            | AstNode::Assignment { loc, .. }
            | AstNode::ArrayDeclaration { loc, .. }
            | AstNode::ArrayLiteral { loc, .. }
            | AstNode::ArrayAccess { loc, .. }
            | AstNode::ArrayAssignment { loc, .. }
            | AstNode::Dereference { loc, .. }
            | AstNode::AddressOf { loc, .. }
            | AstNode::If { loc, .. }
            | AstNode::While { loc, .. }
            | AstNode::For { loc, .. }
            | AstNode::FunctionDeclaration { loc, .. }
            | AstNode::Return { loc, .. }
            | AstNode::Call { loc, .. }
            | AstNode::Import { loc, .. } => *loc,
        }
    }

    /// Whether this subtree contains a function call. The code generator
    /// uses this to decide when a live value must move to a callee-saved
    /// register before a call clobbers the caller-saved pool.
    pub fn contains_call(&self) -> bool {
        match self {
            AstNode::Call { .. } => true,
            AstNode::Binary { left, right, .. } | AstNode::Condition { left, right, .. } => {
                left.contains_call() || right.contains_call()
            }
            AstNode::Dereference { operand, .. } | AstNode::AddressOf { operand, .. } => {
                operand.contains_call()
            }
            AstNode::ArrayAccess { index, .. } => index.contains_call(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(value: i64) -> AstNode {
        AstNode::NumberLiteral {
            value,
            loc: SourceLocation::dummy(),
        }
    }

    #[test]
    fn test_contains_call() {
        let plain = AstNode::Binary {
            op: BinaryOp::Add,
            left: Box::new(num(1)),
            right: Box::new(num(2)),
            loc: SourceLocation::dummy(),
        };
        assert!(!plain.contains_call());

        let with_call = AstNode::Binary {
            op: BinaryOp::Add,
            left: Box::new(num(1)),
            right: Box::new(AstNode::Call {
                callee: "f".to_string(),
                arguments: vec![],
                loc: SourceLocation::dummy(),
            }),
            loc: SourceLocation::dummy(),
        };
        assert!(with_call.contains_call());
    }
}
