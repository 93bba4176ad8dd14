//! Stack frame layout
//!
//! Slot `i` of a frame lives at address `fp - i`. Slots are assigned
//! monotonically over a pre-scan of the declarations (parameters first, then
//! every declaration in the body, recursing into `if`/`while`/`for` bodies
//! since the scope is flat) and are never reused within a function. `sp` is
//! decremented once at entry by the frame size, so array sizes must be
//! integer literals at generation time.

use dcc_common::CompilerError;
use dcc_frontend::AstNode;
use std::collections::HashMap;

/// One function's (or the entry section's) frame layout
#[derive(Debug, Default)]
pub struct StackFrame {
    slots: HashMap<String, u32>,
    next_slot: u32,
}

impl StackFrame {
    /// Pre-scan a parameter list and statement body into a layout
    pub fn build(parameters: &[String], body: &[AstNode]) -> Result<Self, CompilerError> {
        let mut frame = StackFrame::default();
        for name in parameters {
            frame.declare(name, 1);
        }
        frame.scan(body)?;
        Ok(frame)
    }

    fn scan(&mut self, nodes: &[AstNode]) -> Result<(), CompilerError> {
        for node in nodes {
            match node {
                AstNode::VariableDeclaration { name, .. } => {
                    self.declare(name, 1);
                }
                AstNode::ArrayDeclaration {
                    name, size, loc, ..
                } => {
                    let AstNode::NumberLiteral { value, .. } = size.as_ref() else {
                        return Err(CompilerError::codegen_error(
                            format!("Array '{}' must have a literal size", name),
                            Some(*loc),
                        ));
                    };
                    if *value <= 0 {
                        return Err(CompilerError::codegen_error(
                            format!("Array '{}' must have a positive size", name),
                            Some(*loc),
                        ));
                    }
                    self.declare(name, *value as u32);
                }
                AstNode::If {
                    body, else_body, ..
                } => {
                    self.scan(body)?;
                    if let Some(else_body) = else_body {
                        self.scan(else_body)?;
                    }
                }
                AstNode::While { body, .. } => {
                    self.scan(body)?;
                }
                AstNode::For { init, body, .. } => {
                    self.scan(std::slice::from_ref(&**init))?;
                    self.scan(body)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare(&mut self, name: &str, size: u32) {
        self.slots.insert(name.to_string(), self.next_slot);
        self.next_slot += size;
    }

    /// The variable's slot. Analysis ran first, so unknown names are
    /// generator bugs and handled at the call site.
    pub fn slot_of(&self, name: &str) -> Option<u32> {
        self.slots.get(name).copied()
    }

    /// Total slot count, the amount `sp` drops at entry
    pub fn size(&self) -> u32 {
        self.next_slot
    }
}
