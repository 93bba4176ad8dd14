//! Semantic analysis for Drift C
//!
//! Two passes over the top-level node list: signature collection (standard
//! library first, then user function declarations), then type checking.
//! Analysis is fail-fast: the first error aborts the pass.
//!
//! Scoping is flat per function: one variable table per function activation,
//! cleared and reseeded with the parameter bindings at entry and restored to
//! the enclosing bindings on exit. `if`/`while`/`for` bodies share their
//! function's namespace. This mirrors the language's single-mapping scope
//! model rather than a scope stack.

use crate::ast::{AstNode, TypeName};
use crate::stdlib;
use dcc_common::{target, CompilerError, FunctionSignature, SourceLocation, Type};
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

/// Semantic analysis errors. Each carries the offending source location
/// where one is attributable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("Unknown type '{name}'")]
    UnknownType {
        name: String,
        loc: Option<SourceLocation>,
    },

    #[error("Function '{name}' already declared")]
    DuplicateFunction {
        name: String,
        loc: Option<SourceLocation>,
    },

    #[error("Can't declare function with name '{name}'. Reserved keyword")]
    ReservedName {
        name: String,
        loc: Option<SourceLocation>,
    },

    #[error("Variable '{name}' already declared")]
    DuplicateVariable {
        name: String,
        loc: Option<SourceLocation>,
    },

    #[error("Use of undeclared variable '{name}'")]
    UndeclaredVariable {
        name: String,
        loc: Option<SourceLocation>,
    },

    #[error("Call to undeclared function '{name}'")]
    UndeclaredFunction {
        name: String,
        loc: Option<SourceLocation>,
    },

    #[error("Use of undeclared array '{name}'")]
    UndeclaredArray {
        name: String,
        loc: Option<SourceLocation>,
    },

    #[error("Type mismatch in {context}: expected {expected}, got {found}")]
    TypeMismatch {
        context: String,
        expected: Type,
        found: Type,
        loc: Option<SourceLocation>,
    },

    #[error("Condition operands must be int or bool, got {left} and {right}")]
    InvalidConditionOperand {
        left: Type,
        right: Type,
        loc: Option<SourceLocation>,
    },

    #[error("{construct} condition must be bool or int, got {found}")]
    InvalidConditionType {
        construct: &'static str,
        found: Type,
        loc: Option<SourceLocation>,
    },

    #[error("Function '{name}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        loc: Option<SourceLocation>,
    },

    #[error("Return type mismatch: expected {expected}, got {found}")]
    ReturnTypeMismatch {
        expected: Type,
        found: Type,
        loc: Option<SourceLocation>,
    },

    #[error("Array size must be an integer, got {found}")]
    InvalidArraySize {
        found: Type,
        loc: Option<SourceLocation>,
    },

    #[error("Array index must be an integer, got {found}")]
    InvalidArrayIndex {
        found: Type,
        loc: Option<SourceLocation>,
    },

    #[error("All array elements must have the same type, got {first} and {other}")]
    InconsistentArrayElementTypes {
        first: Type,
        other: Type,
        loc: Option<SourceLocation>,
    },

    #[error("Cannot dereference non-pointer type {found}")]
    NotAPointer {
        found: Type,
        loc: Option<SourceLocation>,
    },
}

impl SemanticError {
    /// The source location this error points at, if one is attributable
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            SemanticError::UnknownType { loc, .. }
            | SemanticError::DuplicateFunction { loc, .. }
            | SemanticError::ReservedName { loc, .. }
            | SemanticError::DuplicateVariable { loc, .. }
            | SemanticError::UndeclaredVariable { loc, .. }
            | SemanticError::UndeclaredFunction { loc, .. }
            | SemanticError::UndeclaredArray { loc, .. }
            | SemanticError::TypeMismatch { loc, .. }
            | SemanticError::InvalidConditionOperand { loc, .. }
            | SemanticError::InvalidConditionType { loc, .. }
            | SemanticError::ArityMismatch { loc, .. }
            | SemanticError::ReturnTypeMismatch { loc, .. }
            | SemanticError::InvalidArraySize { loc, .. }
            | SemanticError::InconsistentArrayElementTypes { loc, .. }
            | SemanticError::InvalidArrayIndex { loc, .. }
            | SemanticError::NotAPointer { loc, .. } => *loc,
        }
    }
}

impl From<SemanticError> for CompilerError {
    fn from(err: SemanticError) -> Self {
        let location = err.location();
        CompilerError::semantic_error(err.to_string(), location)
    }
}

/// The semantic analyzer. Owns the per-compilation symbol tables:
/// the variable table (flat, per function activation) and the function
/// signature table.
pub struct SemanticAnalyzer {
    variables: HashMap<String, Type>,
    functions: HashMap<String, FunctionSignature>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Analyze a top-level node list, annotating pointer-backed array
    /// accesses in place.
    pub fn analyze(&mut self, nodes: &mut [AstNode]) -> Result<(), SemanticError> {
        self.collect_signatures(nodes)?;
        debug!("collected {} function signatures", self.functions.len());

        for node in nodes.iter_mut() {
            self.analyze_node(node, None)?;
        }
        Ok(())
    }

    /// First pass: seed the function table with the standard library, then
    /// register every user function declaration.
    fn collect_signatures(&mut self, nodes: &[AstNode]) -> Result<(), SemanticError> {
        for (name, func) in stdlib::functions() {
            self.functions.insert(name.to_string(), func.signature);
        }

        for node in nodes {
            match node {
                AstNode::FunctionDeclaration {
                    name,
                    return_type,
                    parameters,
                    loc,
                    ..
                } => {
                    if target::is_reserved_mnemonic(name) {
                        return Err(SemanticError::ReservedName {
                            name: name.clone(),
                            loc: Some(*loc),
                        });
                    }
                    if self.functions.contains_key(name) {
                        return Err(SemanticError::DuplicateFunction {
                            name: name.clone(),
                            loc: Some(*loc),
                        });
                    }

                    let resolved_return = self.resolve_return_type(return_type, *loc)?;
                    let mut resolved_params = Vec::with_capacity(parameters.len());
                    for param in parameters {
                        let param_type = self.resolve_type(&param.type_name, *loc)?;
                        resolved_params.push((param.name.clone(), param_type));
                    }

                    self.functions.insert(
                        name.clone(),
                        FunctionSignature::new(resolved_return, resolved_params),
                    );
                }
                AstNode::Import { name, loc } => {
                    if stdlib::lookup(name).is_none() {
                        return Err(SemanticError::UndeclaredFunction {
                            name: name.clone(),
                            loc: Some(*loc),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Analyze one node. Expressions yield `Some(type)`, statements `None`.
    /// `expected` is the enclosing function's return type while inside a
    /// function body (consumed by `Return`).
    fn analyze_node(
        &mut self,
        node: &mut AstNode,
        expected: Option<&Type>,
    ) -> Result<Option<Type>, SemanticError> {
        match node {
            AstNode::NumberLiteral { .. } => Ok(Some(Type::Int)),
            AstNode::BooleanLiteral { .. } => Ok(Some(Type::Bool)),

            AstNode::Identifier { name, loc } => match self.variables.get(name) {
                Some(var_type) => Ok(Some(var_type.clone())),
                None => Err(SemanticError::UndeclaredVariable {
                    name: name.clone(),
                    loc: Some(*loc),
                }),
            },

            AstNode::Binary { left, right, .. } => {
                self.analyze_expression(left, None)?;
                self.analyze_expression(right, None)?;
                Ok(Some(Type::Int))
            }

            AstNode::Condition {
                left, right, loc, ..
            } => {
                let left_type = self.analyze_expression(left, None)?;
                let right_type = self.analyze_expression(right, None)?;
                if !is_int_or_bool(&left_type) || !is_int_or_bool(&right_type) {
                    return Err(SemanticError::InvalidConditionOperand {
                        left: left_type,
                        right: right_type,
                        loc: Some(*loc),
                    });
                }
                Ok(Some(Type::Bool))
            }

            AstNode::VariableDeclaration {
                type_name,
                name,
                initializer,
                loc,
            } => {
                let var_type = self.resolve_type(type_name, *loc)?;
                if self.variables.contains_key(name) {
                    return Err(SemanticError::DuplicateVariable {
                        name: name.clone(),
                        loc: Some(*loc),
                    });
                }
                self.variables.insert(name.clone(), var_type.clone());

                if let Some(init) = initializer {
                    let init_type = self.analyze_expression(init, Some(&var_type))?;
                    if !var_type.coercible_from(&init_type) {
                        return Err(SemanticError::TypeMismatch {
                            context: format!("initialization of '{}'", name),
                            expected: var_type,
                            found: init_type,
                            loc: Some(*loc),
                        });
                    }
                }
                Ok(None)
            }

            AstNode::Assignment {
                name, value, loc, ..
            } => {
                let target_type = match self.variables.get(name) {
                    Some(t) => t.clone(),
                    None => {
                        return Err(SemanticError::UndeclaredVariable {
                            name: name.clone(),
                            loc: Some(*loc),
                        })
                    }
                };
                let value_type = self.analyze_expression(value, Some(&target_type))?;
                if !target_type.coercible_from(&value_type) {
                    return Err(SemanticError::TypeMismatch {
                        context: format!("assignment to '{}'", name),
                        expected: target_type,
                        found: value_type,
                        loc: Some(*loc),
                    });
                }
                Ok(Some(target_type))
            }

            AstNode::If {
                condition,
                body,
                else_body,
                loc,
            } => {
                let cond_type = self.analyze_expression(condition, Some(&Type::Bool))?;
                if !is_int_or_bool(&cond_type) {
                    return Err(SemanticError::InvalidConditionType {
                        construct: "if",
                        found: cond_type,
                        loc: Some(*loc),
                    });
                }
                for stmt in body.iter_mut() {
                    self.analyze_node(stmt, expected)?;
                }
                if let Some(else_body) = else_body {
                    for stmt in else_body.iter_mut() {
                        self.analyze_node(stmt, expected)?;
                    }
                }
                Ok(None)
            }

            AstNode::While {
                condition,
                body,
                loc,
            } => {
                let cond_type = self.analyze_expression(condition, Some(&Type::Bool))?;
                if !is_int_or_bool(&cond_type) {
                    return Err(SemanticError::InvalidConditionType {
                        construct: "while",
                        found: cond_type,
                        loc: Some(*loc),
                    });
                }
                for stmt in body.iter_mut() {
                    self.analyze_node(stmt, expected)?;
                }
                Ok(None)
            }

            AstNode::For {
                init,
                condition,
                increment,
                body,
                loc,
            } => {
                self.analyze_node(init, expected)?;
                let cond_type = self.analyze_expression(condition, Some(&Type::Bool))?;
                if !is_int_or_bool(&cond_type) {
                    return Err(SemanticError::InvalidConditionType {
                        construct: "for",
                        found: cond_type,
                        loc: Some(*loc),
                    });
                }
                self.analyze_node(increment, expected)?;
                for stmt in body.iter_mut() {
                    self.analyze_node(stmt, expected)?;
                }
                Ok(None)
            }

            AstNode::Call {
                callee,
                arguments,
                loc,
            } => {
                let signature = match self.functions.get(callee) {
                    Some(sig) => sig.clone(),
                    None => {
                        return Err(SemanticError::UndeclaredFunction {
                            name: callee.clone(),
                            loc: Some(*loc),
                        })
                    }
                };
                if arguments.len() != signature.parameters.len() {
                    return Err(SemanticError::ArityMismatch {
                        name: callee.clone(),
                        expected: signature.parameters.len(),
                        found: arguments.len(),
                        loc: Some(*loc),
                    });
                }
                for (i, (arg, (_, param_type))) in arguments
                    .iter_mut()
                    .zip(signature.parameters.iter())
                    .enumerate()
                {
                    let arg_type = self.analyze_expression(arg, Some(param_type))?;
                    if arg_type == *param_type {
                        continue;
                    }
                    // A void* parameter accepts an argument of any type
                    if *param_type == Type::pointer_to(Type::Void) {
                        continue;
                    }
                    if !param_type.coercible_from(&arg_type) {
                        return Err(SemanticError::TypeMismatch {
                            context: format!("argument {} of '{}'", i + 1, callee),
                            expected: param_type.clone(),
                            found: arg_type,
                            loc: Some(*loc),
                        });
                    }
                }
                Ok(Some(signature.return_type))
            }

            AstNode::FunctionDeclaration {
                name,
                return_type,
                parameters,
                body,
                loc,
            } => {
                let resolved_return = self.resolve_return_type(return_type, *loc)?;

                // Fresh flat scope: parameters only, enclosing bindings
                // restored afterwards.
                let enclosing = std::mem::take(&mut self.variables);
                for param in parameters.iter() {
                    let param_type = self.resolve_type(&param.type_name, *loc)?;
                    self.variables.insert(param.name.clone(), param_type);
                }

                let mut result = Ok(None);
                for stmt in body.iter_mut() {
                    if let Err(err) = self.analyze_node(stmt, Some(&resolved_return)) {
                        result = Err(err);
                        break;
                    }
                }

                self.variables = enclosing;
                debug!("analyzed function '{}'", name);
                result
            }

            AstNode::Return { value, loc } => match value {
                Some(value) => {
                    let return_type = self.analyze_expression(value, expected)?;
                    if let Some(expected_type) = expected {
                        if return_type != *expected_type {
                            return Err(SemanticError::ReturnTypeMismatch {
                                expected: expected_type.clone(),
                                found: return_type,
                                loc: Some(*loc),
                            });
                        }
                    }
                    Ok(Some(return_type))
                }
                None => {
                    if let Some(expected_type) = expected {
                        if *expected_type != Type::Void {
                            return Err(SemanticError::ReturnTypeMismatch {
                                expected: expected_type.clone(),
                                found: Type::Void,
                                loc: Some(*loc),
                            });
                        }
                    }
                    Ok(None)
                }
            },

            AstNode::ArrayDeclaration {
                type_name,
                name,
                size,
                initializer,
                loc,
            } => {
                let element_type = self.resolve_array_element_type(type_name, *loc)?;
                if self.variables.contains_key(name) {
                    return Err(SemanticError::DuplicateVariable {
                        name: name.clone(),
                        loc: Some(*loc),
                    });
                }

                let size_type = self.analyze_expression(size, Some(&Type::Int))?;
                if size_type != Type::Int {
                    return Err(SemanticError::InvalidArraySize {
                        found: size_type,
                        loc: Some(*loc),
                    });
                }

                self.variables.insert(name.clone(), element_type.clone());

                if let Some(init) = initializer {
                    let init_type = self.analyze_expression(init, Some(&element_type))?;
                    if init_type != element_type {
                        return Err(SemanticError::TypeMismatch {
                            context: format!("array initialization of '{}'", name),
                            expected: element_type,
                            found: init_type,
                            loc: Some(*loc),
                        });
                    }
                }
                Ok(None)
            }

            AstNode::ArrayLiteral { elements, loc } => {
                let mut first: Option<Type> = None;
                for element in elements.iter_mut() {
                    let element_type = self.analyze_expression(element, first.as_ref())?;
                    match &first {
                        None => first = Some(element_type),
                        Some(expected_type) if *expected_type != element_type => {
                            return Err(SemanticError::InconsistentArrayElementTypes {
                                first: expected_type.clone(),
                                other: element_type,
                                loc: Some(*loc),
                            });
                        }
                        Some(_) => {}
                    }
                }
                // Empty literals default to int
                Ok(Some(first.unwrap_or(Type::Int)))
            }

            AstNode::ArrayAccess {
                name,
                index,
                is_pointer,
                loc,
            } => {
                let bound_type = match self.variables.get(name) {
                    Some(t) => t.clone(),
                    None => {
                        return Err(SemanticError::UndeclaredArray {
                            name: name.clone(),
                            loc: Some(*loc),
                        })
                    }
                };

                let index_type = self.analyze_expression(index, Some(&Type::Int))?;
                if index_type != Type::Int {
                    return Err(SemanticError::InvalidArrayIndex {
                        found: index_type,
                        loc: Some(*loc),
                    });
                }

                if let Type::Pointer(base) = bound_type {
                    *is_pointer = true;
                    Ok(Some(*base))
                } else {
                    Ok(Some(bound_type))
                }
            }

            AstNode::ArrayAssignment {
                name,
                index,
                value,
                is_pointer,
                loc,
            } => {
                let bound_type = match self.variables.get(name) {
                    Some(t) => t.clone(),
                    None => {
                        return Err(SemanticError::UndeclaredArray {
                            name: name.clone(),
                            loc: Some(*loc),
                        })
                    }
                };

                let index_type = self.analyze_expression(index, Some(&Type::Int))?;
                if index_type != Type::Int {
                    return Err(SemanticError::InvalidArrayIndex {
                        found: index_type,
                        loc: Some(*loc),
                    });
                }

                let element_type = if let Type::Pointer(base) = bound_type {
                    *is_pointer = true;
                    *base
                } else {
                    bound_type
                };

                let value_type = self.analyze_expression(value, Some(&element_type))?;
                if value_type != element_type {
                    return Err(SemanticError::TypeMismatch {
                        context: format!("array assignment to '{}'", name),
                        expected: element_type,
                        found: value_type,
                        loc: Some(*loc),
                    });
                }
                Ok(Some(value_type))
            }

            AstNode::Dereference { operand, loc } => {
                let operand_type = self.analyze_expression(operand, None)?;
                match operand_type {
                    Type::Pointer(base) => Ok(Some(*base)),
                    other => Err(SemanticError::NotAPointer {
                        found: other,
                        loc: Some(*loc),
                    }),
                }
            }

            AstNode::AddressOf { operand, .. } => {
                let operand_type = self.analyze_expression(operand, None)?;
                Ok(Some(Type::pointer_to(operand_type)))
            }

            AstNode::Import { .. } => Ok(None),
        }
    }

    /// Analyze a node in expression position. Statements never appear here
    /// in a well-formed AST; they fall back to `void`, which no expression
    /// context accepts.
    fn analyze_expression(
        &mut self,
        node: &mut AstNode,
        expected: Option<&Type>,
    ) -> Result<Type, SemanticError> {
        Ok(self.analyze_node(node, expected)?.unwrap_or(Type::Void))
    }

    /// Resolve a syntactic type in value position (`int`, `bool`, pointers)
    fn resolve_type(
        &self,
        type_name: &TypeName,
        loc: SourceLocation,
    ) -> Result<Type, SemanticError> {
        match type_name {
            TypeName::Named(name) => match name.as_str() {
                "int" => Ok(Type::Int),
                "bool" => Ok(Type::Bool),
                _ => Err(SemanticError::UnknownType {
                    name: name.clone(),
                    loc: Some(loc),
                }),
            },
            TypeName::Pointer(base) => {
                // void is valid only as a pointer base
                if let TypeName::Named(name) = base.as_ref() {
                    if name == "void" {
                        return Ok(Type::pointer_to(Type::Void));
                    }
                }
                Ok(Type::pointer_to(self.resolve_type(base, loc)?))
            }
        }
    }

    /// Resolve a function return type (`int`, `bool`, or `void`)
    fn resolve_return_type(
        &self,
        type_name: &TypeName,
        loc: SourceLocation,
    ) -> Result<Type, SemanticError> {
        if let TypeName::Named(name) = type_name {
            if name == "void" {
                return Ok(Type::Void);
            }
        }
        self.resolve_type(type_name, loc)
    }

    /// Resolve an array's element type; only named base types are valid
    fn resolve_array_element_type(
        &self,
        type_name: &TypeName,
        loc: SourceLocation,
    ) -> Result<Type, SemanticError> {
        match type_name {
            TypeName::Named(_) => self.resolve_type(type_name, loc),
            TypeName::Pointer(_) => Err(SemanticError::UnknownType {
                name: "pointer array element".to_string(),
                loc: Some(loc),
            }),
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_int_or_bool(t: &Type) -> bool {
    matches!(t, Type::Int | Type::Bool)
}
