//! Drift C Compiler - Code Generation
//!
//! Turns an analyzed AST into Drift machine assembly text. The pieces:
//! the assembly model ([`asm`]), the fixed-pool register allocator
//! ([`regalloc`]), stack-frame layout ([`frame`]) and the generator itself
//! ([`gen`]). [`compile_ast`] runs the whole pipeline from a raw AST.

pub mod asm;
pub mod frame;
pub mod gen;
pub mod regalloc;

pub use asm::{Line, Opcode, Operand, Reg};
pub use gen::CodeGenerator;
pub use regalloc::{Pool, RegAllocError, RegisterAllocator};

use dcc_common::{CompilerError, CompilerOptions};
use dcc_frontend::{AstNode, SemanticAnalyzer};

/// Compile a raw AST: semantic analysis, then code generation.
/// Returns the output program as lines.
pub fn compile_ast(
    nodes: &mut [AstNode],
    options: CompilerOptions,
) -> Result<Vec<String>, CompilerError> {
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(nodes)?;
    let mut generator = CodeGenerator::new(options);
    generator.generate(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcc_common::SourceLocation;
    use dcc_frontend::TypeName;

    #[test]
    fn test_compile_ast_smoke() {
        let mut nodes = vec![AstNode::VariableDeclaration {
            type_name: TypeName::Named("int".to_string()),
            name: "x".to_string(),
            initializer: Some(Box::new(AstNode::NumberLiteral {
                value: 2,
                loc: SourceLocation::dummy(),
            })),
            loc: SourceLocation::dummy(),
        }];
        let lines = compile_ast(&mut nodes, CompilerOptions::default()).unwrap();
        assert_eq!(lines[0], "mov|i1 65535 _ sp");
        assert!(lines.contains(&"store|i1 2 r0 _".to_string()));
    }

    #[test]
    fn test_compile_ast_surfaces_semantic_errors() {
        let mut nodes = vec![AstNode::Identifier {
            name: "ghost".to_string(),
            loc: SourceLocation::new(1, 1),
        }];
        let err = compile_ast(&mut nodes, CompilerOptions::default()).unwrap_err();
        assert!(matches!(err, CompilerError::SemanticError { .. }));
    }
}
