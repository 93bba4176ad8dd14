//! Full-pipeline golden tests: build a program AST, run analysis and code
//! generation, and compare the complete output line vector.

use dcc_codegen::compile_ast;
use dcc_common::{CompilerOptions, SourceLocation};
use dcc_frontend::{AssignOp, AstNode, BinaryOp, ConditionOp, Parameter, TypeName};
use pretty_assertions::assert_eq;

fn loc() -> SourceLocation {
    SourceLocation::dummy()
}

fn num(value: i64) -> AstNode {
    AstNode::NumberLiteral { value, loc: loc() }
}

fn ident(name: &str) -> AstNode {
    AstNode::Identifier {
        name: name.to_string(),
        loc: loc(),
    }
}

fn int_ty() -> TypeName {
    TypeName::Named("int".to_string())
}

fn decl(name: &str, initializer: AstNode) -> AstNode {
    AstNode::VariableDeclaration {
        type_name: int_ty(),
        name: name.to_string(),
        initializer: Some(Box::new(initializer)),
        loc: loc(),
    }
}

fn assign(name: &str, op: AssignOp, value: AstNode) -> AstNode {
    AstNode::Assignment {
        name: name.to_string(),
        op,
        value: Box::new(value),
        loc: loc(),
    }
}

fn import(name: &str) -> AstNode {
    AstNode::Import {
        name: name.to_string(),
        loc: loc(),
    }
}

fn call(callee: &str, arguments: Vec<AstNode>) -> AstNode {
    AstNode::Call {
        callee: callee.to_string(),
        arguments,
        loc: loc(),
    }
}

fn compile(mut nodes: Vec<AstNode>) -> Vec<String> {
    compile_ast(&mut nodes, CompilerOptions::default()).unwrap()
}

#[test]
fn compound_assignment() {
    // int x = 2; x += 3;
    let lines = compile(vec![
        decl("x", num(2)),
        assign("x", AssignOp::Add, num(3)),
    ]);
    assert_eq!(
        lines,
        vec![
            "mov|i1 65535 _ sp",
            "jump _start _ pc",
            "",
            "label _start",
            "mov sp _ fp",
            "sub|i2 sp 1 sp",
            "mov fp _ r0",
            "store|i1 2 r0 _",
            "mov fp _ r0",
            "load r0 _ r1",
            "add|i2 r1 3 r0",
            "mov fp _ r1",
            "store r0 r1 _",
        ]
    );
}

#[test]
fn increment_and_decrement() {
    // int x = 5; x++; x--;  (the parser lowers ++/-- to += 1 / -= 1)
    let lines = compile(vec![
        decl("x", num(5)),
        assign("x", AssignOp::Add, num(1)),
        assign("x", AssignOp::Sub, num(1)),
    ]);
    assert_eq!(
        lines[6..],
        [
            "mov fp _ r0",
            "store|i1 5 r0 _",
            "mov fp _ r0",
            "load r0 _ r1",
            "add|i2 r1 1 r0",
            "mov fp _ r1",
            "store r0 r1 _",
            "mov fp _ r0",
            "load r0 _ r1",
            "sub|i2 r1 1 r0",
            "mov fp _ r1",
            "store r0 r1 _",
        ]
    );
}

#[test]
fn stdlib_import_and_call() {
    // import printBool; printBool(true);
    let lines = compile(vec![
        import("printBool"),
        call(
            "printBool",
            vec![AstNode::BooleanLiteral {
                value: true,
                loc: loc(),
            }],
        ),
    ]);
    assert_eq!(
        lines,
        vec![
            "mov|i1 65535 _ sp",
            "jump _start _ pc",
            "",
            "label printBool",
            "mov r0 _ out",
            "return _ _ _",
            "",
            "label _start",
            "mov sp _ fp",
            "mov|i1 1 _ r0",
            "call printBool _ _",
        ]
    );
}

#[test]
fn if_else() {
    // int x = 1; if (x == 1) { x = 2; } else { x = 3; }
    let lines = compile(vec![
        decl("x", num(1)),
        AstNode::If {
            condition: Box::new(AstNode::Condition {
                op: ConditionOp::Equal,
                left: Box::new(ident("x")),
                right: Box::new(num(1)),
                loc: loc(),
            }),
            body: vec![assign("x", AssignOp::Assign, num(2))],
            else_body: Some(vec![assign("x", AssignOp::Assign, num(3))]),
            loc: loc(),
        },
    ]);
    assert_eq!(
        lines[6..],
        [
            "mov fp _ r0",
            "store|i1 1 r0 _",
            "mov fp _ r0",
            "load r0 _ r1",
            "cmp|i2 r1 1 _",
            "jne else_0 _ pc",
            "mov fp _ r0",
            "store|i1 2 r0 _",
            "jump end_if_1 _ pc",
            "label else_0",
            "mov fp _ r0",
            "store|i1 3 r0 _",
            "label end_if_1",
        ]
    );
}

#[test]
fn function_call_with_return_value() {
    // int addOne(int n) { return n + 1; }  int y = addOne(4);
    let lines = compile(vec![
        AstNode::FunctionDeclaration {
            name: "addOne".to_string(),
            return_type: int_ty(),
            parameters: vec![Parameter {
                name: "n".to_string(),
                type_name: int_ty(),
            }],
            body: vec![AstNode::Return {
                value: Some(Box::new(AstNode::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(ident("n")),
                    right: Box::new(num(1)),
                    loc: loc(),
                })),
                loc: loc(),
            }],
            loc: loc(),
        },
        decl("y", call("addOne", vec![num(4)])),
    ]);
    assert_eq!(
        lines,
        vec![
            "mov|i1 65535 _ sp",
            "jump _start _ pc",
            "",
            "label addOne",
            "store fp sp _",
            "sub|i2 sp 1 sp",
            "store lr sp _",
            "sub|i2 sp 1 sp",
            "mov sp _ fp",
            "sub|i2 sp 1 sp",
            "mov fp _ r1",
            "store r0 r1 _",
            "mov fp _ r0",
            "load r0 _ r1",
            "add|i2 r1 1 r0",
            "add|i2 fp 1 sp",
            "load sp _ lr",
            "add|i2 sp 1 sp",
            "load sp _ fp",
            "return _ _ _",
            "",
            "label _start",
            "mov sp _ fp",
            "sub|i2 sp 1 sp",
            "mov|i1 4 _ r0",
            "call addOne _ _",
            "mov fp _ r1",
            "store r0 r1 _",
        ]
    );
}

#[test]
fn for_loop() {
    // import print; for (int i = 0; i < 3; i += 1) { print(i); }
    let lines = compile(vec![
        import("print"),
        AstNode::For {
            init: Box::new(decl("i", num(0))),
            condition: Box::new(AstNode::Condition {
                op: ConditionOp::Less,
                left: Box::new(ident("i")),
                right: Box::new(num(3)),
                loc: loc(),
            }),
            increment: Box::new(assign("i", AssignOp::Add, num(1))),
            body: vec![call("print", vec![ident("i")])],
            loc: loc(),
        },
    ]);
    assert_eq!(
        lines,
        vec![
            "mov|i1 65535 _ sp",
            "jump _start _ pc",
            "",
            "label print",
            "mov r0 _ out",
            "return _ _ _",
            "",
            "label _start",
            "mov sp _ fp",
            "sub|i2 sp 1 sp",
            "mov fp _ r0",
            "store|i1 0 r0 _",
            "label for_0",
            "mov fp _ r0",
            "load r0 _ r1",
            "cmp|i2 r1 3 _",
            "jge end_for_1 _ pc",
            "mov fp _ r1",
            "load r1 _ r0",
            "call print _ _",
            "mov fp _ r0",
            "load r0 _ r1",
            "add|i2 r1 1 r0",
            "mov fp _ r1",
            "store r0 r1 _",
            "jump for_0 _ pc",
            "label end_for_1",
        ]
    );
}

#[test]
fn array_declaration_and_access() {
    // int arr[2] = {1, 2}; int y = arr[1];
    let lines = compile(vec![
        AstNode::ArrayDeclaration {
            type_name: int_ty(),
            name: "arr".to_string(),
            size: Box::new(num(2)),
            initializer: Some(Box::new(AstNode::ArrayLiteral {
                elements: vec![num(1), num(2)],
                loc: loc(),
            })),
            loc: loc(),
        },
        decl(
            "y",
            AstNode::ArrayAccess {
                name: "arr".to_string(),
                index: Box::new(num(1)),
                is_pointer: false,
                loc: loc(),
            },
        ),
    ]);
    assert_eq!(
        lines[3..],
        [
            "label _start",
            "mov sp _ fp",
            "sub|i2 sp 3 sp",
            "mov fp _ r0",
            "store|i1 1 r0 _",
            "sub|i2 fp 1 r0",
            "store|i1 2 r0 _",
            "sub|i2 fp 1 r0",
            "load r0 _ r1",
            "sub|i2 fp 2 r0",
            "store r1 r0 _",
        ]
    );
}

#[test]
fn pointer_round_trip() {
    // int x = 5; int* p = &x; int y = *p;
    let lines = compile(vec![
        decl("x", num(5)),
        AstNode::VariableDeclaration {
            type_name: TypeName::Pointer(Box::new(int_ty())),
            name: "p".to_string(),
            initializer: Some(Box::new(AstNode::AddressOf {
                operand: Box::new(ident("x")),
                loc: loc(),
            })),
            loc: loc(),
        },
        decl(
            "y",
            AstNode::Dereference {
                operand: Box::new(ident("p")),
                loc: loc(),
            },
        ),
    ]);
    assert_eq!(
        lines[3..],
        [
            "label _start",
            "mov sp _ fp",
            "sub|i2 sp 3 sp",
            "mov fp _ r0",
            "store|i1 5 r0 _",
            "mov fp _ r0",
            "sub|i2 fp 1 r1",
            "store r0 r1 _",
            "sub|i2 fp 1 r0",
            "load r0 _ r1",
            "load r1 _ r0",
            "sub|i2 fp 2 r1",
            "store r0 r1 _",
        ]
    );
}

#[test]
fn pointer_indexing_goes_through_the_runtime_value() {
    // int arr[2]; int* p = &arr; int y = p[1];
    // Analysis flags p[1] so the generator indexes from the loaded pointer.
    let lines = compile(vec![
        AstNode::ArrayDeclaration {
            type_name: int_ty(),
            name: "arr".to_string(),
            size: Box::new(num(2)),
            initializer: None,
            loc: loc(),
        },
        AstNode::VariableDeclaration {
            type_name: TypeName::Pointer(Box::new(int_ty())),
            name: "p".to_string(),
            initializer: Some(Box::new(AstNode::AddressOf {
                operand: Box::new(ident("arr")),
                loc: loc(),
            })),
            loc: loc(),
        },
        decl(
            "y",
            AstNode::ArrayAccess {
                name: "p".to_string(),
                index: Box::new(num(1)),
                is_pointer: false,
                loc: loc(),
            },
        ),
    ]);
    assert_eq!(
        lines[3..],
        [
            "label _start",
            "mov sp _ fp",
            "sub|i2 sp 4 sp",
            "mov fp _ r0",
            "sub|i2 fp 2 r1",
            "store r0 r1 _",
            "sub|i2 fp 2 r0",
            "load r0 _ r1",
            "sub|i2 r1 1 r0",
            "load r0 _ r1",
            "sub|i2 fp 3 r0",
            "store r1 r0 _",
        ]
    );
}

#[test]
fn output_is_deterministic() {
    let program = || {
        vec![
            import("print"),
            decl("x", num(1)),
            AstNode::While {
                condition: Box::new(AstNode::Condition {
                    op: ConditionOp::Less,
                    left: Box::new(ident("x")),
                    right: Box::new(num(10)),
                    loc: loc(),
                }),
                body: vec![
                    call("print", vec![ident("x")]),
                    assign("x", AssignOp::Add, num(1)),
                ],
                loc: loc(),
            },
        ]
    };
    assert_eq!(compile(program()), compile(program()));
}
