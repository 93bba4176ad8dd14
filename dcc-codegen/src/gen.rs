//! Code generation
//!
//! Walks an analyzed AST and emits the output program as a `Vec<Line>`.
//! Program shape: a two-line prologue (`sp` to the RAM top, jump to
//! `_start`), the imported standard-library bodies, every user function,
//! then the `_start` section holding the top-level statements.
//!
//! Expression generation returns the register holding the value; the caller
//! releases it. Destination registers are allocated fresh while the operands
//! are still live, so an instruction never reads and writes the same
//! register. Every tracked register is released by the end of a statement,
//! which the end-of-function leak check enforces.

use crate::asm::{render, Line, Opcode, Operand, Reg, ARG_REGISTERS};
use crate::frame::StackFrame;
use crate::regalloc::{Pool, RegisterAllocator};
use dcc_common::{
    CompilerError, CompilerOptions, LabelGenerator, SourceLocation, MAX_RAM_VALUE,
};
use dcc_frontend::stdlib;
use dcc_frontend::{AssignOp, AstNode, BinaryOp, ConditionOp};
use log::debug;

/// The code generator. One instance per compilation; label numbering and
/// the register pools are program-wide state.
pub struct CodeGenerator {
    options: CompilerOptions,
    allocator: RegisterAllocator,
    labels: LabelGenerator,
    lines: Vec<Line>,
}

impl CodeGenerator {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            allocator: RegisterAllocator::new(options.log_allocation),
            labels: LabelGenerator::new(),
            lines: Vec::new(),
        }
    }

    /// Generate the full program from an analyzed top-level node list
    pub fn generate(&mut self, nodes: &[AstNode]) -> Result<Vec<String>, CompilerError> {
        self.lines.push(Line::inst(
            Opcode::Mov,
            i64::from(MAX_RAM_VALUE),
            Operand::None,
            Reg::Sp,
        ));
        self.lines.push(Line::inst(
            Opcode::Jump,
            Operand::label("_start"),
            Operand::None,
            Reg::Pc,
        ));
        self.lines.push(Line::Blank);

        self.emit_imports(nodes)?;

        for node in nodes {
            if let AstNode::FunctionDeclaration {
                name,
                parameters,
                body,
                ..
            } = node
            {
                self.generate_function(name, parameters, body)?;
            }
        }

        self.lines.push(Line::label("_start"));
        let frame = StackFrame::build(&[], nodes)?;
        self.lines
            .push(Line::inst(Opcode::Mov, Reg::Sp, Operand::None, Reg::Fp));
        if frame.size() > 0 {
            self.lines.push(Line::inst(
                Opcode::Sub,
                Reg::Sp,
                i64::from(frame.size()),
                Reg::Sp,
            ));
        }
        for node in nodes {
            match node {
                AstNode::FunctionDeclaration { .. } | AstNode::Import { .. } => {}
                other => self.gen_statement(other, &frame, false)?,
            }
        }
        self.check_balance("_start")?;

        Ok(render(&self.lines))
    }

    /// Emit the bodies of imported standard-library functions, in first
    /// import order, each name once.
    fn emit_imports(&mut self, nodes: &[AstNode]) -> Result<(), CompilerError> {
        let mut imported: Vec<&str> = Vec::new();
        for node in nodes {
            if let AstNode::Import { name, .. } = node {
                if !imported.contains(&name.as_str()) {
                    imported.push(name);
                }
            }
        }
        for name in imported {
            let func = stdlib::lookup(name).ok_or_else(|| {
                CompilerError::internal_error(format!(
                    "import '{}' survived analysis without a library entry",
                    name
                ))
            })?;
            self.lines.push(Line::label(name));
            for line in func.body {
                self.lines.push(Line::Raw(line));
            }
            self.lines.push(Line::Blank);
        }
        Ok(())
    }

    fn generate_function(
        &mut self,
        name: &str,
        parameters: &[dcc_frontend::Parameter],
        body: &[AstNode],
    ) -> Result<(), CompilerError> {
        if self.options.show_general_debug {
            debug!("generating function '{}'", name);
        }
        self.lines.push(Line::label(name));

        // Save the caller's fp and lr above the frame, then take over fp
        self.lines
            .push(Line::inst(Opcode::Store, Reg::Fp, Reg::Sp, Operand::None));
        self.lines
            .push(Line::inst(Opcode::Sub, Reg::Sp, 1, Reg::Sp));
        self.lines
            .push(Line::inst(Opcode::Store, Reg::Lr, Reg::Sp, Operand::None));
        self.lines
            .push(Line::inst(Opcode::Sub, Reg::Sp, 1, Reg::Sp));
        self.lines
            .push(Line::inst(Opcode::Mov, Reg::Sp, Operand::None, Reg::Fp));

        let param_names: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
        let frame = StackFrame::build(&param_names, body)?;
        if frame.size() > 0 {
            self.lines.push(Line::inst(
                Opcode::Sub,
                Reg::Sp,
                i64::from(frame.size()),
                Reg::Sp,
            ));
        }

        if parameters.len() > ARG_REGISTERS.len() {
            return Err(CompilerError::codegen_error(
                format!(
                    "Function '{}' has more than {} parameters",
                    name,
                    ARG_REGISTERS.len()
                ),
                None,
            ));
        }

        // Spill incoming arguments to their frame slots. The argument
        // registers stay pinned until each is stored, so the address
        // temporaries cannot land on a still-live argument.
        for reg in ARG_REGISTERS.iter().take(parameters.len()) {
            self.allocator.reserve(*reg, false)?;
        }
        for (i, param) in parameters.iter().enumerate() {
            let arg_reg = ARG_REGISTERS[i];
            let slot = self.slot(&frame, &param.name)?;
            let addr = self.allocator.allocate(Pool::CallerSaved)?;
            self.emit_slot_address(slot, addr);
            self.lines
                .push(Line::inst(Opcode::Store, arg_reg, addr, Operand::None));
            self.allocator.release(addr)?;
            self.allocator.release(arg_reg)?;
        }

        for stmt in body {
            self.gen_statement(stmt, &frame, true)?;
        }
        if !matches!(body.last(), Some(AstNode::Return { .. })) {
            self.emit_epilogue();
        }
        self.lines.push(Line::Blank);

        self.check_balance(name)
    }

    /// Restore the caller's lr and fp from above the frame and return
    fn emit_epilogue(&mut self) {
        self.lines
            .push(Line::inst(Opcode::Add, Reg::Fp, 1, Reg::Sp));
        self.lines
            .push(Line::inst(Opcode::Load, Reg::Sp, Operand::None, Reg::Lr));
        self.lines
            .push(Line::inst(Opcode::Add, Reg::Sp, 1, Reg::Sp));
        self.lines
            .push(Line::inst(Opcode::Load, Reg::Sp, Operand::None, Reg::Fp));
        self.lines.push(Line::inst(
            Opcode::Return,
            Operand::None,
            Operand::None,
            Operand::None,
        ));
    }

    fn gen_statement(
        &mut self,
        node: &AstNode,
        frame: &StackFrame,
        in_function: bool,
    ) -> Result<(), CompilerError> {
        match node {
            AstNode::VariableDeclaration {
                name, initializer, ..
            } => {
                if let Some(init) = initializer {
                    let slot = self.slot(frame, name)?;
                    self.gen_store_to_slot(slot, init, frame)?;
                }
                Ok(())
            }

            AstNode::Assignment {
                name, op, value, ..
            } => {
                let slot = self.slot(frame, name)?;
                match assign_opcode(*op) {
                    None => self.gen_store_to_slot(slot, value, frame),
                    Some(opcode) => {
                        // load-modify-store
                        let addr = self.allocator.allocate(Pool::CallerSaved)?;
                        self.emit_slot_address(slot, addr);
                        let mut current = self.allocator.allocate(Pool::CallerSaved)?;
                        self.lines
                            .push(Line::inst(Opcode::Load, addr, Operand::None, current));
                        self.allocator.release(addr)?;

                        if value.contains_call() {
                            current = self.protect_across_call(current)?;
                        }
                        let result = if let Some(imm) = literal_value(value) {
                            let dest = self.allocator.allocate(Pool::CallerSaved)?;
                            self.lines.push(Line::inst(opcode, current, imm, dest));
                            self.allocator.release(current)?;
                            dest
                        } else {
                            let rhs = self.gen_expression(value, frame, None)?;
                            let dest = self.allocator.allocate(Pool::CallerSaved)?;
                            self.lines.push(Line::inst(opcode, current, rhs, dest));
                            self.allocator.release(current)?;
                            self.allocator.release(rhs)?;
                            dest
                        };

                        let addr = self.allocator.allocate(Pool::CallerSaved)?;
                        self.emit_slot_address(slot, addr);
                        self.lines
                            .push(Line::inst(Opcode::Store, result, addr, Operand::None));
                        self.allocator.release(result)?;
                        Ok(self.allocator.release(addr)?)
                    }
                }
            }

            AstNode::ArrayDeclaration {
                name, initializer, ..
            } => {
                if let Some(init) = initializer {
                    let base = self.slot(frame, name)?;
                    if let AstNode::ArrayLiteral { elements, .. } = init.as_ref() {
                        for (i, element) in elements.iter().enumerate() {
                            self.gen_store_to_slot(base + i as u32, element, frame)?;
                        }
                    } else {
                        self.gen_store_to_slot(base, init, frame)?;
                    }
                }
                Ok(())
            }

            AstNode::ArrayAssignment {
                name,
                index,
                value,
                is_pointer,
                loc,
            } => {
                if let Some(imm) = literal_value(value) {
                    let addr =
                        self.gen_element_address(name, index, *is_pointer, frame, *loc)?;
                    self.lines
                        .push(Line::inst(Opcode::Store, imm, addr, Operand::None));
                    Ok(self.allocator.release(addr)?)
                } else {
                    let mut value_reg = self.gen_expression(value, frame, None)?;
                    if index.contains_call() {
                        value_reg = self.protect_across_call(value_reg)?;
                    }
                    let addr =
                        self.gen_element_address(name, index, *is_pointer, frame, *loc)?;
                    self.lines
                        .push(Line::inst(Opcode::Store, value_reg, addr, Operand::None));
                    self.allocator.release(value_reg)?;
                    Ok(self.allocator.release(addr)?)
                }
            }

            AstNode::If {
                condition,
                body,
                else_body,
                ..
            } => {
                if let Some(else_body) = else_body {
                    let else_label = self.labels.new_label("else");
                    let end_label = self.labels.new_label("end_if");
                    self.branch_if_false(condition, &else_label, frame)?;
                    for stmt in body {
                        self.gen_statement(stmt, frame, in_function)?;
                    }
                    self.lines.push(Line::inst(
                        Opcode::Jump,
                        Operand::label(&end_label),
                        Operand::None,
                        Reg::Pc,
                    ));
                    self.lines.push(Line::label(else_label));
                    for stmt in else_body {
                        self.gen_statement(stmt, frame, in_function)?;
                    }
                    self.lines.push(Line::label(end_label));
                } else {
                    let end_label = self.labels.new_label("end_if");
                    self.branch_if_false(condition, &end_label, frame)?;
                    for stmt in body {
                        self.gen_statement(stmt, frame, in_function)?;
                    }
                    self.lines.push(Line::label(end_label));
                }
                Ok(())
            }

            AstNode::While {
                condition, body, ..
            } => {
                let top_label = self.labels.new_label("while");
                let end_label = self.labels.new_label("end_while");
                self.lines.push(Line::label(&top_label));
                self.branch_if_false(condition, &end_label, frame)?;
                for stmt in body {
                    self.gen_statement(stmt, frame, in_function)?;
                }
                self.lines.push(Line::inst(
                    Opcode::Jump,
                    Operand::label(top_label),
                    Operand::None,
                    Reg::Pc,
                ));
                self.lines.push(Line::label(end_label));
                Ok(())
            }

            AstNode::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                self.gen_statement(init, frame, in_function)?;
                let top_label = self.labels.new_label("for");
                let end_label = self.labels.new_label("end_for");
                self.lines.push(Line::label(&top_label));
                self.branch_if_false(condition, &end_label, frame)?;
                for stmt in body {
                    self.gen_statement(stmt, frame, in_function)?;
                }
                self.gen_statement(increment, frame, in_function)?;
                self.lines.push(Line::inst(
                    Opcode::Jump,
                    Operand::label(top_label),
                    Operand::None,
                    Reg::Pc,
                ));
                self.lines.push(Line::label(end_label));
                Ok(())
            }

            AstNode::Return { value, .. } => {
                if let Some(value) = value {
                    let reg = self.gen_expression(value, frame, None)?;
                    if reg != Reg::R0 {
                        self.lines
                            .push(Line::inst(Opcode::Mov, reg, Operand::None, Reg::R0));
                    }
                    self.allocator.release(reg)?;
                }
                if in_function {
                    self.emit_epilogue();
                } else {
                    self.lines.push(Line::inst(
                        Opcode::Return,
                        Operand::None,
                        Operand::None,
                        Operand::None,
                    ));
                }
                Ok(())
            }

            AstNode::Call {
                callee,
                arguments,
                loc,
            } => {
                self.gen_call(callee, arguments, frame, *loc, false)?;
                Ok(())
            }

            AstNode::FunctionDeclaration { .. } | AstNode::Import { .. } => Ok(()),

            // Bare expression in statement position: evaluate and discard
            other => {
                let reg = self.gen_expression(other, frame, None)?;
                self.allocator.release(reg)?;
                Ok(())
            }
        }
    }

    /// Store an expression's value into a frame slot. Literal values use the
    /// immediate store form directly.
    fn gen_store_to_slot(
        &mut self,
        slot: u32,
        value: &AstNode,
        frame: &StackFrame,
    ) -> Result<(), CompilerError> {
        if let Some(imm) = literal_value(value) {
            let addr = self.allocator.allocate(Pool::CallerSaved)?;
            self.emit_slot_address(slot, addr);
            self.lines
                .push(Line::inst(Opcode::Store, imm, addr, Operand::None));
            Ok(self.allocator.release(addr)?)
        } else {
            let value_reg = self.gen_expression(value, frame, None)?;
            let addr = self.allocator.allocate(Pool::CallerSaved)?;
            self.emit_slot_address(slot, addr);
            self.lines
                .push(Line::inst(Opcode::Store, value_reg, addr, Operand::None));
            self.allocator.release(value_reg)?;
            Ok(self.allocator.release(addr)?)
        }
    }

    /// Generate an expression. Returns the register holding the value
    /// (`target` when given); the caller releases it.
    fn gen_expression(
        &mut self,
        node: &AstNode,
        frame: &StackFrame,
        target: Option<Reg>,
    ) -> Result<Reg, CompilerError> {
        match node {
            AstNode::NumberLiteral { value, .. } => {
                let dest = self.dest(target)?;
                self.lines
                    .push(Line::inst(Opcode::Mov, *value, Operand::None, dest));
                Ok(dest)
            }

            AstNode::BooleanLiteral { value, .. } => {
                let dest = self.dest(target)?;
                self.lines.push(Line::inst(
                    Opcode::Mov,
                    i64::from(*value),
                    Operand::None,
                    dest,
                ));
                Ok(dest)
            }

            AstNode::Identifier { name, .. } => {
                let slot = self.slot(frame, name)?;
                let addr = self.allocator.allocate(Pool::CallerSaved)?;
                self.emit_slot_address(slot, addr);
                let dest = self.dest(target)?;
                self.lines
                    .push(Line::inst(Opcode::Load, addr, Operand::None, dest));
                self.allocator.release(addr)?;
                Ok(dest)
            }

            AstNode::Binary {
                op, left, right, ..
            } => {
                let mut left_reg = self.gen_expression(left, frame, None)?;
                if right.contains_call() {
                    left_reg = self.protect_across_call(left_reg)?;
                }
                let opcode = binary_opcode(*op);
                if let Some(imm) = literal_value(right) {
                    let dest = self.dest(target)?;
                    self.lines.push(Line::inst(opcode, left_reg, imm, dest));
                    self.allocator.release(left_reg)?;
                    Ok(dest)
                } else {
                    let right_reg = self.gen_expression(right, frame, None)?;
                    let dest = self.dest(target)?;
                    self.lines
                        .push(Line::inst(opcode, left_reg, right_reg, dest));
                    self.allocator.release(left_reg)?;
                    self.allocator.release(right_reg)?;
                    Ok(dest)
                }
            }

            AstNode::Condition {
                op, left, right, ..
            } => {
                // Comparison in value position: materialize 1/0 with a
                // branch over the 0 case.
                self.emit_compare(left, right, frame)?;
                let dest = self.dest(target)?;
                self.lines
                    .push(Line::inst(Opcode::Mov, 1, Operand::None, dest));
                let true_label = self.labels.new_label("ctrue");
                self.lines.push(Line::inst(
                    jump_opcode(*op),
                    Operand::label(&true_label),
                    Operand::None,
                    Reg::Pc,
                ));
                self.lines
                    .push(Line::inst(Opcode::Mov, 0, Operand::None, dest));
                self.lines.push(Line::label(true_label));
                Ok(dest)
            }

            AstNode::Call {
                callee,
                arguments,
                loc,
            } => {
                // When the caller pinned r0 as the target, let the call
                // machinery claim it for the result instead.
                if target == Some(Reg::R0) {
                    self.allocator.release(Reg::R0)?;
                }
                self.gen_call(callee, arguments, frame, *loc, true)?;
                match target {
                    Some(t) if t != Reg::R0 => {
                        self.lines
                            .push(Line::inst(Opcode::Mov, Reg::R0, Operand::None, t));
                        self.allocator.release(Reg::R0)?;
                        Ok(t)
                    }
                    _ => Ok(Reg::R0),
                }
            }

            AstNode::ArrayAccess {
                name,
                index,
                is_pointer,
                loc,
            } => {
                let addr = self.gen_element_address(name, index, *is_pointer, frame, *loc)?;
                let dest = self.dest(target)?;
                self.lines
                    .push(Line::inst(Opcode::Load, addr, Operand::None, dest));
                self.allocator.release(addr)?;
                Ok(dest)
            }

            AstNode::Dereference { operand, .. } => {
                let ptr = self.gen_expression(operand, frame, None)?;
                let dest = self.dest(target)?;
                self.lines
                    .push(Line::inst(Opcode::Load, ptr, Operand::None, dest));
                self.allocator.release(ptr)?;
                Ok(dest)
            }

            AstNode::AddressOf { operand, loc } => match operand.as_ref() {
                AstNode::Identifier { name, .. } => {
                    let slot = self.slot(frame, name)?;
                    let dest = self.dest(target)?;
                    self.emit_slot_address(slot, dest);
                    Ok(dest)
                }
                AstNode::ArrayAccess {
                    name,
                    index,
                    is_pointer,
                    loc,
                } => {
                    let addr =
                        self.gen_element_address(name, index, *is_pointer, frame, *loc)?;
                    match target {
                        Some(t) => {
                            self.lines
                                .push(Line::inst(Opcode::Mov, addr, Operand::None, t));
                            self.allocator.release(addr)?;
                            Ok(t)
                        }
                        None => Ok(addr),
                    }
                }
                _ => Err(CompilerError::codegen_error(
                    "Can only take the address of a variable or array element".to_string(),
                    Some(*loc),
                )),
            },

            other => Err(CompilerError::codegen_error(
                "Expression form is not supported here".to_string(),
                Some(other.loc()),
            )),
        }
    }

    /// Evaluate arguments left to right into the argument registers and
    /// emit the call. With `want_result` the return register `r0` stays
    /// claimed and holds the value.
    fn gen_call(
        &mut self,
        callee: &str,
        arguments: &[AstNode],
        frame: &StackFrame,
        loc: SourceLocation,
        want_result: bool,
    ) -> Result<(), CompilerError> {
        if arguments.len() > ARG_REGISTERS.len() {
            return Err(CompilerError::codegen_error(
                format!(
                    "Function '{}' called with more than {} arguments",
                    callee,
                    ARG_REGISTERS.len()
                ),
                Some(loc),
            ));
        }
        for (i, arg) in arguments.iter().enumerate() {
            let reg = ARG_REGISTERS[i];
            self.allocator.reserve(reg, false)?;
            self.gen_expression(arg, frame, Some(reg))?;
        }
        self.lines.push(Line::inst(
            Opcode::Call,
            Operand::label(callee),
            Operand::None,
            Operand::None,
        ));
        for reg in ARG_REGISTERS.iter().take(arguments.len()) {
            self.allocator.release(*reg)?;
        }
        if want_result {
            self.allocator.reserve(Reg::R0, false)?;
        }
        Ok(())
    }

    /// Compute the address of `name[index]` into a fresh register.
    /// Frame slots grow toward lower addresses, so element `i` lives at
    /// `base - i`; pointer-flagged accesses index from the pointer's
    /// runtime value the same way.
    fn gen_element_address(
        &mut self,
        name: &str,
        index: &AstNode,
        is_pointer: bool,
        frame: &StackFrame,
        loc: SourceLocation,
    ) -> Result<Reg, CompilerError> {
        let base_slot = self.slot(frame, name)?;

        if is_pointer {
            let addr = self.allocator.allocate(Pool::CallerSaved)?;
            self.emit_slot_address(base_slot, addr);
            let mut ptr = self.allocator.allocate(Pool::CallerSaved)?;
            self.lines
                .push(Line::inst(Opcode::Load, addr, Operand::None, ptr));
            self.allocator.release(addr)?;

            match literal_index(index, loc)? {
                Some(0) => Ok(ptr),
                Some(imm) => {
                    let dest = self.allocator.allocate(Pool::CallerSaved)?;
                    self.lines.push(Line::inst(Opcode::Sub, ptr, imm, dest));
                    self.allocator.release(ptr)?;
                    Ok(dest)
                }
                None => {
                    if index.contains_call() {
                        ptr = self.protect_across_call(ptr)?;
                    }
                    let idx = self.gen_expression(index, frame, None)?;
                    let dest = self.allocator.allocate(Pool::CallerSaved)?;
                    self.lines.push(Line::inst(Opcode::Sub, ptr, idx, dest));
                    self.allocator.release(ptr)?;
                    self.allocator.release(idx)?;
                    Ok(dest)
                }
            }
        } else {
            match literal_index(index, loc)? {
                Some(imm) => {
                    let dest = self.allocator.allocate(Pool::CallerSaved)?;
                    self.emit_slot_address(base_slot + imm as u32, dest);
                    Ok(dest)
                }
                None => {
                    let base = self.allocator.allocate(Pool::CallerSaved)?;
                    self.emit_slot_address(base_slot, base);
                    let idx = self.gen_expression(index, frame, None)?;
                    let dest = self.allocator.allocate(Pool::CallerSaved)?;
                    self.lines.push(Line::inst(Opcode::Sub, base, idx, dest));
                    self.allocator.release(base)?;
                    self.allocator.release(idx)?;
                    Ok(dest)
                }
            }
        }
    }

    /// Branch to `label` when the condition is false. Comparison nodes
    /// lower to `cmp` plus the inverse conditional jump; any other value
    /// is tested against zero.
    fn branch_if_false(
        &mut self,
        condition: &AstNode,
        label: &str,
        frame: &StackFrame,
    ) -> Result<(), CompilerError> {
        match condition {
            AstNode::Condition {
                op, left, right, ..
            } => {
                self.emit_compare(left, right, frame)?;
                self.lines.push(Line::inst(
                    inverse_jump_opcode(*op),
                    Operand::label(label),
                    Operand::None,
                    Reg::Pc,
                ));
                Ok(())
            }
            other => {
                let reg = self.gen_expression(other, frame, None)?;
                self.lines
                    .push(Line::inst(Opcode::Cmp, reg, 0, Operand::None));
                self.lines.push(Line::inst(
                    Opcode::Jeq,
                    Operand::label(label),
                    Operand::None,
                    Reg::Pc,
                ));
                Ok(self.allocator.release(reg)?)
            }
        }
    }

    /// Emit `cmp` over the two comparison operands, releasing both
    fn emit_compare(
        &mut self,
        left: &AstNode,
        right: &AstNode,
        frame: &StackFrame,
    ) -> Result<(), CompilerError> {
        let mut left_reg = self.gen_expression(left, frame, None)?;
        if right.contains_call() {
            left_reg = self.protect_across_call(left_reg)?;
        }
        if let Some(imm) = literal_value(right) {
            self.lines
                .push(Line::inst(Opcode::Cmp, left_reg, imm, Operand::None));
            Ok(self.allocator.release(left_reg)?)
        } else {
            let right_reg = self.gen_expression(right, frame, None)?;
            self.lines
                .push(Line::inst(Opcode::Cmp, left_reg, right_reg, Operand::None));
            self.allocator.release(left_reg)?;
            Ok(self.allocator.release(right_reg)?)
        }
    }

    /// Move a live caller-saved value into a callee-saved register so an
    /// upcoming call cannot clobber it
    fn protect_across_call(&mut self, reg: Reg) -> Result<Reg, CompilerError> {
        let safe = self.allocator.allocate(Pool::CalleeSaved)?;
        self.lines
            .push(Line::inst(Opcode::Mov, reg, Operand::None, safe));
        self.allocator.release(reg)?;
        Ok(safe)
    }

    /// Compute `fp - slot` into `dest`
    fn emit_slot_address(&mut self, slot: u32, dest: Reg) {
        if slot == 0 {
            self.lines
                .push(Line::inst(Opcode::Mov, Reg::Fp, Operand::None, dest));
        } else {
            self.lines
                .push(Line::inst(Opcode::Sub, Reg::Fp, i64::from(slot), dest));
        }
    }

    fn dest(&mut self, target: Option<Reg>) -> Result<Reg, CompilerError> {
        match target {
            Some(reg) => Ok(reg),
            None => Ok(self.allocator.allocate(Pool::CallerSaved)?),
        }
    }

    fn slot(&self, frame: &StackFrame, name: &str) -> Result<u32, CompilerError> {
        frame.slot_of(name).ok_or_else(|| {
            CompilerError::internal_error(format!("no frame slot for variable '{}'", name))
        })
    }

    fn check_balance(&self, section: &str) -> Result<(), CompilerError> {
        let live = self.allocator.live_count();
        if live != 0 {
            return Err(CompilerError::internal_error(format!(
                "{} register(s) still live at the end of '{}'",
                live, section
            )));
        }
        Ok(())
    }
}

/// Immediate encoding for literal operands
fn literal_value(node: &AstNode) -> Option<i64> {
    match node {
        AstNode::NumberLiteral { value, .. } => Some(*value),
        AstNode::BooleanLiteral { value, .. } => Some(i64::from(*value)),
        _ => None,
    }
}

/// Literal index, validated non-negative
fn literal_index(node: &AstNode, loc: SourceLocation) -> Result<Option<i64>, CompilerError> {
    match literal_value(node) {
        Some(value) if value < 0 => Err(CompilerError::codegen_error(
            "Array index must not be negative".to_string(),
            Some(loc),
        )),
        other => Ok(other),
    }
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::BitAnd => Opcode::And,
        BinaryOp::BitOr => Opcode::Or,
        BinaryOp::BitXor => Opcode::Xor,
    }
}

fn assign_opcode(op: AssignOp) -> Option<Opcode> {
    match op {
        AssignOp::Assign => None,
        AssignOp::Add => Some(Opcode::Add),
        AssignOp::Sub => Some(Opcode::Sub),
        AssignOp::BitAnd => Some(Opcode::And),
        AssignOp::BitOr => Some(Opcode::Or),
        AssignOp::BitXor => Some(Opcode::Xor),
    }
}

/// Jump taken when the comparison holds
fn jump_opcode(op: ConditionOp) -> Opcode {
    match op {
        ConditionOp::Equal => Opcode::Jeq,
        ConditionOp::NotEqual => Opcode::Jne,
        ConditionOp::Less => Opcode::Jlt,
        ConditionOp::LessEqual => Opcode::Jle,
        ConditionOp::Greater => Opcode::Jgt,
        ConditionOp::GreaterEqual => Opcode::Jge,
    }
}

/// Jump taken when the comparison fails
fn inverse_jump_opcode(op: ConditionOp) -> Opcode {
    match op {
        ConditionOp::Equal => Opcode::Jne,
        ConditionOp::NotEqual => Opcode::Jeq,
        ConditionOp::Less => Opcode::Jge,
        ConditionOp::LessEqual => Opcode::Jgt,
        ConditionOp::Greater => Opcode::Jle,
        ConditionOp::GreaterEqual => Opcode::Jlt,
    }
}
