//! The Drift machine assembly model
//!
//! Instructions are four-column lines: `mnemonic a b dest`, with `_` filling
//! unused columns. An immediate operand moves the mnemonic into its suffixed
//! form (`|i1` when column A is the immediate, `|i2` for column B), e.g.
//! `sub|i2 sp 1 sp`. Labels are standalone `label <name>` lines. The code
//! generator builds a `Vec<Line>` and renders it to text at the end.

use std::fmt;

/// Drift machine registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    /// Frame pointer
    Fp,
    /// Stack pointer
    Sp,
    /// Link register
    Lr,
    /// Program counter; writing it is a jump
    Pc,
    /// Memory-mapped output port
    Out,
}

/// Scratch registers a callee may clobber, in allocation order
pub const CALLER_SAVED: [Reg; 6] = [Reg::R0, Reg::R1, Reg::R2, Reg::R3, Reg::R4, Reg::R5];

/// Registers preserved across calls, in allocation order
pub const CALLEE_SAVED: [Reg; 5] = [Reg::R6, Reg::R7, Reg::R8, Reg::R9, Reg::R10];

/// Argument registers, a prefix of the caller-saved pool
pub const ARG_REGISTERS: [Reg; 4] = [Reg::R0, Reg::R1, Reg::R2, Reg::R3];

impl Reg {
    /// Whether the allocator tracks this register. `fp`/`sp`/`lr`/`pc`/`out`
    /// have fixed roles and bypass tracking.
    pub fn is_tracked(&self) -> bool {
        !matches!(self, Reg::Fp | Reg::Sp | Reg::Lr | Reg::Pc | Reg::Out)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::R0 => "r0",
            Reg::R1 => "r1",
            Reg::R2 => "r2",
            Reg::R3 => "r3",
            Reg::R4 => "r4",
            Reg::R5 => "r5",
            Reg::R6 => "r6",
            Reg::R7 => "r7",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::R10 => "r10",
            Reg::Fp => "fp",
            Reg::Sp => "sp",
            Reg::Lr => "lr",
            Reg::Pc => "pc",
            Reg::Out => "out",
        };
        write!(f, "{}", name)
    }
}

/// Instruction mnemonics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Mov,
    Add,
    Sub,
    And,
    Or,
    Xor,
    Load,
    Store,
    Jump,
    Call,
    Return,
    Cmp,
    Jeq,
    Jne,
    Jlt,
    Jle,
    Jgt,
    Jge,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Mov => "mov",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Jump => "jump",
            Opcode::Call => "call",
            Opcode::Return => "return",
            Opcode::Cmp => "cmp",
            Opcode::Jeq => "jeq",
            Opcode::Jne => "jne",
            Opcode::Jlt => "jlt",
            Opcode::Jle => "jle",
            Opcode::Jgt => "jgt",
            Opcode::Jge => "jge",
        };
        write!(f, "{}", name)
    }
}

/// One instruction column
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Reg(Reg),
    /// Immediate value; moves the mnemonic into its `|iN` form
    Imm(i64),
    /// Code label, used by jumps and calls
    Label(String),
    /// Unused column, rendered as `_`
    None,
}

impl Operand {
    pub fn label(name: impl Into<String>) -> Self {
        Operand::Label(name.into())
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Imm(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Imm(value) => write!(f, "{}", value),
            Operand::Label(name) => write!(f, "{}", name),
            Operand::None => write!(f, "_"),
        }
    }
}

/// One line of the output program
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Inst {
        op: Opcode,
        a: Operand,
        b: Operand,
        dest: Operand,
    },
    Label(String),
    /// Verbatim line (standard-library bodies)
    Raw(&'static str),
    Blank,
}

impl Line {
    pub fn inst(
        op: Opcode,
        a: impl Into<Operand>,
        b: impl Into<Operand>,
        dest: impl Into<Operand>,
    ) -> Self {
        Line::Inst {
            op,
            a: a.into(),
            b: b.into(),
            dest: dest.into(),
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        Line::Label(name.into())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Inst { op, a, b, dest } => {
                let suffix = match (a, b) {
                    (Operand::Imm(_), _) => "|i1",
                    (_, Operand::Imm(_)) => "|i2",
                    _ => "",
                };
                write!(f, "{}{} {} {} {}", op, suffix, a, b, dest)
            }
            Line::Label(name) => write!(f, "label {}", name),
            Line::Raw(text) => write!(f, "{}", text),
            Line::Blank => Ok(()),
        }
    }
}

/// Render a program to its output lines
pub fn render(lines: &[Line]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}
