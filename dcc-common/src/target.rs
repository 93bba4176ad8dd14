//! Drift machine constants
//!
//! Facts about the target machine that more than one phase needs: the top of
//! addressable RAM (the initial stack pointer) and the reserved mnemonic set
//! (the semantic analyzer rejects user functions named after a mnemonic,
//! since function labels share the assembler's namespace).

/// Highest addressable RAM cell; the stack grows downward from here.
pub const MAX_RAM_VALUE: u16 = 65535;

/// Mnemonics of the Drift instruction set. May not be used as function names.
pub const RESERVED_MNEMONICS: &[&str] = &[
    "mov", "add", "sub", "and", "or", "xor", "load", "store", "jump", "call", "return", "cmp",
    "jeq", "jne", "jlt", "jle", "jgt", "jge", "label",
];

/// Check whether a name collides with an assembly-level keyword
pub fn is_reserved_mnemonic(name: &str) -> bool {
    RESERVED_MNEMONICS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_mnemonics() {
        assert!(is_reserved_mnemonic("mov"));
        assert!(is_reserved_mnemonic("jeq"));
        assert!(!is_reserved_mnemonic("main"));
        assert!(!is_reserved_mnemonic("printBool"));
    }
}
