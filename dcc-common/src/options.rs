//! Compiler configuration
//!
//! Named debug toggles consumed (not owned) by the analysis and generation
//! phases. Toggles only gate diagnostic output; they never change the
//! emitted assembly.

/// Debug toggles, normally parsed from the driver's `--debug` flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub show_general_debug: bool,
    pub show_lexer_output: bool,
    pub show_parser_output: bool,
    pub log_allocation: bool,
    pub debug_stack_trace: bool,
}

impl CompilerOptions {
    /// Parse a comma-separated `--debug` option list, e.g. `general,allocator`.
    /// Unknown options are reported back to the caller for a warning.
    pub fn from_debug_options(options: &str) -> (Self, Vec<String>) {
        let mut parsed = Self::default();
        let mut unknown = Vec::new();
        for option in options.split(',') {
            match option {
                "all" => {
                    parsed.show_general_debug = true;
                    parsed.show_lexer_output = true;
                    parsed.show_parser_output = true;
                    parsed.log_allocation = true;
                }
                "general" => parsed.show_general_debug = true,
                "lexer" => parsed.show_lexer_output = true,
                "parser" => parsed.show_parser_output = true,
                "allocator" => parsed.log_allocation = true,
                "stack-trace" => parsed.debug_stack_trace = true,
                other => unknown.push(other.to_string()),
            }
        }
        (parsed, unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_debug_options() {
        let (opts, unknown) = CompilerOptions::from_debug_options("general,allocator");
        assert!(opts.show_general_debug);
        assert!(opts.log_allocation);
        assert!(!opts.show_lexer_output);
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_parse_all() {
        let (opts, _) = CompilerOptions::from_debug_options("all");
        assert!(opts.show_general_debug);
        assert!(opts.show_lexer_output);
        assert!(opts.show_parser_output);
        assert!(opts.log_allocation);
        // "all" deliberately leaves stack traces off
        assert!(!opts.debug_stack_trace);
    }

    #[test]
    fn test_unknown_options_are_reported() {
        let (opts, unknown) = CompilerOptions::from_debug_options("general,frobnicate");
        assert!(opts.show_general_debug);
        assert_eq!(unknown, vec!["frobnicate".to_string()]);
    }
}
