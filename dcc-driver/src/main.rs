//! Drift C Compiler Driver
//!
//! Command-line entry point. The parser is an external collaborator, so the
//! input is its output: a JSON-serialized AST node list. The driver runs
//! semantic analysis and code generation and writes the assembly text.

use clap::Parser;
use dcc_codegen::compile_ast;
use dcc_common::{CompilerError, CompilerOptions};
use dcc_frontend::AstNode;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dcc")]
#[command(about = "Drift C Compiler")]
#[command(version = "0.1.0")]
struct Cli {
    /// Input AST file (JSON node list produced by the parser)
    input: PathBuf,

    /// Output assembly file (defaults to the input with an .asm extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated debug toggles:
    /// all, general, lexer, parser, allocator, stack-trace
    #[arg(long)]
    debug: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let options = match cli.debug.as_deref() {
        Some(spec) => {
            let (options, unknown) = CompilerOptions::from_debug_options(spec);
            for name in unknown {
                warn!("unknown debug option '{}'", name);
            }
            options
        }
        None => CompilerOptions::default(),
    };

    if let Err(e) = compile_file(&cli.input, cli.output.as_deref(), options) {
        eprintln!("Error: {}", e);
        if options.debug_stack_trace {
            eprintln!("{:#?}", e);
        }
        std::process::exit(1);
    }
}

fn compile_file(
    input: &Path,
    output: Option<&Path>,
    options: CompilerOptions,
) -> Result<(), CompilerError> {
    let source = fs::read_to_string(input)?;
    let mut nodes: Vec<AstNode> = serde_json::from_str(&source)
        .map_err(|e| CompilerError::IoError {
            message: format!("malformed AST input: {}", e),
        })?;
    if options.show_parser_output {
        debug!("parsed {} top-level nodes", nodes.len());
    }

    let lines = compile_ast(&mut nodes, options)?;

    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("asm"),
    };
    fs::write(&output_path, lines.join("\n") + "\n")?;
    debug!("wrote {} lines to {}", lines.len(), output_path.display());
    Ok(())
}
