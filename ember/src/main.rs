use clap::{Parser, Subcommand};
use ember_core::ir::builder::BuilderError;
use ember_core::{CompilerError, Options, ice, ir};
use log::info;
use rspirv::binary::Disassemble;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

mod samples;

use samples::Sample;

/// Times the execution of a closure and prints the elapsed time if verbose.
fn time<T, F: FnOnce() -> T>(name: &str, verbose: bool, f: F) -> T {
    let start = Instant::now();
    let result = f();
    if verbose {
        let elapsed = start.elapsed().as_millis();
        eprintln!("{}: {}ms", name, elapsed);
    }
    result
}

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Lowers structured SSA shader IR modules to SPIR-V", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile IR modules (JSON) to SPIR-V
    Compile {
        /// Input IR files
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (defaults to input name with .spv extension; single input only)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Zero-initialize workgroup variables
        #[arg(long)]
        zero_init_workgroup_memory: bool,

        /// Print the disassembled module to stdout
        #[arg(long)]
        disassemble: bool,

        /// Print verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a sample IR module as JSON
    Example {
        #[arg(value_enum)]
        name: Sample,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Compilation error: {0}")]
    CompilationError(#[from] CompilerError),

    #[error("IR construction error: {0}")]
    BuildError(#[from] BuilderError),

    #[error("Disassembly error: {0}")]
    DisassemblyError(String),

    #[error("--output requires a single input, got {0}")]
    MultipleInputs(usize),
}

const ICE_NOTE: &str = "note: this is a bug in ember, please report it with the input module attached";

/// The ICE message itself reaches stderr through the panic that follows.
fn report_ice(_message: &str) {
    write_ice_note(&mut std::io::stderr());
}

fn write_ice_note(out: &mut impl Write) {
    let _ = writeln!(out, "{}", ICE_NOTE);
}

fn main() -> Result<(), DriverError> {
    env_logger::init();
    if ice::set_hook(report_ice).is_err() {
        log::warn!("ICE hook already installed");
    }
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            inputs,
            output,
            zero_init_workgroup_memory,
            disassemble,
            verbose,
        } => {
            if output.is_some() && inputs.len() > 1 {
                return Err(DriverError::MultipleInputs(inputs.len()));
            }
            let options = Options {
                zero_init_workgroup_memory,
            };
            compile_files(&inputs, output, &options, disassemble, verbose)?;
        }
        Commands::Example { name, output } => {
            let module = name.build()?;
            let json = serde_json::to_string_pretty(&module)?;
            match output {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

/// Compile each input on its own thread. Every thread owns its generator.
fn compile_files(
    inputs: &[PathBuf],
    output: Option<PathBuf>,
    options: &Options,
    disassemble: bool,
    verbose: bool,
) -> Result<(), DriverError> {
    if let [input] = inputs {
        let text = compile_file(input, output, options, disassemble, verbose)?;
        if let Some(text) = text {
            print!("{}", text);
        }
        return Ok(());
    }

    let results: Vec<Result<Option<String>, DriverError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || compile_file(input, None, options, disassemble, verbose)))
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    // Disassembly is printed in input order.
    for result in results {
        if let Some(text) = result? {
            print!("{}", text);
        }
    }
    Ok(())
}

fn compile_file(
    input: &Path,
    output: Option<PathBuf>,
    options: &Options,
    disassemble: bool,
    verbose: bool,
) -> Result<Option<String>, DriverError> {
    if verbose {
        info!("Compiling {}...", input.display());
    }

    let source = fs::read_to_string(input)?;
    let module: ir::Module = time("parse", verbose, || serde_json::from_str(&source))?;
    let words = time("generate", verbose, || ember_core::generate(&module, options))?;

    let output_path = output.unwrap_or_else(|| input.with_extension("spv"));
    let mut file = fs::File::create(&output_path)?;
    for word in &words {
        file.write_all(&word.to_le_bytes())?;
    }

    if verbose {
        info!("Successfully compiled to {}", output_path.display());
        info!("Generated {} words of SPIR-V", words.len());
    }

    if !disassemble {
        return Ok(None);
    }
    let parsed = rspirv::dr::load_words(&words).map_err(|e| DriverError::DisassemblyError(format!("{:?}", e)))?;
    Ok(Some(format!("; {}\n{}\n", input.display(), parsed.disassemble())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ice_hook_only_adds_the_note() {
        let mut out = Vec::new();
        write_ice_note(&mut out);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("{}\n", ICE_NOTE));
        assert!(!text.contains("internal compiler error"));
    }
}
