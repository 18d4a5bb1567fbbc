//! SPIR-V code generation backend.
//!
//! Lowers a validated [`ir::Module`] to a SPIR-V 1.3 module:
//! - types and constants are interned on first use
//! - structured if / loop / switch become merge blocks, branches and phis
//! - instructions are selected from the numeric kind of their operands

mod builtins;
mod constants;
mod control_flow;
mod emit;
pub mod instruction;
pub mod module;
mod printer;
mod types;

#[cfg(test)]
mod emit_tests;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod types_tests;

use rspirv::binary::Assemble;
use rspirv::dr;
use rspirv::spirv::Word;

use crate::error::Result;
use crate::ir;

use self::printer::Printer;

/// Code generation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Give workgroup variables a null initializer (VK_KHR_zero_initialize_workgroup_memory).
    pub zero_init_workgroup_memory: bool,
}

/// The assembled module together with its binary encoding.
#[derive(Debug)]
pub struct Output {
    pub module: dr::Module,
    pub words: Vec<Word>,
}

/// Lower `module` to a SPIR-V binary.
pub fn generate(module: &ir::Module, options: &Options) -> Result<Vec<Word>> {
    generate_module(module, options).map(|output| output.words)
}

/// Lower `module`, keeping rspirv's data representation alongside the words.
pub fn generate_module(module: &ir::Module, options: &Options) -> Result<Output> {
    let module = Printer::new(module, options).generate()?.into_dr();
    let words = module.assemble();
    log::debug!(
        "assembled {} words, id bound {}",
        words.len(),
        module.header.as_ref().map_or(0, |header| header.bound)
    );
    Ok(Output { module, words })
}
