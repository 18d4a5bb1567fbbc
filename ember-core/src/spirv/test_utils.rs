#![cfg(test)]

//! Helpers shared by the SPIR-V backend tests.

use rspirv::binary::Disassemble;
use rspirv::dr;
use rspirv::spirv::{Op, Word};

use super::Options;
use crate::ir::Module;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Lower with default options; the module is expected to be valid.
pub fn lower(module: &Module) -> Vec<Word> {
    lower_with(module, Options::default())
}

pub fn lower_with(module: &Module, options: Options) -> Vec<Word> {
    init_logging();
    super::generate(module, &options).unwrap()
}

/// Parse the words back with rspirv's loader.
pub fn parse(words: &[Word]) -> dr::Module {
    dr::load_words(words).unwrap()
}

pub fn lower_and_parse(module: &Module) -> dr::Module {
    parse(&lower(module))
}

pub fn disassemble(words: &[Word]) -> String {
    parse(words).disassemble()
}

/// Every instruction with opcode `op`, in module order.
pub fn find(module: &dr::Module, op: Op) -> Vec<&dr::Instruction> {
    module.all_inst_iter().filter(|inst| inst.class.opcode == op).collect()
}

pub fn count(module: &dr::Module, op: Op) -> usize {
    find(module, op).len()
}

/// Opcodes of the body of function `index`, block labels included.
pub fn function_ops(module: &dr::Module, index: usize) -> Vec<Op> {
    let mut ops = Vec::new();
    for block in &module.functions[index].blocks {
        if let Some(label) = &block.label {
            ops.push(label.class.opcode);
        }
        ops.extend(block.instructions.iter().map(|inst| inst.class.opcode));
    }
    ops
}

/// Label IDs of the blocks of function `index`, in order.
pub fn block_labels(module: &dr::Module, index: usize) -> Vec<Word> {
    module.functions[index]
        .blocks
        .iter()
        .filter_map(|block| block.label.as_ref().and_then(|label| label.result_id))
        .collect()
}

/// The ID operands of an instruction, scopes and memory semantics included, excluding
/// its result type and result.
pub fn id_refs(inst: &dr::Instruction) -> Vec<Word> {
    inst.operands
        .iter()
        .filter_map(|operand| match operand {
            dr::Operand::IdRef(id) | dr::Operand::IdScope(id) | dr::Operand::IdMemorySemantics(id) => Some(*id),
            _ => None,
        })
        .collect()
}

/// The result ID of the first instruction with opcode `op`.
pub fn result_of(module: &dr::Module, op: Op) -> Word {
    find(module, op)[0].result_id.unwrap()
}
