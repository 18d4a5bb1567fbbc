//! Instruction construction on top of [`rspirv::dr`].
//!
//! Emitters hand over a flat operand list in binary order. [`inst`] moves the
//! result type and result ID into their own fields and tags ID operands with
//! the kind the grammar gives them, so the data representation assembles and
//! disassembles like one built by `rspirv::dr::Builder`.

use rspirv::grammar::{CoreInstructionTable, OperandKind, OperandQuantifier};
use rspirv::spirv::{Op, Word};

use crate::ice;

pub use rspirv::dr::{Instruction, Operand};

/// Greatest word count the high half of an instruction's first word can hold.
pub const MAX_WORD_COUNT: usize = 0xFFFF;

/// Build an operand list from anything rspirv converts into [`Operand`].
#[macro_export]
macro_rules! operands {
    ($($x:expr),* $(,)?) => {
        vec![$($crate::spirv::instruction::Operand::from($x)),*]
    };
}

/// Create an instruction from its operands in binary order.
///
/// Raises an ICE if the instruction would not fit the 16-bit word count.
pub fn inst(opcode: Op, operands: Vec<Operand>) -> Instruction {
    let class = CoreInstructionTable::get(opcode);
    let mut operands = operands.into_iter();
    let mut result_type = None;
    let mut result_id = None;
    let mut rest = Vec::with_capacity(operands.len());

    for logical in class.operands {
        match (logical.kind, logical.quantifier) {
            (OperandKind::IdResultType, _) => result_type = operands.next().map(|o| word(opcode, o)),
            (OperandKind::IdResult, _) => result_id = operands.next().map(|o| word(opcode, o)),
            (kind, OperandQuantifier::ZeroOrMore) => {
                for (index, operand) in operands.by_ref().enumerate() {
                    rest.push(tag_repeated(kind, index, operand));
                }
                break;
            }
            (kind, _) => match operands.next() {
                Some(operand) => rest.push(tag(kind, operand)),
                None => break,
            },
        }
    }
    // Trailing parameters of enumerants such as `Decoration::ArrayStride`.
    rest.extend(operands);

    let count = 1
        + result_type.is_some() as usize
        + result_id.is_some() as usize
        + rest.iter().map(operand_words).sum::<usize>();
    if count > MAX_WORD_COUNT {
        ice!("{:?} needs {} words, more than the {} an instruction can hold", opcode, count, MAX_WORD_COUNT);
    }
    Instruction::new(opcode, result_type, result_id, rest)
}

fn word(opcode: Op, operand: Operand) -> Word {
    match operand {
        Operand::LiteralBit32(w) | Operand::IdRef(w) => w,
        other => ice!("{:?} result operand is not an ID: {:?}", opcode, other),
    }
}

fn tag(kind: OperandKind, operand: Operand) -> Operand {
    let w = match operand {
        Operand::LiteralBit32(w) | Operand::IdRef(w) => w,
        other => return other,
    };
    match kind {
        OperandKind::IdRef => Operand::IdRef(w),
        OperandKind::IdScope => Operand::IdScope(w),
        OperandKind::IdMemorySemantics => Operand::IdMemorySemantics(w),
        OperandKind::LiteralExtInstInteger => Operand::LiteralExtInstInteger(w),
        _ => operand,
    }
}

fn tag_repeated(kind: OperandKind, index: usize, operand: Operand) -> Operand {
    let id = match kind {
        OperandKind::IdRef | OperandKind::PairIdRefIdRef => true,
        OperandKind::PairLiteralIntegerIdRef => index % 2 == 1,
        OperandKind::PairIdRefLiteralInteger => index % 2 == 0,
        _ => false,
    };
    if id { tag(OperandKind::IdRef, operand) } else { operand }
}

fn operand_words(operand: &Operand) -> usize {
    match operand {
        Operand::LiteralString(s) => s.len() / 4 + 1,
        Operand::LiteralBit64(_) => 2,
        _ => 1,
    }
}
