//! Constant interning.

use log::trace;
use rspirv::spirv::{Op, Word};

use super::instruction::Operand;
use super::printer::Printer;
use crate::ir::{ArrayCount, ConstId, Constant, Scalar, Type};
use crate::{ice, operands};

impl Printer<'_> {
    /// The ID of a constant, emitting it (and its elements) on first use.
    ///
    /// All-zero composites share one `OpConstantNull` per type.
    pub(super) fn constant_id(&mut self, constant: ConstId) -> Word {
        if let Some(&id) = self.constant_ids.get(&constant) {
            return id;
        }
        let ty = self.constants.type_of(constant);
        let id = if !ty.is_scalar() && self.constants.all_zero(constant) {
            self.constant_null(&ty)
        } else {
            self.emit_constant(constant, &ty)
        };
        self.constant_ids.insert(constant, id);
        id
    }

    fn emit_constant(&mut self, constant: ConstId, ty: &Type) -> Word {
        let type_id = self.type_id(ty);
        let id = self.module.next_id();

        match self.constants.get(constant).clone() {
            Constant::Scalar(Scalar::Bool(true)) => {
                self.module.push_type(Op::ConstantTrue, operands![type_id, id]);
            }
            Constant::Scalar(Scalar::Bool(false)) => {
                self.module.push_type(Op::ConstantFalse, operands![type_id, id]);
            }
            Constant::Scalar(Scalar::I32(v)) => {
                self.module.push_type(Op::Constant, operands![type_id, id, v as u32]);
            }
            Constant::Scalar(Scalar::U32(v)) => {
                self.module.push_type(Op::Constant, operands![type_id, id, v]);
            }
            Constant::Scalar(Scalar::F32(bits)) => {
                self.module
                    .push_type(Op::Constant, operands![type_id, id, bits]);
            }
            Constant::Scalar(Scalar::F16(bits)) => {
                // 16-bit literals occupy the low half of one word.
                self.module
                    .push_type(Op::Constant, operands![type_id, id, bits as u32]);
            }
            Constant::Composite { .. } | Constant::Splat { .. } => {
                let count = match ty {
                    Type::Vector { width, .. } => *width,
                    Type::Matrix { columns, .. } => *columns,
                    Type::Array {
                        count: ArrayCount::Constant(n),
                        ..
                    } => *n,
                    Type::Array {
                        count: ArrayCount::Runtime,
                        ..
                    } => ice!("runtime-sized array constant {:?}", constant),
                    Type::Struct(def) => self.ir.struct_def(*def).members.len() as u32,
                    other => ice!("unhandled constant type {:?}", other),
                };
                let mut operands = operands![type_id, id];
                for index in 0..count {
                    let element = self.constants.element(constant, index as usize);
                    operands.push(Operand::IdRef(self.constant_id(element)));
                }
                self.module.push_type(Op::ConstantComposite, operands);
            }
        }
        trace!("constant {:?} -> %{}", constant, id);
        id
    }

    /// The single `OpConstantNull` of `ty`.
    pub(super) fn constant_null(&mut self, ty: &Type) -> Word {
        let key = super::types::dedup_type(ty);
        if let Some(&id) = self.constant_nulls.get(&key) {
            return id;
        }
        if matches!(key, Type::Pointer { .. }) {
            ice!("unhandled constant type {:?}", key);
        }
        let type_id = self.type_id(&key);
        let id = self.module.next_id();
        self.module.push_type(Op::ConstantNull, operands![type_id, id]);
        self.constant_nulls.insert(key, id);
        id
    }

    /// The single `OpUndef` of `ty`.
    pub(super) fn undef(&mut self, ty: &Type) -> Word {
        let key = super::types::dedup_type(ty);
        if let Some(&id) = self.undef_values.get(&key) {
            return id;
        }
        let type_id = self.type_id(&key);
        let id = self.module.next_id();
        self.module.push_type(Op::Undef, operands![type_id, id]);
        self.undef_values.insert(key, id);
        id
    }
}
