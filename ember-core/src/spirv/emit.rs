//! Lowering of individual value and memory instructions.

use rspirv::spirv::{Op, Word};

use super::instruction::Operand;
use super::printer::Printer;
use crate::ir::{BinaryOp, FuncId, Inst, Scalar, Type, UnaryOp, Value};
use crate::{ice, operands};

impl Printer<'_> {
    fn result_type_id(&mut self, inst: &Inst) -> Word {
        let ir = self.ir;
        match inst.result() {
            Some(result) => self.type_id(&ir.value(result).ty),
            None => ice!("{} instruction has no result", inst.kind.name()),
        }
    }

    fn result_type(&self, inst: &Inst) -> Type {
        match inst.result() {
            Some(result) => self.ir.value(result).ty.clone(),
            None => ice!("{} instruction has no result", inst.kind.name()),
        }
    }

    /// Alias the single result of `inst` to `source`.
    fn pass_through(&mut self, inst: &Inst, source: Value) {
        match inst.result() {
            Some(result) => self.alias_value(result, source),
            None => ice!("{} instruction has no result", inst.kind.name()),
        }
    }

    pub(super) fn emit_access(&mut self, inst: &Inst, object: Value, indices: &[Value]) {
        let ty = self.result_type(inst);
        let type_id = self.type_id(&ty);
        let id = self.result_id(inst);
        let source = self.value_id(object);

        if matches!(ty, Type::Pointer { .. }) {
            let mut operands = operands![type_id, id, source];
            for &index in indices {
                operands.push(Operand::IdRef(self.value_id(index)));
            }
            self.push_inst(Op::AccessChain, operands);
            return;
        }

        // Constant indices accumulate into a single extract.
        let mut operands = operands![type_id, id, source];
        let mut source_ty = self.value_type(object);
        for &index in indices {
            let literal = match index {
                Value::Constant(c) => self.constants.as_u32(c),
                Value::Literal(literal) => Some(literal),
                Value::Ssa(_) => None,
            };
            if let Some(literal) = literal {
                operands.push(Operand::LiteralBit32(literal));
                source_ty = self.ir.element_type(&source_ty, literal);
                continue;
            }

            // Only vectors are indexed dynamically as values.
            if !matches!(source_ty, Type::Vector { .. }) {
                ice!("dynamic index into non-vector value of type {:?}", source_ty);
            }
            let mut vector = source;
            if operands.len() > 3 {
                vector = self.module.next_id();
                operands[0] = Operand::IdRef(self.type_id(&source_ty));
                operands[1] = Operand::IdRef(vector);
                self.push_inst(Op::CompositeExtract, operands);
            }
            let index = self.value_id(index);
            self.push_inst(Op::VectorExtractDynamic, operands![type_id, id, vector, index]);
            return;
        }
        self.push_inst(Op::CompositeExtract, operands);
    }

    pub(super) fn emit_binary(&mut self, inst: &Inst, op: BinaryOp, lhs: Value, rhs: Value) {
        let ty = self.result_type(inst);
        let lhs_ty = self.value_type(lhs);

        let opcode = match op {
            BinaryOp::Add => Some(if ty.is_integer_scalar_or_vector() { Op::IAdd } else { Op::FAdd }),
            BinaryOp::Subtract => Some(if ty.is_integer_scalar_or_vector() { Op::ISub } else { Op::FSub }),
            BinaryOp::Multiply => pick(&ty, Op::IMul, Op::IMul, Op::FMul),
            BinaryOp::Divide => pick(&ty, Op::SDiv, Op::UDiv, Op::FDiv),
            BinaryOp::Modulo => pick(&ty, Op::SRem, Op::UMod, Op::FRem),
            BinaryOp::And if lhs_ty.is_integer_scalar_or_vector() => Some(Op::BitwiseAnd),
            BinaryOp::And if lhs_ty.is_bool_scalar_or_vector() => Some(Op::LogicalAnd),
            BinaryOp::Or if lhs_ty.is_integer_scalar_or_vector() => Some(Op::BitwiseOr),
            BinaryOp::Or if lhs_ty.is_bool_scalar_or_vector() => Some(Op::LogicalOr),
            BinaryOp::And | BinaryOp::Or => None,
            BinaryOp::Xor => Some(Op::BitwiseXor),
            BinaryOp::Equal => compare(&lhs_ty, Op::LogicalEqual, Op::IEqual, Op::IEqual, Op::FOrdEqual),
            BinaryOp::NotEqual => {
                compare(&lhs_ty, Op::LogicalNotEqual, Op::INotEqual, Op::INotEqual, Op::FOrdNotEqual)
            }
            BinaryOp::LessThan => pick(&lhs_ty, Op::SLessThan, Op::ULessThan, Op::FOrdLessThan),
            BinaryOp::GreaterThan => pick(&lhs_ty, Op::SGreaterThan, Op::UGreaterThan, Op::FOrdGreaterThan),
            BinaryOp::LessThanEqual => {
                pick(&lhs_ty, Op::SLessThanEqual, Op::ULessThanEqual, Op::FOrdLessThanEqual)
            }
            BinaryOp::GreaterThanEqual => pick(
                &lhs_ty,
                Op::SGreaterThanEqual,
                Op::UGreaterThanEqual,
                Op::FOrdGreaterThanEqual,
            ),
            BinaryOp::ShiftLeft => Some(Op::ShiftLeftLogical),
            BinaryOp::ShiftRight if lhs_ty.is_signed_integer_scalar_or_vector() => Some(Op::ShiftRightArithmetic),
            BinaryOp::ShiftRight if lhs_ty.is_unsigned_integer_scalar_or_vector() => Some(Op::ShiftRightLogical),
            BinaryOp::ShiftRight => None,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                ice!("short-circuiting {:?} must be lowered to control flow", op)
            }
        };
        let Some(opcode) = opcode else {
            ice!("unhandled binary instruction {:?} on {:?}", op, lhs_ty);
        };

        let type_id = self.type_id(&ty);
        let id = self.result_id(inst);
        let lhs = self.value_id(lhs);
        let rhs = self.value_id(rhs);
        self.push_inst(opcode, operands![type_id, id, lhs, rhs]);
    }

    pub(super) fn emit_unary(&mut self, inst: &Inst, op: UnaryOp, value: Value) {
        let ty = self.result_type(inst);
        let opcode = match op {
            UnaryOp::Complement => Op::Not,
            UnaryOp::Negation if ty.is_float_scalar_or_vector() => Op::FNegate,
            UnaryOp::Negation if ty.is_signed_integer_scalar_or_vector() => Op::SNegate,
            UnaryOp::Negation => ice!("unhandled negation of {:?}", ty),
            UnaryOp::Not => Op::LogicalNot,
        };
        let type_id = self.type_id(&ty);
        let id = self.result_id(inst);
        let value = self.value_id(value);
        self.push_inst(opcode, operands![type_id, id, value]);
    }

    pub(super) fn emit_bitcast(&mut self, inst: &Inst, value: Value) {
        let ty = self.result_type(inst);
        if ty == self.value_type(value) {
            self.pass_through(inst, value);
            return;
        }
        let type_id = self.type_id(&ty);
        let id = self.result_id(inst);
        let value = self.value_id(value);
        self.push_inst(Op::Bitcast, operands![type_id, id, value]);
    }

    pub(super) fn emit_convert(&mut self, inst: &Inst, value: Value) {
        let res_ty = self.result_type(inst);
        let arg_ty = self.value_type(value);

        let type_id = self.type_id(&res_ty);
        let id = self.result_id(inst);
        let arg = self.value_id(value);
        let mut operands = operands![type_id, id, arg];

        let same_size = res_ty.scalar_size() == arg_ty.scalar_size();
        let opcode = if res_ty.is_signed_integer_scalar_or_vector() && arg_ty.is_float_scalar_or_vector() {
            Op::ConvertFToS
        } else if res_ty.is_unsigned_integer_scalar_or_vector() && arg_ty.is_float_scalar_or_vector() {
            Op::ConvertFToU
        } else if res_ty.is_float_scalar_or_vector() && arg_ty.is_signed_integer_scalar_or_vector() {
            Op::ConvertSToF
        } else if res_ty.is_float_scalar_or_vector() && arg_ty.is_unsigned_integer_scalar_or_vector() {
            Op::ConvertUToF
        } else if res_ty.is_float_scalar_or_vector() && arg_ty.is_float_scalar_or_vector() && !same_size {
            Op::FConvert
        } else if res_ty.is_integer_scalar_or_vector() && arg_ty.is_integer_scalar_or_vector() && same_size {
            Op::Bitcast
        } else if res_ty.is_bool_scalar_or_vector() {
            // Compare against zero.
            let opcode = if arg_ty.is_integer_scalar_or_vector() {
                Op::INotEqual
            } else if arg_ty.is_float_scalar_or_vector() {
                Op::FUnordNotEqual
            } else {
                ice!("unhandled conversion from {:?} to {:?}", arg_ty, res_ty);
            };
            operands.push(Operand::IdRef(self.constant_null(&arg_ty)));
            opcode
        } else if arg_ty.is_bool_scalar_or_vector() {
            // Select between one and zero of the result type.
            let (one, zero) = match res_ty.deepest_element() {
                Type::F32 => (Scalar::f32(1.0), Scalar::f32(0.0)),
                Type::F16 => (Scalar::F16(0x3c00), Scalar::F16(0)),
                Type::I32 => (Scalar::I32(1), Scalar::I32(0)),
                Type::U32 => (Scalar::U32(1), Scalar::U32(0)),
                other => ice!("unhandled conversion from bool to {:?}", other),
            };
            let mut one = self.constants.scalar(one);
            let mut zero = self.constants.scalar(zero);
            if let Type::Vector { width, .. } = res_ty {
                one = self.constants.splat(res_ty.clone(), one, width);
                zero = self.constants.splat(res_ty.clone(), zero, width);
            }
            operands.push(Operand::IdRef(self.constant_id(one)));
            operands.push(Operand::IdRef(self.constant_id(zero)));
            Op::Select
        } else {
            ice!("unhandled conversion from {:?} to {:?}", arg_ty, res_ty);
        };

        self.push_inst(opcode, operands);
    }

    pub(super) fn emit_construct(&mut self, inst: &Inst, args: &[Value]) {
        let ty = self.result_type(inst);
        if let [arg] = args {
            if self.value_type(*arg) == ty {
                self.pass_through(inst, *arg);
                return;
            }
        }
        let type_id = self.type_id(&ty);
        let id = self.result_id(inst);
        let mut operands = operands![type_id, id];
        for &arg in args {
            operands.push(Operand::IdRef(self.value_id(arg)));
        }
        self.push_inst(Op::CompositeConstruct, operands);
    }

    pub(super) fn emit_swizzle(&mut self, inst: &Inst, object: Value, indices: &[u32]) {
        let type_id = self.result_type_id(inst);
        let id = self.result_id(inst);
        let object = self.value_id(object);
        let mut operands = operands![type_id, id, object, object];
        operands.extend(indices.iter().map(|&i| Operand::LiteralBit32(i)));
        self.push_inst(Op::VectorShuffle, operands);
    }

    pub(super) fn emit_load(&mut self, inst: &Inst, from: Value) {
        let type_id = self.result_type_id(inst);
        let id = self.result_id(inst);
        let from = self.value_id(from);
        self.push_inst(Op::Load, operands![type_id, id, from]);
    }

    pub(super) fn emit_store(&mut self, to: Value, value: Value) {
        let to = self.value_id(to);
        let value = self.value_id(value);
        self.push_inst(Op::Store, operands![to, value]);
    }

    /// Pointer to one component of the vector behind `vector`.
    fn vector_element_pointer(&mut self, vector: Value, index: Value) -> Word {
        let ptr_ty = self.value_type(vector);
        let Type::Pointer {
            address_space,
            store,
            access,
        } = &ptr_ty
        else {
            ice!("vector element access through non-pointer {:?}", ptr_ty);
        };
        let Type::Vector { elem, .. } = &**store else {
            ice!("vector element access into non-vector {:?}", store);
        };
        let element_ptr = Type::ptr(*address_space, (**elem).clone(), *access);
        let element_ptr = self.type_id(&element_ptr);

        let id = self.module.next_id();
        let vector = self.value_id(vector);
        let index = self.value_id(index);
        self.push_inst(Op::AccessChain, operands![element_ptr, id, vector, index]);
        id
    }

    pub(super) fn emit_load_vector_element(&mut self, inst: &Inst, from: Value, index: Value) {
        let pointer = self.vector_element_pointer(from, index);
        let type_id = self.result_type_id(inst);
        let id = self.result_id(inst);
        self.push_inst(Op::Load, operands![type_id, id, pointer]);
    }

    pub(super) fn emit_store_vector_element(&mut self, to: Value, index: Value, value: Value) {
        let pointer = self.vector_element_pointer(to, index);
        let value = self.value_id(value);
        self.push_inst(Op::Store, operands![pointer, value]);
    }

    pub(super) fn emit_user_call(&mut self, inst: &Inst, target: FuncId, args: &[Value]) {
        let (type_id, id) = match inst.result() {
            Some(_) => (self.result_type_id(inst), self.result_id(inst)),
            // Void calls still define a result ID.
            None => (self.type_id(&Type::Void), self.module.next_id()),
        };
        let function = self.function_id(target);
        let mut operands = operands![type_id, id, function];
        for &arg in args {
            operands.push(Operand::IdRef(self.value_id(arg)));
        }
        self.push_inst(Op::FunctionCall, operands);
    }

    pub(super) fn emit_let(&mut self, inst: &Inst, value: Value) {
        self.pass_through(inst, value);
    }
}

/// Opcode by signedness or float-ness of `ty`.
fn pick(ty: &Type, signed: Op, unsigned: Op, float: Op) -> Option<Op> {
    if ty.is_signed_integer_scalar_or_vector() {
        Some(signed)
    } else if ty.is_unsigned_integer_scalar_or_vector() {
        Some(unsigned)
    } else if ty.is_float_scalar_or_vector() {
        Some(float)
    } else {
        None
    }
}

/// Equality opcode by the operand type, booleans included.
fn compare(ty: &Type, boolean: Op, signed: Op, unsigned: Op, float: Op) -> Option<Op> {
    if ty.is_bool_scalar_or_vector() {
        Some(boolean)
    } else {
        pick(ty, signed, unsigned, float)
    }
}
