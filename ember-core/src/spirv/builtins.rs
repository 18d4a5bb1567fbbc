//! Builtin function calls.
//!
//! Core builtins map onto SPIR-V instructions or GLSL.std.450 extended instructions.
//! SPIR-V builtins are already in target form and only need their opcode.

use rspirv::spirv::{Capability, GLOp, MemorySemantics, Op, Scope, Word};

use super::instruction::Operand;
use super::printer::Printer;
use crate::ir::{BuiltinFn, Inst, SpirvBuiltinFn, Type, Value};
use crate::{ice, operands};

const GLSL_STD_450: &str = "GLSL.std.450";

/// How a builtin call is expressed.
enum Lowering {
    Inst(Op),
    Glsl(GLOp),
    /// A barrier: no result, fixed scope and semantics operands.
    Barrier(MemorySemantics),
}

impl Printer<'_> {
    /// The ID of the GLSL.std.450 import, imported on first use.
    fn glsl_import(&mut self) -> Word {
        if let Some(&id) = self.imports.get(GLSL_STD_450) {
            return id;
        }
        let id = self.module.next_id();
        self.module
            .push_ext_import(Op::ExtInstImport, operands![id, GLSL_STD_450]);
        self.imports.insert(GLSL_STD_450, id);
        id
    }

    /// `OpTypeX` and ID operands for the result of `inst`, if it has one.
    fn result_operands(&mut self, inst: &Inst) -> Vec<Operand> {
        let ir = self.ir;
        match inst.result() {
            Some(result) => {
                let ty = self.type_id(&ir.value(result).ty);
                let id = self.value_id(Value::Ssa(result));
                operands![ty, id]
            }
            None => Vec::new(),
        }
    }

    pub(super) fn emit_core_builtin_call(&mut self, inst: &Inst, func: BuiltinFn, args: &[Value]) {
        let ir = self.ir;
        let result_ty = match inst.result() {
            Some(result) => ir.value(result).ty.clone(),
            None => Type::Void,
        };
        let first_arg_ty = args.first().map(|&arg| self.value_type(arg));

        // Identity operations.
        if let (Some(result), Some(&arg)) = (inst.result(), args.first()) {
            let identity = match func {
                BuiltinFn::Abs => result_ty.is_unsigned_integer_scalar_or_vector(),
                BuiltinFn::All | BuiltinFn::Any => first_arg_ty == Some(Type::Bool),
                _ => false,
            };
            if identity {
                self.alias_value(result, arg);
                return;
            }
        }

        let by_type = |float: GLOp, signed: GLOp, unsigned: GLOp| {
            if result_ty.is_float_scalar_or_vector() {
                Some(Lowering::Glsl(float))
            } else if result_ty.is_signed_integer_scalar_or_vector() {
                Some(Lowering::Glsl(signed))
            } else if result_ty.is_unsigned_integer_scalar_or_vector() {
                Some(Lowering::Glsl(unsigned))
            } else {
                None
            }
        };
        let glsl = |op: GLOp| Some(Lowering::Glsl(op));
        let inst_op = |op: Op| Some(Lowering::Inst(op));

        let lowering = match func {
            BuiltinFn::Abs if result_ty.is_float_scalar_or_vector() => glsl(GLOp::FAbs),
            BuiltinFn::Abs if result_ty.is_signed_integer_scalar_or_vector() => glsl(GLOp::SAbs),
            BuiltinFn::Abs => None,
            BuiltinFn::Acos => glsl(GLOp::Acos),
            BuiltinFn::Acosh => glsl(GLOp::Acosh),
            BuiltinFn::All => inst_op(Op::All),
            BuiltinFn::Any => inst_op(Op::Any),
            BuiltinFn::Asin => glsl(GLOp::Asin),
            BuiltinFn::Asinh => glsl(GLOp::Asinh),
            BuiltinFn::Atan => glsl(GLOp::Atan),
            BuiltinFn::Atan2 => glsl(GLOp::Atan2),
            BuiltinFn::Atanh => glsl(GLOp::Atanh),
            BuiltinFn::Ceil => glsl(GLOp::Ceil),
            BuiltinFn::Clamp => by_type(GLOp::NClamp, GLOp::SClamp, GLOp::UClamp),
            BuiltinFn::Cos => glsl(GLOp::Cos),
            BuiltinFn::Cosh => glsl(GLOp::Cosh),
            BuiltinFn::CountOneBits => inst_op(Op::BitCount),
            BuiltinFn::Cross => glsl(GLOp::Cross),
            BuiltinFn::Degrees => glsl(GLOp::Degrees),
            BuiltinFn::Determinant => glsl(GLOp::Determinant),
            BuiltinFn::Distance => glsl(GLOp::Distance),
            BuiltinFn::Dpdx => inst_op(Op::DPdx),
            BuiltinFn::DpdxCoarse => {
                self.module.push_capability(Capability::DerivativeControl);
                inst_op(Op::DPdxCoarse)
            }
            BuiltinFn::DpdxFine => {
                self.module.push_capability(Capability::DerivativeControl);
                inst_op(Op::DPdxFine)
            }
            BuiltinFn::Dpdy => inst_op(Op::DPdy),
            BuiltinFn::DpdyCoarse => {
                self.module.push_capability(Capability::DerivativeControl);
                inst_op(Op::DPdyCoarse)
            }
            BuiltinFn::DpdyFine => {
                self.module.push_capability(Capability::DerivativeControl);
                inst_op(Op::DPdyFine)
            }
            BuiltinFn::Exp => glsl(GLOp::Exp),
            BuiltinFn::Exp2 => glsl(GLOp::Exp2),
            BuiltinFn::ExtractBits if result_ty.is_signed_integer_scalar_or_vector() => {
                inst_op(Op::BitFieldSExtract)
            }
            BuiltinFn::ExtractBits if result_ty.is_unsigned_integer_scalar_or_vector() => {
                inst_op(Op::BitFieldUExtract)
            }
            BuiltinFn::ExtractBits => None,
            BuiltinFn::FaceForward => glsl(GLOp::FaceForward),
            BuiltinFn::Floor => glsl(GLOp::Floor),
            BuiltinFn::Fma => glsl(GLOp::Fma),
            BuiltinFn::Fract => glsl(GLOp::Fract),
            BuiltinFn::Frexp => glsl(GLOp::FrexpStruct),
            BuiltinFn::Fwidth => inst_op(Op::Fwidth),
            BuiltinFn::FwidthCoarse => {
                self.module.push_capability(Capability::DerivativeControl);
                inst_op(Op::FwidthCoarse)
            }
            BuiltinFn::FwidthFine => {
                self.module.push_capability(Capability::DerivativeControl);
                inst_op(Op::FwidthFine)
            }
            BuiltinFn::InsertBits => inst_op(Op::BitFieldInsert),
            BuiltinFn::InverseSqrt => glsl(GLOp::InverseSqrt),
            BuiltinFn::Ldexp => glsl(GLOp::Ldexp),
            BuiltinFn::Length => glsl(GLOp::Length),
            BuiltinFn::Log => glsl(GLOp::Log),
            BuiltinFn::Log2 => glsl(GLOp::Log2),
            BuiltinFn::Max => by_type(GLOp::FMax, GLOp::SMax, GLOp::UMax),
            BuiltinFn::Min => by_type(GLOp::FMin, GLOp::SMin, GLOp::UMin),
            BuiltinFn::Mix => glsl(GLOp::FMix),
            BuiltinFn::Modf => glsl(GLOp::ModfStruct),
            BuiltinFn::Normalize => glsl(GLOp::Normalize),
            BuiltinFn::Pack2x16Float => glsl(GLOp::PackHalf2x16),
            BuiltinFn::Pack2x16Snorm => glsl(GLOp::PackSnorm2x16),
            BuiltinFn::Pack2x16Unorm => glsl(GLOp::PackUnorm2x16),
            BuiltinFn::Pack4x8Snorm => glsl(GLOp::PackSnorm4x8),
            BuiltinFn::Pack4x8Unorm => glsl(GLOp::PackUnorm4x8),
            BuiltinFn::Pow => glsl(GLOp::Pow),
            BuiltinFn::QuantizeToF16 => inst_op(Op::QuantizeToF16),
            BuiltinFn::Radians => glsl(GLOp::Radians),
            BuiltinFn::Reflect => glsl(GLOp::Reflect),
            BuiltinFn::Refract => glsl(GLOp::Refract),
            BuiltinFn::ReverseBits => inst_op(Op::BitReverse),
            BuiltinFn::Round => glsl(GLOp::RoundEven),
            BuiltinFn::Sign if result_ty.is_float_scalar_or_vector() => glsl(GLOp::FSign),
            BuiltinFn::Sign if result_ty.is_signed_integer_scalar_or_vector() => glsl(GLOp::SSign),
            BuiltinFn::Sign => None,
            BuiltinFn::Sin => glsl(GLOp::Sin),
            BuiltinFn::Sinh => glsl(GLOp::Sinh),
            BuiltinFn::Smoothstep => glsl(GLOp::SmoothStep),
            BuiltinFn::Sqrt => glsl(GLOp::Sqrt),
            BuiltinFn::Step => glsl(GLOp::Step),
            BuiltinFn::StorageBarrier => Some(Lowering::Barrier(MemorySemantics::UNIFORM_MEMORY)),
            BuiltinFn::SubgroupBallot => {
                self.module.push_capability(Capability::GroupNonUniformBallot);
                inst_op(Op::GroupNonUniformBallot)
            }
            BuiltinFn::SubgroupBroadcast => {
                self.module.push_capability(Capability::GroupNonUniformBallot);
                inst_op(Op::GroupNonUniformBroadcast)
            }
            BuiltinFn::Tan => glsl(GLOp::Tan),
            BuiltinFn::Tanh => glsl(GLOp::Tanh),
            BuiltinFn::TextureBarrier => Some(Lowering::Barrier(MemorySemantics::IMAGE_MEMORY)),
            BuiltinFn::TextureNumLevels => {
                self.module.push_capability(Capability::ImageQuery);
                inst_op(Op::ImageQueryLevels)
            }
            BuiltinFn::TextureNumSamples => {
                self.module.push_capability(Capability::ImageQuery);
                inst_op(Op::ImageQuerySamples)
            }
            BuiltinFn::Transpose => inst_op(Op::Transpose),
            BuiltinFn::Trunc => glsl(GLOp::Trunc),
            BuiltinFn::Unpack2x16Float => glsl(GLOp::UnpackHalf2x16),
            BuiltinFn::Unpack2x16Snorm => glsl(GLOp::UnpackSnorm2x16),
            BuiltinFn::Unpack2x16Unorm => glsl(GLOp::UnpackUnorm2x16),
            BuiltinFn::Unpack4x8Snorm => glsl(GLOp::UnpackSnorm4x8),
            BuiltinFn::Unpack4x8Unorm => glsl(GLOp::UnpackUnorm4x8),
            BuiltinFn::WorkgroupBarrier => Some(Lowering::Barrier(MemorySemantics::WORKGROUP_MEMORY)),
            BuiltinFn::ArrayLength
            | BuiltinFn::AtomicAdd
            | BuiltinFn::CountLeadingZeros
            | BuiltinFn::Dot
            | BuiltinFn::FirstLeadingBit
            | BuiltinFn::Select
            | BuiltinFn::TextureDimensions
            | BuiltinFn::TextureLoad
            | BuiltinFn::TextureSample
            | BuiltinFn::TextureStore => None,
        };
        let Some(lowering) = lowering else {
            ice!("unimplemented builtin function: {}", func);
        };

        let (opcode, mut operands) = match lowering {
            Lowering::Barrier(memory) => {
                let scope = self.u32_constant(Scope::Workgroup as u32);
                let semantics = self.u32_constant((MemorySemantics::ACQUIRE_RELEASE | memory).bits());
                self.push_inst(
                    Op::ControlBarrier,
                    vec![
                        Operand::IdScope(scope),
                        Operand::IdScope(scope),
                        Operand::IdMemorySemantics(semantics),
                    ],
                );
                return;
            }
            Lowering::Inst(opcode) => (opcode, self.result_operands(inst)),
            Lowering::Glsl(ext) => {
                let mut operands = self.result_operands(inst);
                let set = self.glsl_import();
                operands.push(Operand::IdRef(set));
                operands.push(Operand::LiteralExtInstInteger(ext as u32));
                (Op::ExtInst, operands)
            }
        };

        match func {
            BuiltinFn::SubgroupBallot => {
                operands.push(Operand::IdScope(self.u32_constant(Scope::Subgroup as u32)));
                if args.is_empty() {
                    // The predicate defaults to true.
                    let predicate = self.constants.bool(true);
                    operands.push(Operand::IdRef(self.constant_id(predicate)));
                }
            }
            BuiltinFn::SubgroupBroadcast => {
                operands.push(Operand::IdScope(self.u32_constant(Scope::Subgroup as u32)));
            }
            _ => {}
        }

        for &arg in args {
            operands.push(Operand::IdRef(self.value_id(arg)));
        }
        self.push_inst(opcode, operands);
    }

    pub(super) fn emit_spirv_builtin_call(&mut self, inst: &Inst, func: SpirvBuiltinFn, args: &[Value]) {
        let opcode = match func {
            SpirvBuiltinFn::ArrayLength => Op::ArrayLength,
            SpirvBuiltinFn::AtomicIAdd => Op::AtomicIAdd,
            SpirvBuiltinFn::AtomicISub => Op::AtomicISub,
            SpirvBuiltinFn::AtomicAnd => Op::AtomicAnd,
            SpirvBuiltinFn::AtomicCompareExchange => Op::AtomicCompareExchange,
            SpirvBuiltinFn::AtomicExchange => Op::AtomicExchange,
            SpirvBuiltinFn::AtomicLoad => Op::AtomicLoad,
            SpirvBuiltinFn::AtomicOr => Op::AtomicOr,
            SpirvBuiltinFn::AtomicSMax => Op::AtomicSMax,
            SpirvBuiltinFn::AtomicSMin => Op::AtomicSMin,
            SpirvBuiltinFn::AtomicStore => Op::AtomicStore,
            SpirvBuiltinFn::AtomicUMax => Op::AtomicUMax,
            SpirvBuiltinFn::AtomicUMin => Op::AtomicUMin,
            SpirvBuiltinFn::AtomicXor => Op::AtomicXor,
            SpirvBuiltinFn::Dot => Op::Dot,
            SpirvBuiltinFn::ImageDrefGather => Op::ImageDrefGather,
            SpirvBuiltinFn::ImageFetch => Op::ImageFetch,
            SpirvBuiltinFn::ImageGather => Op::ImageGather,
            SpirvBuiltinFn::ImageQuerySize => {
                self.module.push_capability(Capability::ImageQuery);
                Op::ImageQuerySize
            }
            SpirvBuiltinFn::ImageQuerySizeLod => {
                self.module.push_capability(Capability::ImageQuery);
                Op::ImageQuerySizeLod
            }
            SpirvBuiltinFn::ImageRead => Op::ImageRead,
            SpirvBuiltinFn::ImageSampleImplicitLod => Op::ImageSampleImplicitLod,
            SpirvBuiltinFn::ImageSampleExplicitLod => Op::ImageSampleExplicitLod,
            SpirvBuiltinFn::ImageSampleDrefImplicitLod => Op::ImageSampleDrefImplicitLod,
            SpirvBuiltinFn::ImageSampleDrefExplicitLod => Op::ImageSampleDrefExplicitLod,
            SpirvBuiltinFn::ImageWrite => Op::ImageWrite,
            SpirvBuiltinFn::MatrixTimesMatrix => Op::MatrixTimesMatrix,
            SpirvBuiltinFn::MatrixTimesScalar => Op::MatrixTimesScalar,
            SpirvBuiltinFn::MatrixTimesVector => Op::MatrixTimesVector,
            SpirvBuiltinFn::SampledImage => Op::SampledImage,
            SpirvBuiltinFn::SDot | SpirvBuiltinFn::UDot => {
                self.module.push_extension("SPV_KHR_integer_dot_product");
                self.module.push_capability(Capability::DotProduct);
                self.module.push_capability(Capability::DotProductInput4x8BitPacked);
                if func == SpirvBuiltinFn::SDot { Op::SDot } else { Op::UDot }
            }
            SpirvBuiltinFn::Select => Op::Select,
            SpirvBuiltinFn::VectorTimesMatrix => Op::VectorTimesMatrix,
            SpirvBuiltinFn::VectorTimesScalar => Op::VectorTimesScalar,
            SpirvBuiltinFn::None => ice!("undefined spirv builtin function"),
        };

        let mut operands = self.result_operands(inst);
        for &arg in args {
            operands.push(Operand::IdRef(self.value_id(arg)));
        }
        self.push_inst(opcode, operands);
    }

    fn u32_constant(&mut self, value: u32) -> Word {
        let constant = self.constants.u32(value);
        self.constant_id(constant)
    }
}
