#![cfg(test)]

use rspirv::dr;
use rspirv::spirv::{Capability, GLOp, Op, StorageClass, Word};

use super::test_utils::*;
use crate::ir::builder::Builder;
use crate::ir::{
    Access, AddressSpace, BinaryOp, BuiltinFn, Module, PipelineStage, SpirvBuiltinFn, StructDef, StructMember,
    Type, UnaryOp, Value, VarInst,
};

/// Build `fn f(params...) -> ret { return body(params...); }` and lower it.
fn lower_expr(ret: Type, params: &[Type], body: impl FnOnce(&mut Builder<'_>, &[Value]) -> Value) -> dr::Module {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let func = b.function("f", ret, PipelineStage::None);
    let params: Vec<Value> = params.iter().map(|ty| b.param(func, ty.clone(), None)).collect();
    let result = body(&mut b, &params);
    b.return_(Some(result)).unwrap();
    lower_and_parse(&module)
}

/// Build `fn f() { body(); }` and lower it.
fn lower_stmts(body: impl FnOnce(&mut Builder<'_>)) -> dr::Module {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    b.function("f", Type::Void, PipelineStage::None);
    body(&mut b);
    b.return_(None).unwrap();
    lower_and_parse(&module)
}

/// Opcodes between the entry label and the return.
fn body_ops(spv: &dr::Module) -> Vec<Op> {
    let ops = function_ops(spv, 0);
    ops[1..ops.len() - 1].to_vec()
}

fn binary_opcode(op: BinaryOp, result: Type, operand: Type) -> Op {
    let spv = lower_expr(result.clone(), &[operand.clone(), operand], |b, p| {
        b.binary(op, result, p[0], p[1]).unwrap()
    });
    let ops = body_ops(&spv);
    assert_eq!(ops.len(), 1);
    ops[0]
}

fn unary_opcode(op: UnaryOp, ty: Type) -> Op {
    let spv = lower_expr(ty.clone(), &[ty.clone()], |b, p| b.unary(op, ty, p[0]).unwrap());
    body_ops(&spv)[0]
}

fn convert_opcode(from: Type, to: Type) -> Op {
    let spv = lower_expr(to.clone(), &[from], |b, p| b.convert(to, p[0]).unwrap());
    let ops = body_ops(&spv);
    assert_eq!(ops.len(), 1);
    ops[0]
}

/// The literal of the `OpConstant` with result `id`.
fn constant_value(spv: &dr::Module, id: Word) -> Option<u32> {
    find(spv, Op::Constant).iter().find_map(|inst| match inst.operands[0] {
        dr::Operand::LiteralBit32(v) if inst.result_id == Some(id) => Some(v),
        _ => None,
    })
}

fn has_capability(spv: &dr::Module, capability: Capability) -> bool {
    find(spv, Op::Capability)
        .iter()
        .any(|inst| inst.operands[0] == dr::Operand::Capability(capability))
}

fn ext_inst_op(spv: &dr::Module) -> u32 {
    let inst = find(spv, Op::ExtInst)[0];
    match inst.operands[1] {
        dr::Operand::LiteralExtInstInteger(op) => op,
        ref other => panic!("unexpected extended instruction operand {:?}", other),
    }
}

fn vec(elem: Type, width: u32) -> Type {
    Type::vec(elem, width)
}

// =============================================================================
// Binary and unary operators
// =============================================================================

#[test]
fn test_arithmetic_uses_result_type() {
    assert_eq!(binary_opcode(BinaryOp::Add, Type::I32, Type::I32), Op::IAdd);
    assert_eq!(binary_opcode(BinaryOp::Add, Type::F32, Type::F32), Op::FAdd);
    assert_eq!(binary_opcode(BinaryOp::Subtract, Type::U32, Type::U32), Op::ISub);
    assert_eq!(binary_opcode(BinaryOp::Multiply, vec(Type::F32, 3), vec(Type::F32, 3)), Op::FMul);
    assert_eq!(binary_opcode(BinaryOp::Divide, Type::I32, Type::I32), Op::SDiv);
    assert_eq!(binary_opcode(BinaryOp::Divide, Type::U32, Type::U32), Op::UDiv);
    assert_eq!(binary_opcode(BinaryOp::Divide, Type::F32, Type::F32), Op::FDiv);
    assert_eq!(binary_opcode(BinaryOp::Modulo, Type::I32, Type::I32), Op::SRem);
    assert_eq!(binary_opcode(BinaryOp::Modulo, Type::U32, Type::U32), Op::UMod);
    assert_eq!(binary_opcode(BinaryOp::Modulo, Type::F32, Type::F32), Op::FRem);
}

#[test]
fn test_comparisons_use_operand_type() {
    assert_eq!(binary_opcode(BinaryOp::LessThan, Type::Bool, Type::U32), Op::ULessThan);
    assert_eq!(binary_opcode(BinaryOp::LessThan, Type::Bool, Type::I32), Op::SLessThan);
    assert_eq!(binary_opcode(BinaryOp::LessThan, Type::Bool, Type::F32), Op::FOrdLessThan);
    assert_eq!(
        binary_opcode(BinaryOp::GreaterThanEqual, vec(Type::Bool, 2), vec(Type::U32, 2)),
        Op::UGreaterThanEqual
    );
    assert_eq!(binary_opcode(BinaryOp::Equal, Type::Bool, Type::Bool), Op::LogicalEqual);
    assert_eq!(binary_opcode(BinaryOp::Equal, Type::Bool, Type::I32), Op::IEqual);
    assert_eq!(binary_opcode(BinaryOp::NotEqual, Type::Bool, Type::F32), Op::FOrdNotEqual);
    assert_eq!(binary_opcode(BinaryOp::NotEqual, Type::Bool, Type::Bool), Op::LogicalNotEqual);
}

#[test]
fn test_bitwise_and_logical() {
    assert_eq!(binary_opcode(BinaryOp::And, Type::U32, Type::U32), Op::BitwiseAnd);
    assert_eq!(binary_opcode(BinaryOp::And, Type::Bool, Type::Bool), Op::LogicalAnd);
    assert_eq!(binary_opcode(BinaryOp::Or, vec(Type::Bool, 4), vec(Type::Bool, 4)), Op::LogicalOr);
    assert_eq!(binary_opcode(BinaryOp::Xor, Type::I32, Type::I32), Op::BitwiseXor);
    assert_eq!(binary_opcode(BinaryOp::ShiftLeft, Type::U32, Type::U32), Op::ShiftLeftLogical);
    assert_eq!(binary_opcode(BinaryOp::ShiftRight, Type::I32, Type::I32), Op::ShiftRightArithmetic);
    assert_eq!(binary_opcode(BinaryOp::ShiftRight, Type::U32, Type::U32), Op::ShiftRightLogical);
}

#[test]
#[should_panic(expected = "internal compiler error")]
fn test_short_circuit_and_is_rejected() {
    binary_opcode(BinaryOp::LogicalAnd, Type::Bool, Type::Bool);
}

#[test]
#[should_panic(expected = "unhandled binary instruction Multiply")]
fn test_matrix_multiply_is_rejected() {
    // Matrix products go through MatrixTimesMatrix and friends, never FMul.
    let mat = Type::mat(Type::F32, 4, 4);
    binary_opcode(BinaryOp::Multiply, mat.clone(), mat);
}

#[test]
fn test_unary() {
    assert_eq!(unary_opcode(UnaryOp::Negation, Type::F32), Op::FNegate);
    assert_eq!(unary_opcode(UnaryOp::Negation, vec(Type::I32, 2)), Op::SNegate);
    assert_eq!(unary_opcode(UnaryOp::Complement, Type::U32), Op::Not);
    assert_eq!(unary_opcode(UnaryOp::Not, Type::Bool), Op::LogicalNot);
}

// =============================================================================
// Passthroughs
// =============================================================================

#[test]
fn test_unsigned_abs_is_identity() {
    let spv = lower_expr(Type::U32, &[Type::U32], |b, p| {
        b.builtin(Type::U32, BuiltinFn::Abs, vec![p[0]]).unwrap()
    });
    assert!(body_ops(&spv).is_empty());
    let param = spv.functions[0].parameters[0].result_id.unwrap();
    assert_eq!(id_refs(find(&spv, Op::ReturnValue)[0]), vec![param]);
    assert_eq!(count(&spv, Op::ExtInstImport), 0);
}

#[test]
fn test_scalar_all_any_are_identity() {
    for func in [BuiltinFn::All, BuiltinFn::Any] {
        let spv = lower_expr(Type::Bool, &[Type::Bool], |b, p| b.builtin(Type::Bool, func, vec![p[0]]).unwrap());
        assert!(body_ops(&spv).is_empty());
    }

    let spv = lower_expr(Type::Bool, &[vec(Type::Bool, 3)], |b, p| {
        b.builtin(Type::Bool, BuiltinFn::Any, vec![p[0]]).unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::Any]);
}

#[test]
fn test_bitcast() {
    let spv = lower_expr(Type::I32, &[Type::I32], |b, p| b.bitcast(Type::I32, p[0]).unwrap());
    assert!(body_ops(&spv).is_empty());

    let spv = lower_expr(Type::U32, &[Type::F32], |b, p| b.bitcast(Type::U32, p[0]).unwrap());
    assert_eq!(body_ops(&spv), vec![Op::Bitcast]);
}

#[test]
fn test_construct() {
    let ty = vec(Type::F32, 2);
    let spv = lower_expr(ty.clone(), &[ty.clone()], |b, p| b.construct(ty.clone(), vec![p[0]]).unwrap());
    assert!(body_ops(&spv).is_empty());

    let ty = vec(Type::F32, 2);
    let spv = lower_expr(ty.clone(), &[Type::F32, Type::F32], |b, p| {
        b.construct(ty.clone(), vec![p[0], p[1]]).unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::CompositeConstruct]);
}

#[test]
fn test_let_is_identity() {
    let spv = lower_expr(Type::F32, &[Type::F32], |b, p| b.let_(p[0]).unwrap());
    assert!(body_ops(&spv).is_empty());
}

// =============================================================================
// Conversions
// =============================================================================

#[test]
fn test_numeric_conversions() {
    assert_eq!(convert_opcode(Type::F32, Type::I32), Op::ConvertFToS);
    assert_eq!(convert_opcode(Type::F32, Type::U32), Op::ConvertFToU);
    assert_eq!(convert_opcode(Type::I32, Type::F32), Op::ConvertSToF);
    assert_eq!(convert_opcode(Type::U32, Type::F32), Op::ConvertUToF);
    assert_eq!(convert_opcode(vec(Type::I32, 3), vec(Type::F16, 3)), Op::ConvertSToF);
    assert_eq!(convert_opcode(Type::F32, Type::F16), Op::FConvert);
    assert_eq!(convert_opcode(Type::I32, Type::U32), Op::Bitcast);
    assert_eq!(convert_opcode(vec(Type::U32, 2), vec(Type::I32, 2)), Op::Bitcast);
}

#[test]
fn test_conversion_to_bool_compares_with_null() {
    assert_eq!(convert_opcode(Type::U32, Type::Bool), Op::INotEqual);
    assert_eq!(convert_opcode(vec(Type::F32, 2), vec(Type::Bool, 2)), Op::FUnordNotEqual);

    let spv = lower_expr(Type::Bool, &[Type::I32], |b, p| b.convert(Type::Bool, p[0]).unwrap());
    let null = result_of(&spv, Op::ConstantNull);
    assert_eq!(id_refs(find(&spv, Op::INotEqual)[0])[1], null);
}

#[test]
fn test_conversion_from_bool_selects() {
    let spv = lower_expr(Type::F32, &[Type::Bool], |b, p| b.convert(Type::F32, p[0]).unwrap());
    let select = find(&spv, Op::Select)[0];
    let operands = id_refs(select);
    assert_eq!(constant_value(&spv, operands[1]), Some(1.0f32.to_bits()));
    assert_eq!(constant_value(&spv, operands[2]), Some(0));

    // Vectors select between splatted constants.
    let ty = vec(Type::I32, 3);
    let spv = lower_expr(ty.clone(), &[vec(Type::Bool, 3)], |b, p| b.convert(ty.clone(), p[0]).unwrap());
    let operands = id_refs(find(&spv, Op::Select)[0]);
    let one = find(&spv, Op::ConstantComposite)[0];
    assert_eq!(operands[1], one.result_id.unwrap());
    let one_scalar = id_refs(one)[0];
    assert_eq!(id_refs(one), vec![one_scalar; 3]);
    assert_eq!(constant_value(&spv, one_scalar), Some(1));
    assert_eq!(operands[2], result_of(&spv, Op::ConstantNull));
}

#[test]
fn test_conversion_leaves_input_pool_untouched() {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let func = b.function("f", Type::F32, PipelineStage::None);
    let p = b.param(func, Type::Bool, None);
    let v = b.convert(Type::F32, p).unwrap();
    b.return_(Some(v)).unwrap();

    let before = module.constants.len();
    lower(&module);
    assert_eq!(module.constants.len(), before);
}

// =============================================================================
// Composite access
// =============================================================================

fn pair_struct(b: &mut Builder<'_>) -> Type {
    b.add_struct(StructDef {
        name: Some("Pair".to_string()),
        members: vec![
            StructMember {
                name: Some("a".to_string()),
                ty: Type::F32,
                offset: 0,
            },
            StructMember {
                name: Some("b".to_string()),
                ty: vec(Type::F32, 4),
                offset: 16,
            },
        ],
        block: false,
    })
}

#[test]
fn test_constant_access_extracts() {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let pair = pair_struct(&mut b);
    let func = b.function("f", Type::F32, PipelineStage::None);
    let p = b.param(func, pair, None);
    let one = b.u32(1);
    let two = b.i32(2);
    let x = b.access(Type::F32, p, vec![one, two]).unwrap();
    b.return_(Some(x)).unwrap();

    let spv = lower_and_parse(&module);
    let extract = find(&spv, Op::CompositeExtract)[0];
    assert_eq!(
        &extract.operands[1..],
        &[dr::Operand::LiteralBit32(1), dr::Operand::LiteralBit32(2)]
    );
}

#[test]
fn test_pointer_access_chains() {
    let spv = lower_stmts(|b| {
        let arr = Type::array(Type::vec(Type::F32, 4), 8, 16);
        let var = b
            .var(Type::ptr(AddressSpace::Function, arr, Access::ReadWrite), VarInst::default())
            .unwrap();
        let index = b.u32(3);
        let ptr = b
            .access(
                Type::ptr(AddressSpace::Function, Type::vec(Type::F32, 4), Access::ReadWrite),
                var,
                vec![index],
            )
            .unwrap();
        b.load(ptr).unwrap();
    });
    assert_eq!(body_ops(&spv), vec![Op::Variable, Op::AccessChain, Op::Load]);
}

#[test]
fn test_dynamic_vector_index_flushes_chain() {
    let arr = Type::array(vec(Type::F32, 4), 4, 16);
    let spv = lower_expr(Type::F32, &[arr, Type::U32], |b, p| {
        let one = b.u32(1);
        b.access(Type::F32, p[0], vec![one, p[1]]).unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::CompositeExtract, Op::VectorExtractDynamic]);

    let extract = find(&spv, Op::CompositeExtract)[0];
    let dynamic = find(&spv, Op::VectorExtractDynamic)[0];
    assert_eq!(id_refs(dynamic)[0], extract.result_id.unwrap());
    assert_eq!(
        id_refs(dynamic)[1],
        spv.functions[0].parameters[1].result_id.unwrap()
    );
}

#[test]
fn test_dynamic_index_of_plain_vector() {
    let spv = lower_expr(Type::I32, &[vec(Type::I32, 3), Type::I32], |b, p| {
        b.access(Type::I32, p[0], vec![p[1]]).unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::VectorExtractDynamic]);
}

#[test]
fn test_swizzle() {
    let spv = lower_expr(vec(Type::F32, 3), &[vec(Type::F32, 4)], |b, p| {
        b.swizzle(vec(Type::F32, 3), p[0], vec![2, 1, 0]).unwrap()
    });
    let shuffle = find(&spv, Op::VectorShuffle)[0];
    let param = spv.functions[0].parameters[0].result_id.unwrap();
    assert_eq!(
        shuffle.operands,
        vec![
            dr::Operand::IdRef(param),
            dr::Operand::IdRef(param),
            dr::Operand::LiteralBit32(2),
            dr::Operand::LiteralBit32(1),
            dr::Operand::LiteralBit32(0),
        ]
    );
}

#[test]
fn test_vector_element_load_and_store() {
    let spv = lower_stmts(|b| {
        let var = b
            .var(
                Type::ptr(AddressSpace::Function, vec(Type::U32, 4), Access::ReadWrite),
                VarInst::default(),
            )
            .unwrap();
        let index = b.u32(2);
        let x = b.load_vector_element(var, index).unwrap();
        let zero = b.u32(0);
        b.store_vector_element(var, zero, x).unwrap();
    });
    assert_eq!(
        body_ops(&spv)[1..],
        [Op::AccessChain, Op::Load, Op::AccessChain, Op::Store]
    );

    // Both element pointers share one `ptr<function, u32>` type.
    let chains = find(&spv, Op::AccessChain);
    assert_eq!(chains[0].result_type, chains[1].result_type);
    let element_ptr = find(&spv, Op::TypePointer)
        .into_iter()
        .find(|inst| inst.result_id == chains[0].result_type)
        .unwrap();
    assert_eq!(element_ptr.operands[0], dr::Operand::StorageClass(StorageClass::Function));
}

// =============================================================================
// Builtins
// =============================================================================

#[test]
fn test_glsl_import_is_shared() {
    let spv = lower_expr(Type::F32, &[Type::F32], |b, p| {
        let s = b.builtin(Type::F32, BuiltinFn::Sqrt, vec![p[0]]).unwrap();
        b.builtin(Type::F32, BuiltinFn::Floor, vec![s]).unwrap()
    });
    assert_eq!(count(&spv, Op::ExtInstImport), 1);
    assert_eq!(count(&spv, Op::ExtInst), 2);
    assert_eq!(ext_inst_op(&spv), GLOp::Sqrt as u32);

    let import = find(&spv, Op::ExtInstImport)[0];
    assert_eq!(import.operands[0], dr::Operand::LiteralString("GLSL.std.450".to_string()));
}

#[test]
fn test_glsl_variant_by_type() {
    let clamp = |ty: Type| {
        let spv = lower_expr(ty.clone(), &[ty.clone(), ty.clone(), ty.clone()], |b, p| {
            b.builtin(ty.clone(), BuiltinFn::Clamp, p.to_vec()).unwrap()
        });
        ext_inst_op(&spv)
    };
    assert_eq!(clamp(Type::F32), GLOp::NClamp as u32);
    assert_eq!(clamp(Type::I32), GLOp::SClamp as u32);
    assert_eq!(clamp(vec(Type::U32, 2)), GLOp::UClamp as u32);

    let spv = lower_expr(Type::I32, &[Type::I32], |b, p| b.builtin(Type::I32, BuiltinFn::Abs, vec![p[0]]).unwrap());
    assert_eq!(ext_inst_op(&spv), GLOp::SAbs as u32);

    let spv = lower_expr(Type::F32, &[Type::F32], |b, p| b.builtin(Type::F32, BuiltinFn::Round, vec![p[0]]).unwrap());
    assert_eq!(ext_inst_op(&spv), GLOp::RoundEven as u32);
}

#[test]
fn test_extract_bits_by_signedness() {
    let extract = |ty: Type| {
        let spv = lower_expr(ty.clone(), &[ty.clone(), Type::U32, Type::U32], |b, p| {
            b.builtin(ty.clone(), BuiltinFn::ExtractBits, p.to_vec()).unwrap()
        });
        body_ops(&spv)[0]
    };
    assert_eq!(extract(Type::I32), Op::BitFieldSExtract);
    assert_eq!(extract(Type::U32), Op::BitFieldUExtract);
}

#[test]
fn test_workgroup_barrier() {
    let spv = lower_stmts(|b| b.builtin_void(BuiltinFn::WorkgroupBarrier, Vec::new()).unwrap());
    let barrier = find(&spv, Op::ControlBarrier)[0];
    assert!(barrier.result_id.is_none());
    let operands = id_refs(barrier);
    assert_eq!(constant_value(&spv, operands[0]), Some(2));
    assert_eq!(operands[0], operands[1]);
    // AcquireRelease | WorkgroupMemory
    assert_eq!(constant_value(&spv, operands[2]), Some(0x108));
}

#[test]
fn test_derivative_control() {
    let spv = lower_expr(Type::F32, &[Type::F32], |b, p| b.builtin(Type::F32, BuiltinFn::Dpdx, vec![p[0]]).unwrap());
    assert!(!has_capability(&spv, Capability::DerivativeControl));

    let spv = lower_expr(Type::F32, &[Type::F32], |b, p| {
        b.builtin(Type::F32, BuiltinFn::FwidthFine, vec![p[0]]).unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::FwidthFine]);
    assert!(has_capability(&spv, Capability::DerivativeControl));
}

#[test]
fn test_subgroup_ballot() {
    let spv = lower_expr(vec(Type::U32, 4), &[Type::Bool], |b, p| {
        b.builtin(vec(Type::U32, 4), BuiltinFn::SubgroupBallot, vec![p[0]]).unwrap()
    });
    assert!(has_capability(&spv, Capability::GroupNonUniformBallot));
    let ballot = id_refs(find(&spv, Op::GroupNonUniformBallot)[0]);
    assert_eq!(constant_value(&spv, ballot[0]), Some(3));
    assert_eq!(ballot[1], spv.functions[0].parameters[0].result_id.unwrap());
}

#[test]
fn test_texture_queries_require_image_query() {
    let texture = Type::SampledTexture {
        dim: crate::ir::TextureDimension::D2,
        sampled: Box::new(Type::F32),
    };
    let spv = lower_expr(Type::U32, &[texture], |b, p| {
        b.builtin(Type::U32, BuiltinFn::TextureNumLevels, vec![p[0]]).unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::ImageQueryLevels]);
    assert!(has_capability(&spv, Capability::ImageQuery));
}

#[test]
#[should_panic(expected = "unimplemented builtin function: textureSample")]
fn test_unimplemented_builtin() {
    lower_expr(vec(Type::F32, 4), &[], |b, _| {
        b.builtin(vec(Type::F32, 4), BuiltinFn::TextureSample, Vec::new()).unwrap()
    });
}

#[test]
fn test_spirv_builtins() {
    let spv = lower_expr(Type::F32, &[vec(Type::F32, 3), vec(Type::F32, 3)], |b, p| {
        b.spirv_builtin(Type::F32, SpirvBuiltinFn::Dot, p.to_vec()).unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::Dot]);

    let mat = Type::mat(Type::F32, 4, 4);
    let spv = lower_expr(vec(Type::F32, 4), &[mat, vec(Type::F32, 4)], |b, p| {
        b.spirv_builtin(vec(Type::F32, 4), SpirvBuiltinFn::MatrixTimesVector, p.to_vec())
            .unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::MatrixTimesVector]);
}

#[test]
fn test_packed_dot_product() {
    let spv = lower_expr(Type::I32, &[Type::U32, Type::U32], |b, p| {
        // Packed vector format: 4x8 bit.
        b.spirv_builtin(Type::I32, SpirvBuiltinFn::SDot, vec![p[0], p[1], Value::Literal(0)])
            .unwrap()
    });
    assert_eq!(body_ops(&spv), vec![Op::SDot]);
    assert!(has_capability(&spv, Capability::DotProduct));
    assert!(has_capability(&spv, Capability::DotProductInput4x8BitPacked));
    assert_eq!(
        find(&spv, Op::Extension)[0].operands[0],
        dr::Operand::LiteralString("SPV_KHR_integer_dot_product".to_string())
    );
}

#[test]
fn test_void_spirv_builtin_has_no_result() {
    let spv = lower_stmts(|b| {
        let var = b
            .var(
                Type::ptr(AddressSpace::Workgroup, Type::Atomic(Box::new(Type::U32)), Access::ReadWrite),
                VarInst::default(),
            )
            .unwrap();
        let scope = b.u32(2);
        let semantics = b.u32(0);
        let one = b.u32(1);
        b.spirv_builtin_void(SpirvBuiltinFn::AtomicStore, vec![var, scope, semantics, one])
            .unwrap();
    });
    let store = find(&spv, Op::AtomicStore)[0];
    assert!(store.result_id.is_none());
    assert!(store.result_type.is_none());
}
