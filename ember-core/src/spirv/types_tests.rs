#![cfg(test)]

use rspirv::dr;
use rspirv::spirv::{Capability, Decoration, Dim, ImageFormat, Op, Word};

use super::test_utils::*;
use super::types::dedup_type;
use crate::ir::builder::Builder;
use crate::ir::{
    Access, AddressSpace, Module, PipelineStage, SamplerKind, StructDef, StructMember, TexelFormat,
    TextureDimension, Type,
};

/// Lower `fn f(params...) {}`.
fn lower_params(params: &[Type]) -> dr::Module {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let func = b.function("f", Type::Void, PipelineStage::None);
    for ty in params {
        b.param(func, ty.clone(), None);
    }
    b.return_(None).unwrap();
    lower_and_parse(&module)
}

fn param_types(spv: &dr::Module) -> Vec<Word> {
    spv.functions[0]
        .parameters
        .iter()
        .map(|param| param.result_type.unwrap())
        .collect()
}

fn has_capability(spv: &dr::Module, capability: Capability) -> bool {
    find(spv, Op::Capability)
        .iter()
        .any(|inst| inst.operands[0] == dr::Operand::Capability(capability))
}

fn sampled(dim: TextureDimension) -> Type {
    Type::SampledTexture {
        dim,
        sampled: Box::new(Type::F32),
    }
}

fn storage(dim: TextureDimension, format: TexelFormat, access: Access) -> Type {
    Type::StorageTexture {
        dim,
        format,
        access,
        sampled: Box::new(Type::F32),
    }
}

/// Member decorations of struct `target` at `member`, without the target and index operands.
fn member_decorations(spv: &dr::Module, target: Word, member: u32) -> Vec<Vec<dr::Operand>> {
    find(spv, Op::MemberDecorate)
        .into_iter()
        .filter(|inst| {
            inst.operands[0] == dr::Operand::IdRef(target) && inst.operands[1] == dr::Operand::LiteralBit32(member)
        })
        .map(|inst| inst.operands[2..].to_vec())
        .collect()
}

fn struct_param(members: Vec<Type>) -> dr::Module {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let mut offset = 0;
    let members = members
        .into_iter()
        .map(|ty| {
            let member = StructMember { name: None, ty, offset };
            offset += 64;
            member
        })
        .collect();
    let ty = b.add_struct(StructDef {
        name: Some("S".to_string()),
        members,
        block: false,
    });
    let func = b.function("f", Type::Void, PipelineStage::None);
    b.param(func, ty, None);
    b.return_(None).unwrap();
    lower_and_parse(&module)
}

// =============================================================================
// Deduplication
// =============================================================================

#[test]
fn test_dedup_is_idempotent() {
    let types = [
        Type::Atomic(Box::new(Type::I32)),
        Type::DepthTexture {
            dim: TextureDimension::Cube,
        },
        Type::DepthMultisampledTexture {
            dim: TextureDimension::D2,
        },
        storage(TextureDimension::D3, TexelFormat::Rgba8Unorm, Access::Write),
        Type::Sampler(SamplerKind::Comparison),
        Type::ptr(
            AddressSpace::Storage,
            Type::runtime_array(Type::Atomic(Box::new(Type::U32)), 4),
            Access::ReadWrite,
        ),
        Type::SampledImage(Box::new(Type::DepthTexture {
            dim: TextureDimension::D2,
        })),
    ];
    for ty in types {
        let once = dedup_type(&ty);
        assert_eq!(dedup_type(&once), once, "{:?}", ty);
    }
}

#[test]
fn test_atomic_is_declared_as_its_scalar() {
    let spv = lower_params(&[Type::Atomic(Box::new(Type::U32)), Type::U32]);
    assert_eq!(count(&spv, Op::TypeInt), 1);
    let types = param_types(&spv);
    assert_eq!(types[0], types[1]);
}

#[test]
fn test_atomic_inside_pointer() {
    let spv = lower_params(&[
        Type::ptr(AddressSpace::Function, Type::Atomic(Box::new(Type::I32)), Access::ReadWrite),
        Type::ptr(AddressSpace::Function, Type::I32, Access::ReadWrite),
    ]);
    assert_eq!(count(&spv, Op::TypePointer), 1);
}

#[test]
fn test_sampler_kinds_share_declaration() {
    let spv = lower_params(&[
        Type::Sampler(SamplerKind::Sampler),
        Type::Sampler(SamplerKind::Comparison),
    ]);
    assert_eq!(count(&spv, Op::TypeSampler), 1);
}

#[test]
fn test_depth_texture_is_sampled_f32() {
    let spv = lower_params(&[
        Type::DepthTexture {
            dim: TextureDimension::D2,
        },
        sampled(TextureDimension::D2),
    ]);
    let images = find(&spv, Op::TypeImage);
    assert_eq!(images.len(), 1);

    let image = images[0];
    let f32_ty = result_of(&spv, Op::TypeFloat);
    assert_eq!(
        image.operands,
        vec![
            dr::Operand::IdRef(f32_ty),
            dr::Operand::Dim(Dim::Dim2D),
            dr::Operand::LiteralBit32(0),
            dr::Operand::LiteralBit32(0),
            dr::Operand::LiteralBit32(0),
            dr::Operand::LiteralBit32(1),
            dr::Operand::ImageFormat(ImageFormat::Unknown),
        ]
    );
}

#[test]
fn test_depth_multisampled_texture() {
    let spv = lower_params(&[Type::DepthMultisampledTexture {
        dim: TextureDimension::D2,
    }]);
    let image = find(&spv, Op::TypeImage)[0];
    assert_eq!(image.operands[4], dr::Operand::LiteralBit32(1));
    assert_eq!(image.operands[5], dr::Operand::LiteralBit32(1));
}

#[test]
fn test_storage_texture_access_is_not_part_of_type() {
    let spv = lower_params(&[
        storage(TextureDimension::D2, TexelFormat::R32Float, Access::Read),
        storage(TextureDimension::D2, TexelFormat::R32Float, Access::Write),
    ]);
    let images = find(&spv, Op::TypeImage);
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].operands[5], dr::Operand::LiteralBit32(2));
    assert_eq!(images[0].operands[6], dr::Operand::ImageFormat(ImageFormat::R32f));
    assert!(!has_capability(&spv, Capability::StorageImageExtendedFormats));
}

#[test]
fn test_extended_texel_formats() {
    for (format, expected) in [
        (TexelFormat::R8Unorm, ImageFormat::R8),
        (TexelFormat::Rg32Float, ImageFormat::Rg32f),
        (TexelFormat::Rg32Sint, ImageFormat::Rg32i),
        (TexelFormat::Rg32Uint, ImageFormat::Rg32ui),
    ] {
        let spv = lower_params(&[storage(TextureDimension::D2, format, Access::Write)]);
        assert_eq!(find(&spv, Op::TypeImage)[0].operands[6], dr::Operand::ImageFormat(expected));
        assert!(has_capability(&spv, Capability::StorageImageExtendedFormats));
    }
}

#[test]
#[should_panic(expected = "bgra8unorm should have been polyfilled")]
fn test_bgra8_must_be_polyfilled() {
    lower_params(&[storage(TextureDimension::D2, TexelFormat::Bgra8Unorm, Access::Write)]);
}

#[test]
fn test_texture_dimension_capabilities() {
    let spv = lower_params(&[sampled(TextureDimension::D1)]);
    assert!(has_capability(&spv, Capability::Sampled1D));

    let spv = lower_params(&[storage(TextureDimension::D1, TexelFormat::Rgba8Unorm, Access::Write)]);
    assert!(has_capability(&spv, Capability::Image1D));
    assert!(!has_capability(&spv, Capability::Sampled1D));

    let spv = lower_params(&[sampled(TextureDimension::CubeArray)]);
    assert!(has_capability(&spv, Capability::SampledCubeArray));
    let image = find(&spv, Op::TypeImage)[0];
    assert_eq!(image.operands[1], dr::Operand::Dim(Dim::DimCube));
    assert_eq!(image.operands[3], dr::Operand::LiteralBit32(1));

    let spv = lower_params(&[sampled(TextureDimension::D2Array)]);
    let image = find(&spv, Op::TypeImage)[0];
    assert_eq!(image.operands[1], dr::Operand::Dim(Dim::Dim2D));
    assert_eq!(image.operands[3], dr::Operand::LiteralBit32(1));
}

#[test]
fn test_input_attachment() {
    let spv = lower_params(&[Type::InputAttachment {
        sampled: Box::new(Type::F32),
    }]);
    assert!(has_capability(&spv, Capability::InputAttachment));
    let image = find(&spv, Op::TypeImage)[0];
    assert_eq!(image.operands[1], dr::Operand::Dim(Dim::DimSubpassData));
    assert_eq!(image.operands[5], dr::Operand::LiteralBit32(2));
}

#[test]
fn test_f16_capabilities() {
    let spv = lower_params(&[Type::vec(Type::F16, 4)]);
    assert!(has_capability(&spv, Capability::Float16));
    assert!(has_capability(&spv, Capability::UniformAndStorageBuffer16BitAccess));
    assert!(has_capability(&spv, Capability::StorageBuffer16BitAccess));

    let spv = lower_params(&[Type::F32]);
    assert!(!has_capability(&spv, Capability::Float16));
}

// =============================================================================
// Layout decorations
// =============================================================================

#[test]
fn test_array_stride() {
    let spv = lower_params(&[
        Type::array(Type::F32, 4, 16),
        Type::ptr(AddressSpace::Storage, Type::runtime_array(Type::U32, 4), Access::ReadWrite),
    ]);
    let array = result_of(&spv, Op::TypeArray);
    let runtime = result_of(&spv, Op::TypeRuntimeArray);

    let strides: Vec<(Word, dr::Operand)> = find(&spv, Op::Decorate)
        .into_iter()
        .filter(|inst| inst.operands[1] == dr::Operand::Decoration(Decoration::ArrayStride))
        .map(|inst| match inst.operands[0] {
            dr::Operand::IdRef(id) => (id, inst.operands[2].clone()),
            ref other => panic!("unexpected decoration target {:?}", other),
        })
        .collect();
    assert!(strides.contains(&(array, dr::Operand::LiteralBit32(16))));
    assert!(strides.contains(&(runtime, dr::Operand::LiteralBit32(4))));

    // The length is a u32 constant.
    let length = id_refs(find(&spv, Op::TypeArray)[0])[1];
    let constant = find(&spv, Op::Constant)
        .into_iter()
        .find(|inst| inst.result_id == Some(length))
        .unwrap();
    assert_eq!(constant.operands[0], dr::Operand::LiteralBit32(4));
}

#[test]
fn test_matrix_member_layout() {
    let spv = struct_param(vec![
        Type::F32,
        Type::mat(Type::F32, 3, 3),
        Type::mat(Type::F16, 2, 2),
        Type::array(Type::mat(Type::F32, 4, 2), 2, 32),
    ]);
    let ty = result_of(&spv, Op::TypeStruct);

    assert_eq!(
        member_decorations(&spv, ty, 0),
        vec![vec![dr::Operand::Decoration(Decoration::Offset), dr::Operand::LiteralBit32(0)]]
    );

    let stride = |member: u32| {
        let decorations = member_decorations(&spv, ty, member);
        assert!(decorations.contains(&vec![dr::Operand::Decoration(Decoration::ColMajor)]));
        decorations
            .iter()
            .find(|operands| operands[0] == dr::Operand::Decoration(Decoration::MatrixStride))
            .map(|operands| operands[1].clone())
    };
    // Three-row columns are padded to four.
    assert_eq!(stride(1), Some(dr::Operand::LiteralBit32(16)));
    assert_eq!(stride(2), Some(dr::Operand::LiteralBit32(4)));
    assert_eq!(stride(3), Some(dr::Operand::LiteralBit32(8)));
}

#[test]
fn test_block_struct() {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let ty = b.add_struct(StructDef {
        name: Some("Params".to_string()),
        members: vec![StructMember {
            name: Some("scale".to_string()),
            ty: Type::F32,
            offset: 0,
        }],
        block: true,
    });
    let func = b.function("f", Type::Void, PipelineStage::None);
    b.param(func, ty, None);
    b.return_(None).unwrap();
    let spv = lower_and_parse(&module);

    let id = result_of(&spv, Op::TypeStruct);
    assert!(find(&spv, Op::Decorate).iter().any(|inst| {
        inst.operands == vec![dr::Operand::IdRef(id), dr::Operand::Decoration(Decoration::Block)]
    }));
    let member = find(&spv, Op::MemberName)[0];
    assert_eq!(member.operands[2], dr::Operand::LiteralString("scale".to_string()));
}

// =============================================================================
// Constants
// =============================================================================

#[test]
fn test_zero_composites_share_null() {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let ty = Type::vec(Type::F32, 2);

    let zero = b.constants().f32(0.0);
    let composite = b.composite(ty.clone(), vec![zero, zero]);
    let splat = b.splat(ty.clone(), zero, 2);

    b.function("a", ty.clone(), PipelineStage::None);
    b.return_(Some(composite)).unwrap();
    b.function("b", ty.clone(), PipelineStage::None);
    b.return_(Some(splat)).unwrap();

    let spv = lower_and_parse(&module);
    assert_eq!(count(&spv, Op::ConstantNull), 1);
    assert_eq!(count(&spv, Op::ConstantComposite), 0);
    let null = result_of(&spv, Op::ConstantNull);
    for inst in find(&spv, Op::ReturnValue) {
        assert_eq!(id_refs(inst), vec![null]);
    }
}

#[test]
fn test_equal_composite_and_splat_share_constant() {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let ty = Type::vec(Type::F32, 3);

    let one = b.constants().f32(1.0);
    let composite = b.composite(ty.clone(), vec![one, one, one]);
    let splat = b.splat(ty.clone(), one, 3);
    assert_eq!(composite, splat);

    b.function("a", ty.clone(), PipelineStage::None);
    b.return_(Some(composite)).unwrap();
    b.function("b", ty.clone(), PipelineStage::None);
    b.return_(Some(splat)).unwrap();

    let spv = lower_and_parse(&module);
    assert_eq!(count(&spv, Op::ConstantComposite), 1);
    let vector = result_of(&spv, Op::ConstantComposite);
    for inst in find(&spv, Op::ReturnValue) {
        assert_eq!(id_refs(inst), vec![vector]);
    }
}

#[test]
fn test_scalar_zero_is_a_constant() {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    b.function("f", Type::U32, PipelineStage::None);
    let zero = b.u32(0);
    b.return_(Some(zero)).unwrap();

    let spv = lower_and_parse(&module);
    assert_eq!(count(&spv, Op::ConstantNull), 0);
    assert_eq!(find(&spv, Op::Constant)[0].operands, vec![dr::Operand::LiteralBit32(0)]);
}

#[test]
fn test_constants_are_interned() {
    let mut module = Module::new();
    let mut b = Builder::new(&mut module);
    let ty = Type::vec(Type::I32, 3);
    let one = b.constants().i32(1);
    let two = b.constants().i32(2);
    let v = b.composite(ty.clone(), vec![one, two, one]);

    let func = b.function("f", ty.clone(), PipelineStage::None);
    let p = b.param(func, ty.clone(), None);
    let sum = b.binary(crate::ir::BinaryOp::Add, ty.clone(), p, v).unwrap();
    let sum = b.binary(crate::ir::BinaryOp::Add, ty, sum, v).unwrap();
    b.return_(Some(sum)).unwrap();

    let spv = lower_and_parse(&module);
    assert_eq!(count(&spv, Op::Constant), 2);
    let composite = find(&spv, Op::ConstantComposite);
    assert_eq!(composite.len(), 1);
    let elements = id_refs(composite[0]);
    assert_eq!(elements[0], elements[2]);
    assert_ne!(elements[0], elements[1]);
}
