//! Type interning.
//!
//! Every type is deduplicated to its target-level identity before lookup, so types
//! that SPIR-V cannot tell apart share one declaration.

use log::trace;
use rspirv::spirv::{Capability, Decoration, Dim, ImageFormat, Op, Word};

use super::instruction::Operand;
use super::printer::{Printer, storage_class};
use crate::ir::{Access, ArrayCount, SamplerKind, StructId, TexelFormat, TextureDimension, Type};
use crate::{ice, operands};

/// Collapse type distinctions that do not exist in SPIR-V.
///
/// Idempotent: `dedup_type(&dedup_type(t)) == dedup_type(t)`.
pub(super) fn dedup_type(ty: &Type) -> Type {
    match ty {
        // Atomics are plain scalars at the type level.
        Type::Atomic(inner) => dedup_type(inner),
        // Depth textures are declared as regular f32 textures.
        Type::DepthTexture { dim } => Type::SampledTexture {
            dim: *dim,
            sampled: Box::new(Type::F32),
        },
        Type::DepthMultisampledTexture { dim } => Type::MultisampledTexture {
            dim: *dim,
            sampled: Box::new(Type::F32),
        },
        // The access mode is a decoration on the variable, not part of the type.
        Type::StorageTexture {
            dim,
            format,
            sampled,
            ..
        } => Type::StorageTexture {
            dim: *dim,
            format: *format,
            access: Access::Read,
            sampled: sampled.clone(),
        },
        Type::Sampler(_) => Type::Sampler(SamplerKind::Sampler),
        Type::SampledImage(image) => Type::SampledImage(Box::new(dedup_type(image))),
        Type::Pointer {
            address_space,
            store,
            access,
        } => Type::Pointer {
            address_space: *address_space,
            store: Box::new(dedup_type(store)),
            access: *access,
        },
        Type::Array { elem, count, stride } => Type::Array {
            elem: Box::new(dedup_type(elem)),
            count: *count,
            stride: *stride,
        },
        other => other.clone(),
    }
}

impl Printer<'_> {
    /// The ID of `ty`, emitting its declaration (and those of its components) on first use.
    pub(super) fn type_id(&mut self, ty: &Type) -> Word {
        let ty = dedup_type(ty);
        if let Some(&id) = self.types.get(&ty) {
            return id;
        }
        let id = self.module.next_id();
        self.emit_type(id, &ty);
        trace!("type {:?} -> %{}", ty, id);
        self.types.insert(ty, id);
        id
    }

    fn emit_type(&mut self, id: Word, ty: &Type) {
        match ty {
            Type::Void => self.module.push_type(Op::TypeVoid, operands![id]),
            Type::Bool => self.module.push_type(Op::TypeBool, operands![id]),
            Type::I32 => self.module.push_type(Op::TypeInt, operands![id, 32u32, 1u32]),
            Type::U32 => self.module.push_type(Op::TypeInt, operands![id, 32u32, 0u32]),
            Type::F32 => self.module.push_type(Op::TypeFloat, operands![id, 32u32]),
            Type::F16 => {
                self.module.push_capability(Capability::Float16);
                self.module.push_capability(Capability::UniformAndStorageBuffer16BitAccess);
                self.module.push_capability(Capability::StorageBuffer16BitAccess);
                self.module.push_type(Op::TypeFloat, operands![id, 16u32]);
            }
            Type::Vector { elem, width } => {
                let elem = self.type_id(elem);
                self.module.push_type(Op::TypeVector, operands![id, elem, *width]);
            }
            Type::Matrix { columns, .. } => {
                let Some(column) = ty.column_type() else {
                    ice!("matrix without column type");
                };
                let column = self.type_id(&column);
                self.module.push_type(Op::TypeMatrix, operands![id, column, *columns]);
            }
            Type::Array { elem, count, stride } => {
                let elem = self.type_id(elem);
                match count {
                    ArrayCount::Constant(n) => {
                        let count = self.constants.u32(*n);
                        let count = self.constant_id(count);
                        self.module.push_type(Op::TypeArray, operands![id, elem, count]);
                    }
                    ArrayCount::Runtime => {
                        self.module.push_type(Op::TypeRuntimeArray, operands![id, elem]);
                    }
                }
                self.module
                    .push_annot(Op::Decorate, operands![id, Decoration::ArrayStride, *stride]);
            }
            Type::Pointer {
                address_space, store, ..
            } => {
                let store = self.type_id(store);
                let class = storage_class(*address_space);
                self.module.push_type(Op::TypePointer, operands![id, class, store]);
            }
            Type::Struct(def) => self.emit_struct_type(id, *def),
            Type::Sampler(_) => self.module.push_type(Op::TypeSampler, operands![id]),
            Type::SampledTexture { .. }
            | Type::MultisampledTexture { .. }
            | Type::StorageTexture { .. }
            | Type::InputAttachment { .. } => self.emit_texture_type(id, ty),
            Type::SampledImage(image) => {
                let image = self.type_id(image);
                self.module.push_type(Op::TypeSampledImage, operands![id, image]);
            }
            Type::Atomic(_) | Type::DepthTexture { .. } | Type::DepthMultisampledTexture { .. } => {
                ice!("unhandled type {:?} reached declaration without deduplication", ty)
            }
        }
    }

    fn emit_struct_type(&mut self, id: Word, def_id: StructId) {
        let ir = self.ir;
        let def = ir.struct_def(def_id);

        let mut operands = operands![id];
        for (index, member) in def.members.iter().enumerate() {
            let index = index as u32;
            operands.push(Operand::IdRef(self.type_id(&member.ty)));

            self.module.push_annot(
                Op::MemberDecorate,
                operands![id, index, Decoration::Offset, member.offset],
            );

            // Matrices, possibly nested in arrays, need an explicit layout.
            let mut nested = &member.ty;
            while let Type::Array { elem, .. } = nested {
                nested = elem;
            }
            if let Type::Matrix { elem, rows, .. } = nested {
                let effective_rows = if *rows == 2 { 2 } else { 4 };
                let scalar_size = match elem.scalar_size() {
                    Some(size) => size,
                    None => ice!("matrix with non-scalar element {:?}", elem),
                };
                self.module
                    .push_annot(Op::MemberDecorate, operands![id, index, Decoration::ColMajor]);
                self.module.push_annot(
                    Op::MemberDecorate,
                    operands![id, index, Decoration::MatrixStride, effective_rows * scalar_size],
                );
            }

            if let Some(name) = &member.name {
                self.module
                    .push_debug(Op::MemberName, operands![id, index, name.as_str()]);
            }
        }
        self.module.push_type(Op::TypeStruct, operands);

        if def.block {
            self.module
                .push_annot(Op::Decorate, operands![id, Decoration::Block]);
        }
        if let Some(name) = &def.name {
            self.emit_name(id, name);
        }
    }

    fn emit_texture_type(&mut self, id: Word, ty: &Type) {
        let (sampled_type, dim) = match ty {
            Type::SampledTexture { dim, sampled }
            | Type::MultisampledTexture { dim, sampled }
            | Type::StorageTexture { dim, sampled, .. } => (self.type_id(sampled), *dim),
            Type::InputAttachment { sampled } => (self.type_id(sampled), TextureDimension::D2),
            other => ice!("{:?} is not a texture type", other),
        };

        let arrayed = dim.is_arrayed() as u32;
        let spv_dim = match dim {
            TextureDimension::D1 => {
                match ty {
                    Type::SampledTexture { .. } => self.module.push_capability(Capability::Sampled1D),
                    Type::StorageTexture { .. } => self.module.push_capability(Capability::Image1D),
                    _ => {}
                }
                Dim::Dim1D
            }
            TextureDimension::D2 if matches!(ty, Type::InputAttachment { .. }) => {
                self.module.push_capability(Capability::InputAttachment);
                Dim::DimSubpassData
            }
            TextureDimension::D2 | TextureDimension::D2Array => Dim::Dim2D,
            TextureDimension::D3 => Dim::Dim3D,
            TextureDimension::Cube => Dim::DimCube,
            TextureDimension::CubeArray => {
                if matches!(ty, Type::SampledTexture { .. }) {
                    self.module.push_capability(Capability::SampledCubeArray);
                }
                Dim::DimCube
            }
            TextureDimension::None => ice!("unhandled texture dimension {:?}", dim),
        };

        // Vulkan ignores the depth operand.
        let depth = 0u32;
        let multisampled = matches!(ty, Type::MultisampledTexture { .. }) as u32;
        let sampled = if matches!(
            ty,
            Type::SampledTexture { .. } | Type::MultisampledTexture { .. }
        ) {
            1u32
        } else {
            2u32
        };
        let format = match ty {
            Type::StorageTexture { format, .. } => self.texel_format(*format),
            _ => ImageFormat::Unknown,
        };

        self.module.push_type(
            Op::TypeImage,
            operands![
                id,
                sampled_type,
                spv_dim,
                depth,
                arrayed,
                multisampled,
                sampled,
                format
            ],
        );
    }

    fn texel_format(&mut self, format: TexelFormat) -> ImageFormat {
        match format {
            TexelFormat::Bgra8Unorm => {
                ice!("bgra8unorm should have been polyfilled to rgba8unorm")
            }
            TexelFormat::R8Unorm => {
                self.module.push_capability(Capability::StorageImageExtendedFormats);
                ImageFormat::R8
            }
            TexelFormat::R32Float => ImageFormat::R32f,
            TexelFormat::R32Sint => ImageFormat::R32i,
            TexelFormat::R32Uint => ImageFormat::R32ui,
            TexelFormat::Rg32Float => {
                self.module.push_capability(Capability::StorageImageExtendedFormats);
                ImageFormat::Rg32f
            }
            TexelFormat::Rg32Sint => {
                self.module.push_capability(Capability::StorageImageExtendedFormats);
                ImageFormat::Rg32i
            }
            TexelFormat::Rg32Uint => {
                self.module.push_capability(Capability::StorageImageExtendedFormats);
                ImageFormat::Rg32ui
            }
            TexelFormat::Rgba16Float => ImageFormat::Rgba16f,
            TexelFormat::Rgba16Sint => ImageFormat::Rgba16i,
            TexelFormat::Rgba16Uint => ImageFormat::Rgba16ui,
            TexelFormat::Rgba32Float => ImageFormat::Rgba32f,
            TexelFormat::Rgba32Sint => ImageFormat::Rgba32i,
            TexelFormat::Rgba32Uint => ImageFormat::Rgba32ui,
            TexelFormat::Rgba8Sint => ImageFormat::Rgba8i,
            TexelFormat::Rgba8Snorm => ImageFormat::Rgba8Snorm,
            TexelFormat::Rgba8Uint => ImageFormat::Rgba8ui,
            TexelFormat::Rgba8Unorm => ImageFormat::Rgba8,
            TexelFormat::Undefined => ImageFormat::Unknown,
        }
    }
}
