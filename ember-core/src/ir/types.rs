//! IR types.
//!
//! Types are plain structural values: two types are the same type iff they compare
//! equal. Structs are the exception and are referenced by [`StructId`] into the
//! module's struct table.

use serde::{Deserialize, Serialize};

/// Index into [`super::Module::structs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructId(pub u32);

impl StructId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for StructId {
    fn from(id: u32) -> Self {
        StructId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressSpace {
    Undefined,
    Function,
    Private,
    Workgroup,
    Uniform,
    Storage,
    Handle,
    PushConstant,
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureDimension {
    None,
    D1,
    D2,
    D2Array,
    D3,
    Cube,
    CubeArray,
}

impl TextureDimension {
    pub fn is_arrayed(self) -> bool {
        matches!(self, TextureDimension::D2Array | TextureDimension::CubeArray)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexelFormat {
    Bgra8Unorm,
    Rgba8Unorm,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Float,
    R8Unorm,
    R32Uint,
    R32Sint,
    R32Float,
    Rg32Uint,
    Rg32Sint,
    Rg32Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba32Float,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplerKind {
    Sampler,
    Comparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayCount {
    Constant(u32),
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Bool,
    I32,
    U32,
    F32,
    F16,
    Vector {
        elem: Box<Type>,
        width: u32,
    },
    /// Column-major matrix of `columns` vectors, each `rows` wide.
    Matrix {
        elem: Box<Type>,
        columns: u32,
        rows: u32,
    },
    Array {
        elem: Box<Type>,
        count: ArrayCount,
        stride: u32,
    },
    Atomic(Box<Type>),
    Pointer {
        address_space: AddressSpace,
        store: Box<Type>,
        access: Access,
    },
    Struct(StructId),
    Sampler(SamplerKind),
    SampledTexture {
        dim: TextureDimension,
        sampled: Box<Type>,
    },
    MultisampledTexture {
        dim: TextureDimension,
        sampled: Box<Type>,
    },
    DepthTexture {
        dim: TextureDimension,
    },
    DepthMultisampledTexture {
        dim: TextureDimension,
    },
    StorageTexture {
        dim: TextureDimension,
        format: TexelFormat,
        access: Access,
        sampled: Box<Type>,
    },
    InputAttachment {
        sampled: Box<Type>,
    },
    SampledImage(Box<Type>),
}

impl Type {
    pub fn vec(elem: Type, width: u32) -> Type {
        Type::Vector {
            elem: Box::new(elem),
            width,
        }
    }

    pub fn mat(elem: Type, columns: u32, rows: u32) -> Type {
        Type::Matrix {
            elem: Box::new(elem),
            columns,
            rows,
        }
    }

    pub fn array(elem: Type, count: u32, stride: u32) -> Type {
        Type::Array {
            elem: Box::new(elem),
            count: ArrayCount::Constant(count),
            stride,
        }
    }

    pub fn runtime_array(elem: Type, stride: u32) -> Type {
        Type::Array {
            elem: Box::new(elem),
            count: ArrayCount::Runtime,
            stride,
        }
    }

    pub fn ptr(address_space: AddressSpace, store: Type, access: Access) -> Type {
        Type::Pointer {
            address_space,
            store: Box::new(store),
            access,
        }
    }

    /// The column vector type of a matrix.
    pub fn column_type(&self) -> Option<Type> {
        match self {
            Type::Matrix { elem, rows, .. } => Some(Type::vec((**elem).clone(), *rows)),
            _ => None,
        }
    }

    /// Innermost element through vectors, matrices and arrays.
    pub fn deepest_element(&self) -> &Type {
        match self {
            Type::Vector { elem, .. } | Type::Matrix { elem, .. } | Type::Array { elem, .. } => {
                elem.deepest_element()
            }
            _ => self,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Bool | Type::I32 | Type::U32 | Type::F32 | Type::F16)
    }

    pub fn is_float_scalar(&self) -> bool {
        matches!(self, Type::F32 | Type::F16)
    }

    pub fn is_integer_scalar(&self) -> bool {
        matches!(self, Type::I32 | Type::U32)
    }

    fn scalar_or_vector_matches(&self, pred: fn(&Type) -> bool) -> bool {
        match self {
            Type::Vector { elem, .. } => pred(elem),
            other => pred(other),
        }
    }

    pub fn is_float_scalar_or_vector(&self) -> bool {
        self.scalar_or_vector_matches(Type::is_float_scalar)
    }

    pub fn is_signed_integer_scalar_or_vector(&self) -> bool {
        self.scalar_or_vector_matches(|t| matches!(t, Type::I32))
    }

    pub fn is_unsigned_integer_scalar_or_vector(&self) -> bool {
        self.scalar_or_vector_matches(|t| matches!(t, Type::U32))
    }

    pub fn is_integer_scalar_or_vector(&self) -> bool {
        self.scalar_or_vector_matches(Type::is_integer_scalar)
    }

    pub fn is_bool_scalar_or_vector(&self) -> bool {
        self.scalar_or_vector_matches(|t| matches!(t, Type::Bool))
    }

    pub fn is_f16_scalar_or_vector(&self) -> bool {
        self.scalar_or_vector_matches(|t| matches!(t, Type::F16))
    }

    /// The store type, if this is a pointer.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer { store, .. } => Some(store),
            _ => None,
        }
    }

    /// Byte size of scalars and vectors of scalars.
    pub fn scalar_size(&self) -> Option<u32> {
        match self {
            Type::Bool | Type::I32 | Type::U32 | Type::F32 => Some(4),
            Type::F16 => Some(2),
            Type::Vector { elem, width } => elem.scalar_size().map(|s| s * width),
            _ => None,
        }
    }

    /// Vector width, or 1 for anything else.
    pub fn width(&self) -> u32 {
        match self {
            Type::Vector { width, .. } => *width,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructMember {
    pub name: Option<String>,
    pub ty: Type,
    /// Byte offset of the member within the struct.
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructDef {
    pub name: Option<String>,
    pub members: Vec<StructMember>,
    /// Buffer interface structs are decorated `Block`.
    pub block: bool,
}
