//! Content-addressed constant pool.
//!
//! Every constant is interned: inserting a structurally equal constant twice yields
//! the same [`ConstId`]. Code generation synthesizes its own constants through this
//! pool so they share the same identity as constants built by the producer.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::types::Type;
use crate::ice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstId(pub u32);

impl ConstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ConstId {
    fn from(id: u32) -> Self {
        ConstId(id)
    }
}

/// Scalar constant. Floats are stored as their bit patterns so constants are hashable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    I32(i32),
    U32(u32),
    F32(u32),
    F16(u16),
}

impl Scalar {
    pub fn f32(value: f32) -> Self {
        Scalar::F32(value.to_bits())
    }

    pub fn ty(self) -> Type {
        match self {
            Scalar::Bool(_) => Type::Bool,
            Scalar::I32(_) => Type::I32,
            Scalar::U32(_) => Type::U32,
            Scalar::F32(_) => Type::F32,
            Scalar::F16(_) => Type::F16,
        }
    }

    /// Positive zero only: `-0.0` is not a zero value.
    pub fn is_zero(self) -> bool {
        match self {
            Scalar::Bool(b) => !b,
            Scalar::I32(v) => v == 0,
            Scalar::U32(v) => v == 0,
            Scalar::F32(bits) => bits == 0,
            Scalar::F16(bits) => bits == 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Scalar(Scalar),
    /// Vector, matrix, array or struct with one element per component.
    Composite { ty: Type, elements: Vec<ConstId> },
    /// Composite whose components are all `element`.
    Splat { ty: Type, element: ConstId, count: u32 },
}

impl Constant {
    /// A composite whose elements are all the same constant is stored as a splat, so
    /// both spellings of one value intern to the same ID.
    pub fn canonical(self) -> Self {
        match self {
            Constant::Composite { ty, elements }
                if !elements.is_empty() && elements.iter().all(|&e| e == elements[0]) =>
            {
                Constant::Splat {
                    ty,
                    element: elements[0],
                    count: elements.len() as u32,
                }
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "PoolItems")]
pub struct ConstantPool {
    items: IndexSet<Constant>,
}

/// Serialized form of a pool, checked for duplicates before it becomes a [`ConstantPool`].
#[derive(Deserialize)]
struct PoolItems {
    items: Vec<Constant>,
}

impl TryFrom<PoolItems> for ConstantPool {
    type Error = String;

    fn try_from(raw: PoolItems) -> Result<Self, Self::Error> {
        let mut items = IndexSet::with_capacity(raw.items.len());
        for (index, constant) in raw.items.into_iter().enumerate() {
            let constant = constant.canonical();
            if let Some(first) = items.get_index_of(&constant) {
                return Err(format!(
                    "constant {} duplicates constant {}: {:?}",
                    index, first, constant
                ));
            }
            items.insert(constant);
        }
        Ok(ConstantPool { items })
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, constant: Constant) -> ConstId {
        let (index, _) = self.items.insert_full(constant.canonical());
        ConstId(index as u32)
    }

    pub fn get(&self, id: ConstId) -> &Constant {
        match self.items.get_index(id.index()) {
            Some(constant) => constant,
            None => ice!("unknown constant {:?}", id),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn scalar(&mut self, scalar: Scalar) -> ConstId {
        self.insert(Constant::Scalar(scalar))
    }

    pub fn bool(&mut self, value: bool) -> ConstId {
        self.scalar(Scalar::Bool(value))
    }

    pub fn i32(&mut self, value: i32) -> ConstId {
        self.scalar(Scalar::I32(value))
    }

    pub fn u32(&mut self, value: u32) -> ConstId {
        self.scalar(Scalar::U32(value))
    }

    pub fn f32(&mut self, value: f32) -> ConstId {
        self.scalar(Scalar::f32(value))
    }

    pub fn f16_bits(&mut self, bits: u16) -> ConstId {
        self.scalar(Scalar::F16(bits))
    }

    pub fn composite(&mut self, ty: Type, elements: Vec<ConstId>) -> ConstId {
        self.insert(Constant::Composite { ty, elements })
    }

    pub fn splat(&mut self, ty: Type, element: ConstId, count: u32) -> ConstId {
        self.insert(Constant::Splat { ty, element, count })
    }

    pub fn type_of(&self, id: ConstId) -> Type {
        match self.get(id) {
            Constant::Scalar(s) => s.ty(),
            Constant::Composite { ty, .. } | Constant::Splat { ty, .. } => ty.clone(),
        }
    }

    /// True if every scalar reachable from the constant is (positive) zero.
    pub fn all_zero(&self, id: ConstId) -> bool {
        match self.get(id) {
            Constant::Scalar(s) => s.is_zero(),
            Constant::Composite { elements, .. } => elements.iter().all(|&e| self.all_zero(e)),
            Constant::Splat { element, .. } => self.all_zero(*element),
        }
    }

    /// Component `index` of a composite constant.
    pub fn element(&self, id: ConstId, index: usize) -> ConstId {
        match self.get(id) {
            Constant::Composite { elements, .. } => match elements.get(index) {
                Some(&e) => e,
                None => ice!("constant {:?} has no element {}", id, index),
            },
            Constant::Splat { element, .. } => *element,
            Constant::Scalar(s) => ice!("cannot index scalar constant {:?}", s),
        }
    }

    /// The value of an integer scalar constant, reinterpreted as u32.
    pub fn as_u32(&self, id: ConstId) -> Option<u32> {
        match self.get(id) {
            Constant::Scalar(Scalar::I32(v)) => Some(*v as u32),
            Constant::Scalar(Scalar::U32(v)) => Some(*v),
            _ => None,
        }
    }
}
