//! Structured SSA shader IR.
//!
//! The IR is a set of flat arenas owned by [`Module`] and referenced by typed IDs:
//! - **Values** ([`ValueId`]) are defined exactly once, by an instruction result, a
//!   function parameter or a block parameter.
//! - **Blocks** ([`BlockId`]) hold an ordered instruction list ending in a terminator.
//! - **Control instructions** (if / loop / switch) own their child blocks. Exits
//!   out of a construct carry the construct's result values, like block arguments:
//!
//! ```text
//! %r = if %cond [t: bb1, f: bb2]
//!   bb1:
//!     exit_if 1i
//!   bb2:
//!     exit_if 2i
//! ```
//!
//! Constants live in the content-addressed [`ConstantPool`].

pub mod builder;
pub mod constant;
pub mod inst;
pub mod ops;
pub mod types;


use std::fmt;

use serde::{Deserialize, Serialize};

pub use constant::{ConstId, Constant, ConstantPool, Scalar};
pub use inst::{Case, CaseSelector, IfInst, Inst, InstKind, LoopInst, SwitchInst, VarInst};
pub use ops::*;
pub use types::{Access, AddressSpace, ArrayCount, SamplerKind, StructDef, StructId, StructMember};
pub use types::{TexelFormat, TextureDimension, Type};

use crate::ice;

// =============================================================================
// ID Types
// =============================================================================

/// Non-constant SSA value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for ValueId {
    fn from(id: u32) -> Self {
        ValueId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstId(pub u32);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for InstId {
    fn from(id: u32) -> Self {
        InstId(id)
    }
}

/// BlockId(0) is always the module's root block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub const ROOT: BlockId = BlockId(0);
}

impl From<u32> for BlockId {
    fn from(id: u32) -> Self {
        BlockId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncId(pub u32);

impl FuncId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for FuncId {
    fn from(id: u32) -> Self {
        FuncId(id)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

// =============================================================================
// Values
// =============================================================================

/// An instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Constant(ConstId),
    Ssa(ValueId),
    /// Raw literal word, only meaningful as a SPIR-V builtin argument.
    Literal(u32),
}

impl From<ValueId> for Value {
    fn from(id: ValueId) -> Self {
        Value::Ssa(id)
    }
}

impl From<ConstId> for Value {
    fn from(id: ConstId) -> Self {
        Value::Constant(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueOrigin {
    InstResult(InstId),
    FunctionParam(FuncId),
    BlockParam(BlockId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDef {
    pub ty: Type,
    pub name: Option<String>,
    pub origin: ValueOrigin,
}

// =============================================================================
// Functions and blocks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<ValueId>,
    pub return_type: Type,
    pub stage: PipelineStage,
    /// Required for compute entry points.
    pub workgroup_size: Option<[u32; 3]>,
    pub block: BlockId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Ordered instructions; the last one is the terminator once the block is closed.
    pub insts: Vec<InstId>,
    /// Block parameters of a multi-in block (loop body and continuing).
    pub params: Vec<ValueId>,
    /// The control instruction owning this block, if any.
    pub parent: Option<InstId>,
    /// Sibling branches into a multi-in block, in creation order.
    pub inbound: Vec<InstId>,
}

// =============================================================================
// Module
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub structs: Vec<StructDef>,
    pub constants: ConstantPool,
    pub values: Vec<ValueDef>,
    pub insts: Vec<Inst>,
    pub blocks: Vec<Block>,
    pub functions: Vec<Function>,
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    /// Create an empty module with its root block.
    pub fn new() -> Self {
        Module {
            structs: Vec::new(),
            constants: ConstantPool::new(),
            values: Vec::new(),
            insts: Vec::new(),
            blocks: vec![Block::default()],
            functions: Vec::new(),
        }
    }

    pub fn root_block(&self) -> &Block {
        self.block(BlockId::ROOT)
    }

    pub fn add_struct(&mut self, def: StructDef) -> StructId {
        self.structs.push(def);
        StructId((self.structs.len() - 1) as u32)
    }

    pub fn struct_def(&self, id: StructId) -> &StructDef {
        match self.structs.get(id.index()) {
            Some(def) => def,
            None => ice!("unknown struct {:?}", id),
        }
    }

    pub fn value(&self, id: ValueId) -> &ValueDef {
        match self.values.get(id.index()) {
            Some(def) => def,
            None => ice!("unknown value {}", id),
        }
    }

    pub fn inst(&self, id: InstId) -> &Inst {
        match self.insts.get(id.index()) {
            Some(inst) => inst,
            None => ice!("unknown instruction {}", id),
        }
    }

    pub fn block(&self, id: BlockId) -> &Block {
        match self.blocks.get(id.index()) {
            Some(block) => block,
            None => ice!("unknown block {}", id),
        }
    }

    pub fn function(&self, id: FuncId) -> &Function {
        match self.functions.get(id.index()) {
            Some(func) => func,
            None => ice!("unknown function {:?}", id),
        }
    }

    pub fn name_of(&self, id: ValueId) -> Option<&str> {
        self.value(id).name.as_deref()
    }

    pub fn value_type(&self, value: Value) -> Type {
        match value {
            Value::Constant(c) => self.constants.type_of(c),
            Value::Ssa(id) => self.value(id).ty.clone(),
            Value::Literal(_) => Type::U32,
        }
    }

    /// The block's terminator, if it has been closed.
    pub fn terminator(&self, block: BlockId) -> Option<InstId> {
        let last = *self.block(block).insts.last()?;
        self.inst(last).kind.is_terminator().then_some(last)
    }

    /// Type of component `index` of a composite type.
    pub fn element_type(&self, ty: &Type, index: u32) -> Type {
        match ty {
            Type::Vector { elem, .. } | Type::Array { elem, .. } => (**elem).clone(),
            Type::Matrix { .. } => match ty.column_type() {
                Some(column) => column,
                None => ice!("matrix without column type"),
            },
            Type::Struct(id) => match self.struct_def(*id).members.get(index as usize) {
                Some(member) => member.ty.clone(),
                None => ice!("struct {:?} has no member {}", id, index),
            },
            other => ice!("cannot index into type {:?}", other),
        }
    }

    /// Visit every block reachable from `block`, including nested control blocks.
    pub fn walk_blocks(&self, block: BlockId, f: &mut impl FnMut(BlockId)) {
        f(block);
        for &inst in &self.block(block).insts {
            for child in self.inst(inst).kind.child_blocks() {
                self.walk_blocks(child, f);
            }
        }
    }
}
