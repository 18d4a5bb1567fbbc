//! IR module builder.
//!
//! Provides a safe API for constructing IR modules, ensuring:
//! - Instructions are only added to a selected, unterminated block
//! - Result values get their types and origins recorded
//! - Exits and sibling branches are registered with the construct they target

use thiserror::Error;

use super::constant::{ConstId, Constant, ConstantPool, Scalar};
use super::inst::{Case, CaseSelector, IfInst, Inst, InstKind, LoopInst, SwitchInst, VarInst};
use super::ops::{BinaryOp, BuiltinFn, PipelineStage, SpirvBuiltinFn, UnaryOp};
use super::types::{StructDef, Type};
use super::{Block, BlockId, FuncId, Function, InstId, Module, Value, ValueDef, ValueId, ValueOrigin};

/// Error during module building.
#[derive(Debug, Clone, Error)]
pub enum BuilderError {
    #[error("no current block selected")]
    NoCurrentBlock,
    #[error("block {0} already terminated")]
    BlockAlreadyTerminated(BlockId),
    #[error("expected a pointer, found {0:?}")]
    NotAPointer(Type),
    #[error("expected a vector, found {0:?}")]
    NotAVector(Type),
    #[error("{inst} is not a {expected} instruction")]
    WrongControlKind { expected: &'static str, inst: InstId },
}

pub type BuildResult<T> = std::result::Result<T, BuilderError>;

/// Blocks and results of a newly created `if`.
#[derive(Debug, Clone)]
pub struct IfHandle {
    pub inst: InstId,
    pub true_block: BlockId,
    pub false_block: BlockId,
    pub results: Vec<Value>,
}

/// Blocks and results of a newly created `loop`.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    pub inst: InstId,
    pub body: BlockId,
    pub continuing: BlockId,
    pub results: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct SwitchHandle {
    pub inst: InstId,
    pub results: Vec<Value>,
}

/// Builder appending to an IR [`Module`].
///
/// # Example
///
/// ```ignore
/// let mut module = Module::new();
/// let mut b = Builder::new(&mut module);
/// b.function("main", Type::F32, PipelineStage::None);
/// let one = b.f32(1.0);
/// let two = b.f32(2.0);
/// let sum = b.binary(BinaryOp::Add, Type::F32, one, two)?;
/// b.return_(Some(sum))?;
/// ```
pub struct Builder<'m> {
    module: &'m mut Module,
    current_block: Option<BlockId>,
}

impl<'m> Builder<'m> {
    /// Create a builder whose current block is the module's root block.
    pub fn new(module: &'m mut Module) -> Self {
        Builder {
            module,
            current_block: Some(BlockId::ROOT),
        }
    }

    pub fn module(&self) -> &Module {
        &*self.module
    }

    pub fn constants(&mut self) -> &mut ConstantPool {
        &mut self.module.constants
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    /// Select the block that subsequent instructions are appended to.
    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    /// Select the module's root block, which holds module-scope variables.
    pub fn switch_to_root(&mut self) {
        self.current_block = Some(BlockId::ROOT);
    }

    fn new_block(&mut self, parent: Option<InstId>) -> BlockId {
        self.module.blocks.push(Block {
            parent,
            ..Block::default()
        });
        BlockId((self.module.blocks.len() - 1) as u32)
    }

    fn new_value(&mut self, ty: Type, origin: ValueOrigin) -> ValueId {
        self.module.values.push(ValueDef { ty, name: None, origin });
        ValueId((self.module.values.len() - 1) as u32)
    }

    fn next_inst_id(&self) -> InstId {
        InstId(self.module.insts.len() as u32)
    }

    /// Append an instruction to the current block.
    fn push(&mut self, kind: InstKind, result_types: Vec<Type>) -> BuildResult<(InstId, Vec<Value>)> {
        let block = self.current_block.ok_or(BuilderError::NoCurrentBlock)?;
        if self.module.terminator(block).is_some() {
            return Err(BuilderError::BlockAlreadyTerminated(block));
        }
        let id = self.next_inst_id();
        let results: Vec<ValueId> = result_types
            .into_iter()
            .map(|ty| self.new_value(ty, ValueOrigin::InstResult(id)))
            .collect();
        let values = results.iter().map(|&r| Value::Ssa(r)).collect();
        self.module.insts.push(Inst { kind, results, block });
        self.module.blocks[block.index()].insts.push(id);
        Ok((id, values))
    }

    fn push_value(&mut self, kind: InstKind, ty: Type) -> BuildResult<Value> {
        let (_, results) = self.push(kind, vec![ty])?;
        Ok(results[0])
    }

    fn push_void(&mut self, kind: InstKind) -> BuildResult<InstId> {
        let (id, _) = self.push(kind, Vec::new())?;
        Ok(id)
    }

    // =========================================================================
    // Module-level declarations
    // =========================================================================

    /// Add a function and select its entry block.
    pub fn function(&mut self, name: &str, return_type: Type, stage: PipelineStage) -> FuncId {
        let block = self.new_block(None);
        self.module.functions.push(Function {
            name: name.to_string(),
            params: Vec::new(),
            return_type,
            stage,
            workgroup_size: None,
            block,
        });
        self.current_block = Some(block);
        FuncId((self.module.functions.len() - 1) as u32)
    }

    /// Add a compute entry point with the given workgroup size.
    pub fn compute_function(&mut self, name: &str, workgroup_size: [u32; 3]) -> FuncId {
        let func = self.function(name, Type::Void, PipelineStage::Compute);
        self.module.functions[func.index()].workgroup_size = Some(workgroup_size);
        func
    }

    pub fn param(&mut self, func: FuncId, ty: Type, name: Option<&str>) -> Value {
        let id = self.new_value(ty, ValueOrigin::FunctionParam(func));
        self.module.values[id.index()].name = name.map(str::to_string);
        self.module.functions[func.index()].params.push(id);
        Value::Ssa(id)
    }

    /// Add a parameter to a multi-in block.
    pub fn block_param(&mut self, block: BlockId, ty: Type) -> Value {
        let id = self.new_value(ty, ValueOrigin::BlockParam(block));
        self.module.blocks[block.index()].params.push(id);
        Value::Ssa(id)
    }

    pub fn add_struct(&mut self, def: StructDef) -> Type {
        Type::Struct(self.module.add_struct(def))
    }

    /// Name a non-constant value. Constants are content-addressed and stay unnamed.
    pub fn set_name(&mut self, value: Value, name: &str) {
        if let Value::Ssa(id) = value {
            self.module.values[id.index()].name = Some(name.to_string());
        }
    }

    // =========================================================================
    // Constants
    // =========================================================================

    pub fn constant(&mut self, constant: Constant) -> Value {
        Value::Constant(self.module.constants.insert(constant))
    }

    pub fn scalar(&mut self, scalar: Scalar) -> Value {
        Value::Constant(self.module.constants.scalar(scalar))
    }

    pub fn bool(&mut self, value: bool) -> Value {
        self.scalar(Scalar::Bool(value))
    }

    pub fn i32(&mut self, value: i32) -> Value {
        self.scalar(Scalar::I32(value))
    }

    pub fn u32(&mut self, value: u32) -> Value {
        self.scalar(Scalar::U32(value))
    }

    pub fn f32(&mut self, value: f32) -> Value {
        self.scalar(Scalar::f32(value))
    }

    pub fn composite(&mut self, ty: Type, elements: Vec<ConstId>) -> Value {
        self.constant(Constant::Composite { ty, elements })
    }

    pub fn splat(&mut self, ty: Type, element: ConstId, count: u32) -> Value {
        self.constant(Constant::Splat { ty, element, count })
    }

    // =========================================================================
    // Instructions
    // =========================================================================

    pub fn binary(&mut self, op: BinaryOp, ty: Type, lhs: Value, rhs: Value) -> BuildResult<Value> {
        self.push_value(InstKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn unary(&mut self, op: UnaryOp, ty: Type, value: Value) -> BuildResult<Value> {
        self.push_value(InstKind::Unary { op, value }, ty)
    }

    pub fn bitcast(&mut self, ty: Type, value: Value) -> BuildResult<Value> {
        self.push_value(InstKind::Bitcast { value }, ty)
    }

    pub fn convert(&mut self, ty: Type, value: Value) -> BuildResult<Value> {
        self.push_value(InstKind::Convert { value }, ty)
    }

    pub fn construct(&mut self, ty: Type, args: Vec<Value>) -> BuildResult<Value> {
        self.push_value(InstKind::Construct { args }, ty)
    }

    pub fn swizzle(&mut self, ty: Type, object: Value, indices: Vec<u32>) -> BuildResult<Value> {
        self.push_value(InstKind::Swizzle { object, indices }, ty)
    }

    /// Index into a composite value, or into a pointer to one when `ty` is a pointer.
    pub fn access(&mut self, ty: Type, object: Value, indices: Vec<Value>) -> BuildResult<Value> {
        self.push_value(InstKind::Access { object, indices }, ty)
    }

    fn pointee_of(&self, pointer: Value) -> BuildResult<Type> {
        let ty = self.module.value_type(pointer);
        match ty.pointee() {
            Some(store) => Ok(store.clone()),
            None => Err(BuilderError::NotAPointer(ty)),
        }
    }

    pub fn load(&mut self, from: Value) -> BuildResult<Value> {
        let ty = self.pointee_of(from)?;
        self.push_value(InstKind::Load { from }, ty)
    }

    pub fn store(&mut self, to: Value, value: Value) -> BuildResult<()> {
        self.push_void(InstKind::Store { to, value }).map(|_| ())
    }

    pub fn load_vector_element(&mut self, from: Value, index: Value) -> BuildResult<Value> {
        let ty = match self.pointee_of(from)? {
            Type::Vector { elem, .. } => *elem,
            other => return Err(BuilderError::NotAVector(other)),
        };
        self.push_value(InstKind::LoadVectorElement { from, index }, ty)
    }

    pub fn store_vector_element(&mut self, to: Value, index: Value, value: Value) -> BuildResult<()> {
        self.push_void(InstKind::StoreVectorElement { to, index, value }).map(|_| ())
    }

    /// Declare a variable; `ty` is the pointer type of the result.
    pub fn var(&mut self, ty: Type, var: VarInst) -> BuildResult<Value> {
        if ty.pointee().is_none() {
            return Err(BuilderError::NotAPointer(ty));
        }
        self.push_value(InstKind::Var(var), ty)
    }

    pub fn let_(&mut self, value: Value) -> BuildResult<Value> {
        let ty = self.module.value_type(value);
        self.push_value(InstKind::Let { value }, ty)
    }

    pub fn builtin(&mut self, ty: Type, func: BuiltinFn, args: Vec<Value>) -> BuildResult<Value> {
        self.push_value(InstKind::CoreBuiltinCall { func, args }, ty)
    }

    pub fn builtin_void(&mut self, func: BuiltinFn, args: Vec<Value>) -> BuildResult<()> {
        self.push_void(InstKind::CoreBuiltinCall { func, args }).map(|_| ())
    }

    pub fn spirv_builtin(&mut self, ty: Type, func: SpirvBuiltinFn, args: Vec<Value>) -> BuildResult<Value> {
        self.push_value(InstKind::SpirvBuiltinCall { func, args }, ty)
    }

    pub fn spirv_builtin_void(&mut self, func: SpirvBuiltinFn, args: Vec<Value>) -> BuildResult<()> {
        self.push_void(InstKind::SpirvBuiltinCall { func, args }).map(|_| ())
    }

    pub fn call(&mut self, target: FuncId, args: Vec<Value>) -> BuildResult<Value> {
        let ty = self.module.function(target).return_type.clone();
        self.push_value(InstKind::UserCall { target, args }, ty)
    }

    pub fn call_void(&mut self, target: FuncId, args: Vec<Value>) -> BuildResult<()> {
        self.push_void(InstKind::UserCall { target, args }).map(|_| ())
    }

    // =========================================================================
    // Control instructions
    // =========================================================================

    pub fn if_(&mut self, condition: Value, result_types: Vec<Type>) -> BuildResult<IfHandle> {
        let inst = self.next_inst_id();
        let true_block = self.new_block(Some(inst));
        let false_block = self.new_block(Some(inst));
        let kind = InstKind::If(IfInst {
            condition,
            true_block,
            false_block,
            exits: Vec::new(),
        });
        let (inst, results) = self.push(kind, result_types)?;
        Ok(IfHandle {
            inst,
            true_block,
            false_block,
            results,
        })
    }

    pub fn loop_(&mut self, result_types: Vec<Type>) -> BuildResult<LoopHandle> {
        let inst = self.next_inst_id();
        let body = self.new_block(Some(inst));
        let continuing = self.new_block(Some(inst));
        let kind = InstKind::Loop(LoopInst {
            initializer: None,
            body,
            continuing,
            exits: Vec::new(),
        });
        let (inst, results) = self.push(kind, result_types)?;
        Ok(LoopHandle {
            inst,
            body,
            continuing,
            results,
        })
    }

    /// Give a loop an initializer block, which runs once before the first iteration.
    pub fn loop_initializer(&mut self, target: InstId) -> BuildResult<BlockId> {
        let block = self.new_block(Some(target));
        match &mut self.module.insts[target.index()].kind {
            InstKind::Loop(l) => {
                l.initializer = Some(block);
                Ok(block)
            }
            _ => Err(BuilderError::WrongControlKind {
                expected: "loop",
                inst: target,
            }),
        }
    }

    pub fn switch(&mut self, condition: Value, result_types: Vec<Type>) -> BuildResult<SwitchHandle> {
        let kind = InstKind::Switch(SwitchInst {
            condition,
            cases: Vec::new(),
            exits: Vec::new(),
        });
        let (inst, results) = self.push(kind, result_types)?;
        Ok(SwitchHandle { inst, results })
    }

    /// Add a case to a switch and return its block.
    pub fn case(&mut self, target: InstId, selectors: Vec<CaseSelector>) -> BuildResult<BlockId> {
        let block = self.new_block(Some(target));
        match &mut self.module.insts[target.index()].kind {
            InstKind::Switch(s) => {
                s.cases.push(Case { selectors, block });
                Ok(block)
            }
            _ => Err(BuilderError::WrongControlKind {
                expected: "switch",
                inst: target,
            }),
        }
    }

    // =========================================================================
    // Terminators
    // =========================================================================

    fn loop_of(&self, target: InstId) -> BuildResult<&LoopInst> {
        match &self.module.inst(target).kind {
            InstKind::Loop(l) => Ok(l),
            _ => Err(BuilderError::WrongControlKind {
                expected: "loop",
                inst: target,
            }),
        }
    }

    fn register_exit(&mut self, target: InstId, exit: InstId, expected: &'static str) -> BuildResult<()> {
        let exits = match (&mut self.module.insts[target.index()].kind, expected) {
            (InstKind::If(i), "if") => &mut i.exits,
            (InstKind::Loop(l), "loop") => &mut l.exits,
            (InstKind::Switch(s), "switch") => &mut s.exits,
            _ => return Err(BuilderError::WrongControlKind { expected, inst: target }),
        };
        exits.push(exit);
        Ok(())
    }

    fn register_inbound(&mut self, block: BlockId, branch: InstId) {
        self.module.blocks[block.index()].inbound.push(branch);
    }

    pub fn return_(&mut self, value: Option<Value>) -> BuildResult<()> {
        self.push_void(InstKind::Return { value }).map(|_| ())
    }

    pub fn exit_if(&mut self, target: InstId, args: Vec<Value>) -> BuildResult<()> {
        let exit = self.push_void(InstKind::ExitIf { target, args })?;
        self.register_exit(target, exit, "if")
    }

    pub fn exit_loop(&mut self, target: InstId, args: Vec<Value>) -> BuildResult<()> {
        let exit = self.push_void(InstKind::ExitLoop { target, args })?;
        self.register_exit(target, exit, "loop")
    }

    pub fn exit_switch(&mut self, target: InstId, args: Vec<Value>) -> BuildResult<()> {
        let exit = self.push_void(InstKind::ExitSwitch { target, args })?;
        self.register_exit(target, exit, "switch")
    }

    /// Leave the loop if `condition` holds, otherwise start the next iteration.
    pub fn break_if(
        &mut self,
        target: InstId,
        condition: Value,
        next_iter_args: Vec<Value>,
        exit_args: Vec<Value>,
    ) -> BuildResult<()> {
        let body = self.loop_of(target)?.body;
        let exit = self.push_void(InstKind::BreakIf {
            condition,
            target,
            next_iter_args,
            exit_args,
        })?;
        self.register_exit(target, exit, "loop")?;
        self.register_inbound(body, exit);
        Ok(())
    }

    pub fn continue_(&mut self, target: InstId, args: Vec<Value>) -> BuildResult<()> {
        let continuing = self.loop_of(target)?.continuing;
        let branch = self.push_void(InstKind::Continue { target, args })?;
        self.register_inbound(continuing, branch);
        Ok(())
    }

    pub fn next_iteration(&mut self, target: InstId, args: Vec<Value>) -> BuildResult<()> {
        let body = self.loop_of(target)?.body;
        let branch = self.push_void(InstKind::NextIteration { target, args })?;
        self.register_inbound(body, branch);
        Ok(())
    }

    pub fn terminate_invocation(&mut self) -> BuildResult<()> {
        self.push_void(InstKind::TerminateInvocation).map(|_| ())
    }

    pub fn unreachable(&mut self) -> BuildResult<()> {
        self.push_void(InstKind::Unreachable).map(|_| ())
    }
}
