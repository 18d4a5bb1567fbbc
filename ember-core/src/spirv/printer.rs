//! Module-level lowering: ID allocation, functions, entry points and variables.
//!
//! [`Printer`] owns every output-side table for one lowering. Types, constants,
//! values and labels all get their IDs lazily on first reference, from the single
//! ID counter of the output [`Module`].

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use rspirv::spirv::{
    AddressingModel, BuiltIn, Capability, Decoration, ExecutionMode, ExecutionModel, FunctionControl,
    MemoryModel, Op, StorageClass, Word,
};

use super::Options;
use super::control_flow::Scope;
use super::instruction::{self, Operand};
use super::module::{Function, Module};
use crate::error::Result;
use crate::ir::{
    self, Access, AddressSpace, BlockId, BuiltinValue, ConstId, ConstantPool, FuncId, Inst, InstId, InstKind,
    InterpolationSampling, InterpolationType, IoAttributes, PipelineStage, Type, Value, ValueId,
};
use crate::{bail_spirv, ice, operands};

/// Function type key: return type ID and parameter type IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct FunctionType {
    pub return_type: Word,
    pub params: Vec<Word>,
}

/// SPIR-V has a hard limit on function parameters.
const MAX_FUNCTION_PARAMS: usize = 255;

pub(super) struct Printer<'a> {
    pub(super) ir: &'a ir::Module,
    /// Copy of the input pool; constants synthesized during lowering are added here.
    pub(super) constants: ConstantPool,
    pub(super) module: Module,
    zero_init_workgroup_memory: bool,

    pub(super) types: HashMap<Type, Word>,
    pub(super) function_types: HashMap<FunctionType, Word>,
    pub(super) constant_ids: HashMap<ConstId, Word>,
    pub(super) constant_nulls: HashMap<Type, Word>,
    pub(super) undef_values: HashMap<Type, Word>,
    values: HashMap<ValueId, Word>,
    function_ids: HashMap<FuncId, Word>,
    block_labels: HashMap<BlockId, Word>,
    merge_labels: HashMap<InstId, Word>,
    pub(super) imports: HashMap<&'static str, Word>,

    current_function: Option<Function>,
}

impl<'a> Printer<'a> {
    pub(super) fn new(ir: &'a ir::Module, options: &Options) -> Self {
        Printer {
            ir,
            constants: ir.constants.clone(),
            module: Module::new(),
            zero_init_workgroup_memory: options.zero_init_workgroup_memory,
            types: HashMap::new(),
            function_types: HashMap::new(),
            constant_ids: HashMap::new(),
            constant_nulls: HashMap::new(),
            undef_values: HashMap::new(),
            values: HashMap::new(),
            function_ids: HashMap::new(),
            block_labels: HashMap::new(),
            merge_labels: HashMap::new(),
            imports: HashMap::new(),
            current_function: None,
        }
    }

    /// Lower the whole IR module.
    pub(super) fn generate(mut self) -> Result<Module> {
        self.module.push_capability(Capability::Shader);
        self.module.push_memory_model(
            Op::MemoryModel,
            operands![AddressingModel::Logical, MemoryModel::GLSL450],
        );

        self.emit_root_block();

        for index in 0..self.ir.functions.len() {
            self.emit_function(FuncId(index as u32))?;
        }

        debug!(
            "lowered {} functions, {} types, {} constants",
            self.ir.functions.len(),
            self.types.len(),
            self.constant_ids.len()
        );
        Ok(self.module)
    }

    // =========================================================================
    // IDs
    // =========================================================================

    /// The ID of `value`, allocating one on first reference.
    pub(super) fn value_id(&mut self, value: Value) -> Word {
        match value {
            Value::Constant(c) => self.constant_id(c),
            Value::Literal(literal) => literal,
            Value::Ssa(id) => {
                let module = &mut self.module;
                *self.values.entry(id).or_insert_with(|| module.next_id())
            }
        }
    }

    /// The label of `block`.
    pub(super) fn label(&mut self, block: BlockId) -> Word {
        let module = &mut self.module;
        *self.block_labels.entry(block).or_insert_with(|| module.next_id())
    }

    /// The merge block label of a control instruction.
    pub(super) fn merge_label(&mut self, inst: InstId) -> Word {
        let module = &mut self.module;
        *self.merge_labels.entry(inst).or_insert_with(|| module.next_id())
    }

    pub(super) fn function_id(&mut self, func: FuncId) -> Word {
        let module = &mut self.module;
        *self.function_ids.entry(func).or_insert_with(|| module.next_id())
    }

    /// The ID of the single result of `inst`.
    pub(super) fn result_id(&mut self, inst: &Inst) -> Word {
        match inst.result() {
            Some(result) => self.value_id(Value::Ssa(result)),
            None => ice!("{} instruction has no result", inst.kind.name()),
        }
    }

    /// Make `result` stand for `source` without emitting an instruction.
    ///
    /// A result that was already referenced (e.g. by a loop header phi) keeps its ID and
    /// is defined with an `OpCopyObject` instead.
    pub(super) fn alias_value(&mut self, result: ValueId, source: Value) {
        let ir = self.ir;
        let source = self.value_id(source);
        match self.values.get(&result).copied() {
            Some(existing) => {
                let ty = self.type_id(&ir.value(result).ty);
                self.push_inst(Op::CopyObject, operands![ty, existing, source]);
            }
            None => {
                self.values.insert(result, source);
            }
        }
    }

    pub(super) fn value_type(&self, value: Value) -> Type {
        match value {
            Value::Constant(c) => self.constants.type_of(c),
            Value::Ssa(id) => self.ir.value(id).ty.clone(),
            Value::Literal(_) => Type::U32,
        }
    }

    // =========================================================================
    // Emission helpers
    // =========================================================================

    pub(super) fn current_function(&mut self) -> &mut Function {
        match self.current_function.as_mut() {
            Some(function) => function,
            None => ice!("instruction emitted outside of a function"),
        }
    }

    pub(super) fn push_inst(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.current_function().push_inst(opcode, operands);
    }

    pub(super) fn emit_name(&mut self, id: Word, name: &str) {
        self.module.push_debug(Op::Name, operands![id, name]);
    }

    /// Annotate each named result of `inst` right after its defining instruction.
    pub(super) fn emit_result_names(&mut self, inst: &Inst) {
        let ir = self.ir;
        for &result in &inst.results {
            if let Some(name) = ir.name_of(result) {
                let id = self.value_id(Value::Ssa(result));
                self.emit_name(id, name);
            }
        }
    }

    // =========================================================================
    // Root block
    // =========================================================================

    fn emit_root_block(&mut self) {
        let ir = self.ir;
        for &inst in &ir.root_block().insts {
            match &ir.inst(inst).kind {
                InstKind::Var(_) => self.emit_var(inst),
                other => ice!("unimplemented root block instruction: {}", other.name()),
            }
        }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn emit_function(&mut self, func_id: FuncId) -> Result<()> {
        let ir = self.ir;
        let func = ir.function(func_id);

        if func.params.len() > MAX_FUNCTION_PARAMS {
            bail_spirv!(
                "Function '{}' has more than {} parameters",
                func.name,
                MAX_FUNCTION_PARAMS
            );
        }
        debug!("emitting function '{}'", func.name);

        let id = self.function_id(func_id);
        self.emit_name(id, &func.name);

        if func.stage != PipelineStage::None {
            self.emit_entry_point(func_id, id);
        }

        let return_type = self.type_id(&func.return_type);

        let mut params = Vec::with_capacity(func.params.len());
        let mut param_types = Vec::with_capacity(func.params.len());
        for &param in &func.params {
            let param_id = self.value_id(Value::Ssa(param));
            let param_def = ir.value(param);
            let param_type = self.type_id(&param_def.ty);
            params.push(instruction::inst(Op::FunctionParameter, operands![param_type, param_id]));
            param_types.push(param_type);
            if let Some(name) = &param_def.name {
                self.emit_name(param_id, name);
            }
        }

        let function_type = self.function_type_id(FunctionType {
            return_type,
            params: param_types,
        });

        let declaration = instruction::inst(
            Op::Function,
            operands![return_type, id, FunctionControl::NONE, function_type],
        );
        let label = self.label(func.block);
        self.current_function = Some(Function::new(declaration, label, params));

        // The entry label is emitted by the function itself.
        self.emit_block_instructions(func.block, Scope::default());

        if let Some(function) = self.current_function.take() {
            self.module.push_function(function);
        }
        Ok(())
    }

    fn function_type_id(&mut self, key: FunctionType) -> Word {
        if let Some(&id) = self.function_types.get(&key) {
            return id;
        }
        let id = self.module.next_id();
        let mut operands = operands![id, key.return_type];
        operands.extend(key.params.iter().map(|&p| Operand::IdRef(p)));
        self.module.push_type(Op::TypeFunction, operands);
        self.function_types.insert(key, id);
        id
    }

    fn emit_entry_point(&mut self, func_id: FuncId, id: Word) {
        let ir = self.ir;
        let func = ir.function(func_id);

        let model = match func.stage {
            PipelineStage::Compute => {
                let [x, y, z] = match func.workgroup_size {
                    Some(size) => size,
                    None => ice!("compute entry point '{}' has no workgroup size", func.name),
                };
                self.module.push_execution_mode(
                    Op::ExecutionMode,
                    operands![id, ExecutionMode::LocalSize, x, y, z],
                );
                ExecutionModel::GLCompute
            }
            PipelineStage::Fragment => {
                self.module.push_execution_mode(
                    Op::ExecutionMode,
                    operands![id, ExecutionMode::OriginUpperLeft],
                );
                ExecutionModel::Fragment
            }
            PipelineStage::Vertex => ExecutionModel::Vertex,
            PipelineStage::None => ice!("undefined pipeline stage for entry point '{}'", func.name),
        };

        let mut operands = operands![model, id, func.name.as_str()];

        // Interface: every shader IO variable the entry point references.
        let used = self.values_used_in(func.block);
        for &global in &ir.root_block().insts {
            let inst = ir.inst(global);
            let InstKind::Var(var) = &inst.kind else {
                continue;
            };
            let Some(result) = inst.result() else {
                continue;
            };
            let Type::Pointer { address_space, .. } = &ir.value(result).ty else {
                continue;
            };
            if !matches!(address_space, AddressSpace::In | AddressSpace::Out) || !used.contains(&result) {
                continue;
            }
            operands.push(Operand::IdRef(self.value_id(Value::Ssa(result))));

            if var.attributes.builtin == Some(BuiltinValue::FragDepth) {
                self.module.push_execution_mode(
                    Op::ExecutionMode,
                    operands![id, ExecutionMode::DepthReplacing],
                );
            }
        }

        self.module.push_entry_point(Op::EntryPoint, operands);
    }

    /// Non-constant values referenced anywhere under `block`.
    fn values_used_in(&self, block: BlockId) -> HashSet<ValueId> {
        let ir = self.ir;
        let mut used = HashSet::new();
        ir.walk_blocks(block, &mut |b| {
            for &inst in &ir.block(b).insts {
                ir.inst(inst).kind.for_each_operand(|operand| {
                    if let Value::Ssa(id) = operand {
                        used.insert(id);
                    }
                });
            }
        });
        used
    }

    // =========================================================================
    // Variables
    // =========================================================================

    pub(super) fn emit_var(&mut self, inst_id: InstId) {
        let ir = self.ir;
        let inst = ir.inst(inst_id);
        let InstKind::Var(var) = &inst.kind else {
            ice!("{} is not a var", inst_id);
        };
        let id = self.result_id(inst);
        let Some(result) = inst.result() else {
            ice!("var {} has no result", inst_id);
        };
        let ptr = &ir.value(result).ty;
        let Type::Pointer {
            address_space,
            store,
            access,
        } = ptr
        else {
            ice!("var {} has non-pointer type {:?}", inst_id, ptr);
        };
        if *address_space == AddressSpace::Undefined {
            ice!("unimplemented variable address space {:?}", address_space);
        }
        let ty = self.type_id(ptr);

        match address_space {
            AddressSpace::Function => {
                if self.current_function.is_none() {
                    ice!("function-scope var {} outside of a function", inst_id);
                }
                match var.initializer {
                    Some(initializer) => {
                        self.current_function()
                            .push_var(operands![ty, id, StorageClass::Function]);
                        let value = self.value_id(initializer);
                        self.push_inst(Op::Store, operands![id, value]);
                    }
                    None => {
                        let null = self.constant_null(store);
                        self.current_function()
                            .push_var(operands![ty, id, StorageClass::Function, null]);
                    }
                }
            }
            AddressSpace::In | AddressSpace::Out => {
                if matches!(store.deepest_element(), Type::F16) {
                    self.module.push_capability(Capability::StorageInputOutput16);
                }
                let class = storage_class(*address_space);
                self.module.push_type(Op::Variable, operands![ty, id, class]);
                self.emit_io_attributes(id, &var.attributes, *address_space);
            }
            AddressSpace::Private => {
                let initializer = match var.initializer {
                    Some(value @ Value::Constant(_)) => self.value_id(value),
                    Some(other) => ice!("private var {} has non-constant initializer {:?}", inst_id, other),
                    None => self.constant_null(store),
                };
                self.module.push_type(
                    Op::Variable,
                    operands![ty, id, StorageClass::Private, initializer],
                );
            }
            AddressSpace::PushConstant => {
                self.module
                    .push_type(Op::Variable, operands![ty, id, StorageClass::PushConstant]);
            }
            AddressSpace::Handle | AddressSpace::Storage | AddressSpace::Uniform => {
                let class = storage_class(*address_space);
                self.module.push_type(Op::Variable, operands![ty, id, class]);

                let Some(binding) = var.binding_point else {
                    ice!("resource var {} has no binding point", inst_id);
                };
                self.module.push_annot(
                    Op::Decorate,
                    operands![id, Decoration::DescriptorSet, binding.group],
                );
                self.module.push_annot(
                    Op::Decorate,
                    operands![id, Decoration::Binding, binding.binding],
                );

                // Storage textures and buffers carry their access mode as decorations.
                let resource_access = match &**store {
                    Type::StorageTexture { access, .. } => Some(*access),
                    Type::Struct(_) => Some(*access),
                    _ => None,
                };
                match resource_access {
                    Some(Access::Read) => {
                        self.module
                            .push_annot(Op::Decorate, operands![id, Decoration::NonWritable]);
                    }
                    Some(Access::Write) => {
                        self.module
                            .push_annot(Op::Decorate, operands![id, Decoration::NonReadable]);
                    }
                    Some(Access::ReadWrite) | None => {}
                }

                if let Some(index) = var.input_attachment_index {
                    if !matches!(**store, Type::InputAttachment { .. }) {
                        ice!("input attachment index on non-input-attachment var {}", inst_id);
                    }
                    self.module.push_annot(
                        Op::Decorate,
                        operands![id, Decoration::InputAttachmentIndex, index],
                    );
                }
            }
            AddressSpace::Workgroup => {
                let mut operands = operands![ty, id, StorageClass::Workgroup];
                if self.zero_init_workgroup_memory {
                    operands.push(Operand::IdRef(self.constant_null(store)));
                }
                self.module.push_type(Op::Variable, operands);
            }
            AddressSpace::Undefined => unreachable!("rejected above"),
        }
        trace!("var {} -> %{}", inst_id, id);

        if let Some(name) = ir.name_of(result) {
            self.emit_name(id, name);
        }
    }

    fn emit_io_attributes(&mut self, id: Word, attrs: &IoAttributes, address_space: AddressSpace) {
        if let Some(location) = attrs.location {
            self.module
                .push_annot(Op::Decorate, operands![id, Decoration::Location, location]);
        }
        if let Some(blend_src) = attrs.blend_src {
            self.module
                .push_annot(Op::Decorate, operands![id, Decoration::Index, blend_src]);
        }
        if let Some(interpolation) = attrs.interpolation {
            match interpolation.ty {
                InterpolationType::Linear => {
                    self.module
                        .push_annot(Op::Decorate, operands![id, Decoration::NoPerspective]);
                }
                InterpolationType::Flat => {
                    self.module.push_annot(Op::Decorate, operands![id, Decoration::Flat]);
                }
                InterpolationType::Perspective => {}
            }
            match interpolation.sampling {
                InterpolationSampling::Centroid => {
                    self.module
                        .push_annot(Op::Decorate, operands![id, Decoration::Centroid]);
                }
                InterpolationSampling::Sample => {
                    self.module.push_capability(Capability::SampleRateShading);
                    self.module.push_annot(Op::Decorate, operands![id, Decoration::Sample]);
                }
                InterpolationSampling::Center | InterpolationSampling::Undefined => {}
            }
        }
        if let Some(builtin) = attrs.builtin {
            let builtin = self.builtin_value(builtin, address_space);
            self.module.push_annot(
                Op::Decorate,
                operands![id, Decoration::BuiltIn, builtin],
            );
        }
        if attrs.invariant {
            self.module
                .push_annot(Op::Decorate, operands![id, Decoration::Invariant]);
        }
    }

    fn builtin_value(&mut self, builtin: BuiltinValue, address_space: AddressSpace) -> BuiltIn {
        match builtin {
            BuiltinValue::PointSize => BuiltIn::PointSize,
            BuiltinValue::FragDepth => BuiltIn::FragDepth,
            BuiltinValue::FrontFacing => BuiltIn::FrontFacing,
            BuiltinValue::GlobalInvocationId => BuiltIn::GlobalInvocationId,
            BuiltinValue::InstanceIndex => BuiltIn::InstanceIndex,
            BuiltinValue::LocalInvocationId => BuiltIn::LocalInvocationId,
            BuiltinValue::LocalInvocationIndex => BuiltIn::LocalInvocationIndex,
            BuiltinValue::NumWorkgroups => BuiltIn::NumWorkgroups,
            // Vertex output vs fragment input.
            BuiltinValue::Position if address_space == AddressSpace::Out => BuiltIn::Position,
            BuiltinValue::Position => BuiltIn::FragCoord,
            BuiltinValue::SampleIndex => {
                self.module.push_capability(Capability::SampleRateShading);
                BuiltIn::SampleId
            }
            BuiltinValue::SampleMask => BuiltIn::SampleMask,
            BuiltinValue::SubgroupInvocationId => {
                self.module.push_capability(Capability::GroupNonUniform);
                BuiltIn::SubgroupLocalInvocationId
            }
            BuiltinValue::SubgroupSize => {
                self.module.push_capability(Capability::GroupNonUniform);
                BuiltIn::SubgroupSize
            }
            BuiltinValue::VertexIndex => BuiltIn::VertexIndex,
            BuiltinValue::WorkgroupId => BuiltIn::WorkgroupId,
            BuiltinValue::Undefined => ice!("undefined builtin value"),
        }
    }
}

/// The storage class for an address space.
pub(super) fn storage_class(address_space: AddressSpace) -> StorageClass {
    match address_space {
        AddressSpace::Handle => StorageClass::UniformConstant,
        AddressSpace::Function => StorageClass::Function,
        AddressSpace::In => StorageClass::Input,
        AddressSpace::Private => StorageClass::Private,
        AddressSpace::PushConstant => StorageClass::PushConstant,
        AddressSpace::Out => StorageClass::Output,
        AddressSpace::Storage => StorageClass::StorageBuffer,
        AddressSpace::Uniform => StorageClass::Uniform,
        AddressSpace::Workgroup => StorageClass::Workgroup,
        AddressSpace::Undefined => ice!("unhandled address space {:?}", address_space),
    }
}
