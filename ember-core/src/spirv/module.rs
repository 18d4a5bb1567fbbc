//! SPIR-V module sections.
//!
//! Instructions are pushed into per-section streams in any order. [`Module::assemble`]
//! lays them out as an [`rspirv::dr::Module`] and lets rspirv serialize it.

use indexmap::IndexSet;
use rspirv::binary::Assemble;
use rspirv::dr;
use rspirv::spirv::{Capability, Op, Word};

use super::instruction::{Instruction, Operand, inst};
use crate::IdSource;
use crate::{ice, operands};

/// SPIR-V 1.3.
pub const SPIRV_VERSION: (u8, u8) = (1, 3);

/// Bumped whenever the shape of the generated code changes.
pub const WRITER_VERSION: Word = 1;

/// Tool ID in the high half, writer version in the low half. Tool 0 is unregistered.
pub const GENERATOR_ID: Word = WRITER_VERSION;

/// A function under construction.
#[derive(Debug, Clone)]
pub struct Function {
    function: dr::Function,
    variables: Vec<Instruction>,
}

impl Function {
    /// `declaration` is the `OpFunction` instruction and `label` the entry block label.
    pub fn new(declaration: Instruction, label: Word, params: Vec<Instruction>) -> Self {
        let mut function = dr::Function::new();
        function.def = Some(declaration);
        function.parameters = params;
        function.blocks.push(block(label));
        Function {
            function,
            variables: Vec::new(),
        }
    }

    /// Append to the current block; `OpLabel` opens a new one.
    pub fn push_inst(&mut self, opcode: Op, operands: Vec<Operand>) {
        let instruction = inst(opcode, operands);
        if opcode == Op::Label {
            let mut next = dr::Block::new();
            next.label = Some(instruction);
            self.function.blocks.push(next);
            return;
        }
        match self.function.blocks.last_mut() {
            Some(current) => current.instructions.push(instruction),
            None => ice!("function has no entry block"),
        }
    }

    /// Function-scope variables are hoisted to the start of the entry block.
    pub fn push_var(&mut self, operands: Vec<Operand>) {
        self.variables.push(inst(Op::Variable, operands));
    }

    fn into_dr(self) -> dr::Function {
        let Function {
            mut function,
            variables,
        } = self;
        if let Some(entry) = function.blocks.first_mut() {
            entry.instructions.splice(0..0, variables);
        }
        function.end = Some(inst(Op::FunctionEnd, Vec::new()));
        function
    }
}

fn block(label: Word) -> dr::Block {
    let mut block = dr::Block::new();
    block.label = Some(inst(Op::Label, operands![label]));
    block
}

#[derive(Debug, Clone)]
pub struct Module {
    ids: IdSource<Word>,
    capabilities: IndexSet<Capability>,
    extensions: IndexSet<String>,
    ext_imports: Vec<Instruction>,
    memory_model: Option<Instruction>,
    entry_points: Vec<Instruction>,
    execution_modes: Vec<Instruction>,
    debug: Vec<Instruction>,
    annotations: Vec<Instruction>,
    types: Vec<Instruction>,
    functions: Vec<Function>,
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    pub fn new() -> Self {
        Module {
            // ID 0 is invalid in SPIR-V.
            ids: IdSource::starting_at(1),
            capabilities: IndexSet::new(),
            extensions: IndexSet::new(),
            ext_imports: Vec::new(),
            memory_model: None,
            entry_points: Vec::new(),
            execution_modes: Vec::new(),
            debug: Vec::new(),
            annotations: Vec::new(),
            types: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn next_id(&mut self) -> Word {
        self.ids.next()
    }

    /// One past the greatest ID handed out.
    pub fn id_bound(&self) -> Word {
        self.ids.bound()
    }

    /// Declare a capability; duplicates are ignored.
    pub fn push_capability(&mut self, capability: Capability) {
        self.capabilities.insert(capability);
    }

    /// Declare an extension; duplicates are ignored.
    pub fn push_extension(&mut self, name: &str) {
        self.extensions.insert(name.to_string());
    }

    pub fn push_ext_import(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.ext_imports.push(inst(opcode, operands));
    }

    pub fn push_memory_model(&mut self, opcode: Op, operands: Vec<Operand>) {
        if self.memory_model.is_some() {
            ice!("memory model declared twice");
        }
        self.memory_model = Some(inst(opcode, operands));
    }

    pub fn push_entry_point(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.entry_points.push(inst(opcode, operands));
    }

    pub fn push_execution_mode(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.execution_modes.push(inst(opcode, operands));
    }

    pub fn push_debug(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.debug.push(inst(opcode, operands));
    }

    pub fn push_annot(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.annotations.push(inst(opcode, operands));
    }

    pub fn push_type(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.types.push(inst(opcode, operands));
    }

    pub fn push_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    /// Lay the sections out as an rspirv module, with the header bound taken from the ID counter.
    pub fn into_dr(self) -> dr::Module {
        let mut header = dr::ModuleHeader::new(self.ids.bound());
        header.set_version(SPIRV_VERSION.0, SPIRV_VERSION.1);
        header.generator = GENERATOR_ID;

        let mut module = dr::Module::new();
        module.header = Some(header);
        module.capabilities = self
            .capabilities
            .into_iter()
            .map(|capability| inst(Op::Capability, operands![capability]))
            .collect();
        module.extensions = self
            .extensions
            .into_iter()
            .map(|name| inst(Op::Extension, operands![name]))
            .collect();
        module.ext_inst_imports = self.ext_imports;
        module.memory_model = self.memory_model;
        module.entry_points = self.entry_points;
        module.execution_modes = self.execution_modes;
        module.debug_names = self.debug;
        module.annotations = self.annotations;
        module.types_global_values = self.types;
        module.functions = self.functions.into_iter().map(Function::into_dr).collect();
        module
    }

    /// Serialize to SPIR-V words.
    pub fn assemble(self) -> Vec<Word> {
        self.into_dr().assemble()
    }
}
