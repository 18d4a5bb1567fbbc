//! Instructions.

use serde::{Deserialize, Serialize};

use super::constant::ConstId;
use super::ops::{BinaryOp, BindingPoint, BuiltinFn, IoAttributes, SpirvBuiltinFn, UnaryOp};
use super::{BlockId, FuncId, InstId, Value, ValueId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inst {
    pub kind: InstKind,
    /// Zero or one result for plain instructions, any number for control instructions.
    pub results: Vec<ValueId>,
    /// The block containing this instruction.
    pub block: BlockId,
}

impl Inst {
    pub fn result(&self) -> Option<ValueId> {
        self.results.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfInst {
    pub condition: Value,
    pub true_block: BlockId,
    pub false_block: BlockId,
    /// `exit_if` instructions targeting this if, in creation order.
    pub exits: Vec<InstId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopInst {
    pub initializer: Option<BlockId>,
    pub body: BlockId,
    pub continuing: BlockId,
    /// `exit_loop` and `break_if` instructions targeting this loop.
    pub exits: Vec<InstId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSelector {
    Default,
    Value(ConstId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub selectors: Vec<CaseSelector>,
    pub block: BlockId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchInst {
    pub condition: Value,
    pub cases: Vec<Case>,
    /// `exit_switch` instructions targeting this switch.
    pub exits: Vec<InstId>,
}

/// A variable declaration. The result type is the pointer to the variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarInst {
    pub initializer: Option<Value>,
    pub binding_point: Option<BindingPoint>,
    pub attributes: IoAttributes,
    pub input_attachment_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstKind {
    Access { object: Value, indices: Vec<Value> },
    Binary { op: BinaryOp, lhs: Value, rhs: Value },
    Unary { op: UnaryOp, value: Value },
    Bitcast { value: Value },
    Convert { value: Value },
    Construct { args: Vec<Value> },
    Swizzle { object: Value, indices: Vec<u32> },
    Load { from: Value },
    Store { to: Value, value: Value },
    LoadVectorElement { from: Value, index: Value },
    StoreVectorElement { to: Value, index: Value, value: Value },
    Var(VarInst),
    Let { value: Value },
    CoreBuiltinCall { func: BuiltinFn, args: Vec<Value> },
    SpirvBuiltinCall { func: SpirvBuiltinFn, args: Vec<Value> },
    UserCall { target: FuncId, args: Vec<Value> },

    If(IfInst),
    Loop(LoopInst),
    Switch(SwitchInst),

    // Terminators
    Return { value: Option<Value> },
    BreakIf { condition: Value, target: InstId, next_iter_args: Vec<Value>, exit_args: Vec<Value> },
    Continue { target: InstId, args: Vec<Value> },
    NextIteration { target: InstId, args: Vec<Value> },
    ExitIf { target: InstId, args: Vec<Value> },
    ExitLoop { target: InstId, args: Vec<Value> },
    ExitSwitch { target: InstId, args: Vec<Value> },
    TerminateInvocation,
    Unreachable,
}

impl InstKind {
    /// Short instruction name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            InstKind::Access { .. } => "access",
            InstKind::Binary { .. } => "binary",
            InstKind::Unary { .. } => "unary",
            InstKind::Bitcast { .. } => "bitcast",
            InstKind::Convert { .. } => "convert",
            InstKind::Construct { .. } => "construct",
            InstKind::Swizzle { .. } => "swizzle",
            InstKind::Load { .. } => "load",
            InstKind::Store { .. } => "store",
            InstKind::LoadVectorElement { .. } => "load_vector_element",
            InstKind::StoreVectorElement { .. } => "store_vector_element",
            InstKind::Var(_) => "var",
            InstKind::Let { .. } => "let",
            InstKind::CoreBuiltinCall { .. } => "builtin call",
            InstKind::SpirvBuiltinCall { .. } => "spirv builtin call",
            InstKind::UserCall { .. } => "call",
            InstKind::If(_) => "if",
            InstKind::Loop(_) => "loop",
            InstKind::Switch(_) => "switch",
            InstKind::Return { .. } => "return",
            InstKind::BreakIf { .. } => "break_if",
            InstKind::Continue { .. } => "continue",
            InstKind::NextIteration { .. } => "next_iteration",
            InstKind::ExitIf { .. } => "exit_if",
            InstKind::ExitLoop { .. } => "exit_loop",
            InstKind::ExitSwitch { .. } => "exit_switch",
            InstKind::TerminateInvocation => "terminate_invocation",
            InstKind::Unreachable => "unreachable",
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Return { .. }
                | InstKind::BreakIf { .. }
                | InstKind::Continue { .. }
                | InstKind::NextIteration { .. }
                | InstKind::ExitIf { .. }
                | InstKind::ExitLoop { .. }
                | InstKind::ExitSwitch { .. }
                | InstKind::TerminateInvocation
                | InstKind::Unreachable
        )
    }

    pub fn is_control(&self) -> bool {
        matches!(self, InstKind::If(_) | InstKind::Loop(_) | InstKind::Switch(_))
    }

    /// Values carried out of a construct by an exit.
    pub fn exit_args(&self) -> &[Value] {
        match self {
            InstKind::BreakIf { exit_args, .. } => exit_args,
            InstKind::ExitIf { args, .. } | InstKind::ExitLoop { args, .. } | InstKind::ExitSwitch { args, .. } => {
                args
            }
            _ => &[],
        }
    }

    /// Values passed to the parameters of a multi-in block.
    pub fn branch_args(&self) -> &[Value] {
        match self {
            InstKind::BreakIf { next_iter_args, .. } => next_iter_args,
            InstKind::Continue { args, .. } | InstKind::NextIteration { args, .. } => args,
            _ => &[],
        }
    }

    /// Blocks owned by a control instruction, in emission order.
    pub fn child_blocks(&self) -> Vec<BlockId> {
        match self {
            InstKind::If(i) => vec![i.true_block, i.false_block],
            InstKind::Loop(l) => l.initializer.into_iter().chain([l.body, l.continuing]).collect(),
            InstKind::Switch(s) => s.cases.iter().map(|c| c.block).collect(),
            _ => Vec::new(),
        }
    }

    /// Call `f` for every value operand.
    pub fn for_each_operand(&self, mut f: impl FnMut(Value)) {
        let mut all = |values: &[Value]| values.iter().copied().for_each(&mut f);
        match self {
            InstKind::Access { object, indices } => {
                all(&[*object]);
                all(indices);
            }
            InstKind::Binary { lhs, rhs, .. } => all(&[*lhs, *rhs]),
            InstKind::Unary { value, .. }
            | InstKind::Bitcast { value }
            | InstKind::Convert { value }
            | InstKind::Let { value } => all(&[*value]),
            InstKind::Swizzle { object, .. } => all(&[*object]),
            InstKind::Load { from } => all(&[*from]),
            InstKind::Store { to, value } => all(&[*to, *value]),
            InstKind::LoadVectorElement { from, index } => all(&[*from, *index]),
            InstKind::StoreVectorElement { to, index, value } => all(&[*to, *index, *value]),
            InstKind::Var(var) => all(var.initializer.as_slice()),
            InstKind::Construct { args }
            | InstKind::CoreBuiltinCall { args, .. }
            | InstKind::SpirvBuiltinCall { args, .. }
            | InstKind::UserCall { args, .. }
            | InstKind::Continue { args, .. }
            | InstKind::NextIteration { args, .. }
            | InstKind::ExitIf { args, .. }
            | InstKind::ExitLoop { args, .. }
            | InstKind::ExitSwitch { args, .. } => all(args),
            InstKind::If(i) => all(&[i.condition]),
            InstKind::Switch(s) => all(&[s.condition]),
            InstKind::Return { value } => all(value.as_slice()),
            InstKind::BreakIf {
                condition,
                next_iter_args,
                exit_args,
                ..
            } => {
                all(&[*condition]);
                all(next_iter_args);
                all(exit_args);
            }
            InstKind::Loop(_) | InstKind::TerminateInvocation | InstKind::Unreachable => {}
        }
    }
}
