//! Structured control flow lowering.
//!
//! IR control instructions own their blocks and pass results out through exit
//! instructions. SPIR-V wants the same structure expressed as:
//! - a merge declaration (`OpSelectionMerge` / `OpLoopMerge`) before each branch
//! - an explicit merge block after the construct
//! - `OpPhi` instructions for every value that flows into a merge or loop header
//!
//! ```text
//! %r = if %c [t: bb1, f: bb2]        OpSelectionMerge %merge None
//!   bb1: exit_if 1i           =>      OpBranchConditional %c %bb1 %bb2
//!   bb2: exit_if 2i                   %bb1: OpBranch %merge
//!                                     %bb2: OpBranch %merge
//!                                     %merge: %r = OpPhi %i32 %one %bb1 %two %bb2
//! ```

use rspirv::spirv::{LoopControl, Op, SelectionControl, Word};

use super::instruction::Operand;
use super::printer::Printer;
use crate::ir::{BlockId, CaseSelector, IfInst, InstId, InstKind, LoopInst, SwitchInst, Value};
use crate::{ice, operands};

/// Labels of the nearest enclosing constructs.
///
/// Passed by value down the recursion: each construct hands its children a modified
/// copy, so the enclosing labels are back in effect once it returns.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Scope {
    pub if_merge: Option<Word>,
    pub switch_merge: Option<Word>,
    pub loop_header: Option<Word>,
    pub loop_merge: Option<Word>,
}

fn expect_label(label: Option<Word>, what: &str, inst: InstId) -> Word {
    match label {
        Some(label) => label,
        None => ice!("{} {} outside of its construct", what, inst),
    }
}

impl Printer<'_> {
    /// Emit a non-entry block: its label, incoming phis, then its instructions.
    pub(super) fn emit_block(&mut self, block: BlockId, scope: Scope) {
        let ir = self.ir;
        let label = self.label(block);
        self.push_inst(Op::Label, operands![label]);

        let b = ir.block(block);
        if b.insts.is_empty() {
            // Dead end, unless the parent merges a result through it.
            match b.parent {
                Some(parent) if !ir.inst(parent).results.is_empty() => {
                    let merge = self.merge_label(parent);
                    self.push_inst(Op::Branch, operands![merge]);
                }
                _ => self.push_inst(Op::Unreachable, Vec::new()),
            }
            return;
        }

        if !b.params.is_empty() {
            self.emit_incoming_phis(block);
        }
        self.emit_block_instructions(block, scope);
    }

    /// Emit the instructions of `block` into the current function.
    pub(super) fn emit_block_instructions(&mut self, block: BlockId, scope: Scope) {
        let ir = self.ir;
        let b = ir.block(block);
        for &inst_id in &b.insts {
            let inst = ir.inst(inst_id);
            match &inst.kind {
                InstKind::Access { object, indices } => self.emit_access(inst, *object, indices),
                InstKind::Binary { op, lhs, rhs } => self.emit_binary(inst, *op, *lhs, *rhs),
                InstKind::Unary { op, value } => self.emit_unary(inst, *op, *value),
                InstKind::Bitcast { value } => self.emit_bitcast(inst, *value),
                InstKind::Convert { value } => self.emit_convert(inst, *value),
                InstKind::Construct { args } => self.emit_construct(inst, args),
                InstKind::Swizzle { object, indices } => self.emit_swizzle(inst, *object, indices),
                InstKind::Load { from } => self.emit_load(inst, *from),
                InstKind::Store { to, value } => self.emit_store(*to, *value),
                InstKind::LoadVectorElement { from, index } => self.emit_load_vector_element(inst, *from, *index),
                InstKind::StoreVectorElement { to, index, value } => {
                    self.emit_store_vector_element(*to, *index, *value)
                }
                InstKind::Var(_) => self.emit_var(inst_id),
                InstKind::Let { value } => self.emit_let(inst, *value),
                InstKind::CoreBuiltinCall { func, args } => self.emit_core_builtin_call(inst, *func, args),
                InstKind::SpirvBuiltinCall { func, args } => self.emit_spirv_builtin_call(inst, *func, args),
                InstKind::UserCall { target, args } => self.emit_user_call(inst, *target, args),
                InstKind::If(i) => self.emit_if(inst_id, i, scope),
                InstKind::Loop(l) => self.emit_loop(inst_id, l, scope),
                InstKind::Switch(s) => self.emit_switch(inst_id, s, scope),
                _ => self.emit_terminator(inst_id, scope),
            }

            if !matches!(inst.kind, InstKind::Var(_)) {
                self.emit_result_names(inst);
            }
        }

        if b.insts.is_empty() {
            self.push_inst(Op::Unreachable, Vec::new());
        }
    }

    // =========================================================================
    // Terminators
    // =========================================================================

    fn emit_terminator(&mut self, inst_id: InstId, scope: Scope) {
        let ir = self.ir;
        match &ir.inst(inst_id).kind {
            InstKind::Return { value: Some(value) } => {
                let value = self.value_id(*value);
                self.push_inst(Op::ReturnValue, operands![value]);
            }
            InstKind::Return { value: None } => self.push_inst(Op::Return, Vec::new()),
            InstKind::BreakIf { condition, .. } => {
                let condition = self.value_id(*condition);
                let merge = expect_label(scope.loop_merge, "break_if", inst_id);
                let header = expect_label(scope.loop_header, "break_if", inst_id);
                self.push_inst(Op::BranchConditional, operands![condition, merge, header]);
            }
            InstKind::Continue { target, .. } => {
                let InstKind::Loop(l) = &ir.inst(*target).kind else {
                    ice!("continue {} does not target a loop", inst_id);
                };
                let continuing = self.label(l.continuing);
                self.push_inst(Op::Branch, operands![continuing]);
            }
            InstKind::ExitIf { .. } => {
                let merge = expect_label(scope.if_merge, "exit_if", inst_id);
                self.push_inst(Op::Branch, operands![merge]);
            }
            InstKind::ExitLoop { .. } => {
                let merge = expect_label(scope.loop_merge, "exit_loop", inst_id);
                self.push_inst(Op::Branch, operands![merge]);
            }
            InstKind::ExitSwitch { .. } => {
                let merge = expect_label(scope.switch_merge, "exit_switch", inst_id);
                self.push_inst(Op::Branch, operands![merge]);
            }
            InstKind::NextIteration { .. } => {
                let header = expect_label(scope.loop_header, "next_iteration", inst_id);
                self.push_inst(Op::Branch, operands![header]);
            }
            InstKind::TerminateInvocation => self.push_inst(Op::Kill, Vec::new()),
            InstKind::Unreachable => self.push_inst(Op::Unreachable, Vec::new()),
            other => ice!("unimplemented branch: {}", other.name()),
        }
    }

    // =========================================================================
    // Constructs
    // =========================================================================

    fn emit_if(&mut self, inst_id: InstId, i: &IfInst, scope: Scope) {
        let ir = self.ir;
        let has_results = !ir.inst(inst_id).results.is_empty();

        let merge = self.merge_label(inst_id);
        let scope = Scope {
            if_merge: Some(merge),
            ..scope
        };

        // A branch needs a real block if it does work, escapes the if, or feeds a result.
        // Otherwise it branches straight to the merge block.
        let needs_block = |block: BlockId| {
            let b = ir.block(block);
            let escapes = match ir.terminator(block) {
                Some(t) => !matches!(ir.inst(t).kind, InstKind::ExitIf { .. }),
                None => false,
            };
            b.insts.len() > 1 || has_results || escapes
        };
        let emit_true = needs_block(i.true_block);
        let emit_false = needs_block(i.false_block);
        let true_label = if emit_true { self.label(i.true_block) } else { merge };
        let false_label = if emit_false { self.label(i.false_block) } else { merge };

        self.push_inst(
            Op::SelectionMerge,
            operands![merge, SelectionControl::NONE],
        );
        let condition = self.value_id(i.condition);
        self.push_inst(Op::BranchConditional, operands![condition, true_label, false_label]);

        if emit_true {
            self.emit_block(i.true_block, scope);
        }
        if emit_false {
            self.emit_block(i.false_block, scope);
        }

        self.push_inst(Op::Label, operands![merge]);
        self.emit_exit_phis(inst_id, &i.exits, &[i.true_block, i.false_block]);
    }

    fn emit_loop(&mut self, inst_id: InstId, l: &LoopInst, scope: Scope) {
        let ir = self.ir;
        let init_label = l.initializer.map(|init| self.label(init));
        let body_label = self.label(l.body);
        let continuing_label = self.label(l.continuing);

        let header = self.module.next_id();
        let merge = self.merge_label(inst_id);
        let scope = Scope {
            loop_header: Some(header),
            loop_merge: Some(merge),
            ..scope
        };

        match (l.initializer, init_label) {
            (Some(init), Some(label)) => {
                self.push_inst(Op::Branch, operands![label]);
                self.emit_block(init, scope);
            }
            _ => self.push_inst(Op::Branch, operands![header]),
        }

        // The header hosts the body's phis and the merge declaration.
        self.push_inst(Op::Label, operands![header]);
        self.emit_incoming_phis(l.body);
        self.push_inst(
            Op::LoopMerge,
            operands![merge, continuing_label, LoopControl::NONE],
        );
        self.push_inst(Op::Branch, operands![body_label]);

        self.push_inst(Op::Label, operands![body_label]);
        self.emit_block_instructions(l.body, scope);

        if ir.terminator(l.continuing).is_some() {
            self.emit_block(l.continuing, scope);
        } else {
            // Every loop needs a continue target with a back-edge, reachable or not.
            self.push_inst(Op::Label, operands![continuing_label]);
            self.push_inst(Op::Branch, operands![header]);
        }

        self.push_inst(Op::Label, operands![merge]);
        self.emit_exit_phis(inst_id, &l.exits, &[]);
    }

    fn emit_switch(&mut self, inst_id: InstId, s: &SwitchInst, scope: Scope) {
        let defaults: Vec<BlockId> = s
            .cases
            .iter()
            .filter(|c| c.selectors.contains(&CaseSelector::Default))
            .map(|c| c.block)
            .collect();
        let default_block = match defaults.as_slice() {
            [block] => *block,
            [] => ice!("switch {} has no default case", inst_id),
            _ => ice!("switch {} has {} default cases", inst_id, defaults.len()),
        };
        let default_label = self.label(default_block);

        let condition = self.value_id(s.condition);
        let mut switch_operands = operands![condition, default_label];
        for case in &s.cases {
            let label = self.label(case.block);
            for selector in &case.selectors {
                let CaseSelector::Value(value) = selector else {
                    continue;
                };
                let Some(literal) = self.constants.as_u32(*value) else {
                    ice!("switch {} has non-integer selector {:?}", inst_id, value);
                };
                switch_operands.push(Operand::LiteralBit32(literal));
                switch_operands.push(Operand::IdRef(label));
            }
        }

        let merge = self.merge_label(inst_id);
        let scope = Scope {
            switch_merge: Some(merge),
            ..scope
        };

        self.push_inst(
            Op::SelectionMerge,
            operands![merge, SelectionControl::NONE],
        );
        self.push_inst(Op::Switch, switch_operands);

        for case in &s.cases {
            self.emit_block(case.block, scope);
        }

        self.push_inst(Op::Label, operands![merge]);
        self.emit_exit_phis(inst_id, &s.exits, &[]);
    }

    // =========================================================================
    // Phis
    // =========================================================================

    /// The label of the block control leaves from when `terminator` executes.
    ///
    /// That is the merge block of the last construct before the terminator in its
    /// block, or the terminator's own block when there is none.
    fn terminator_block_label(&mut self, terminator: InstId) -> Word {
        let ir = self.ir;
        let block = ir.inst(terminator).block;
        let insts = &ir.block(block).insts;
        let position = match insts.iter().position(|&i| i == terminator) {
            Some(position) => position,
            None => ice!("{} is not in its block {}", terminator, block),
        };
        let last_control = insts[..position]
            .iter()
            .rev()
            .find(|&&i| ir.inst(i).kind.is_control());
        match last_control {
            Some(&control) => self.merge_label(control),
            None => self.label(block),
        }
    }

    /// Phis in a loop header or continuing block, one per block parameter.
    fn emit_incoming_phis(&mut self, block: BlockId) {
        let ir = self.ir;
        let b = ir.block(block);
        for (index, &param) in b.params.iter().enumerate() {
            let ty = self.type_id(&ir.value(param).ty);
            let id = self.value_id(Value::Ssa(param));
            let mut operands = operands![ty, id];
            for &incoming in &b.inbound {
                let Some(&arg) = ir.inst(incoming).kind.branch_args().get(index) else {
                    ice!("{} passes no argument for parameter {} of {}", incoming, index, block);
                };
                operands.push(Operand::IdRef(self.value_id(arg)));
                operands.push(Operand::IdRef(self.terminator_block_label(incoming)));
            }
            self.push_inst(Op::Phi, operands);
        }
    }

    /// Phis in a merge block, one per result of the construct.
    ///
    /// `implicit_exits` are the construct's blocks that may reach the merge without an
    /// exit instruction; empty ones contribute an undef edge.
    fn emit_exit_phis(&mut self, inst_id: InstId, exits: &[InstId], implicit_exits: &[BlockId]) {
        let ir = self.ir;
        for (index, &result) in ir.inst(inst_id).results.iter().enumerate() {
            let result_ty = &ir.value(result).ty;

            let mut branches: Vec<(Word, Option<Value>)> = Vec::with_capacity(exits.len());
            for &exit in exits {
                let Some(&arg) = ir.inst(exit).kind.exit_args().get(index) else {
                    ice!("{} carries no value for result {} of {}", exit, index, inst_id);
                };
                branches.push((self.terminator_block_label(exit), Some(arg)));
            }
            // Deterministic operand order.
            branches.sort_by_key(|&(label, _)| label);

            for &block in implicit_exits {
                if ir.block(block).insts.is_empty() {
                    branches.push((self.label(block), None));
                }
            }

            let ty = self.type_id(result_ty);
            let id = self.value_id(Value::Ssa(result));
            let mut operands = operands![ty, id];
            for (label, value) in branches {
                let value = match value {
                    Some(value) => self.value_id(value),
                    None => self.undef(result_ty),
                };
                operands.push(Operand::IdRef(value));
                operands.push(Operand::IdRef(label));
            }
            self.push_inst(Op::Phi, operands);
        }
    }
}
