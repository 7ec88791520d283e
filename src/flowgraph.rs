//! A control-flow graph recovered from one function's instruction range,
//! represented as predecessor/successor maps keyed by instruction
//! identity.
//!
//! ```text
//!     L1:
//!         ...
//!         IfZ t, L2   ; edge L1's IfZ -> L2
//!         ...
//!         Goto L1     ; edge -> L1
//!     L2:
//!         Return v    ; edge -> function entry (see module docs below)
//! ```
//!
//! Only control-transfer edges are recorded; the linear ("fall through")
//! successor is not added; see [`crate::regalloc::last_use`] which walks
//! the instruction range directly rather than this graph for exactly that
//! reason. A `Return` instruction gets a single edge back to the
//! function's first instruction: this models "control does not continue
//! past here" without needing a distinguished terminal node, at the cost
//! of looking like a loop to an unsuspecting consumer of the graph.

use crate::entity::SecondaryMap;
use crate::ir::{Inst, Instruction, Program};
use log::trace;
use std::collections::HashMap;

/// The two runtime labels that a jump may legitimately name without it
/// resolving to a `Label` in the current function. Such jumps get no edge
/// at all, since they leave the function entirely.
const RUNTIME_LABELS: &[&str] = &["_PrintString", "_PrintInt"];

#[derive(Clone, Default)]
struct CFGNode {
    predecessors: Vec<Inst>,
    successors: Vec<Inst>,
}

/// The control-flow graph of a single function.
pub struct ControlFlowGraph {
    first: Inst,
    last: Inst,
    nodes: SecondaryMap<Inst, CFGNode>,
    labels: HashMap<String, Inst>,
}

impl ControlFlowGraph {
    /// Build the control-flow graph of the function occupying
    /// `[first, last]` (inclusive), which must begin at `BeginFunc` and end
    /// at the matching `EndFunc`.
    pub fn compute(program: &Program, first: Inst, last: Inst) -> Self {
        let mut cfg = ControlFlowGraph {
            first,
            last,
            nodes: SecondaryMap::new(),
            labels: HashMap::new(),
        };
        cfg.compute_labels(program);
        cfg.compute_edges(program);
        trace!(
            "control-flow graph built for function spanning {}..={}",
            first,
            last
        );
        cfg
    }

    fn each_inst(&self, program: &Program) -> Vec<Inst> {
        program
            .iter()
            .skip_while(|&i| i != self.first)
            .take_while(|&i| i != self.last)
            .chain(std::iter::once(self.last))
            .collect()
    }

    fn compute_labels(&mut self, program: &Program) {
        for inst in self.each_inst(program) {
            if let Instruction::Label { name } = program.get(inst) {
                self.labels.insert(name.clone(), inst);
            }
        }
    }

    fn compute_edges(&mut self, program: &Program) {
        for inst in self.each_inst(program) {
            match program.get(inst) {
                Instruction::Return { .. } => {
                    self.add_edge(inst, self.first);
                }
                Instruction::Goto { label }
                | Instruction::IfZ { label, .. }
                | Instruction::LCall { label, .. } => {
                    self.add_jump_edge(inst, label);
                }
                _ => {}
            }
        }
    }

    fn add_jump_edge(&mut self, from: Inst, label: &str) {
        if RUNTIME_LABELS.contains(&label) {
            // Control leaves the function entirely; no edge to model.
            return;
        }
        match self.labels.get(label) {
            Some(&target) => self.add_edge(from, target),
            // Unresolved: a label in a different function. Conservative
            // placeholder so every instruction has somewhere to point.
            None => self.add_edge(from, from),
        }
    }

    fn add_edge(&mut self, from: Inst, to: Inst) {
        self.nodes[from].successors.push(to);
        self.nodes[to].predecessors.push(from);
    }

    /// The function's first instruction (`BeginFunc`).
    pub fn first(&self) -> Inst {
        self.first
    }

    /// The function's last instruction (`EndFunc`).
    pub fn last(&self) -> Inst {
        self.last
    }

    /// Instructions that may transfer control to `inst`.
    pub fn predecessors(&self, inst: Inst) -> &[Inst] {
        &self.nodes[inst].predecessors
    }

    /// Instructions `inst` may transfer control to.
    pub fn successors(&self, inst: Inst) -> &[Inst] {
        &self.nodes[inst].successors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, Location};

    fn label(name: &str) -> Instruction {
        Instruction::Label {
            name: name.to_string(),
        }
    }

    #[test]
    fn if_and_goto_resolve_to_same_function_labels() {
        let mut program = Program::new();
        let begin = program.push(Instruction::BeginFunc { frame_size: 0 });
        let l1 = program.push(label("L1"));
        let t = Location::frame("_tmp0", -8);
        let ifz = program.push(Instruction::IfZ {
            test: t.clone(),
            label: "L2".to_string(),
        });
        let goto = program.push(Instruction::Goto {
            label: "L1".to_string(),
        });
        let l2 = program.push(label("L2"));
        let ret = program.push(Instruction::Return { value: None });
        let end = program.push(Instruction::EndFunc);

        let cfg = ControlFlowGraph::compute(&program, begin, end);
        assert_eq!(cfg.successors(ifz), &[l2]);
        assert_eq!(cfg.successors(goto), &[l1]);
        assert_eq!(cfg.successors(ret), &[begin]);
        assert!(cfg.predecessors(end).is_empty());
    }

    #[test]
    fn print_string_jump_gets_no_edge() {
        let mut program = Program::new();
        let begin = program.push(Instruction::BeginFunc { frame_size: 0 });
        let call = program.push(Instruction::LCall {
            label: "_PrintString".to_string(),
            dst: None,
        });
        let end = program.push(Instruction::EndFunc);

        let cfg = ControlFlowGraph::compute(&program, begin, end);
        assert!(cfg.successors(call).is_empty());
    }

    #[test]
    fn unresolved_label_gets_self_edge() {
        let mut program = Program::new();
        let begin = program.push(Instruction::BeginFunc { frame_size: 0 });
        let call = program.push(Instruction::LCall {
            label: "_OtherFunction".to_string(),
            dst: None,
        });
        let end = program.push(Instruction::EndFunc);

        let cfg = ControlFlowGraph::compute(&program, begin, end);
        assert_eq!(cfg.successors(call), &[call]);
    }
}
