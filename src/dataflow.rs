//! A generic fixpoint worklist dataflow engine, parameterized over a
//! lattice value type and a [`FlowView`] direction.
//!
//! No concrete analysis in this crate currently instantiates this engine:
//! the one analysis the emitter needs (last-use, see
//! [`crate::regalloc::last_use`]) is simple enough to compute with a
//! single linear walk over a function's instructions and does not need a
//! fixpoint. This module is kept for a future analysis that does need one
//! (e.g. full liveness as a set of live temporaries per program point)
//! rather than deleted, since the worklist algorithm itself is exactly the
//! textbook one and not worth re-deriving later.

use crate::flow_view::FlowView;
use crate::ir::{Inst, Program};
use std::collections::{HashSet, VecDeque};

/// Hooks a concrete dataflow analysis supplies to [`analyze`].
pub trait Analysis {
    /// Lattice value.
    type Value: Clone + PartialEq;

    /// Value at the flow view's entry node.
    fn init(&self) -> Self::Value;

    /// Neutral element for [`Analysis::meet`].
    fn top(&self) -> Self::Value;

    /// Transfer function: the outgoing value at `inst` given its incoming
    /// value.
    fn effect(&self, program: &Program, inst: Inst, value_in: &Self::Value) -> Self::Value;

    /// Confluence operator; must be commutative, associative and
    /// idempotent for the worklist to terminate.
    fn meet(&self, a: &Self::Value, b: &Self::Value) -> Self::Value;
}

/// Result of running [`analyze`]: the value flowing into and out of every
/// node reached from the view's entry node.
pub struct DataflowResult<V> {
    /// Per-instruction incoming value.
    pub df_in: std::collections::HashMap<Inst, V>,
    /// Per-instruction outgoing value.
    pub df_out: std::collections::HashMap<Inst, V>,
}

/// Run `analysis` to a fixpoint over `view`.
pub fn analyze<A: Analysis>(
    program: &Program,
    view: &dyn FlowView,
    nodes: &[Inst],
    analysis: &A,
) -> DataflowResult<A::Value> {
    let mut df_in = std::collections::HashMap::new();
    let mut df_out = std::collections::HashMap::new();

    let entry = view.first();
    df_in.insert(entry, analysis.init());
    df_out.insert(entry, analysis.effect(program, entry, &analysis.init()));

    let mut worklist: VecDeque<Inst> = VecDeque::new();
    let mut queued: HashSet<Inst> = HashSet::new();
    for &n in nodes {
        if n == entry {
            continue;
        }
        df_in.insert(n, analysis.top());
        df_out.insert(n, analysis.effect(program, n, &analysis.top()));
        worklist.push_back(n);
        queued.insert(n);
    }

    while let Some(n) = worklist.pop_front() {
        queued.remove(&n);
        let mut meet_value = analysis.top();
        for &p in view.incoming(n) {
            if let Some(pred_out) = df_out.get(&p) {
                meet_value = analysis.meet(&meet_value, pred_out);
            }
        }
        let changed = df_in.get(&n) != Some(&meet_value);
        if changed {
            let new_out = analysis.effect(program, n, &meet_value);
            df_in.insert(n, meet_value);
            df_out.insert(n, new_out);
            for &succ in view.outgoing(n) {
                if queued.insert(succ) {
                    worklist.push_back(succ);
                }
            }
        }
    }

    DataflowResult { df_in, df_out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_view::ForwardFlow;
    use crate::flowgraph::ControlFlowGraph;
    use crate::ir::Instruction;

    /// Trivial analysis: counts the number of nodes reachable so far,
    /// exercised purely to validate the worklist converges and visits
    /// every node once the graph has no further changes to propagate.
    struct ReachableCount;

    impl Analysis for ReachableCount {
        type Value = bool;

        fn init(&self) -> bool {
            true
        }

        fn top(&self) -> bool {
            false
        }

        fn effect(&self, _program: &Program, _inst: Inst, value_in: &bool) -> bool {
            *value_in
        }

        fn meet(&self, a: &bool, b: &bool) -> bool {
            *a || *b
        }
    }

    #[test]
    fn worklist_reaches_fixpoint_on_a_straight_line_function() {
        let mut program = Program::new();
        let begin = program.push(Instruction::BeginFunc { frame_size: 0 });
        let ret = program.push(Instruction::Return { value: None });
        let end = program.push(Instruction::EndFunc);
        let cfg = ControlFlowGraph::compute(&program, begin, end);
        let view = ForwardFlow::new(&cfg);
        let nodes = vec![begin, ret, end];

        let result = analyze(&program, &view, &nodes, &ReachableCount);
        assert_eq!(result.df_in[&begin], true);
    }
}
