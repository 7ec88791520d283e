//! Forward/reverse adapters over a [`ControlFlowGraph`], letting a single
//! dataflow algorithm run in either direction.

use crate::flowgraph::ControlFlowGraph;
use crate::ir::Inst;

/// A direction-agnostic view of a control-flow graph.
pub trait FlowView {
    /// The node a forward analysis should start from (its entry node), or
    /// a reverse analysis's starting node (the graph's exit node).
    fn first(&self) -> Inst;
    /// The complementary endpoint to [`FlowView::first`].
    fn last(&self) -> Inst;
    /// Nodes that flow into `inst` in this view's direction.
    fn incoming(&self, inst: Inst) -> &[Inst];
    /// Nodes `inst` flows into in this view's direction.
    fn outgoing(&self, inst: Inst) -> &[Inst];
}

/// The graph as built: predecessors flow in, successors flow out.
pub struct ForwardFlow<'a> {
    cfg: &'a ControlFlowGraph,
}

impl<'a> ForwardFlow<'a> {
    /// Wrap `cfg` for forward traversal.
    pub fn new(cfg: &'a ControlFlowGraph) -> Self {
        ForwardFlow { cfg }
    }
}

impl FlowView for ForwardFlow<'_> {
    fn first(&self) -> Inst {
        self.cfg.first()
    }

    fn last(&self) -> Inst {
        self.cfg.last()
    }

    fn incoming(&self, inst: Inst) -> &[Inst] {
        self.cfg.predecessors(inst)
    }

    fn outgoing(&self, inst: Inst) -> &[Inst] {
        self.cfg.successors(inst)
    }
}

/// The graph with every edge reversed: successors flow in, predecessors
/// flow out, and the traversal starts from the graph's exit node.
pub struct ReverseFlow<'a> {
    cfg: &'a ControlFlowGraph,
}

impl<'a> ReverseFlow<'a> {
    /// Wrap `cfg` for reverse traversal.
    pub fn new(cfg: &'a ControlFlowGraph) -> Self {
        ReverseFlow { cfg }
    }
}

impl FlowView for ReverseFlow<'_> {
    fn first(&self) -> Inst {
        self.cfg.last()
    }

    fn last(&self) -> Inst {
        self.cfg.first()
    }

    fn incoming(&self, inst: Inst) -> &[Inst] {
        self.cfg.successors(inst)
    }

    fn outgoing(&self, inst: Inst) -> &[Inst] {
        self.cfg.predecessors(inst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, Program};

    #[test]
    fn reverse_flow_swaps_endpoints_and_edges() {
        let mut program = Program::new();
        let begin = program.push(Instruction::BeginFunc { frame_size: 0 });
        let end = program.push(Instruction::EndFunc);
        let cfg = ControlFlowGraph::compute(&program, begin, end);

        let fwd = ForwardFlow::new(&cfg);
        let rev = ReverseFlow::new(&cfg);
        assert_eq!(fwd.first(), rev.last());
        assert_eq!(fwd.last(), rev.first());
    }
}
