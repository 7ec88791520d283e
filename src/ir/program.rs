//! The instruction arena.

use crate::entity::PrimaryMap;
use crate::ir::{Inst, Instruction};

/// An owned, ordered sequence of instructions.
///
/// Instructions are appended once and never removed; [`Inst`] indices are
/// stable for the program's whole lifetime, which is what lets the
/// control-flow graph and last-use maps key on them directly instead of on
/// pointer identity.
#[derive(Default)]
pub struct Program {
    insts: PrimaryMap<Inst, Instruction>,
}

impl Program {
    /// An empty program.
    pub fn new() -> Self {
        Program {
            insts: PrimaryMap::new(),
        }
    }

    /// Append an instruction, returning its stable reference.
    pub fn push(&mut self, inst: Instruction) -> Inst {
        self.insts.push(inst)
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Look up an instruction by reference.
    pub fn get(&self, inst: Inst) -> &Instruction {
        &self.insts[inst]
    }

    /// Mutably look up an instruction by reference (used to backfill
    /// `BeginFunc::frame_size` once a function's locals are all known).
    pub fn get_mut(&mut self, inst: Inst) -> &mut Instruction {
        &mut self.insts[inst]
    }

    /// Iterate every instruction reference in program order.
    pub fn iter(&self) -> impl Iterator<Item = Inst> + '_ {
        self.insts.keys()
    }

    /// Iterate `(Inst, &Instruction)` pairs in program order.
    pub fn iter_with_data(&self) -> impl Iterator<Item = (Inst, &Instruction)> + '_ {
        self.insts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Location;

    #[test]
    fn push_and_get_round_trip() {
        let mut prog = Program::new();
        let i = prog.push(Instruction::LoadConstant {
            dst: Location::frame("_tmp0", -8),
            value: 42,
        });
        match prog.get(i) {
            Instruction::LoadConstant { value, .. } => assert_eq!(*value, 42),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn iteration_preserves_program_order() {
        let mut prog = Program::new();
        for i in 0..5 {
            prog.push(Instruction::PopParams { bytes: i });
        }
        let order: Vec<i32> = prog
            .iter()
            .map(|inst| match prog.get(inst) {
                Instruction::PopParams { bytes } => *bytes,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
