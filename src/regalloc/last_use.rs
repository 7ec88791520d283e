//! Last-use (liveness) analysis.
//!
//! For each function, a single linear walk over its instructions records,
//! for every temporary, the instruction at which it is last touched. The
//! driver uses this to insert a `DiscardValue` right after that point so
//! the emitter can drop the temporary's register instead of spilling it.
//! This is deliberately not expressed as an [`crate::dataflow::Analysis`]:
//! a single forward walk that always keeps the newest touch already gives
//! the right answer, because only the *last* write to the map for a given
//! temporary matters.

use crate::ir::{Inst, Location, Program};
use std::collections::HashMap;

/// Maps each temporary seen in a function to the instruction that last
/// referenced it.
#[derive(Default)]
pub struct LastUseMap {
    last_use: HashMap<Location, Inst>,
}

impl LastUseMap {
    /// Walk `[first, last]` (inclusive) and record each temporary's final
    /// reference.
    pub fn compute(program: &Program, first: Inst, last: Inst) -> Self {
        let mut map = LastUseMap {
            last_use: HashMap::new(),
        };
        let mut in_range = false;
        for inst in program.iter() {
            if inst == first {
                in_range = true;
            }
            if !in_range {
                continue;
            }
            for operand in program.get(inst).operands() {
                if operand.is_temporary() {
                    map.last_use.insert(operand.clone(), inst);
                }
            }
            if inst == last {
                break;
            }
        }
        map
    }

    /// Whether `inst` is the last use of `loc` within this function.
    pub fn is_last_use(&self, loc: &Location, inst: Inst) -> bool {
        self.last_use.get(loc) == Some(&inst)
    }

    /// Every `(Location, Inst)` pair recorded, used by the driver to find
    /// every temporary whose last use is a given instruction.
    pub fn iter(&self) -> impl Iterator<Item = (&Location, &Inst)> {
        self.last_use.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Instruction;

    #[test]
    fn newest_touch_wins() {
        let mut program = Program::new();
        let begin = program.push(Instruction::BeginFunc { frame_size: 0 });
        let t = Location::frame("_tmp0", -8);
        let first_use = program.push(Instruction::LoadConstant {
            dst: t.clone(),
            value: 1,
        });
        let second_use = program.push(Instruction::Assign {
            dst: Location::frame("y", -12),
            src: t.clone(),
        });
        let end = program.push(Instruction::EndFunc);

        let map = LastUseMap::compute(&program, begin, end);
        assert!(!map.is_last_use(&t, first_use));
        assert!(map.is_last_use(&t, second_use));
    }

    #[test]
    fn non_temporaries_are_never_recorded() {
        let mut program = Program::new();
        let begin = program.push(Instruction::BeginFunc { frame_size: 0 });
        let x = Location::frame("x", -8);
        let use_x = program.push(Instruction::LoadConstant {
            dst: x.clone(),
            value: 7,
        });
        let end = program.push(Instruction::EndFunc);

        let map = LastUseMap::compute(&program, begin, end);
        assert!(!map.is_last_use(&x, use_x));
    }
}
