//! The register descriptor: which [`Location`] currently lives in which
//! [`Register`], in both directions.

use crate::regalloc::register_file::Register;
use crate::ir::Location;
use log::warn;
use std::collections::HashMap;

/// Bidirectional binding between registers and the variables resident in
/// them. The invariant this maintains: a `Location` is bound to at most
/// one register, and a register is bound to at most one `Location`.
#[derive(Default)]
pub struct RegisterDescriptor {
    bindings: HashMap<Register, Location>,
}

impl RegisterDescriptor {
    /// An empty descriptor.
    pub fn new() -> Self {
        RegisterDescriptor {
            bindings: HashMap::new(),
        }
    }

    /// Bind `loc` to `reg`, replacing any prior binding for either side.
    /// Violations of the at-most-one invariant are logged rather than
    /// treated as fatal, matching the non-fatal diagnostic this is
    /// specified to be: the allocator keeps going with the newest binding
    /// winning.
    pub fn insert(&mut self, reg: Register, loc: Location) {
        if let Some(existing) = self.bindings.get(&reg) {
            if *existing != loc {
                warn!(
                    "register descriptor invariant violated: {} already bound to {}, rebinding to {}",
                    reg, existing, loc
                );
            }
        }
        if let Some(stale_reg) = self.lookup(&loc) {
            if stale_reg != reg {
                self.bindings.remove(&stale_reg);
            }
        }
        self.bindings.insert(reg, loc);
    }

    /// Unbind whatever is resident in `reg`, if anything.
    pub fn remove(&mut self, reg: Register) {
        self.bindings.remove(&reg);
    }

    /// Unbind `loc` wherever it is resident, returning the register it was
    /// freed from.
    pub fn remove_location(&mut self, loc: &Location) -> Option<Register> {
        let reg = self.lookup(loc)?;
        self.bindings.remove(&reg);
        Some(reg)
    }

    /// The register `loc` is currently resident in, if any.
    pub fn lookup(&self, loc: &Location) -> Option<Register> {
        self.bindings
            .iter()
            .find(|(_, bound)| *bound == loc)
            .map(|(reg, _)| *reg)
    }

    /// The variable currently resident in `reg`, if any.
    pub fn resident(&self, reg: Register) -> Option<&Location> {
        self.bindings.get(&reg)
    }

    /// Whether `reg` is currently bound to anything.
    pub fn is_bound(&self, reg: Register) -> bool {
        self.bindings.contains_key(&reg)
    }

    /// Every currently-bound `(Register, Location)` pair, used by
    /// `clean_for_branch` to decide what to spill.
    pub fn bound_pairs(&self) -> impl Iterator<Item = (Register, &Location)> {
        self.bindings.iter().map(|(&r, l)| (r, l))
    }

    /// Drop every binding without emitting anything; used once every dirty
    /// scratch register has already been spilled by the caller.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_lookup_round_trips() {
        let mut rd = RegisterDescriptor::new();
        let loc = Location::frame("_tmp0", -8);
        rd.insert(Register::T0, loc.clone());
        assert_eq!(rd.lookup(&loc), Some(Register::T0));
        assert_eq!(rd.resident(Register::T0), Some(&loc));
    }

    #[test]
    fn rebinding_a_location_clears_its_old_register() {
        let mut rd = RegisterDescriptor::new();
        let loc = Location::frame("_tmp0", -8);
        rd.insert(Register::T0, loc.clone());
        rd.insert(Register::T1, loc.clone());
        assert_eq!(rd.lookup(&loc), Some(Register::T1));
        assert!(!rd.is_bound(Register::T0));
    }

    #[test]
    fn remove_location_frees_its_register() {
        let mut rd = RegisterDescriptor::new();
        let loc = Location::frame("_tmp0", -8);
        rd.insert(Register::T0, loc.clone());
        assert_eq!(rd.remove_location(&loc), Some(Register::T0));
        assert_eq!(rd.lookup(&loc), None);
    }
}
