//! The fixed MIPS register file.
//!
//! Every value lives on the stack at first; values only enter a register
//! when an instruction actually needs them there, and leave it again as
//! soon as the register is needed for something else or the value's last
//! use has passed. There is no attempt at a global coloring: this is the
//! simplest allocator that can still avoid a store/load pair around every
//! single operand.

use std::fmt;

/// One MIPS integer or floating-point register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Register {
    Zero,
    At,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,
    K0,
    K1,
    Gp,
    Sp,
    Fp,
    Ra,
    F0,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    F25,
    F26,
    F27,
    F28,
    F29,
    F30,
    F31,
}

/// All 64 registers, in register-file order.
pub const ALL_REGISTERS: [Register; 64] = [
    Register::Zero,
    Register::At,
    Register::V0,
    Register::V1,
    Register::A0,
    Register::A1,
    Register::A2,
    Register::A3,
    Register::S0,
    Register::S1,
    Register::S2,
    Register::S3,
    Register::S4,
    Register::S5,
    Register::S6,
    Register::S7,
    Register::T0,
    Register::T1,
    Register::T2,
    Register::T3,
    Register::T4,
    Register::T5,
    Register::T6,
    Register::T7,
    Register::T8,
    Register::T9,
    Register::K0,
    Register::K1,
    Register::Gp,
    Register::Sp,
    Register::Fp,
    Register::Ra,
    Register::F0,
    Register::F1,
    Register::F2,
    Register::F3,
    Register::F4,
    Register::F5,
    Register::F6,
    Register::F7,
    Register::F8,
    Register::F9,
    Register::F10,
    Register::F11,
    Register::F12,
    Register::F13,
    Register::F14,
    Register::F15,
    Register::F16,
    Register::F17,
    Register::F18,
    Register::F19,
    Register::F20,
    Register::F21,
    Register::F22,
    Register::F23,
    Register::F24,
    Register::F25,
    Register::F26,
    Register::F27,
    Register::F28,
    Register::F29,
    Register::F30,
    Register::F31,
];

/// The scratch registers the allocator is allowed to hand out:
/// `$t0..$t9`. Every other general-purpose register (`$s0..$s7`, the FPU
/// bank) exists in the model but is not a candidate for on-demand
/// fill/spill in this allocator.
pub const SCRATCH_REGISTERS: [Register; 10] = [
    Register::T0,
    Register::T1,
    Register::T2,
    Register::T3,
    Register::T4,
    Register::T5,
    Register::T6,
    Register::T7,
    Register::T8,
    Register::T9,
];

impl Register {
    /// The assembler mnemonic, e.g. `"$t3"`.
    pub fn name(self) -> &'static str {
        match self {
            Register::Zero => "$zero",
            Register::At => "$at",
            Register::V0 => "$v0",
            Register::V1 => "$v1",
            Register::A0 => "$a0",
            Register::A1 => "$a1",
            Register::A2 => "$a2",
            Register::A3 => "$a3",
            Register::S0 => "$s0",
            Register::S1 => "$s1",
            Register::S2 => "$s2",
            Register::S3 => "$s3",
            Register::S4 => "$s4",
            Register::S5 => "$s5",
            Register::S6 => "$s6",
            Register::S7 => "$s7",
            Register::T0 => "$t0",
            Register::T1 => "$t1",
            Register::T2 => "$t2",
            Register::T3 => "$t3",
            Register::T4 => "$t4",
            Register::T5 => "$t5",
            Register::T6 => "$t6",
            Register::T7 => "$t7",
            Register::T8 => "$t8",
            Register::T9 => "$t9",
            Register::K0 => "$k0",
            Register::K1 => "$k1",
            Register::Gp => "$gp",
            Register::Sp => "$sp",
            Register::Fp => "$fp",
            Register::Ra => "$ra",
            Register::F0 => "$f0",
            Register::F1 => "$f1",
            Register::F2 => "$f2",
            Register::F3 => "$f3",
            Register::F4 => "$f4",
            Register::F5 => "$f5",
            Register::F6 => "$f6",
            Register::F7 => "$f7",
            Register::F8 => "$f8",
            Register::F9 => "$f9",
            Register::F10 => "$f10",
            Register::F11 => "$f11",
            Register::F12 => "$f12",
            Register::F13 => "$f13",
            Register::F14 => "$f14",
            Register::F15 => "$f15",
            Register::F16 => "$f16",
            Register::F17 => "$f17",
            Register::F18 => "$f18",
            Register::F19 => "$f19",
            Register::F20 => "$f20",
            Register::F21 => "$f21",
            Register::F22 => "$f22",
            Register::F23 => "$f23",
            Register::F24 => "$f24",
            Register::F25 => "$f25",
            Register::F26 => "$f26",
            Register::F27 => "$f27",
            Register::F28 => "$f28",
            Register::F29 => "$f29",
            Register::F30 => "$f30",
            Register::F31 => "$f31",
        }
    }

    /// Whether this register is one the allocator may bind a variable to:
    /// `$t0..$t9`, `$s0..$s7`, and the FPU bank. `$v0`/`$a0..$a3`/`$sp` etc.
    /// have fixed calling-convention roles and are never handed out by
    /// [`crate::regalloc::descriptor::RegisterDescriptor::pick_for`].
    pub fn is_general_purpose(self) -> bool {
        matches!(
            self,
            Register::S0
                | Register::S1
                | Register::S2
                | Register::S3
                | Register::S4
                | Register::S5
                | Register::S6
                | Register::S7
                | Register::T0
                | Register::T1
                | Register::T2
                | Register::T3
                | Register::T4
                | Register::T5
                | Register::T6
                | Register::T7
                | Register::T8
                | Register::T9
                | Register::F0
                | Register::F1
                | Register::F2
                | Register::F3
                | Register::F4
                | Register::F5
                | Register::F6
                | Register::F7
                | Register::F8
                | Register::F9
                | Register::F10
                | Register::F11
                | Register::F12
                | Register::F13
                | Register::F14
                | Register::F15
                | Register::F16
                | Register::F17
                | Register::F18
                | Register::F19
                | Register::F20
                | Register::F21
                | Register::F22
                | Register::F23
                | Register::F24
                | Register::F25
                | Register::F26
                | Register::F27
                | Register::F28
                | Register::F29
                | Register::F30
                | Register::F31
        )
    }

    /// Whether this is one of the FPU single-precision registers.
    pub fn is_fpu(self) -> bool {
        matches!(
            self,
            Register::F0
                | Register::F1
                | Register::F2
                | Register::F3
                | Register::F4
                | Register::F5
                | Register::F6
                | Register::F7
                | Register::F8
                | Register::F9
                | Register::F10
                | Register::F11
                | Register::F12
                | Register::F13
                | Register::F14
                | Register::F15
                | Register::F16
                | Register::F17
                | Register::F18
                | Register::F19
                | Register::F20
                | Register::F21
                | Register::F22
                | Register::F23
                | Register::F24
                | Register::F25
                | Register::F26
                | Register::F27
                | Register::F28
                | Register::F29
                | Register::F30
                | Register::F31
        )
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-register liveness state within the allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegisterContents {
    /// Whether a value is currently resident.
    pub is_dirty: bool,
    /// Reserved for the duration of the current instruction's emission, so
    /// a later operand fill can't reclaim a register an earlier operand of
    /// the same instruction just filled.
    pub mutex_locked: bool,
    /// Set by `DiscardValue`: the next reclaim of this register may skip
    /// the spill, because the resident value will never be read again.
    pub can_discard: bool,
}

/// Liveness state for all 64 registers.
pub struct RegisterFile {
    contents: [RegisterContents; 64],
}

impl RegisterFile {
    /// A fresh register file with every register clean.
    pub fn new() -> Self {
        RegisterFile {
            contents: [RegisterContents::default(); 64],
        }
    }

    /// Read a register's current state.
    pub fn get(&self, reg: Register) -> RegisterContents {
        self.contents[reg as usize]
    }

    /// Mutably access a register's state.
    pub fn get_mut(&mut self, reg: Register) -> &mut RegisterContents {
        &mut self.contents[reg as usize]
    }

    /// Clear every scratch register's dirty/discard/lock state, without
    /// touching `$s0..$s7` or the FPU bank. Used at every branch boundary.
    pub fn clear_scratch(&mut self) {
        for &reg in &SCRATCH_REGISTERS {
            self.contents[reg as usize] = RegisterContents::default();
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_scratch_and_saved_and_fpu_registers_are_general_purpose() {
        assert!(Register::T3.is_general_purpose());
        assert!(Register::S2.is_general_purpose());
        assert!(Register::F4.is_general_purpose());
        assert!(!Register::V0.is_general_purpose());
        assert!(!Register::Sp.is_general_purpose());
    }

    #[test]
    fn clear_scratch_only_touches_t_registers() {
        let mut regs = RegisterFile::new();
        regs.get_mut(Register::T0).is_dirty = true;
        regs.get_mut(Register::S0).is_dirty = true;
        regs.clear_scratch();
        assert!(!regs.get(Register::T0).is_dirty);
        assert!(regs.get(Register::S0).is_dirty);
    }
}
