//! MIPS assembly emission: the register-allocating backend that consumes
//! a [`crate::ir::Program`] and writes SPIM-compatible text.

mod mips;

pub use mips::MipsEmitter;
