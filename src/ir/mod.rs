//! The three-address-code instruction model: [`Location`], [`Instruction`]
//! and the owning [`Program`] arena, plus construction helpers in
//! [`build`].

pub mod build;
mod entities;
mod instruction;
pub mod location;
mod program;

pub use build::{Builtin, FunctionBuilder};
pub use entities::Inst;
pub use instruction::{BinaryOpcode, Instruction};
pub use location::{Location, Segment};
pub use program::Program;
