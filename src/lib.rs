//! MIPS code generation library.
//!
//! Turns a linear stream of three-address-code instructions into textual
//! MIPS assembly for a SPIM-class simulator. The pipeline is: segment the
//! instruction stream into functions, build a control-flow graph per
//! function, compute last-use information for temporaries, then emit
//! assembly while discarding dead registers as soon as their value is no
//! longer needed.
#![deny(missing_docs, trivial_numeric_casts, unused_extern_crates)]
#![warn(unused_import_braces)]
#![cfg_attr(
    feature = "cargo-clippy",
    allow(
        clippy::many_single_char_names,
        clippy::identity_op,
        clippy::needless_borrow,
        clippy::too_many_arguments,
        clippy::match_same_arms
    )
)]

pub use cranelift_entity as entity;

pub mod dataflow;
pub mod driver;
pub mod emit;
pub mod error;
pub mod flow_view;
pub mod flowgraph;
pub mod ir;
pub mod regalloc;

pub use crate::driver::{Codegen, CodegenOptions};
pub use crate::error::{CodegenError, CodegenResult};
pub use crate::ir::{Inst, Instruction, Location, Program};

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
