//! Register allocation: the 64-slot register file, the register
//! descriptor that tracks which variable currently lives in which
//! register, and the last-use analysis that tells the emitter when a
//! register may be discarded without spilling.

pub mod descriptor;
pub mod last_use;
pub mod register_file;

pub use descriptor::RegisterDescriptor;
pub use last_use::LastUseMap;
pub use register_file::{Register, RegisterFile};
