//! Symbolic operand descriptors.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Byte size of one stack slot. Every local, temporary and parameter
/// occupies exactly one slot.
pub const VAR_SIZE: i32 = 4;

/// Which base register a [`Location`] is addressed relative to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Addressed relative to `$fp` (locals, temporaries, parameters).
    Frame,
    /// Addressed relative to `$gp` (globals).
    Global,
    /// A computed reference: `base` evaluates to an address, and this
    /// location lives at a further constant byte `offset` from it. Used for
    /// array elements and object fields reached through a pointer.
    Indirect {
        /// The location holding the base address.
        base: Box<Location>,
    },
}

/// A symbolic operand: a named, addressable storage location.
///
/// Two locations are semantically equal when their `name`, `segment` and
/// `offset` all match, regardless of whether they are the same allocation
/// (mirrors how the source compares generated temporaries by name rather
/// than by identity).
#[derive(Clone, Debug)]
pub struct Location {
    /// Name used for diagnostics and to detect compiler-generated
    /// temporaries (anything prefixed with `_tmp`).
    pub name: String,
    /// Addressing mode.
    pub segment: Segment,
    /// Byte offset from the segment's base register, a multiple of
    /// [`VAR_SIZE`].
    pub offset: i32,
}

impl Location {
    /// The fixed prefix that marks a name as compiler-generated.
    pub const TEMP_PREFIX: &'static str = "_tmp";

    /// A location addressed relative to the frame pointer.
    pub fn frame(name: impl Into<String>, offset: i32) -> Self {
        Location {
            name: name.into(),
            segment: Segment::Frame,
            offset,
        }
    }

    /// A location addressed relative to the global pointer.
    pub fn global(name: impl Into<String>, offset: i32) -> Self {
        Location {
            name: name.into(),
            segment: Segment::Global,
            offset,
        }
    }

    /// A location reached indirectly through `base`, at a further constant
    /// `offset` (used for array elements and object fields).
    pub fn indirect(name: impl Into<String>, base: Location, offset: i32) -> Self {
        Location {
            name: name.into(),
            segment: Segment::Indirect {
                base: Box::new(base),
            },
            offset,
        }
    }

    /// Whether this location names a compiler-generated temporary, the sole
    /// criterion the last-use pass uses to decide what may be discarded.
    pub fn is_temporary(&self) -> bool {
        self.name.starts_with(Self::TEMP_PREFIX)
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.segment == other.segment && self.offset == other.offset
    }
}

impl Eq for Location {}

impl Hash for Location {
    // Consistent with `PartialEq` without requiring `Segment`/`Box<Location>`
    // to implement `Hash`: every location that compares equal necessarily
    // shares `name` and `offset`, which is all an hash map lookup needs.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.offset.hash(state);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
