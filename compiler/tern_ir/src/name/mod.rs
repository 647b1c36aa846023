//! Interned identifiers.

use std::fmt;

/// Handle to a string held by a [`StringInterner`](crate::StringInterner).
///
/// Equal names mean equal text, provided both came from the same interner.
/// The default name is the empty string.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    pub const EMPTY: Name = Name(0);

    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Slot in the interner's table.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name#{}", self.0)
    }
}
