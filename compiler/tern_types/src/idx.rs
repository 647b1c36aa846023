//! Canonical type handle.
//!
//! `TypeId` is THE type representation handed between components. All
//! descriptors live in the [`TypeArena`](crate::TypeArena) and are referenced
//! by their 32-bit index; structurally equal descriptors share one index, so
//! type equality is an O(1) integer comparison.

use std::fmt;

/// A 32-bit index into the type arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Pre-interned types (indices 0-9) ===

    /// 32-bit signed integer.
    pub const I32: Self = Self(0);
    /// 64-bit signed integer.
    pub const I64: Self = Self(1);
    /// 32-bit float.
    pub const F32: Self = Self(2);
    /// 64-bit float.
    pub const F64: Self = Self(3);
    /// Boolean.
    pub const BOOL: Self = Self(4);
    /// UTF-8 string.
    pub const STRING: Self = Self(5);
    /// The unit type.
    pub const VOID: Self = Self(6);
    /// The absent-value type that marks optional unions (`T | None`).
    pub const NONE: Self = Self(7);
    /// The bottom type.
    pub const NEVER: Self = Self(8);
    /// Placeholder for a type that could not be determined; error recovery
    /// and relaxed-mode padding resolve to it.
    pub const UNKNOWN: Self = Self(9);

    /// First index for dynamically interned types.
    pub const FIRST_DYNAMIC: u32 = 10;

    /// Create an id from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into arena storage.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is one of the pre-interned types.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    /// Check if this is the `unknown` placeholder.
    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.0 == Self::UNKNOWN.0
    }

    /// Check if this is the `never` type.
    #[inline]
    pub const fn is_never(self) -> bool {
        self.0 == Self::NEVER.0
    }

    /// Name of a pre-interned type, `None` for dynamic ids.
    #[inline]
    pub const fn builtin_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("i32"),
            1 => Some("i64"),
            2 => Some("f32"),
            3 => Some("f64"),
            4 => Some("bool"),
            5 => Some("string"),
            6 => Some("void"),
            7 => Some("None"),
            8 => Some("never"),
            9 => Some("unknown"),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin_name() {
            Some(name) => write!(f, "TypeId::{name}"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

/// Identity of a generic type parameter.
///
/// Allocated by the arena; the same declared parameter always maps to the
/// same id for the lifetime of the compilation unit.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeParamId(u32);

impl TypeParamId {
    /// Create from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the arena's parameter table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}", self.0)
    }
}

const _: () = assert!(std::mem::size_of::<TypeId>() == 4);

#[cfg(test)]
mod tests;
