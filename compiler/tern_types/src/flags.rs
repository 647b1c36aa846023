//! Pre-computed type metadata flags.
//!
//! `TypeFlags` are computed once when a descriptor is interned and cached
//! beside it, so common questions ("does this mention a type parameter?",
//! "is this fully concrete?") never require a traversal.

use bitflags::bitflags;

bitflags! {
    /// Pre-computed type properties for O(1) queries.
    ///
    /// Used to gate substitution (no `HAS_PARAM` means substitution is a
    /// no-op) and instantiation caching (no `HAS_UNKNOWN` means concrete).
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeFlags: u32 {
        // === Presence Flags (bits 0-7) ===

        /// Mentions a free type parameter.
        const HAS_PARAM = 1 << 0;
        /// Mentions the `unknown` placeholder.
        const HAS_UNKNOWN = 1 << 1;
        /// Contains a recursive binder somewhere inside.
        const HAS_RECURSIVE = 1 << 2;

        // === Category Flags (bits 8-19) ===

        /// Primitive leaf type.
        const IS_PRIMITIVE = 1 << 8;
        /// Bare type parameter reference.
        const IS_PARAM = 1 << 9;
        /// Nominal object identity.
        const IS_NOMINAL = 1 << 10;
        /// Structural record.
        const IS_STRUCTURAL = 1 << 11;
        /// Trait reference.
        const IS_TRAIT = 1 << 12;
        /// Function type.
        const IS_FUNCTION = 1 << 13;
        /// Union type.
        const IS_UNION = 1 << 14;
        /// Intersection type.
        const IS_INTERSECTION = 1 << 15;
        /// Fixed array type.
        const IS_ARRAY = 1 << 16;
        /// Recursive type.
        const IS_RECURSIVE = 1 << 17;
    }
}

impl TypeFlags {
    /// Flags that propagate from child types to parents.
    pub const PROPAGATE_MASK: Self = Self::from_bits_truncate(
        Self::HAS_PARAM.bits() | Self::HAS_UNKNOWN.bits() | Self::HAS_RECURSIVE.bits(),
    );

    /// Check if the type mentions free type parameters.
    #[inline]
    pub const fn has_params(self) -> bool {
        self.contains(Self::HAS_PARAM)
    }

    /// Check if the type mentions the `unknown` placeholder.
    #[inline]
    pub const fn has_unknown(self) -> bool {
        self.contains(Self::HAS_UNKNOWN)
    }

    /// Concrete: no free parameters and no placeholders.
    #[inline]
    pub const fn is_concrete(self) -> bool {
        !self.intersects(Self::HAS_PARAM.union(Self::HAS_UNKNOWN))
    }

    /// Flags inherited by a parent from this child.
    #[inline]
    #[must_use]
    pub const fn propagated(self) -> Self {
        self.intersection(Self::PROPAGATE_MASK)
    }
}
