//! Cross-module declaration references.
//!
//! The binder resolves every identifier to a `SymbolRef`: the module that
//! declares it plus the module-local symbol index. The type core compares
//! these for equality and uses them as map keys; it never asks where a module
//! lives on disk or in which order modules were loaded.

use std::fmt;

/// Identifier of a module within the compilation session.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
#[repr(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    /// Create a module id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ModuleId(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Module-local symbol index assigned by the binder.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
#[repr(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Create a symbol id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        SymbolId(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identifier of the package a declaration was compiled from.
///
/// Used for package-private field visibility.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Default)]
#[repr(transparent)]
pub struct PackageId(pub u32);

/// A declaration reference that is stable across module boundaries.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolRef {
    pub module: ModuleId,
    pub symbol: SymbolId,
}

impl SymbolRef {
    /// Create a symbol reference.
    #[inline]
    pub const fn new(module: ModuleId, symbol: SymbolId) -> Self {
        SymbolRef { module, symbol }
    }

    /// Shorthand for tests and generated declarations.
    #[inline]
    pub const fn from_raw(module: u32, symbol: u32) -> Self {
        SymbolRef {
            module: ModuleId::new(module),
            symbol: SymbolId::new(symbol),
        }
    }
}

impl fmt::Debug for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{:?}", self.module, self.symbol)
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module.raw(), self.symbol.raw())
    }
}
