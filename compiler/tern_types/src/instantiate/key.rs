//! Instance keys and the per-key resolution state machine.

use std::fmt;

use smallvec::SmallVec;
use tern_ir::SymbolRef;

use crate::{TypeArena, TypeId};

/// Identity of one instantiation: a declaration applied to type arguments.
///
/// Sound as a cache key because type ids are canonical.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct InstanceKey {
    pub symbol: SymbolRef,
    pub args: SmallVec<[TypeId; 4]>,
}

impl InstanceKey {
    pub fn new(symbol: SymbolRef, args: &[TypeId]) -> Self {
        InstanceKey {
            symbol,
            args: SmallVec::from_slice(args),
        }
    }

    /// Check if every argument is free of parameters and placeholders.
    ///
    /// Only concrete keys may be cached.
    pub fn is_concrete(&self, arena: &TypeArena) -> bool {
        self.args.iter().all(|&a| arena.flags(a).is_concrete())
    }
}

/// Renders as `module:symbol<arg,arg>` with raw type ids.
impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", arg.raw())?;
        }
        f.write_str(">")
    }
}

/// Where the resolution of one key stands. Absence means not started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionState {
    /// Being resolved; re-entrant requests receive the placeholder.
    InProgress(TypeId),
    /// Resolved to the given type.
    Done(TypeId),
    /// Resolution failed and was reported.
    Failed,
}
