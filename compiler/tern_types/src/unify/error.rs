//! Unification failures.
//!
//! Failures are ordinary values: callers such as overload filtering try the
//! next candidate, others turn the error into a positioned diagnostic.

use tern_ir::{EffectRow, Name};

use crate::{TypeId, TypeParamId};

/// Why two types failed to unify.
#[derive(Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum UnifyError {
    /// The types have incompatible shapes.
    #[error("type mismatch")]
    Mismatch {
        /// The type the context required.
        expected: TypeId,
        /// The type that was found.
        found: TypeId,
    },

    /// Function types with different parameter counts.
    #[error("expected {expected} parameters, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// A required field of the expected record is absent.
    #[error("missing field")]
    MissingField { field: Name, expected: TypeId },

    /// The actual effect row is not allowed where the expected one is.
    #[error("effect row mismatch")]
    EffectMismatch {
        expected: EffectRow,
        found: EffectRow,
    },

    /// Binding the parameter would create an infinite type.
    #[error("infinite type")]
    OccursCheck { param: TypeParamId, ty: TypeId },

    /// The shared step budget ran out.
    #[error("unification step budget of {max_steps} exceeded")]
    BudgetExceeded { max_steps: u32 },
}

impl UnifyError {
    /// Check if the failure came from the step budget rather than the types.
    #[inline]
    pub fn is_budget(&self) -> bool {
        matches!(self, UnifyError::BudgetExceeded { .. })
    }
}
