//! Boundary to the effect system.
//!
//! Effect rows are opaque [`EffectRow`] handles attached to function types.
//! The type core only needs to compose rows, check one row against another
//! during unification, and ask whether a row is empty; everything else about
//! effects lives outside this crate.

pub use tern_ir::EffectRow;

/// Operations the type core needs from the effect system.
pub trait EffectSystem {
    /// Combine several rows into one (e.g. the rows of a curried chain).
    fn compose(&self, rows: &[EffectRow]) -> EffectRow;

    /// Check that a function with row `actual` may be used where `expected`
    /// is required.
    fn constrain(&self, actual: EffectRow, expected: EffectRow) -> bool;

    /// Check whether `row` performs no effects.
    fn is_empty(&self, row: EffectRow) -> bool;
}

/// Effect system that reads each row handle as a capability bitset.
///
/// Composition is union, a row satisfies another if it is a subset of it.
/// Drivers without a full effect system and the tests use this.
#[derive(Copy, Clone, Debug, Default)]
pub struct CapabilitySetEffects;

impl EffectSystem for CapabilitySetEffects {
    fn compose(&self, rows: &[EffectRow]) -> EffectRow {
        EffectRow(rows.iter().fold(0, |acc, row| acc | row.0))
    }

    fn constrain(&self, actual: EffectRow, expected: EffectRow) -> bool {
        actual.0 & !expected.0 == 0
    }

    fn is_empty(&self, row: EffectRow) -> bool {
        row.0 == 0
    }
}
