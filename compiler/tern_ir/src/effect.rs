//! Opaque effect row handle.

/// Handle to an effect row owned by the effect system.
///
/// The type core only stores, hashes and compares these; composing and
/// constraining rows is delegated to the effect system.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Default)]
#[repr(transparent)]
pub struct EffectRow(pub u32);

impl EffectRow {
    /// The empty (pure) row.
    pub const PURE: EffectRow = EffectRow(0);
}
