//! Handles shared by the binder and the type core.
//!
//! Everything here is small and `Copy`: interned [`Name`]s, byte [`Span`]s,
//! cross-module [`SymbolRef`]s, [`ExprId`]s keying the output tables, and
//! [`HirTypeExpr`], a type annotation whose names are already bound to
//! declarations. No parsing or name lookup happens in this crate.

mod effect;
mod expr_id;
mod hir_type;
mod interner;
mod name;
mod span;
mod symbol;

pub use effect::EffectRow;
pub use expr_id::ExprId;
pub use hir_type::{HirFnParamType, HirObjectField, HirTypeExpr, HirTypeExprKind};
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::Span;
pub use symbol::{ModuleId, PackageId, SymbolId, SymbolRef};

// Handles are stored in every side table; keep them small.
#[cfg(target_pointer_width = "64")]
const _: () = {
    assert!(std::mem::size_of::<Name>() == 4);
    assert!(std::mem::size_of::<Span>() == 8);
    assert!(std::mem::size_of::<SymbolRef>() == 8);
};
