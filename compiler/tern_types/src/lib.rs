//! Type core for Tern.
//!
//! Four components share one [`TypingContext`] per compilation unit:
//!
//! - **Type arena**: interned, canonical type descriptors behind `TypeId`
//!   handles, with substitution, recursive types and unification
//! - **Generic instantiation**: object, alias and trait declarations applied
//!   to type arguments, cached per [`InstanceKey`]
//! - **Trait resolution**: impl templates matched against types, with base
//!   delegation and lazy hydration of imported impls
//! - **Call resolution**: argument matching, overload selection, type
//!   argument inference and curried application
//!
//! # Design
//!
//! - Every mutable cache lives in the context; nothing is global
//! - User errors are values ([`TypeCheckError`]) and the offending
//!   expression types as `unknown`; contract violations between components
//!   panic
//! - Descriptors are a closed enum matched exhaustively

mod arena;
mod calls;
mod config;
mod context;
mod data;
mod decl;
pub mod effects;
mod error;
mod flags;
mod idx;
mod instantiate;
mod output;
mod signature;
mod traits;
mod unify;

pub use arena::{NotContractive, Substitution, TypeArena, TypeParamInfo};
pub use calls::{
    match_arguments, ArgBinding, ArgMatch, CallArg, CallResolution, CallSite, Callee, MatchError,
    MatchOptions,
};
pub use config::{TypeckConfig, TypingMode};
pub use context::TypingContext;
pub use data::{FnParam, Primitive, StructField, TypeData, Visibility};
pub use decl::{
    FieldDecl, FunctionDecl, ImplDecl, ObjectDecl, ParamDecl, TraitDecl, TypeAliasDecl,
    TypeParamDecl,
};
pub use effects::{CapabilitySetEffects, EffectRow, EffectSystem};
pub use error::{ErrorReported, InheritedFieldProblem, TypeCheckError, TypeErrorKind};
pub use flags::TypeFlags;
pub use idx::{TypeId, TypeParamId};
pub use instantiate::{
    InstanceKey, ObjectResolution, ObjectTemplate, ObjectTypeInfo, ResolutionState, TemplateParam,
};
pub use output::{CallTarget, ResolutionTables};
pub use signature::{FunctionSignature, ParamSignature};
pub use traits::{ImplTemplate, TraitImplInstance, TraitMethodLink, TraitRegistry};
pub use unify::{unify, StepBudget, StructuralResolver, UnifyError, UnifyOptions, Unifier, Variance};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Enable with `RUST_LOG=tern_types=debug` or
/// `RUST_LOG=tern_types=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

#[cfg(target_pointer_width = "64")]
const _: () = {
    assert!(std::mem::size_of::<TypeId>() == 4);
    assert!(std::mem::size_of::<TypeParamId>() == 4);
};
