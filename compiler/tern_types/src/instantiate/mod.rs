//! Generic instantiation engine.
//!
//! Resolves object, alias and trait declarations applied to type arguments
//! into concrete types. Every declaration is lowered once into a template
//! over its own type parameters; instances substitute the template.
//!
//! # Resolution states
//!
//! Each [`InstanceKey`] moves through an explicit state machine:
//!
//! ```text
//! (absent) ──▶ InProgress(placeholder) ──▶ Done(ty)
//!                                     └──▶ Failed
//! ```
//!
//! A re-entrant request for an in-progress key receives the placeholder,
//! which is how self-referential declarations terminate. Only keys whose
//! arguments are concrete keep their final state; others are recomputed.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tern_ir::{Name, Span, SymbolRef};

use crate::{ErrorReported, Substitution, TypeErrorKind, TypeId, TypeParamId};

mod alias;
mod key;
mod object;

pub use key::{InstanceKey, ResolutionState};
pub use object::{ObjectResolution, ObjectTemplate, ObjectTypeInfo};

use crate::context::TypingContext;
use alias::AliasTemplate;
use object::TemplateState;

#[cfg(test)]
mod tests;

/// A declared type parameter of a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateParam {
    /// The parameter's declaration.
    pub symbol: SymbolRef,
    pub name: Name,
    pub param: TypeParamId,
}

/// Caches and state machines for one compilation unit.
#[derive(Default)]
pub(crate) struct InstanceCache {
    states: FxHashMap<InstanceKey, ResolutionState>,
    objects: FxHashMap<InstanceKey, Rc<ObjectTypeInfo>>,
    object_templates: FxHashMap<SymbolRef, TemplateState>,
    alias_templates: FxHashMap<SymbolRef, AliasTemplate>,
}

/// Map each template parameter to its argument.
pub(crate) fn bind_params(params: &[TemplateParam], args: &[TypeId]) -> Substitution {
    params
        .iter()
        .zip(args)
        .map(|(p, &arg)| (p.param, arg))
        .collect()
}

impl TypingContext<'_> {
    /// Check the argument count against the declared parameter count.
    ///
    /// Too many arguments is always an error. Missing trailing arguments are
    /// an error in strict mode and padded with `unknown` otherwise.
    pub(crate) fn normalize_type_args(
        &mut self,
        name: Name,
        expected: usize,
        args: &[TypeId],
        span: Span,
    ) -> Result<SmallVec<[TypeId; 4]>, ErrorReported> {
        if args.len() > expected {
            return Err(self.report(
                span,
                TypeErrorKind::TooManyTypeArguments {
                    name,
                    expected,
                    found: args.len(),
                },
            ));
        }
        if args.len() < expected && self.config().is_strict() {
            return Err(self.report(
                span,
                TypeErrorKind::MissingTypeArguments {
                    name,
                    expected,
                    found: args.len(),
                },
            ));
        }
        let mut normalized = SmallVec::from_slice(args);
        normalized.resize(expected, TypeId::UNKNOWN);
        Ok(normalized)
    }

    /// Check each argument against its parameter's bound.
    ///
    /// Bounds may mention earlier parameters; the full argument list is
    /// substituted into each bound before checking.
    pub(crate) fn check_constraints(
        &mut self,
        params: &[TemplateParam],
        args: &[TypeId],
        span: Span,
    ) -> Result<(), ErrorReported> {
        let bindings = bind_params(params, args);
        let mut result = Ok(());
        for (p, &arg) in params.iter().zip(args) {
            if arg.is_unknown() {
                continue;
            }
            let Some(bound) = self.constraint_of(p.param) else {
                continue;
            };
            let bound = self.arena.substitute(bound, &bindings);
            if !self.type_satisfies(arg, bound) {
                result = Err(self.report(
                    span,
                    TypeErrorKind::ConstraintViolation {
                        param: p.name,
                        arg,
                        constraint: bound,
                    },
                ));
            }
        }
        result
    }

    /// Resolve a trait declaration applied to `args` to its trait type.
    pub(crate) fn resolve_trait_type(
        &mut self,
        symbol: SymbolRef,
        args: &[TypeId],
        span: Span,
    ) -> Result<TypeId, ErrorReported> {
        let Some(decl) = self.trait_decls.get(&symbol).cloned() else {
            panic!("no trait declaration registered for {symbol}");
        };
        let params = self.decl_params(symbol);
        let args = self.normalize_type_args(decl.name, params.len(), args, span)?;
        let key = InstanceKey::new(symbol, &args);
        match self.instances.states.get(&key) {
            Some(&ResolutionState::InProgress(ty) | &ResolutionState::Done(ty)) => return Ok(ty),
            Some(ResolutionState::Failed) => return Err(ErrorReported),
            None => {}
        }

        let ty = self.arena.trait_type(symbol, decl.name, &args);
        self.instances
            .states
            .insert(key.clone(), ResolutionState::InProgress(ty));
        let checked = self.check_constraints(&params, &args, span);
        let state = match checked {
            Ok(()) => ResolutionState::Done(ty),
            Err(_) => ResolutionState::Failed,
        };
        self.settle(key, state);
        checked.map(|()| ty)
    }

    /// Record the final state of `key`, keeping it only for concrete keys.
    /// Check if `ty` still mentions the binder of an alias, other than
    /// `symbol`, whose template is being lowered further up the stack.
    ///
    /// Such a result is only meaningful inside that alias and is never
    /// cached; it is rebuilt once the enclosing alias has closed.
    pub(crate) fn is_open_over_alias(&self, symbol: SymbolRef, ty: TypeId) -> bool {
        let building: SmallVec<[TypeParamId; 4]> = self
            .instances
            .alias_templates
            .iter()
            .filter_map(|(&other, template)| match template {
                AliasTemplate::Building(binder) if other != symbol => Some(*binder),
                _ => None,
            })
            .collect();
        !building.is_empty()
            && self
                .arena
                .free_params(ty)
                .iter()
                .any(|param| building.contains(param))
    }

    fn settle(&mut self, key: InstanceKey, state: ResolutionState) {
        if key.is_concrete(&self.arena) {
            tracing::trace!(%key, ?state, "settled instance");
            self.instances.states.insert(key, state);
        } else {
            self.instances.states.remove(&key);
        }
    }

    // === Function instances ===

    /// Check if `key` is resolved or currently being resolved.
    ///
    /// Generic function bodies are re-typed once per key; a driver asks this
    /// before typing a body for a new instantiation.
    pub fn is_cached_or_active(&self, key: &InstanceKey) -> bool {
        self.instances.states.contains_key(key)
    }

    /// Current state of `key`, `None` if resolution never started.
    pub fn resolution_state(&self, key: &InstanceKey) -> Option<ResolutionState> {
        self.instances.states.get(key).copied()
    }

    /// Mark `key` as being resolved.
    ///
    /// Returns `false` without changing anything if it is already cached or
    /// active.
    pub fn begin_instance(&mut self, key: InstanceKey, placeholder: TypeId) -> bool {
        if self.is_cached_or_active(&key) {
            tracing::debug!(%key, "instance already cached or active");
            return false;
        }
        self.instances
            .states
            .insert(key, ResolutionState::InProgress(placeholder));
        true
    }

    /// Finish resolving `key`: `Some(ty)` on success, `None` on failure.
    ///
    /// Non-concrete keys are forgotten so the next request recomputes them.
    pub fn finish_instance(&mut self, key: InstanceKey, result: Option<TypeId>) {
        let state = result.map_or(ResolutionState::Failed, ResolutionState::Done);
        self.settle(key, state);
    }
}
