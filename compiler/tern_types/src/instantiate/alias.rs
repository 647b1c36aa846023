//! Type alias templates.
//!
//! An alias target is lowered once with a fresh binder standing in for the
//! alias itself. If the target mentions the binder, the template becomes a
//! `recursive` type, which must be contractive.
//!
//! While mutually recursive aliases are lowered, the inner one sees the
//! outer one only as its binder. Such open templates are dropped after use
//! and lowered again once the outer alias is ready.

use tern_ir::{Span, SymbolRef};

use crate::context::TypingContext;
use crate::{ErrorReported, TypeData, TypeErrorKind, TypeId, TypeParamId};

use super::{bind_params, InstanceKey, ResolutionState};

pub(crate) enum AliasTemplate {
    /// Lowering the target; self-references resolve to the binder.
    Building(TypeParamId),
    Ready(TypeId),
    Failed,
}

impl TypingContext<'_> {
    /// Resolve a type alias applied to `args`.
    #[tracing::instrument(level = "debug", skip(self, args, span), fields(%symbol))]
    pub fn resolve_alias(
        &mut self,
        symbol: SymbolRef,
        args: &[TypeId],
        span: Span,
    ) -> Result<TypeId, ErrorReported> {
        let Some(decl) = self.aliases.get(&symbol).cloned() else {
            panic!("no type alias registered for {symbol}");
        };
        let params = self.decl_params(symbol);
        let args = self.normalize_type_args(decl.name, params.len(), args, span)?;

        match self.instances.alias_templates.get(&symbol) {
            Some(&AliasTemplate::Building(binder)) => {
                let identity = params
                    .iter()
                    .zip(&args)
                    .all(|(p, &arg)| self.arena.get(arg) == &TypeData::TypeParam(p.param));
                // A self-reference with other arguments would need
                // polymorphic recursion.
                return Ok(if identity {
                    self.arena.param_ref(binder)
                } else {
                    TypeId::UNKNOWN
                });
            }
            Some(AliasTemplate::Failed) => return Err(ErrorReported),
            Some(AliasTemplate::Ready(_)) | None => {}
        }

        let key = InstanceKey::new(symbol, &args);
        match self.instances.states.get(&key) {
            Some(&ResolutionState::InProgress(ty) | &ResolutionState::Done(ty)) => return Ok(ty),
            Some(ResolutionState::Failed) => return Err(ErrorReported),
            None => {}
        }

        let template = self.alias_template(symbol)?;
        self.instances
            .states
            .insert(key.clone(), ResolutionState::InProgress(TypeId::UNKNOWN));
        let checked = self.check_constraints(&params, &args, span);
        let result = checked.map(|()| {
            let bindings = bind_params(&params, &args);
            self.arena.substitute(template, &bindings)
        });
        if matches!(result, Ok(ty) if self.is_open_over_alias(symbol, ty)) {
            self.instances.states.remove(&key);
            return result;
        }
        let state = match result {
            Ok(ty) => ResolutionState::Done(ty),
            Err(_) => ResolutionState::Failed,
        };
        self.settle(key, state);
        result
    }

    fn alias_template(&mut self, symbol: SymbolRef) -> Result<TypeId, ErrorReported> {
        match self.instances.alias_templates.get(&symbol) {
            Some(&AliasTemplate::Ready(ty)) => return Ok(ty),
            Some(AliasTemplate::Failed) => return Err(ErrorReported),
            Some(AliasTemplate::Building(_)) | None => {}
        }
        let Some(decl) = self.aliases.get(&symbol).cloned() else {
            panic!("no type alias registered for {symbol}");
        };

        let binder = self.arena.fresh_type_param(decl.name);
        self.instances
            .alias_templates
            .insert(symbol, AliasTemplate::Building(binder));
        let body = self.resolve_type_expr(&decl.target);

        let result = if self.arena.mentions_param(body, binder) {
            self.arena.close_recursive(binder, body).map_err(|_| {
                self.report(
                    decl.span,
                    TypeErrorKind::NotContractive { name: decl.name },
                )
            })
        } else {
            Ok(body)
        };
        let state = match result {
            Ok(ty) if self.is_open_over_alias(symbol, ty) => {
                tracing::debug!(%symbol, "alias template open over an enclosing alias");
                self.instances.alias_templates.remove(&symbol);
                return result;
            }
            Ok(ty) => AliasTemplate::Ready(ty),
            Err(_) => AliasTemplate::Failed,
        };
        tracing::debug!(%symbol, ok = result.is_ok(), "built alias template");
        self.instances.alias_templates.insert(symbol, state);
        result
    }
}
