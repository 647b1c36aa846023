//! Call and overload resolution.
//!
//! A call names either an overload set or a callee value. Resolution picks
//! the signature, matches arguments to parameters, infers type arguments
//! and continues through curried result types until every argument is
//! consumed.
//!
//! # Pipeline
//!
//! ```text
//! CallSite
//!   ├── Callee::Overloads ──▶ trial every candidate (errors discarded)
//!   │                          ├── 1 passes  ──▶ selected
//!   │                          ├── 0 pass    ──▶ trait dispatch, else E2024
//!   │                          └── n pass    ──▶ E2023, or `unknown` when
//!   │                                            an argument is `unknown`
//!   └── Callee::Value ──────▶ function type as the only signature
//!
//! selected stage ──▶ result is a function and arguments remain?
//!                     └── yes: next stage on the remaining arguments
//! ```
//!
//! Failures are reported once and the call's type becomes `unknown`.

use std::rc::Rc;

use tern_ir::{ExprId, Name, Span, SymbolRef};

use crate::context::TypingContext;
use crate::{
    EffectRow, ErrorReported, FunctionSignature, InstanceKey, ParamSignature, Substitution, TypeCheckError,
    TypeData, TypeErrorKind, TypeId,
};

mod bind;
mod matching;


pub use matching::{match_arguments, ArgMatch, MatchError, MatchOptions};

/// One argument of a call, already typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallArg {
    pub ty: TypeId,
    pub label: Option<Name>,
    pub span: Span,
    /// The argument expression, when the caller wants its type recorded.
    pub expr: Option<ExprId>,
}

impl CallArg {
    pub fn positional(ty: TypeId) -> Self {
        CallArg {
            ty,
            label: None,
            span: Span::DUMMY,
            expr: None,
        }
    }

    pub fn labeled(label: Name, ty: TypeId) -> Self {
        CallArg {
            label: Some(label),
            ..Self::positional(ty)
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn with_expr(mut self, expr: ExprId) -> Self {
        self.expr = Some(expr);
        self
    }
}

/// What is being called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    /// Functions sharing the called name. Never empty.
    Overloads(Vec<SymbolRef>),
    /// A value of function type (closure, field, call result).
    Value(TypeId),
}

/// A call expression as the checker sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub expr: ExprId,
    pub span: Span,
    pub callee: Callee,
    pub args: Vec<CallArg>,
    /// Type the surrounding expression expects, used to infer type
    /// arguments the call's arguments leave open.
    pub expected: Option<TypeId>,
}

/// How a parameter received its value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgBinding {
    /// From the argument at this index.
    Arg(usize),
    /// From field `field` of the structural argument at `arg`.
    Spread { arg: usize, field: Name },
    /// Left out; optional parameters only.
    Absent,
}

impl ArgBinding {
    /// The same binding with argument indexes moved by `offset`.
    fn shifted(self, offset: usize) -> Self {
        match self {
            ArgBinding::Arg(i) => ArgBinding::Arg(i + offset),
            ArgBinding::Spread { arg, field } => ArgBinding::Spread {
                arg: arg + offset,
                field,
            },
            ArgBinding::Absent => ArgBinding::Absent,
        }
    }
}

/// Outcome of a resolved call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallResolution {
    /// The selected function; the trait method for trait dispatch, `None`
    /// for calls through a value.
    pub target: Option<SymbolRef>,
    /// Inferred type arguments of the target, in declaration order.
    pub type_args: Vec<TypeId>,
    pub instance_key: Option<InstanceKey>,
    /// Type of the whole call after every curried stage.
    pub result: TypeId,
    pub trait_dispatch: bool,
    /// Parameter bindings of every stage in order, with indexes into the
    /// call's argument list.
    pub bindings: Vec<ArgBinding>,
    /// Effects of every stage applied, composed.
    pub effects: EffectRow,
}

impl CallResolution {
    fn unknown() -> Self {
        CallResolution {
            target: None,
            type_args: Vec::new(),
            instance_key: None,
            result: TypeId::UNKNOWN,
            trait_dispatch: false,
            bindings: Vec::new(),
            effects: EffectRow::PURE,
        }
    }
}

/// One signature applied to a run of arguments.
struct Applied {
    consumed: usize,
    result: TypeId,
    bindings: Vec<ArgBinding>,
    type_args: Vec<TypeId>,
    effects: EffectRow,
}

impl From<MatchError> for TypeCheckError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::Missing { index, param, span } => {
                TypeCheckError::new(span, TypeErrorKind::MissingArgument { param, index })
            }
            MatchError::Label {
                expected,
                found,
                span,
                ..
            } => TypeCheckError::new(span, TypeErrorKind::LabelMismatch { expected, found }),
            MatchError::Extra {
                expected,
                found,
                span,
            } => TypeCheckError::new(span, TypeErrorKind::ExtraArguments { expected, found }),
        }
    }
}

impl TypingContext<'_> {
    // === Signatures ===

    /// The lowered signature of a registered function.
    ///
    /// # Panics
    ///
    /// Panics if `symbol` was never registered; the binder only hands out
    /// symbols of declared functions.
    pub fn signature(&mut self, symbol: SymbolRef) -> Rc<FunctionSignature> {
        if let Some(sig) = self.signatures.get(&symbol) {
            return Rc::clone(sig);
        }
        let Some(decl) = self.functions.get(&symbol).cloned() else {
            panic!("no function declaration registered for {symbol}");
        };
        let type_params = self.decl_params(symbol).iter().map(|p| p.param).collect();
        let mut params = Vec::with_capacity(decl.params.len());
        for p in &decl.params {
            params.push(ParamSignature {
                ty: self.resolve_type_expr(&p.ty),
                label: p.label,
                name: Some(p.name),
                optional: p.optional,
                span: p.span,
            });
        }
        // Un-annotated returns stay unknown until the body is typed.
        let ret = match &decl.ret {
            Some(ret) => self.resolve_type_expr(ret),
            None => TypeId::UNKNOWN,
        };
        let sig = Rc::new(FunctionSignature {
            params,
            ret,
            effects: decl.effects,
            type_params,
        });
        self.signatures.insert(symbol, Rc::clone(&sig));
        sig
    }

    // === Entry points ===

    /// Resolve a call and record the outcome in the output tables.
    ///
    /// On failure the call's expression type is recorded as `unknown`.
    #[tracing::instrument(level = "debug", skip_all, fields(expr = site.expr.raw()))]
    pub fn resolve_call(&mut self, site: &CallSite) -> Result<CallResolution, ErrorReported> {
        let saved = std::mem::replace(&mut self.current_span, site.span);
        let outcome = match &site.callee {
            Callee::Overloads(candidates) => self.resolve_overloaded(site, candidates),
            Callee::Value(ty) => self.resolve_value_call(site, *ty),
        };
        self.current_span = saved;

        for arg in &site.args {
            if let Some(expr) = arg.expr {
                self.tables.record_type(expr, arg.ty);
            }
        }
        match &outcome {
            Ok(resolution) => {
                self.tables.record_type(site.expr, resolution.result);
                if let (Some(symbol), Some(key)) = (resolution.target, &resolution.instance_key) {
                    self.tables.record_call(
                        site.expr,
                        crate::CallTarget {
                            symbol,
                            type_args: resolution.type_args.clone(),
                            instance_key: key.clone(),
                        },
                        resolution.trait_dispatch,
                    );
                }
            }
            Err(ErrorReported) => self.tables.record_type(site.expr, TypeId::UNKNOWN),
        }
        outcome
    }

    /// Resolve a call, returning only its type.
    pub fn check_call(&mut self, site: &CallSite) -> TypeId {
        self.resolve_call(site)
            .map_or(TypeId::UNKNOWN, |resolution| resolution.result)
    }

    // === Callees ===

    fn resolve_value_call(
        &mut self,
        site: &CallSite,
        ty: TypeId,
    ) -> Result<CallResolution, ErrorReported> {
        if ty.is_unknown() {
            return Ok(CallResolution::unknown());
        }
        let resolution = CallResolution {
            result: ty,
            ..CallResolution::unknown()
        };
        self.apply_curried(resolution, site, 0, true)
    }

    fn resolve_overloaded(
        &mut self,
        site: &CallSite,
        candidates: &[SymbolRef],
    ) -> Result<CallResolution, ErrorReported> {
        let Some(&first) = candidates.first() else {
            panic!("empty overload set at {:?}", site.span);
        };

        if let [symbol] = candidates {
            let sig = self.signature(*symbol);
            let applied = match self.apply_signature(&sig, &site.args, site.expected, site.span) {
                Ok(applied) => applied,
                Err(errors) => {
                    self.push_errors(errors);
                    return Err(ErrorReported);
                }
            };
            return self.after_first_stage(Some(*symbol), false, applied, site);
        }

        let mut passing = Vec::new();
        for &symbol in candidates {
            let sig = self.signature(symbol);
            if let Ok(applied) = self.apply_signature(&sig, &site.args, site.expected, site.span) {
                passing.push((symbol, applied));
            }
        }
        tracing::debug!(
            candidates = candidates.len(),
            passing = passing.len(),
            "overload trial"
        );

        let name = self.function_name(first);
        match passing.len() {
            1 => {
                let (symbol, applied) = passing.remove(0);
                self.after_first_stage(Some(symbol), false, applied, site)
            }
            0 => match self.trait_dispatch(site, candidates)? {
                Some((method, applied)) => self.after_first_stage(Some(method), true, applied, site),
                None => Err(self.report(
                    site.span,
                    TypeErrorKind::NoMatchingOverload {
                        name,
                        candidates: candidates.len(),
                    },
                )),
            },
            // An `unknown` argument fits every candidate; its error is
            // already on record.
            n if site.args.iter().any(|arg| self.arena.flags(arg.ty).has_unknown()) => {
                tracing::debug!(passing = n, "ambiguity from unknown arguments absorbed");
                Ok(CallResolution::unknown())
            }
            n => Err(self.report(
                site.span,
                TypeErrorKind::AmbiguousOverload {
                    name,
                    candidates: n,
                },
            )),
        }
    }

    fn function_name(&self, symbol: SymbolRef) -> Name {
        match self.functions.get(&symbol) {
            Some(decl) => decl.name,
            None => panic!("no function declaration registered for {symbol}"),
        }
    }

    /// Resolve through a trait table when the receiver is a trait type.
    ///
    /// Candidates implementing the same trait method collapse into one
    /// dispatch target; several distinct methods are ambiguous.
    fn trait_dispatch(
        &mut self,
        site: &CallSite,
        candidates: &[SymbolRef],
    ) -> Result<Option<(SymbolRef, Applied)>, ErrorReported> {
        let Some(receiver) = site.args.first() else {
            return Ok(None);
        };
        let TypeData::Trait {
            owner: trait_symbol,
            ..
        } = *self.arena.get(receiver.ty)
        else {
            return Ok(None);
        };

        let mut methods: Vec<(SymbolRef, Applied)> = Vec::new();
        for &symbol in candidates {
            let Some(link) = self.traits.method_link(symbol) else {
                continue;
            };
            if link.trait_symbol != trait_symbol || methods.iter().any(|(m, _)| *m == link.method)
            {
                continue;
            }
            let mut sig = (*self.signature(symbol)).clone();
            if let Some(self_param) = sig.params.first_mut() {
                self_param.ty = receiver.ty;
            }
            if let Ok(mut applied) =
                self.apply_signature(&sig, &site.args, site.expected, site.span)
            {
                // The impl's own type arguments do not apply to the method.
                applied.type_args.clear();
                methods.push((link.method, applied));
            }
        }

        match methods.len() {
            0 => Ok(None),
            1 => {
                let (method, applied) = methods.remove(0);
                tracing::debug!(%method, "call resolved through trait dispatch");
                Ok(Some((method, applied)))
            }
            n => {
                let name = self.function_name(candidates[0]);
                Err(self.report(
                    site.span,
                    TypeErrorKind::AmbiguousOverload {
                        name,
                        candidates: n,
                    },
                ))
            }
        }
    }

    // === Stages ===

    fn after_first_stage(
        &mut self,
        target: Option<SymbolRef>,
        trait_dispatch: bool,
        applied: Applied,
        site: &CallSite,
    ) -> Result<CallResolution, ErrorReported> {
        self.check_progress(applied.consumed, site.args.len())?;
        let resolution = CallResolution {
            target,
            instance_key: target.map(|s| InstanceKey::new(s, &applied.type_args)),
            type_args: applied.type_args,
            result: applied.result,
            trait_dispatch,
            bindings: applied.bindings,
            effects: applied.effects,
        };
        let consumed = applied.consumed;
        self.apply_curried(resolution, site, consumed, false)
    }

    /// Apply `resolution.result` to the arguments from `offset` on, one
    /// stage per function type, until no argument is left.
    ///
    /// `first` forces one stage even without arguments, so that calling a
    /// value applies it.
    fn apply_curried(
        &mut self,
        mut resolution: CallResolution,
        site: &CallSite,
        mut offset: usize,
        mut first: bool,
    ) -> Result<CallResolution, ErrorReported> {
        while first || offset < site.args.len() {
            first = false;
            let current = resolution.result;
            if current.is_unknown() {
                break;
            }
            let Some(sig) = FunctionSignature::from_function_type(&self.arena, current) else {
                return Err(self.report(site.span, TypeErrorKind::NotCallable { ty: current }));
            };
            let rest = &site.args[offset..];
            let applied = match self.apply_signature(&sig, rest, site.expected, site.span) {
                Ok(applied) => applied,
                Err(errors) => {
                    self.push_errors(errors);
                    return Err(ErrorReported);
                }
            };
            self.check_progress(applied.consumed, rest.len())?;
            tracing::trace!(offset, consumed = applied.consumed, "applied curried stage");
            resolution
                .bindings
                .extend(applied.bindings.into_iter().map(|b| b.shifted(offset)));
            resolution.result = applied.result;
            resolution.effects = self.compose_effects(&[resolution.effects, applied.effects]);
            offset += applied.consumed;
        }
        Ok(resolution)
    }

    fn check_progress(&mut self, consumed: usize, available: usize) -> Result<(), ErrorReported> {
        if consumed == 0 && available > 0 {
            return Err(self.report(
                self.current_span,
                TypeErrorKind::CurriedNoProgress {
                    remaining: available,
                },
            ));
        }
        Ok(())
    }

    /// Match, infer and check one signature against `args`.
    ///
    /// Problems are returned rather than reported so overload trials can
    /// discard them.
    fn apply_signature(
        &mut self,
        sig: &FunctionSignature,
        args: &[CallArg],
        expected: Option<TypeId>,
        span: Span,
    ) -> Result<Applied, Vec<TypeCheckError>> {
        let options = MatchOptions {
            allow_trailing: matches!(self.arena.get(sig.ret), TypeData::Function { .. }),
            punned_labels: false,
        };
        let matched = match_arguments(
            &self.arena,
            &self.structural_of,
            &sig.params,
            args,
            options,
            span,
        )
        .map_err(|err| vec![TypeCheckError::from(err)])?;

        let mut errors = Vec::new();
        let mut bindings = Substitution::default();
        let mut unbindable = Vec::new();
        if sig.is_generic() {
            for (index, (param, &binding)) in sig.params.iter().zip(&matched.bindings).enumerate() {
                let Some((actual, _)) = self.binding_type(args, binding) else {
                    continue;
                };
                if !self.bind_type_params_from_type(param.ty, actual, &sig.type_params, &mut bindings)
                {
                    unbindable.push(index);
                }
            }
            if let Some(expected) = expected {
                if matched.consumed == args.len() && !expected.is_unknown() {
                    let mut from_expected = Substitution::default();
                    self.bind_type_params_from_type(
                        sig.ret,
                        expected,
                        &sig.type_params,
                        &mut from_expected,
                    );
                    for (param, ty) in from_expected {
                        bindings.entry(param).or_insert(ty);
                    }
                }
            }
            for &param in &sig.type_params {
                if bindings.contains_key(&param) {
                    continue;
                }
                if self.config().is_strict() {
                    let name = self.arena.param_info(param).name;
                    errors.push(TypeCheckError::new(
                        span,
                        TypeErrorKind::CannotInfer { param: name },
                    ));
                }
                bindings.insert(param, TypeId::UNKNOWN);
            }
        }

        let instantiated = sig.substituted(&mut self.arena, &bindings);
        for (index, (param, &binding)) in instantiated
            .params
            .iter()
            .zip(&matched.bindings)
            .enumerate()
        {
            let Some((actual, arg_span)) = self.binding_type(args, binding) else {
                continue;
            };
            if unbindable.contains(&index) || !self.type_satisfies(actual, param.ty) {
                errors.push(TypeCheckError::new(
                    arg_span,
                    TypeErrorKind::Mismatch {
                        expected: param.ty,
                        found: actual,
                    },
                ));
            }
        }

        let type_args: Vec<TypeId> = sig
            .type_params
            .iter()
            .map(|p| bindings.get(p).copied().unwrap_or(TypeId::UNKNOWN))
            .collect();
        for (&param, &arg) in sig.type_params.iter().zip(&type_args) {
            if arg.is_unknown() {
                continue;
            }
            let Some(bound) = self.constraint_of(param) else {
                continue;
            };
            let bound = self.arena.substitute(bound, &bindings);
            if !self.type_satisfies(arg, bound) {
                errors.push(TypeCheckError::new(
                    span,
                    TypeErrorKind::ConstraintViolation {
                        param: self.arena.param_info(param).name,
                        arg,
                        constraint: bound,
                    },
                ));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Applied {
            consumed: matched.consumed,
            result: instantiated.ret,
            bindings: matched.bindings,
            type_args,
            effects: instantiated.effects,
        })
    }

    /// Type and position of the value bound to a parameter.
    fn binding_type(&self, args: &[CallArg], binding: ArgBinding) -> Option<(TypeId, Span)> {
        match binding {
            ArgBinding::Arg(i) => Some((args[i].ty, args[i].span)),
            ArgBinding::Spread { arg, field } => {
                let fields = self.fields_of(args[arg].ty)?;
                let field = fields.iter().find(|f| f.name == field)?;
                Some((field.ty, args[arg].span))
            }
            ArgBinding::Absent => None,
        }
    }
}
