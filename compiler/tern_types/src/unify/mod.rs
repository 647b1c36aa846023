//! Substitution-based unification with variance and a step budget.
//!
//! `unify(actual, expected)` succeeds when a value of type `actual` may be
//! used where `expected` is required, accumulating bindings for the type
//! parameters it meets along the way.
//!
//! # Rules
//!
//! - identical ids unify immediately (canonical interning)
//! - `unknown` on either side unifies only in lenient mode
//! - `never` is the bottom type in covariant mode
//! - an unbound parameter on either side binds (occurs-checked); a bound
//!   parameter is replaced by its binding first
//! - recursive types unfold, with the pair assumed equal while comparing
//! - unions and intersections decompose member-wise; alternatives are tried
//!   against a snapshot of the bindings and rolled back on failure
//! - nominal types need the same owner and unifiable arguments; a nominal
//!   may widen to its structural projection through a
//!   [`StructuralResolver`]
//! - records use width subtyping (covariant) or exact field sets
//!   (invariant)
//! - functions need equal arity; parameters compare with sides swapped and
//!   effect rows are checked by the [`EffectSystem`]
//!
//! Every recursive step consumes one unit of the shared [`StepBudget`].

mod budget;
mod error;

pub use budget::StepBudget;
pub use error::UnifyError;

use std::collections::HashMap;
use std::hash::BuildHasher;

use rustc_hash::FxHashSet;
use tern_stack::with_stack_guard;

use crate::arena::{Substitution, TypeArena};
use crate::effects::EffectSystem;
use crate::{TypeData, TypeId, TypeParamId};

/// How strictly types must agree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variance {
    /// `actual` may be a subtype of `expected`.
    #[default]
    Covariant,
    /// `actual` and `expected` must be equivalent.
    Invariant,
}

/// Per-call unification options.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UnifyOptions {
    pub variance: Variance,
    /// Treat `unknown` as compatible with everything.
    pub allow_unknown: bool,
}

impl UnifyOptions {
    /// Covariant, strict about `unknown`.
    pub const COVARIANT: UnifyOptions = UnifyOptions {
        variance: Variance::Covariant,
        allow_unknown: false,
    };

    /// Invariant, strict about `unknown`.
    pub const INVARIANT: UnifyOptions = UnifyOptions {
        variance: Variance::Invariant,
        allow_unknown: false,
    };

    /// Same options with lenient `unknown` handling switched on or off.
    #[must_use]
    pub const fn allowing_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }
}

/// Widens a nominal type to its structural projection.
pub trait StructuralResolver {
    /// The structural projection of `nominal`, if it has one.
    fn structural_of(&self, nominal: TypeId) -> Option<TypeId>;
}

impl<S: BuildHasher> StructuralResolver for HashMap<TypeId, TypeId, S> {
    fn structural_of(&self, nominal: TypeId) -> Option<TypeId> {
        self.get(&nominal).copied()
    }
}

/// Unifies types and accumulates parameter bindings.
///
/// The substitution is kept idempotent: no bound value mentions another
/// bound parameter.
pub struct Unifier<'a> {
    arena: &'a mut TypeArena,
    effects: &'a dyn EffectSystem,
    budget: &'a mut StepBudget,
    resolver: Option<&'a dyn StructuralResolver>,
    options: UnifyOptions,
    subst: Substitution,
    /// Pairs of recursive types assumed equal while their unfoldings are
    /// compared.
    assumed: FxHashSet<(TypeId, TypeId)>,
}

impl<'a> Unifier<'a> {
    /// Create a unifier with an empty substitution.
    pub fn new(
        arena: &'a mut TypeArena,
        effects: &'a dyn EffectSystem,
        budget: &'a mut StepBudget,
        options: UnifyOptions,
    ) -> Self {
        Unifier {
            arena,
            effects,
            budget,
            resolver: None,
            options,
            subst: Substitution::default(),
            assumed: FxHashSet::default(),
        }
    }

    /// Allow nominal types to widen through `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a dyn StructuralResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Start from existing bindings.
    #[must_use]
    pub fn with_bindings(mut self, bindings: Substitution) -> Self {
        self.subst = bindings;
        self
    }

    /// Unify `actual` against `expected`.
    ///
    /// On failure the bindings made by this call are rolled back.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn unify(&mut self, actual: TypeId, expected: TypeId) -> Result<(), UnifyError> {
        self.attempt(|u| u.go(actual, expected))
    }

    /// Bindings accumulated so far.
    pub fn substitution(&self) -> &Substitution {
        &self.subst
    }

    /// Consume the unifier, returning its bindings.
    pub fn into_substitution(self) -> Substitution {
        self.subst
    }

    /// Apply the accumulated bindings to `ty`.
    pub fn apply(&mut self, ty: TypeId) -> TypeId {
        self.arena.substitute(ty, &self.subst)
    }

    // === Core algorithm ===

    fn go(&mut self, actual: TypeId, expected: TypeId) -> Result<(), UnifyError> {
        self.budget.tick()?;
        with_stack_guard(|| self.go_inner(actual, expected))
    }

    fn go_inner(&mut self, actual: TypeId, expected: TypeId) -> Result<(), UnifyError> {
        let actual = self.shallow_resolve(actual);
        let expected = self.shallow_resolve(expected);
        let mismatch = UnifyError::Mismatch {
            expected,
            found: actual,
        };

        if actual == expected {
            return Ok(());
        }
        if actual.is_unknown() || expected.is_unknown() {
            return if self.options.allow_unknown {
                Ok(())
            } else {
                Err(mismatch)
            };
        }
        if actual.is_never() && self.options.variance == Variance::Covariant {
            return Ok(());
        }

        let actual_data = self.arena.get(actual).clone();
        let expected_data = self.arena.get(expected).clone();

        if let TypeData::TypeParam(param) = expected_data {
            return self.bind(param, actual);
        }
        if let TypeData::TypeParam(param) = actual_data {
            return self.bind(param, expected);
        }

        if matches!(actual_data, TypeData::Recursive { .. })
            || matches!(expected_data, TypeData::Recursive { .. })
        {
            if !self.assumed.insert((actual, expected)) {
                return Ok(());
            }
            let actual = self.arena.unfold(actual);
            let expected = self.arena.unfold(expected);
            return self.go(actual, expected);
        }

        match (&actual_data, &expected_data) {
            (TypeData::Union(found), TypeData::Union(wanted))
                if self.options.variance == Variance::Invariant =>
            {
                for &member in found.iter() {
                    self.unify_with_any(member, wanted, mismatch.clone())?;
                }
                for &member in wanted.iter() {
                    self.unify_any_with(found, member, mismatch.clone())?;
                }
                Ok(())
            }
            (TypeData::Union(found), _) => {
                if self.options.variance == Variance::Invariant {
                    return Err(mismatch);
                }
                found.iter().try_for_each(|&member| self.go(member, expected))
            }
            (_, TypeData::Union(wanted)) => {
                if self.options.variance == Variance::Invariant {
                    return Err(mismatch);
                }
                if wanted.contains(&actual) {
                    return Ok(());
                }
                self.unify_with_any(actual, wanted, mismatch)
            }

            (
                _,
                TypeData::Intersection {
                    nominal,
                    structural,
                    traits,
                },
            ) => nominal
                .iter()
                .chain(structural.iter())
                .chain(traits.iter())
                .try_for_each(|&component| self.go(actual, component)),
            (
                TypeData::Intersection {
                    nominal,
                    structural,
                    traits,
                },
                _,
            ) => {
                let components: Vec<TypeId> = nominal
                    .iter()
                    .chain(structural.iter())
                    .chain(traits.iter())
                    .copied()
                    .collect();
                self.unify_any_with(&components, expected, mismatch)
            }

            (
                TypeData::Nominal {
                    owner: found_owner,
                    args: found_args,
                    ..
                },
                TypeData::Nominal {
                    owner: wanted_owner,
                    args: wanted_args,
                    ..
                },
            ) => {
                if found_owner != wanted_owner || found_args.len() != wanted_args.len() {
                    return Err(mismatch);
                }
                self.unify_args(found_args, wanted_args)
            }
            (TypeData::Nominal { .. }, TypeData::Structural { .. }) => {
                match self.resolver.and_then(|r| r.structural_of(actual)) {
                    Some(projection) => self.go(projection, expected),
                    None => Err(mismatch),
                }
            }

            (
                TypeData::Trait {
                    owner: found_owner,
                    args: found_args,
                    ..
                },
                TypeData::Trait {
                    owner: wanted_owner,
                    args: wanted_args,
                    ..
                },
            ) => {
                if found_owner != wanted_owner || found_args.len() != wanted_args.len() {
                    return Err(mismatch);
                }
                self.unify_args(found_args, wanted_args)
            }

            (TypeData::Structural { fields: found }, TypeData::Structural { fields: wanted }) => {
                let invariant = self.options.variance == Variance::Invariant;
                if invariant && found.len() != wanted.len() {
                    return Err(mismatch);
                }
                for field in wanted.iter() {
                    match found.binary_search_by_key(&field.name, |f| f.name) {
                        Ok(i) => {
                            let have = &found[i];
                            let optional_mismatch = if invariant {
                                have.optional != field.optional
                            } else {
                                have.optional && !field.optional
                            };
                            if optional_mismatch {
                                return Err(UnifyError::MissingField {
                                    field: field.name,
                                    expected,
                                });
                            }
                            self.go(have.ty, field.ty)?;
                        }
                        Err(_) if field.optional && !invariant => {}
                        Err(_) => {
                            return Err(UnifyError::MissingField {
                                field: field.name,
                                expected,
                            })
                        }
                    }
                }
                Ok(())
            }

            (
                TypeData::Function {
                    params: found_params,
                    ret: found_ret,
                    effects: found_effects,
                },
                TypeData::Function {
                    params: wanted_params,
                    ret: wanted_ret,
                    effects: wanted_effects,
                },
            ) => {
                if found_params.len() != wanted_params.len() {
                    return Err(UnifyError::ArityMismatch {
                        expected: wanted_params.len(),
                        found: found_params.len(),
                    });
                }
                for (have, want) in found_params.iter().zip(wanted_params.iter()) {
                    if let (Some(a), Some(b)) = (have.label, want.label) {
                        if a != b {
                            return Err(mismatch);
                        }
                    }
                    // Parameters are contravariant.
                    self.go(want.ty, have.ty)?;
                }
                self.go(*found_ret, *wanted_ret)?;

                let effects_ok = match self.options.variance {
                    // A pure function fits any expected row.
                    Variance::Covariant => {
                        self.effects.is_empty(*found_effects)
                            || self.effects.constrain(*found_effects, *wanted_effects)
                    }
                    Variance::Invariant => {
                        found_effects == wanted_effects
                            || (self.effects.constrain(*found_effects, *wanted_effects)
                                && self.effects.constrain(*wanted_effects, *found_effects))
                    }
                };
                if effects_ok {
                    Ok(())
                } else {
                    Err(UnifyError::EffectMismatch {
                        expected: *wanted_effects,
                        found: *found_effects,
                    })
                }
            }

            (TypeData::FixedArray(found), TypeData::FixedArray(wanted)) => self.go(*found, *wanted),

            _ => Err(mismatch),
        }
    }

    fn unify_args(&mut self, found: &[TypeId], wanted: &[TypeId]) -> Result<(), UnifyError> {
        found
            .iter()
            .zip(wanted.iter())
            .try_for_each(|(&a, &e)| self.go(a, e))
    }

    /// `actual` must unify with at least one of `candidates`.
    fn unify_with_any(
        &mut self,
        actual: TypeId,
        candidates: &[TypeId],
        on_failure: UnifyError,
    ) -> Result<(), UnifyError> {
        for &candidate in candidates {
            match self.attempt(|u| u.go(actual, candidate)) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_budget() => return Err(err),
                Err(_) => {}
            }
        }
        Err(on_failure)
    }

    /// At least one of `candidates` must unify with `expected`.
    fn unify_any_with(
        &mut self,
        candidates: &[TypeId],
        expected: TypeId,
        on_failure: UnifyError,
    ) -> Result<(), UnifyError> {
        for &candidate in candidates {
            match self.attempt(|u| u.go(candidate, expected)) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_budget() => return Err(err),
                Err(_) => {}
            }
        }
        Err(on_failure)
    }

    /// Run `f`, restoring bindings and assumptions if it fails.
    fn attempt(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), UnifyError>,
    ) -> Result<(), UnifyError> {
        let saved_subst = self.subst.clone();
        let saved_assumed = self.assumed.clone();
        let result = f(self);
        if result.is_err() {
            self.subst = saved_subst;
            self.assumed = saved_assumed;
        }
        result
    }

    // === Bindings ===

    fn shallow_resolve(&self, mut ty: TypeId) -> TypeId {
        while let TypeData::TypeParam(param) = self.arena.get(ty) {
            match self.subst.get(param) {
                Some(&bound) if bound != ty => ty = bound,
                _ => break,
            }
        }
        ty
    }

    fn bind(&mut self, param: TypeParamId, ty: TypeId) -> Result<(), UnifyError> {
        let ty = self.arena.substitute(ty, &self.subst);
        if let TypeData::TypeParam(other) = self.arena.get(ty) {
            if *other == param {
                return Ok(());
            }
        }
        if self.arena.mentions_param(ty, param) {
            return Err(UnifyError::OccursCheck { param, ty });
        }

        let mut single = Substitution::default();
        single.insert(param, ty);
        let existing: Vec<TypeParamId> = self.subst.keys().copied().collect();
        for key in existing {
            let value = self.subst[&key];
            let updated = self.arena.substitute(value, &single);
            self.subst.insert(key, updated);
        }
        self.subst.insert(param, ty);
        Ok(())
    }
}

/// Unify `actual` against `expected` with a fresh substitution.
pub fn unify(
    arena: &mut TypeArena,
    effects: &dyn EffectSystem,
    budget: &mut StepBudget,
    actual: TypeId,
    expected: TypeId,
    options: UnifyOptions,
) -> Result<Substitution, UnifyError> {
    let mut unifier = Unifier::new(arena, effects, budget, options);
    unifier.unify(actual, expected)?;
    Ok(unifier.into_substitution())
}

#[cfg(test)]
mod tests;
