//! Type-parameter inference from argument and expected types.
//!
//! `bind_type_params_from_type` walks the shape of a parameter type and
//! records what each in-scope parameter must be. A parameter seen twice
//! keeps the more general of its two candidates.
//!
//! # Union-expected inference
//!
//! For an expected union such as `List<T> | U | None`, the first bare
//! parameter member (`U`) is the remainder and concrete members (`None`)
//! absorb the actual members they accept. The remaining actual members are
//! assigned to the structured members (`List<T>`) by a bounded depth-first
//! search, scored by (members assigned, actual members covered). A member
//! is only assigned an actual member of the same outer shape. Whatever
//! the best assignment leaves uncovered is unioned into the remainder.
//! Several distinct best assignments are ambiguous; running out of states
//! reports `W2902` and the binding fails.

use smallvec::SmallVec;
use tern_stack::with_stack_guard;

use crate::context::TypingContext;
use crate::{Substitution, TypeData, TypeErrorKind, TypeId, TypeParamId};

/// The search ran out of states.
struct Exhausted;

struct UnionSearch<'s> {
    scope: &'s [TypeParamId],
    /// Expected members that mention in-scope parameters, minus the
    /// remainder.
    structured: SmallVec<[TypeId; 4]>,
    /// Actual members no concrete expected member accepts.
    uncovered: SmallVec<[TypeId; 4]>,
    states: usize,
    max_states: usize,
    best_score: (usize, usize),
    best: Vec<(Substitution, SmallVec<[bool; 4]>)>,
}

impl TypingContext<'_> {
    /// Bind the in-scope parameters of `expected` from `actual`.
    ///
    /// Returns `false` on a conflicting rebinding, an ambiguous union
    /// assignment or an exhausted union search. Shape mismatches are left
    /// to the compatibility check that follows.
    pub(crate) fn bind_type_params_from_type(
        &mut self,
        expected: TypeId,
        actual: TypeId,
        scope: &[TypeParamId],
        bindings: &mut Substitution,
    ) -> bool {
        with_stack_guard(|| self.bind_from(expected, actual, scope, bindings))
    }

    fn bind_from(
        &mut self,
        expected: TypeId,
        actual: TypeId,
        scope: &[TypeParamId],
        bindings: &mut Substitution,
    ) -> bool {
        if actual.is_unknown() || !self.arena.flags(expected).has_params() {
            return true;
        }
        match self.arena.get(expected).clone() {
            TypeData::TypeParam(param) => {
                !scope.contains(&param) || self.bind_param(param, actual, bindings)
            }
            TypeData::Nominal { owner, args, .. } => {
                let actual_args = self
                    .arena
                    .nominal_component(actual)
                    .and_then(|n| match self.arena.get(n) {
                        TypeData::Nominal {
                            owner: o, args: a, ..
                        } if *o == owner => Some(a.clone()),
                        _ => None,
                    });
                match actual_args {
                    Some(actual_args) => self.bind_pairs(&args, &actual_args, scope, bindings),
                    None => true,
                }
            }
            TypeData::Trait { owner, args, .. } => {
                let actual_args = match self.arena.get(actual) {
                    TypeData::Trait {
                        owner: o, args: a, ..
                    } if *o == owner => Some(a.clone()),
                    _ => {
                        let subject = self.arena.nominal_component(actual).unwrap_or(actual);
                        self.impls_for(subject)
                            .into_iter()
                            .find(|i| i.trait_symbol == owner)
                            .and_then(|i| match self.arena.get(i.trait_ty) {
                                TypeData::Trait { args: a, .. } => Some(a.clone()),
                                _ => None,
                            })
                    }
                };
                match actual_args {
                    Some(actual_args) => self.bind_pairs(&args, &actual_args, scope, bindings),
                    None => true,
                }
            }
            TypeData::Structural { fields } => {
                let Some(actual_fields) = self.fields_of(actual) else {
                    return true;
                };
                fields.iter().all(|f| {
                    actual_fields
                        .iter()
                        .find(|a| a.name == f.name)
                        .map_or(true, |a| self.bind_from(f.ty, a.ty, scope, bindings))
                })
            }
            TypeData::Function { params, ret, .. } => {
                let TypeData::Function {
                    params: actual_params,
                    ret: actual_ret,
                    ..
                } = self.arena.get(actual).clone()
                else {
                    return true;
                };
                params
                    .iter()
                    .zip(actual_params.iter())
                    .all(|(e, a)| self.bind_from(e.ty, a.ty, scope, bindings))
                    && self.bind_from(ret, actual_ret, scope, bindings)
            }
            TypeData::FixedArray(elem) => {
                let actual_elem = match self.arena.get(actual) {
                    TypeData::FixedArray(e) => *e,
                    _ => return true,
                };
                self.bind_from(elem, actual_elem, scope, bindings)
            }
            TypeData::Union(members) => self.bind_union(&members, actual, scope, bindings),
            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => nominal
                .into_iter()
                .chain(structural)
                .chain(traits.iter().copied())
                .all(|part| self.bind_from(part, actual, scope, bindings)),
            TypeData::Primitive(_)
            | TypeData::Unknown
            | TypeData::Recursive { .. } => true,
        }
    }

    fn bind_pairs(
        &mut self,
        expected: &[TypeId],
        actual: &[TypeId],
        scope: &[TypeParamId],
        bindings: &mut Substitution,
    ) -> bool {
        expected
            .iter()
            .zip(actual)
            .all(|(&e, &a)| self.bind_from(e, a, scope, bindings))
    }

    /// Record `param := actual`, keeping the more general candidate when
    /// `param` is already bound.
    fn bind_param(
        &mut self,
        param: TypeParamId,
        actual: TypeId,
        bindings: &mut Substitution,
    ) -> bool {
        let Some(&prev) = bindings.get(&param) else {
            bindings.insert(param, actual);
            return true;
        };
        if prev.is_unknown() {
            bindings.insert(param, actual);
            return true;
        }
        if prev == actual || self.type_satisfies(actual, prev) {
            return true;
        }
        if self.type_satisfies(prev, actual) {
            bindings.insert(param, actual);
            return true;
        }
        tracing::trace!(?param, prev = prev.raw(), actual = actual.raw(), "conflicting binding");
        false
    }

    fn bind_union(
        &mut self,
        members: &[TypeId],
        actual: TypeId,
        scope: &[TypeParamId],
        bindings: &mut Substitution,
    ) -> bool {
        let remainder = members.iter().find_map(|&m| match self.arena.get(m) {
            TypeData::TypeParam(p) if scope.contains(p) => Some(*p),
            _ => None,
        });
        let mut structured = SmallVec::new();
        let mut concrete: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &m in members {
            if !self.arena.flags(m).has_params() {
                concrete.push(m);
            } else if remainder.map_or(true, |r| self.arena.get(m) != &TypeData::TypeParam(r)) {
                structured.push(m);
            }
        }

        let mut uncovered = SmallVec::new();
        for a in self.arena.union_members(actual) {
            if !concrete.iter().any(|&c| self.type_satisfies(a, c)) {
                uncovered.push(a);
            }
        }
        if structured.is_empty() {
            return self.bind_remainder(remainder, &uncovered, bindings);
        }

        let mut search = UnionSearch {
            scope,
            structured,
            uncovered,
            states: 0,
            max_states: self.config().max_union_binding_states,
            best_score: (0, 0),
            best: Vec::new(),
        };
        let mut used: SmallVec<[bool; 4]> = SmallVec::from_elem(false, search.uncovered.len());
        if self
            .union_dfs(&mut search, 0, bindings.clone(), &mut used, 0)
            .is_err()
        {
            let max_states = search.max_states;
            tracing::warn!(max_states, "union binding search exhausted");
            self.report(
                self.current_span,
                TypeErrorKind::UnionSearchExhausted { max_states },
            );
            return false;
        }
        if search.best.len() > 1 {
            tracing::debug!(solutions = search.best.len(), "ambiguous union binding");
            return false;
        }
        let Some((solution, covered)) = search.best.pop() else {
            return self.bind_remainder(remainder, &search.uncovered, bindings);
        };
        *bindings = solution;
        let rest: SmallVec<[TypeId; 4]> = search
            .uncovered
            .iter()
            .zip(&covered)
            .filter(|&(_, &c)| !c)
            .map(|(&a, _)| a)
            .collect();
        self.bind_remainder(remainder, &rest, bindings)
    }

    fn union_dfs(
        &mut self,
        search: &mut UnionSearch<'_>,
        index: usize,
        bindings: Substitution,
        used: &mut SmallVec<[bool; 4]>,
        assigned: usize,
    ) -> Result<(), Exhausted> {
        search.states += 1;
        if search.states > search.max_states {
            return Err(Exhausted);
        }

        if index == search.structured.len() {
            let covered = self.coverage(search, &bindings);
            let score = (assigned, covered.iter().filter(|&&c| c).count());
            if score > search.best_score || search.best.is_empty() {
                search.best_score = score;
                search.best = vec![(bindings, covered)];
            } else if score == search.best_score && search.best.iter().all(|(b, _)| *b != bindings)
            {
                search.best.push((bindings, covered));
            }
            return Ok(());
        }

        let member = search.structured[index];
        for j in 0..search.uncovered.len() {
            if used[j] {
                continue;
            }
            let actual = search.uncovered[j];
            if !self.shape_fits(member, actual) {
                continue;
            }
            let mut trial = bindings.clone();
            if self.bind_from(member, actual, search.scope, &mut trial) {
                used[j] = true;
                let outcome = self.union_dfs(search, index + 1, trial, used, assigned + 1);
                used[j] = false;
                outcome?;
            }
        }
        self.union_dfs(search, index + 1, bindings, used, assigned)
    }

    /// Check if `actual` has the outer shape of `expected`, so that pairing
    /// them counts as an assignment.
    fn shape_fits(&mut self, expected: TypeId, actual: TypeId) -> bool {
        match self.arena.get(expected).clone() {
            TypeData::Nominal { owner, .. } => {
                let found = self.arena.nominal_component(actual).map(|n| self.arena.get(n));
                matches!(found, Some(TypeData::Nominal { owner: o, .. }) if *o == owner)
            }
            TypeData::Trait { owner, .. } => match self.arena.get(actual) {
                TypeData::Trait { owner: o, .. } => *o == owner,
                _ => {
                    let subject = self.arena.nominal_component(actual).unwrap_or(actual);
                    self.impls_for(subject).iter().any(|i| i.trait_symbol == owner)
                }
            },
            TypeData::Structural { .. } => self.fields_of(actual).is_some(),
            TypeData::Function { .. } => {
                matches!(self.arena.get(actual), TypeData::Function { .. })
            }
            TypeData::FixedArray(_) => matches!(self.arena.get(actual), TypeData::FixedArray(_)),
            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => nominal
                .into_iter()
                .chain(structural)
                .chain(traits.iter().copied())
                .all(|part| self.shape_fits(part, actual)),
            _ => true,
        }
    }

    /// Which uncovered actual members the structured members accept under
    /// `bindings`.
    fn coverage(&mut self, search: &UnionSearch<'_>, bindings: &Substitution) -> SmallVec<[bool; 4]> {
        let mut resolved: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &m in &search.structured {
            let ty = self.arena.substitute(m, bindings);
            let free = self.arena.free_params(ty);
            if !free.iter().any(|p| search.scope.contains(p)) {
                resolved.push(ty);
            }
        }
        let mut covered = SmallVec::new();
        for &a in &search.uncovered {
            let hit = resolved.iter().any(|&r| self.type_satisfies(a, r));
            covered.push(hit);
        }
        covered
    }

    fn bind_remainder(
        &mut self,
        remainder: Option<TypeParamId>,
        rest: &[TypeId],
        bindings: &mut Substitution,
    ) -> bool {
        match remainder {
            Some(param) if !rest.is_empty() => {
                let ty = self.arena.union(rest);
                self.bind_param(param, ty, bindings)
            }
            _ => true,
        }
    }
}
