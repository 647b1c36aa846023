//! The `type_satisfies` relation shared by instantiation and call checking.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tern_ir::SymbolRef;
use tern_stack::with_stack_guard;

use crate::context::TypingContext;
use crate::{TypeData, TypeId, UnifyOptions};

impl TypingContext<'_> {
    /// Check if a value of type `actual` may be used where `expected` is
    /// required.
    ///
    /// Trait types are satisfied through registered impls, a type parameter
    /// through its bound, and everything else through covariant
    /// unification. Bindings made while checking are discarded.
    pub fn type_satisfies(&mut self, actual: TypeId, expected: TypeId) -> bool {
        with_stack_guard(|| self.satisfies(actual, expected))
    }

    fn satisfies(&mut self, actual: TypeId, expected: TypeId) -> bool {
        if actual == expected || actual.is_unknown() || expected.is_unknown() || actual.is_never()
        {
            return true;
        }
        match self.arena.get(expected) {
            TypeData::Trait { owner, .. } => {
                let trait_symbol = *owner;
                self.satisfies_trait(actual, expected, trait_symbol)
            }
            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => {
                let parts: SmallVec<[TypeId; 4]> = nominal
                    .iter()
                    .chain(structural.iter())
                    .chain(traits.iter())
                    .copied()
                    .collect();
                parts.into_iter().all(|part| self.satisfies(actual, part))
            }
            TypeData::Union(members) => {
                let members: SmallVec<[TypeId; 4]> = members.iter().copied().collect();
                if let TypeData::Union(own) = self.arena.get(actual) {
                    let own: SmallVec<[TypeId; 4]> = own.iter().copied().collect();
                    return own.into_iter().all(|m| self.satisfies(m, expected));
                }
                members.iter().any(|&m| self.satisfies(actual, m))
                    || self.compatible(actual, expected)
            }
            _ => self.satisfies_plain(actual, expected),
        }
    }

    fn satisfies_plain(&mut self, actual: TypeId, expected: TypeId) -> bool {
        match self.arena.get(actual) {
            TypeData::Union(own) => {
                let own: SmallVec<[TypeId; 4]> = own.iter().copied().collect();
                own.into_iter().all(|m| self.satisfies(m, expected))
            }
            TypeData::TypeParam(param) => {
                let param = *param;
                self.compatible(actual, expected)
                    || self
                        .constraint_of(param)
                        .is_some_and(|bound| self.satisfies(bound, expected))
            }
            _ => self.compatible(actual, expected),
        }
    }

    fn satisfies_trait(&mut self, actual: TypeId, expected: TypeId, trait_symbol: SymbolRef) -> bool {
        match self.arena.get(actual) {
            TypeData::TypeParam(param) => {
                let param = *param;
                self.constraint_of(param)
                    .is_some_and(|bound| self.satisfies(bound, expected))
            }
            TypeData::Trait { .. } => self
                .unify(actual, expected, Self::lenient(UnifyOptions::COVARIANT))
                .is_ok(),
            TypeData::Intersection {
                nominal, traits, ..
            } => {
                let parts: SmallVec<[TypeId; 4]> =
                    traits.iter().chain(nominal.iter()).copied().collect();
                parts.into_iter().any(|part| self.satisfies(part, expected))
            }
            TypeData::Union(own) => {
                let own: SmallVec<[TypeId; 4]> = own.iter().copied().collect();
                own.into_iter().all(|m| self.satisfies(m, expected))
            }
            _ => {
                let subject = self.arena.nominal_component(actual).unwrap_or(actual);
                if self.has_matching_impl(subject, expected, trait_symbol) {
                    return true;
                }
                self.base_has_matching_impl(subject, expected, trait_symbol)
            }
        }
    }

    /// Walk the base chain of `subject` looking for an impl.
    fn base_has_matching_impl(
        &mut self,
        subject: TypeId,
        expected: TypeId,
        trait_symbol: SymbolRef,
    ) -> bool {
        let mut seen = FxHashSet::default();
        seen.insert(subject);
        let mut current = subject;
        while let Some(&base) = self.base_of.get(&current) {
            if !seen.insert(base) {
                break;
            }
            tracing::trace!(base = base.raw(), "delegating trait check to base");
            if self.has_matching_impl(base, expected, trait_symbol) {
                return true;
            }
            current = base;
        }
        false
    }

    fn has_matching_impl(
        &mut self,
        subject: TypeId,
        expected: TypeId,
        trait_symbol: SymbolRef,
    ) -> bool {
        loop {
            let candidates: SmallVec<[TypeId; 4]> = self
                .impls_for(subject)
                .into_iter()
                .filter(|i| i.trait_symbol == trait_symbol)
                .map(|i| i.trait_ty)
                .collect();
            let options = Self::lenient(UnifyOptions::COVARIANT);
            if candidates
                .into_iter()
                .any(|trait_ty| self.unify(trait_ty, expected, options).is_ok())
            {
                return true;
            }
            // Impls of the trait may live in a module not hydrated yet.
            if !self.hydrate_module_impls(trait_symbol.module) {
                return false;
            }
        }
    }
}
