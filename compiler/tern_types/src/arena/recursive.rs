//! Recursive types, contractiveness and free-parameter queries.
//!
//! A recursive type `rec b. body` is contractive when every occurrence of
//! `b` in `body` sits behind a guarding constructor: a nominal or trait
//! argument, a structural field, a function parameter or result, or an
//! array element. Occurrences at the top of the body, directly as a union
//! member, or directly as an intersection component are unguarded.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tern_ir::Name;

use super::{Substitution, TypeArena};
use crate::{TypeData, TypeId, TypeParamId};

/// The binder of a recursive type occurs unguarded in its body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("recursive type is not contractive")]
pub struct NotContractive {
    pub binder: TypeParamId,
}

impl TypeArena {
    /// Build a self-referential type.
    ///
    /// `build` receives the arena, a type id standing for the whole type and
    /// the binder that id refers to. When the returned body never mentions
    /// the binder the body itself is returned.
    pub fn create_recursive_type(
        &mut self,
        name: Name,
        build: impl FnOnce(&mut TypeArena, TypeId, TypeParamId) -> TypeId,
    ) -> Result<TypeId, NotContractive> {
        let binder = self.fresh_type_param(name);
        let self_ref = self.param_ref(binder);
        let body = build(self, self_ref, binder);
        self.close_recursive(binder, body)
    }

    /// Wrap `body` in a recursive binder after checking contractiveness.
    pub fn close_recursive(
        &mut self,
        binder: TypeParamId,
        body: TypeId,
    ) -> Result<TypeId, NotContractive> {
        if self.occurs_unguarded(body, binder) {
            return Err(NotContractive { binder });
        }
        Ok(self.intern(TypeData::Recursive { binder, body }))
    }

    /// Check whether `binder` appears in `body` outside any guard.
    pub fn occurs_unguarded(&self, body: TypeId, binder: TypeParamId) -> bool {
        if !self.flags(body).has_params() {
            return false;
        }
        match self.get(body) {
            TypeData::TypeParam(p) => *p == binder,
            TypeData::Union(members) => members.iter().any(|&m| self.occurs_unguarded(m, binder)),
            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => nominal
                .iter()
                .chain(structural.iter())
                .chain(traits.iter())
                .any(|&c| self.occurs_unguarded(c, binder)),
            TypeData::Recursive { binder: inner, body } => {
                *inner != binder && self.occurs_unguarded(*body, binder)
            }
            TypeData::Primitive(_)
            | TypeData::Unknown
            | TypeData::Nominal { .. }
            | TypeData::Trait { .. }
            | TypeData::Structural { .. }
            | TypeData::Function { .. }
            | TypeData::FixedArray(_) => false,
        }
    }

    /// Unfold a recursive type one level; other types are returned as is.
    pub fn unfold(&mut self, id: TypeId) -> TypeId {
        let (binder, body) = match self.get(id) {
            TypeData::Recursive { binder, body } => (*binder, *body),
            _ => return id,
        };
        let mut bindings = Substitution::default();
        bindings.insert(binder, id);
        self.substitute(body, &bindings)
    }

    /// Check whether `param` occurs free in `id`.
    pub fn mentions_param(&self, id: TypeId, param: TypeParamId) -> bool {
        self.free_params(id).contains(&param)
    }

    /// Free type parameters of `id`, sorted and unique.
    pub fn free_params(&self, id: TypeId) -> SmallVec<[TypeParamId; 4]> {
        let mut out = SmallVec::new();
        if self.flags(id).has_params() {
            let mut visited = FxHashSet::default();
            self.collect_free(id, &[], &mut visited, &mut out);
            out.sort_unstable();
            out.dedup();
        }
        out
    }

    fn collect_free(
        &self,
        id: TypeId,
        bound: &[TypeParamId],
        visited: &mut FxHashSet<TypeId>,
        out: &mut SmallVec<[TypeParamId; 4]>,
    ) {
        // `has_params` is false both for ground types and for recursive
        // types whose only parameter is their own binder.
        if !self.flags(id).has_params() {
            return;
        }
        // Sharing is only memoized outside recursive binders.
        if bound.is_empty() && !visited.insert(id) {
            return;
        }
        match self.get(id) {
            TypeData::TypeParam(p) => {
                if !bound.contains(p) {
                    out.push(*p);
                }
            }
            TypeData::Recursive { binder, body } => {
                let mut inner: SmallVec<[TypeParamId; 4]> = SmallVec::from_slice(bound);
                inner.push(*binder);
                self.collect_free(*body, &inner, visited, out);
            }
            _ => {
                for child in self.children(id) {
                    self.collect_free(child, bound, visited, out);
                }
            }
        }
    }

    /// Direct child types of `id`, in descriptor order.
    pub fn children(&self, id: TypeId) -> SmallVec<[TypeId; 8]> {
        match self.get(id) {
            TypeData::Nominal { args, .. } | TypeData::Trait { args, .. } => {
                args.iter().copied().collect()
            }
            TypeData::Structural { fields } => fields.iter().map(|f| f.ty).collect(),
            TypeData::Function { params, ret, .. } => params
                .iter()
                .map(|p| p.ty)
                .chain(std::iter::once(*ret))
                .collect(),
            TypeData::Union(members) => members.iter().copied().collect(),
            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => nominal
                .iter()
                .chain(structural.iter())
                .chain(traits.iter())
                .copied()
                .collect(),
            TypeData::FixedArray(elem) => SmallVec::from_slice(&[*elem]),
            TypeData::Recursive { body, .. } => SmallVec::from_slice(&[*body]),
            TypeData::Primitive(_) | TypeData::Unknown | TypeData::TypeParam(_) => SmallVec::new(),
        }
    }
}
