//! The type arena: canonical storage for every type of a compilation unit.
//!
//! Every descriptor is canonicalized and interned, so two structurally equal
//! descriptors always receive the same [`TypeId`]. Nothing is ever mutated in
//! place; substitution, merging and unfolding produce new interned ids.
//!
//! # Layout
//!
//! Parallel vectors indexed by `TypeId`:
//! - `items`: the canonical [`TypeData`]
//! - `flags`: pre-computed [`TypeFlags`]
//!
//! Indices 0-9 hold the primitives and `unknown` so the `TypeId` constants
//! are valid without consulting the arena.

mod construct;
mod format;
mod recursive;
mod subst;

pub use recursive::NotContractive;
pub use subst::Substitution;

use rustc_hash::FxHashMap;
use tern_ir::Name;

use crate::{Primitive, TypeData, TypeFlags, TypeId, TypeParamId};

/// Metadata remembered for each allocated type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeParamInfo {
    /// Declared name, used for display only.
    pub name: Name,
}

/// Interning store for type descriptors.
#[derive(Clone, Debug)]
pub struct TypeArena {
    items: Vec<TypeData>,
    flags: Vec<TypeFlags>,
    intern_map: FxHashMap<TypeData, TypeId>,
    params: Vec<TypeParamInfo>,
}

impl TypeArena {
    /// Create an arena with the primitives and `unknown` pre-interned.
    pub fn new() -> Self {
        let mut arena = TypeArena {
            items: Vec::with_capacity(256),
            flags: Vec::with_capacity(256),
            intern_map: FxHashMap::default(),
            params: Vec::new(),
        };

        for prim in Primitive::ALL {
            let id = arena.insert(TypeData::Primitive(prim));
            debug_assert_eq!(id, prim.type_id());
        }
        let unknown = arena.insert(TypeData::Unknown);
        debug_assert_eq!(unknown, TypeId::UNKNOWN);

        arena
    }

    /// Intern a descriptor, returning its canonical id.
    ///
    /// The descriptor is canonicalized first, so callers may pass fields or
    /// union members in any order.
    pub fn intern(&mut self, data: TypeData) -> TypeId {
        match self.canonicalize(data) {
            Canonical::Existing(id) => id,
            Canonical::Data(data) => self.insert(data),
        }
    }

    /// Insert an already canonical descriptor.
    fn insert(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.intern_map.get(&data) {
            return id;
        }

        let raw = u32::try_from(self.items.len())
            .unwrap_or_else(|_| panic!("type arena overflow: more than u32::MAX types"));
        let id = TypeId::from_raw(raw);
        let flags = self.compute_flags(&data);

        self.items.push(data.clone());
        self.flags.push(flags);
        self.intern_map.insert(data, id);
        id
    }

    /// Look up the descriptor of `id`.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this arena.
    #[inline]
    pub fn get(&self, id: TypeId) -> &TypeData {
        match self.items.get(id.index()) {
            Some(data) => data,
            None => panic!("type id {id:?} does not belong to this arena"),
        }
    }

    /// Pre-computed flags of `id`.
    #[inline]
    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.flags[id.index()]
    }

    /// Number of interned types.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; the primitives are pre-interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Allocate a fresh type parameter.
    pub fn fresh_type_param(&mut self, name: Name) -> TypeParamId {
        let raw = u32::try_from(self.params.len())
            .unwrap_or_else(|_| panic!("type parameter overflow"));
        self.params.push(TypeParamInfo { name });
        TypeParamId::from_raw(raw)
    }

    /// Metadata of an allocated type parameter.
    pub fn param_info(&self, param: TypeParamId) -> TypeParamInfo {
        match self.params.get(param.index()) {
            Some(info) => *info,
            None => panic!("type parameter {param:?} does not belong to this arena"),
        }
    }

    fn compute_flags(&self, data: &TypeData) -> TypeFlags {
        let children = |ids: &mut dyn Iterator<Item = TypeId>| {
            ids.fold(TypeFlags::empty(), |acc, id| acc | self.flags(id).propagated())
        };

        match data {
            TypeData::Primitive(_) => TypeFlags::IS_PRIMITIVE,
            TypeData::Unknown => TypeFlags::HAS_UNKNOWN,
            TypeData::TypeParam(_) => TypeFlags::IS_PARAM | TypeFlags::HAS_PARAM,
            TypeData::Nominal { args, .. } => {
                TypeFlags::IS_NOMINAL | children(&mut args.iter().copied())
            }
            TypeData::Trait { args, .. } => TypeFlags::IS_TRAIT | children(&mut args.iter().copied()),
            TypeData::Structural { fields } => {
                TypeFlags::IS_STRUCTURAL | children(&mut fields.iter().map(|f| f.ty))
            }
            TypeData::Function { params, ret, .. } => {
                TypeFlags::IS_FUNCTION
                    | children(&mut params.iter().map(|p| p.ty))
                    | self.flags(*ret).propagated()
            }
            TypeData::Union(members) => TypeFlags::IS_UNION | children(&mut members.iter().copied()),
            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => {
                TypeFlags::IS_INTERSECTION
                    | children(
                        &mut nominal
                            .iter()
                            .chain(structural.iter())
                            .chain(traits.iter())
                            .copied(),
                    )
            }
            TypeData::FixedArray(elem) => TypeFlags::IS_ARRAY | self.flags(*elem).propagated(),
            TypeData::Recursive { binder, body } => {
                let mut flags = TypeFlags::IS_RECURSIVE
                    | TypeFlags::HAS_RECURSIVE
                    | self.flags(*body).propagated();
                // The binder is bound here; only other parameters stay free.
                if flags.has_params() && self.free_params(*body).iter().all(|p| p == binder) {
                    flags.remove(TypeFlags::HAS_PARAM);
                }
                flags
            }
        }
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of canonicalizing a descriptor before insertion.
enum Canonical {
    /// The descriptor collapsed to an existing id.
    Existing(TypeId),
    /// Canonical descriptor to insert.
    Data(TypeData),
}

#[cfg(test)]
mod tests;
