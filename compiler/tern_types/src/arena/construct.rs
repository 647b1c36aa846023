//! Canonicalization and construction helpers.
//!
//! Canonical forms enforced before interning:
//! - structural fields sorted by name
//! - union members flattened, `never` dropped, sorted and de-duplicated; an
//!   empty union is `never`, a singleton union is its member
//! - intersection traits sorted and de-duplicated; a single component
//!   collapses to that component
//! - a recursive type whose body never mentions its binder is its body

use smallvec::SmallVec;
use tern_ir::{EffectRow, Name, SymbolRef};

use super::{Canonical, TypeArena};
use crate::{FnParam, StructField, TypeData, TypeId, TypeParamId};

impl TypeArena {
    pub(super) fn canonicalize(&self, data: TypeData) -> Canonical {
        match data {
            TypeData::Structural { fields } => {
                let mut fields = fields.into_vec();
                fields.sort_by_key(|f| f.name);
                if let Some(pair) = fields.windows(2).find(|w| w[0].name == w[1].name) {
                    panic!(
                        "structural type built with duplicate field {:?}",
                        pair[0].name
                    );
                }
                Canonical::Data(TypeData::Structural {
                    fields: fields.into_boxed_slice(),
                })
            }

            TypeData::Union(members) => {
                let mut flat: SmallVec<[TypeId; 8]> = SmallVec::new();
                for member in members.iter().copied() {
                    match self.get(member) {
                        TypeData::Union(inner) => flat.extend(inner.iter().copied()),
                        _ if member.is_never() => {}
                        _ => flat.push(member),
                    }
                }
                flat.sort_unstable();
                flat.dedup();
                match flat.len() {
                    0 => Canonical::Existing(TypeId::NEVER),
                    1 => Canonical::Existing(flat[0]),
                    _ => Canonical::Data(TypeData::Union(flat.into_vec().into_boxed_slice())),
                }
            }

            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => {
                let mut traits = traits.into_vec();
                traits.sort_unstable();
                traits.dedup();
                let components = usize::from(nominal.is_some())
                    + usize::from(structural.is_some())
                    + traits.len();
                match components {
                    0 => panic!("intersection built without components"),
                    1 => Canonical::Existing(
                        nominal
                            .or(structural)
                            .unwrap_or_else(|| traits[0]),
                    ),
                    _ => Canonical::Data(TypeData::Intersection {
                        nominal,
                        structural,
                        traits: traits.into_boxed_slice(),
                    }),
                }
            }

            TypeData::Recursive { binder, body } => {
                if self.mentions_param(body, binder) {
                    Canonical::Data(TypeData::Recursive { binder, body })
                } else {
                    Canonical::Existing(body)
                }
            }

            other => Canonical::Data(other),
        }
    }

    // === Constructors ===

    /// Reference to a type parameter.
    pub fn param_ref(&mut self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeParam(param))
    }

    /// Nominal object type `name<args>` declared by `owner`.
    pub fn nominal(&mut self, owner: SymbolRef, name: Name, args: &[TypeId]) -> TypeId {
        self.intern(TypeData::Nominal {
            owner,
            name,
            args: args.into(),
        })
    }

    /// Trait type `name<args>` declared by `owner`.
    pub fn trait_type(&mut self, owner: SymbolRef, name: Name, args: &[TypeId]) -> TypeId {
        self.intern(TypeData::Trait {
            owner,
            name,
            args: args.into(),
        })
    }

    /// Structural object type; fields may come in any order.
    pub fn structural(&mut self, fields: Vec<StructField>) -> TypeId {
        self.intern(TypeData::Structural {
            fields: fields.into_boxed_slice(),
        })
    }

    /// Function type.
    pub fn function(&mut self, params: Vec<FnParam>, ret: TypeId, effects: EffectRow) -> TypeId {
        self.intern(TypeData::Function {
            params: params.into_boxed_slice(),
            ret,
            effects,
        })
    }

    /// Union of `members`, canonicalized.
    pub fn union(&mut self, members: &[TypeId]) -> TypeId {
        self.intern(TypeData::Union(members.into()))
    }

    /// `ty | None`.
    pub fn optional(&mut self, ty: TypeId) -> TypeId {
        self.union(&[ty, TypeId::NONE])
    }

    /// Intersection, canonicalized.
    pub fn intersection(
        &mut self,
        nominal: Option<TypeId>,
        structural: Option<TypeId>,
        traits: Vec<TypeId>,
    ) -> TypeId {
        self.intern(TypeData::Intersection {
            nominal,
            structural,
            traits: traits.into_boxed_slice(),
        })
    }

    /// Fixed-size array of `elem`.
    pub fn fixed_array(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeData::FixedArray(elem))
    }

    // === Queries ===

    /// Check if `ty` accepts an absent value (`None` or a union with it).
    pub fn is_optional(&self, ty: TypeId) -> bool {
        ty == TypeId::NONE
            || matches!(self.get(ty), TypeData::Union(members) if members.contains(&TypeId::NONE))
    }

    /// Members of a union, or `ty` itself.
    pub fn union_members(&self, ty: TypeId) -> SmallVec<[TypeId; 4]> {
        match self.get(ty) {
            TypeData::Union(members) => members.iter().copied().collect(),
            _ => SmallVec::from_slice(&[ty]),
        }
    }

    /// Nominal component of an object value type.
    pub fn nominal_component(&self, ty: TypeId) -> Option<TypeId> {
        match self.get(ty) {
            TypeData::Nominal { .. } => Some(ty),
            TypeData::Intersection { nominal, .. } => *nominal,
            _ => None,
        }
    }

    /// Declaring symbol of a nominal or trait type.
    pub fn owner_of(&self, ty: TypeId) -> Option<SymbolRef> {
        match self.get(ty) {
            TypeData::Nominal { owner, .. } | TypeData::Trait { owner, .. } => Some(*owner),
            _ => None,
        }
    }

    /// Fields visible on `ty` without consulting nominal projections.
    pub fn structural_fields(&self, ty: TypeId) -> Option<&[StructField]> {
        match self.get(ty) {
            TypeData::Structural { fields } => Some(fields),
            TypeData::Intersection {
                structural: Some(s),
                ..
            } => self.get(*s).fields(),
            _ => None,
        }
    }

    /// Look up a field by name on a structural or intersection type.
    pub fn field(&self, ty: TypeId, name: Name) -> Option<&StructField> {
        let fields = self.structural_fields(ty)?;
        fields
            .binary_search_by_key(&name, |f| f.name)
            .ok()
            .map(|i| &fields[i])
    }
}
