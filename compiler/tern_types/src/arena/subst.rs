//! Substitution of type parameters.

use rustc_hash::FxHashMap;
use tern_stack::with_stack_guard;

use super::TypeArena;
use crate::{FnParam, TypeData, TypeId, TypeParamId};

/// Bindings from type parameters to types.
pub type Substitution = FxHashMap<TypeParamId, TypeId>;

impl TypeArena {
    /// Replace every free parameter bound in `bindings`.
    ///
    /// Types without free parameters are returned unchanged without a walk;
    /// by interning, an unaffected compound type maps back to the same id.
    pub fn substitute(&mut self, id: TypeId, bindings: &Substitution) -> TypeId {
        if bindings.is_empty() || !self.flags(id).has_params() {
            return id;
        }
        with_stack_guard(|| self.substitute_inner(id, bindings))
    }

    fn substitute_inner(&mut self, id: TypeId, bindings: &Substitution) -> TypeId {
        if !self.flags(id).has_params() {
            return id;
        }

        match self.get(id).clone() {
            TypeData::TypeParam(param) => bindings.get(&param).copied().unwrap_or(id),

            TypeData::Nominal { owner, name, args } => {
                let args = self.substitute_all(&args, bindings);
                self.intern(TypeData::Nominal { owner, name, args })
            }

            TypeData::Trait { owner, name, args } => {
                let args = self.substitute_all(&args, bindings);
                self.intern(TypeData::Trait { owner, name, args })
            }

            TypeData::Structural { fields } => {
                let fields = fields
                    .iter()
                    .map(|f| {
                        let ty = self.substitute(f.ty, bindings);
                        f.with_type(ty)
                    })
                    .collect();
                self.intern(TypeData::Structural { fields })
            }

            TypeData::Function {
                params,
                ret,
                effects,
            } => {
                let params = params
                    .iter()
                    .map(|p| FnParam {
                        ty: self.substitute(p.ty, bindings),
                        ..*p
                    })
                    .collect();
                let ret = self.substitute(ret, bindings);
                self.intern(TypeData::Function {
                    params,
                    ret,
                    effects,
                })
            }

            TypeData::Union(members) => {
                let members = self.substitute_all(&members, bindings);
                self.intern(TypeData::Union(members))
            }

            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => {
                let nominal = nominal.map(|n| self.substitute(n, bindings));
                let structural = structural.map(|s| self.substitute(s, bindings));
                let traits = self.substitute_all(&traits, bindings);
                self.intern(TypeData::Intersection {
                    nominal,
                    structural,
                    traits,
                })
            }

            TypeData::FixedArray(elem) => {
                let elem = self.substitute(elem, bindings);
                self.intern(TypeData::FixedArray(elem))
            }

            TypeData::Recursive { binder, body } => {
                let body = if bindings.contains_key(&binder) {
                    // Inner binder shadows the outer binding.
                    let mut inner = bindings.clone();
                    inner.remove(&binder);
                    self.substitute(body, &inner)
                } else {
                    self.substitute(body, bindings)
                };
                self.intern(TypeData::Recursive { binder, body })
            }

            TypeData::Primitive(_) | TypeData::Unknown => id,
        }
    }

    fn substitute_all(&mut self, ids: &[TypeId], bindings: &Substitution) -> Box<[TypeId]> {
        ids.iter().map(|&t| self.substitute(t, bindings)).collect()
    }
}
