//! Lowered function signatures.

use tern_ir::{EffectRow, Name, Span};

use crate::{FnParam, Substitution, TypeArena, TypeData, TypeId, TypeParamId};

/// A parameter of a lowered signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSignature {
    pub ty: TypeId,
    /// External label; labeled parameters require labeled or spread
    /// arguments.
    pub label: Option<Name>,
    /// Declared name, absent for signatures built from function types.
    pub name: Option<Name>,
    pub optional: bool,
    pub span: Span,
}

impl ParamSignature {
    /// Check if a call may leave this parameter without an argument.
    pub fn is_omittable(&self, arena: &TypeArena) -> bool {
        self.optional || arena.is_optional(self.ty)
    }

    /// Check if the label equals the declared name (`~x` for `x`).
    pub fn is_punned(&self) -> bool {
        self.label.is_some() && self.label == self.name
    }
}

/// Signature of a callable.
///
/// `ret` and `effects` may be back-patched once an un-annotated body has
/// been typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub params: Vec<ParamSignature>,
    pub ret: TypeId,
    pub effects: EffectRow,
    /// Generic parameters, in declaration order.
    pub type_params: Vec<TypeParamId>,
}

impl FunctionSignature {
    /// Read a signature off a function type.
    pub fn from_function_type(arena: &TypeArena, ty: TypeId) -> Option<Self> {
        match arena.get(ty) {
            TypeData::Function {
                params,
                ret,
                effects,
            } => Some(FunctionSignature {
                params: params
                    .iter()
                    .map(|p| ParamSignature {
                        ty: p.ty,
                        label: p.label,
                        name: p.label,
                        optional: p.optional,
                        span: Span::DUMMY,
                    })
                    .collect(),
                ret: *ret,
                effects: *effects,
                type_params: Vec::new(),
            }),
            _ => None,
        }
    }

    /// The function type of this signature.
    pub fn function_type(&self, arena: &mut TypeArena) -> TypeId {
        let params = self
            .params
            .iter()
            .map(|p| FnParam {
                ty: p.ty,
                label: p.label,
                optional: p.optional,
            })
            .collect();
        arena.function(params, self.ret, self.effects)
    }

    /// Apply `bindings` to every parameter and the result.
    pub fn substituted(&self, arena: &mut TypeArena, bindings: &Substitution) -> Self {
        FunctionSignature {
            params: self
                .params
                .iter()
                .map(|p| ParamSignature {
                    ty: arena.substitute(p.ty, bindings),
                    ..p.clone()
                })
                .collect(),
            ret: arena.substitute(self.ret, bindings),
            effects: self.effects,
            type_params: self.type_params.clone(),
        }
    }

    /// Check if the signature has generic parameters.
    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}
