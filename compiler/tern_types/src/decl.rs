//! Declarations handed over by the binder.
//!
//! These are plain data: names are interned, every reference carries the
//! [`SymbolRef`] the binder resolved it to, and type annotations are
//! unlowered [`HirTypeExpr`]s. The context lowers them lazily.

use tern_ir::{EffectRow, HirTypeExpr, Name, PackageId, Span, SymbolRef};

use crate::Visibility;

/// A declared generic parameter: `T` or `T: Constraint`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub symbol: SymbolRef,
    pub name: Name,
    pub constraint: Option<HirTypeExpr>,
}

impl TypeParamDecl {
    /// Unconstrained parameter.
    pub fn new(symbol: SymbolRef, name: Name) -> Self {
        TypeParamDecl {
            symbol,
            name,
            constraint: None,
        }
    }

    /// Parameter bounded by `constraint`.
    #[must_use]
    pub fn with_constraint(mut self, constraint: HirTypeExpr) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// A field of an object declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: HirTypeExpr,
    pub optional: bool,
    pub visibility: Visibility,
    pub span: Span,
}

impl FieldDecl {
    /// Required public field.
    pub fn new(name: Name, ty: HirTypeExpr) -> Self {
        FieldDecl {
            name,
            ty,
            optional: false,
            visibility: Visibility::Public,
            span: Span::DUMMY,
        }
    }
}

/// `object Name<Params>: Base { fields }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectDecl {
    pub symbol: SymbolRef,
    pub name: Name,
    pub type_params: Vec<TypeParamDecl>,
    pub fields: Vec<FieldDecl>,
    pub base: Option<HirTypeExpr>,
    pub visibility: Visibility,
    pub package: Option<PackageId>,
    pub span: Span,
}

/// `trait Name<Params> { methods }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraitDecl {
    pub symbol: SymbolRef,
    pub name: Name,
    pub type_params: Vec<TypeParamDecl>,
    /// Method declarations of the trait.
    pub methods: Vec<SymbolRef>,
    pub span: Span,
}

/// `type Name<Params> = target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeAliasDecl {
    pub symbol: SymbolRef,
    pub name: Name,
    pub type_params: Vec<TypeParamDecl>,
    pub target: HirTypeExpr,
    pub span: Span,
}

/// `impl<Params> Trait<Args> for Target { methods }`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplDecl {
    pub symbol: SymbolRef,
    pub type_params: Vec<TypeParamDecl>,
    /// The implemented trait; must be a named reference to a trait.
    pub trait_ref: HirTypeExpr,
    pub target: HirTypeExpr,
    /// Trait method symbol to implementing function symbol.
    pub methods: Vec<(SymbolRef, SymbolRef)>,
    pub span: Span,
}

impl ImplDecl {
    /// Symbol of the implemented trait, as resolved by the binder.
    pub fn trait_symbol(&self) -> Option<SymbolRef> {
        match &self.trait_ref.kind {
            tern_ir::HirTypeExprKind::Named { symbol, .. } => *symbol,
            _ => None,
        }
    }
}

/// A parameter of a function declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: Name,
    /// External label (`~x`); `None` for positional parameters.
    pub label: Option<Name>,
    pub ty: HirTypeExpr,
    pub optional: bool,
    pub span: Span,
}

impl ParamDecl {
    /// Positional required parameter.
    pub fn positional(name: Name, ty: HirTypeExpr) -> Self {
        ParamDecl {
            name,
            label: None,
            ty,
            optional: false,
            span: Span::DUMMY,
        }
    }

    /// Labeled required parameter whose label equals its name.
    pub fn labeled(name: Name, ty: HirTypeExpr) -> Self {
        ParamDecl {
            label: Some(name),
            ..Self::positional(name, ty)
        }
    }
}

/// `fn name<Params>(params) -> ret`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDecl {
    pub symbol: SymbolRef,
    pub name: Name,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<ParamDecl>,
    /// Declared return type; `None` until the body is typed.
    pub ret: Option<HirTypeExpr>,
    pub effects: EffectRow,
    pub span: Span,
}
