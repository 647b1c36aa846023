//! Type expressions after name binding.
//!
//! `HirTypeExpr` captures the structure of a type annotation as the binder
//! hands it over: every named reference already carries the `SymbolRef` it
//! resolved to (or `None` when the name is a builtin primitive or unresolved).
//! The type core lowers these into canonical type ids.

use crate::{EffectRow, Name, Span, SymbolRef};

/// A bound type expression with its source span.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct HirTypeExpr {
    pub kind: HirTypeExprKind,
    pub span: Span,
}

/// The shape of a bound type expression.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum HirTypeExprKind {
    /// A named type with optional type arguments: `i32`, `List<T>`, `Eq<T>`.
    Named {
        /// The written name (used for primitives and diagnostics).
        name: Name,
        /// Declaration the binder resolved the name to.
        symbol: Option<SymbolRef>,
        /// Generic type arguments, empty if none were written.
        type_args: Vec<HirTypeExpr>,
    },

    /// A structural object type: `{ x: i32, y?: i32 }`.
    Object(Vec<HirObjectField>),

    /// A tuple type: `(i32, bool)`, lowered to a structural object with
    /// positional field names.
    Tuple(Vec<HirTypeExpr>),

    /// A function type: `(~x: i32, y: i32) -> i32`.
    Function {
        params: Vec<HirFnParamType>,
        ret: Box<HirTypeExpr>,
        /// Effect annotation, `None` for pure.
        effects: Option<EffectRow>,
    },

    /// A union type: `A | B`.
    Union(Vec<HirTypeExpr>),

    /// An intersection type: `A & { x: i32 } & Trait`.
    Intersection(Vec<HirTypeExpr>),

    /// A fixed array type: `FixedArray<T>`.
    FixedArray(Box<HirTypeExpr>),
}

/// A field of a structural object type expression.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct HirObjectField {
    pub name: Name,
    pub ty: HirTypeExpr,
    pub optional: bool,
    pub span: Span,
}

/// A parameter of a function type expression.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct HirFnParamType {
    pub ty: HirTypeExpr,
    pub label: Option<Name>,
    pub optional: bool,
}

impl HirTypeExpr {
    /// Create a type expression from its kind and span.
    #[inline]
    pub fn new(kind: HirTypeExprKind, span: Span) -> Self {
        HirTypeExpr { kind, span }
    }

    /// A named reference without type arguments.
    pub fn named(name: Name, symbol: Option<SymbolRef>) -> Self {
        Self::new(
            HirTypeExprKind::Named {
                name,
                symbol,
                type_args: Vec::new(),
            },
            Span::DUMMY,
        )
    }

    /// A named reference with type arguments.
    pub fn applied(name: Name, symbol: Option<SymbolRef>, type_args: Vec<HirTypeExpr>) -> Self {
        Self::new(
            HirTypeExprKind::Named {
                name,
                symbol,
                type_args,
            },
            Span::DUMMY,
        )
    }

    /// A structural object type.
    pub fn object(fields: Vec<HirObjectField>) -> Self {
        Self::new(HirTypeExprKind::Object(fields), Span::DUMMY)
    }

    /// A union of the given members.
    pub fn union(members: Vec<HirTypeExpr>) -> Self {
        Self::new(HirTypeExprKind::Union(members), Span::DUMMY)
    }

    /// An intersection of the given members.
    pub fn intersection(members: Vec<HirTypeExpr>) -> Self {
        Self::new(HirTypeExprKind::Intersection(members), Span::DUMMY)
    }

    /// A fixed array of `elem`.
    pub fn fixed_array(elem: HirTypeExpr) -> Self {
        Self::new(HirTypeExprKind::FixedArray(Box::new(elem)), Span::DUMMY)
    }

    /// Attach a source span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl HirObjectField {
    /// A required field without a source span.
    pub fn required(name: Name, ty: HirTypeExpr) -> Self {
        HirObjectField {
            name,
            ty,
            optional: false,
            span: Span::DUMMY,
        }
    }
}
