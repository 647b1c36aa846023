#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rustc_hash::FxHashMap;
use tern_ir::{EffectRow, Name, StringInterner, SymbolRef};

use super::*;
use crate::effects::CapabilitySetEffects;
use crate::{FnParam, Primitive, StructField};

struct Fixture {
    interner: StringInterner,
    arena: TypeArena,
    budget: StepBudget,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            interner: StringInterner::new(),
            arena: TypeArena::new(),
            budget: StepBudget::new(10_000),
        }
    }

    fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn record(&mut self, fields: &[(&str, TypeId)]) -> TypeId {
        let fields = fields
            .iter()
            .map(|(n, t)| StructField::new(self.interner.intern(n), *t))
            .collect();
        self.arena.structural(fields)
    }

    fn param(&mut self, name: &str) -> (TypeParamId, TypeId) {
        let p = self.arena.fresh_type_param(self.interner.intern(name));
        (p, self.arena.param_ref(p))
    }

    fn unify(
        &mut self,
        actual: TypeId,
        expected: TypeId,
        options: UnifyOptions,
    ) -> Result<Substitution, UnifyError> {
        unify(
            &mut self.arena,
            &CapabilitySetEffects,
            &mut self.budget,
            actual,
            expected,
            options,
        )
    }
}

#[test]
fn width_subtyping_is_covariant_only() {
    let mut fx = Fixture::new();
    let wide = fx.record(&[("x", TypeId::I32), ("y", TypeId::I32)]);
    let narrow = fx.record(&[("x", TypeId::I32)]);

    assert!(fx.unify(wide, narrow, UnifyOptions::COVARIANT).is_ok());
    assert!(matches!(
        fx.unify(narrow, wide, UnifyOptions::COVARIANT),
        Err(UnifyError::MissingField { .. })
    ));
    assert!(fx.unify(wide, narrow, UnifyOptions::INVARIANT).is_err());
}

#[test]
fn optional_fields_may_be_absent() {
    let mut fx = Fixture::new();
    let y = fx.name("y");
    let x = fx.name("x");
    let with_optional = fx.arena.structural(vec![
        StructField::new(x, TypeId::I32),
        StructField::new(y, TypeId::BOOL).optional(),
    ]);
    let only_x = fx.record(&[("x", TypeId::I32)]);
    assert!(fx.unify(only_x, with_optional, UnifyOptions::COVARIANT).is_ok());
}

#[test]
fn parameters_bind_and_stay_consistent() {
    let mut fx = Fixture::new();
    let (t, t_ref) = fx.param("T");
    let expected = fx.record(&[("a", t_ref), ("b", t_ref)]);

    let same = fx.record(&[("a", TypeId::I32), ("b", TypeId::I32)]);
    let subst = fx.unify(same, expected, UnifyOptions::COVARIANT).unwrap();
    assert_eq!(subst.get(&t), Some(&TypeId::I32));

    let mixed = fx.record(&[("a", TypeId::I32), ("b", TypeId::BOOL)]);
    assert!(fx.unify(mixed, expected, UnifyOptions::COVARIANT).is_err());
}

#[test]
fn occurs_check_rejects_infinite_types() {
    let mut fx = Fixture::new();
    let (t, t_ref) = fx.param("T");
    let arr = fx.arena.fixed_array(t_ref);
    assert_eq!(
        fx.unify(arr, t_ref, UnifyOptions::COVARIANT),
        Err(UnifyError::OccursCheck { param: t, ty: arr })
    );
}

#[test]
fn unknown_is_lenient_only_when_allowed() {
    let mut fx = Fixture::new();
    assert!(fx.unify(TypeId::UNKNOWN, TypeId::I32, UnifyOptions::COVARIANT).is_err());
    let lenient = UnifyOptions::COVARIANT.allowing_unknown(true);
    assert!(fx.unify(TypeId::UNKNOWN, TypeId::I32, lenient).is_ok());
    assert!(fx.unify(TypeId::STRING, TypeId::UNKNOWN, lenient).is_ok());
}

#[test]
fn never_is_bottom_in_covariant_mode() {
    let mut fx = Fixture::new();
    assert!(fx.unify(TypeId::NEVER, TypeId::STRING, UnifyOptions::COVARIANT).is_ok());
    assert!(fx.unify(TypeId::NEVER, TypeId::STRING, UnifyOptions::INVARIANT).is_err());
}

#[test]
fn unions_decompose() {
    let mut fx = Fixture::new();
    let opt_i32 = fx.arena.optional(TypeId::I32);
    let wide = fx.arena.union(&[TypeId::I32, TypeId::BOOL, TypeId::NONE]);

    assert!(fx.unify(TypeId::I32, opt_i32, UnifyOptions::COVARIANT).is_ok());
    assert!(fx.unify(opt_i32, wide, UnifyOptions::COVARIANT).is_ok());
    assert!(fx.unify(wide, opt_i32, UnifyOptions::COVARIANT).is_err());
    assert!(fx.unify(TypeId::I32, opt_i32, UnifyOptions::INVARIANT).is_err());
}

#[test]
fn failed_union_alternatives_roll_back_bindings() {
    let mut fx = Fixture::new();
    for field in ["a", "b", "c"] {
        fx.name(field);
    }
    let (t, t_ref) = fx.param("T");
    let first = fx.record(&[("b", t_ref), ("c", TypeId::STRING)]);
    let second = fx.record(&[("a", t_ref)]);
    let expected = fx.arena.union(&[first, second]);

    // `first` binds T to i32 through `b`, then fails on `c`. Without the
    // rollback `second` would see T = i32 and reject `a: bool`.
    let actual = fx.record(&[("a", TypeId::BOOL), ("b", TypeId::I32), ("c", TypeId::I32)]);
    let subst = fx.unify(actual, expected, UnifyOptions::COVARIANT).unwrap();
    assert_eq!(subst.get(&t), Some(&TypeId::BOOL));
}

#[test]
fn functions_are_contravariant_in_parameters() {
    let mut fx = Fixture::new();
    let wide = fx.record(&[("x", TypeId::I32), ("y", TypeId::I32)]);
    let narrow = fx.record(&[("x", TypeId::I32)]);
    let takes_narrow = fx
        .arena
        .function(vec![FnParam::positional(narrow)], TypeId::VOID, EffectRow::PURE);
    let takes_wide = fx
        .arena
        .function(vec![FnParam::positional(wide)], TypeId::VOID, EffectRow::PURE);

    assert!(fx.unify(takes_narrow, takes_wide, UnifyOptions::COVARIANT).is_ok());
    assert!(fx.unify(takes_wide, takes_narrow, UnifyOptions::COVARIANT).is_err());
}

#[test]
fn function_arity_and_effects_are_checked() {
    let mut fx = Fixture::new();
    let unary = fx.arena.function(
        vec![FnParam::positional(TypeId::I32)],
        TypeId::I32,
        EffectRow::PURE,
    );
    let binary = fx.arena.function(
        vec![FnParam::positional(TypeId::I32), FnParam::positional(TypeId::I32)],
        TypeId::I32,
        EffectRow::PURE,
    );
    assert_eq!(
        fx.unify(unary, binary, UnifyOptions::COVARIANT),
        Err(UnifyError::ArityMismatch {
            expected: 2,
            found: 1
        })
    );

    let effectful = fx.arena.function(
        vec![FnParam::positional(TypeId::I32)],
        TypeId::I32,
        EffectRow(0b1),
    );
    assert!(fx.unify(unary, effectful, UnifyOptions::COVARIANT).is_ok());
    assert!(matches!(
        fx.unify(effectful, unary, UnifyOptions::COVARIANT),
        Err(UnifyError::EffectMismatch { .. })
    ));
}

/// Rows only satisfy themselves; purity is known without asking.
struct ExactRows;

impl crate::EffectSystem for ExactRows {
    fn compose(&self, rows: &[EffectRow]) -> EffectRow {
        rows.last().copied().unwrap_or(EffectRow::PURE)
    }

    fn constrain(&self, actual: EffectRow, expected: EffectRow) -> bool {
        actual == expected
    }

    fn is_empty(&self, row: EffectRow) -> bool {
        row == EffectRow::PURE
    }
}

#[test]
fn pure_functions_fit_any_row_covariantly() {
    let mut fx = Fixture::new();
    let with_row = |arena: &mut TypeArena, row| {
        arena.function(vec![FnParam::positional(TypeId::I32)], TypeId::I32, row)
    };
    let pure = with_row(&mut fx.arena, EffectRow::PURE);
    let io = with_row(&mut fx.arena, EffectRow(0b01));
    let io_and_net = with_row(&mut fx.arena, EffectRow(0b11));

    let mut check = |actual, expected, options| {
        Unifier::new(&mut fx.arena, &ExactRows, &mut fx.budget, options)
            .unify(actual, expected)
            .is_ok()
    };
    assert!(check(pure, io, UnifyOptions::COVARIANT));
    assert!(!check(pure, io, UnifyOptions::INVARIANT));
    assert!(!check(io, io_and_net, UnifyOptions::COVARIANT));
    assert!(check(io, io, UnifyOptions::INVARIANT));
}

#[test]
fn nominal_types_compare_owner_and_arguments() {
    let mut fx = Fixture::new();
    let list = fx.name("List");
    let owner = SymbolRef::from_raw(1, 1);
    let other = SymbolRef::from_raw(1, 2);
    let (t, t_ref) = fx.param("T");

    let list_i32 = fx.arena.nominal(owner, list, &[TypeId::I32]);
    let list_t = fx.arena.nominal(owner, list, &[t_ref]);
    let other_i32 = fx.arena.nominal(other, list, &[TypeId::I32]);

    let subst = fx.unify(list_i32, list_t, UnifyOptions::INVARIANT).unwrap();
    assert_eq!(subst.get(&t), Some(&TypeId::I32));
    assert!(fx.unify(list_i32, other_i32, UnifyOptions::COVARIANT).is_err());
}

#[test]
fn nominal_widens_through_structural_resolver() {
    let mut fx = Fixture::new();
    let point_name = fx.name("Point");
    let point = fx.arena.nominal(SymbolRef::from_raw(0, 3), point_name, &[]);
    let fields = fx.record(&[("x", TypeId::I32), ("y", TypeId::I32)]);
    let wanted = fx.record(&[("x", TypeId::I32)]);

    let mut resolver = FxHashMap::default();
    resolver.insert(point, fields);

    let effects = CapabilitySetEffects;
    let mut unifier = Unifier::new(
        &mut fx.arena,
        &effects,
        &mut fx.budget,
        UnifyOptions::COVARIANT,
    )
    .with_resolver(&resolver);
    assert!(unifier.unify(point, wanted).is_ok());

    assert!(fx.unify(point, wanted, UnifyOptions::COVARIANT).is_err());
}

#[test]
fn recursive_types_unify_co_inductively() {
    let mut fx = Fixture::new();
    let name = fx.name("X");
    let a = fx
        .arena
        .create_recursive_type(name, |arena, me, _| arena.fixed_array(me))
        .unwrap();
    let b = fx
        .arena
        .create_recursive_type(name, |arena, me, _| arena.fixed_array(me))
        .unwrap();
    assert_ne!(a, b);

    assert!(fx.unify(a, b, UnifyOptions::INVARIANT).is_ok());

    let unrolled = fx.arena.fixed_array(a);
    assert!(fx.unify(unrolled, b, UnifyOptions::INVARIANT).is_ok());
    assert!(fx.unify(a, TypeId::I32, UnifyOptions::COVARIANT).is_err());
}

#[test]
fn exhausted_budget_fails_every_step() {
    let mut fx = Fixture::new();
    fx.budget = StepBudget::new(2);
    let a = fx.record(&[("x", TypeId::I32), ("y", TypeId::I32)]);
    let b = fx.record(&[("x", TypeId::I32), ("y", TypeId::I32), ("z", TypeId::BOOL)]);

    let err = fx.unify(b, a, UnifyOptions::COVARIANT).unwrap_err();
    assert!(err.is_budget());
    assert!(fx.budget.is_exhausted());
    assert!(fx.unify(TypeId::I32, TypeId::I64, UnifyOptions::COVARIANT).unwrap_err().is_budget());

    assert!(fx.budget.take_first_report());
    assert!(!fx.budget.take_first_report());
    fx.budget.reset();
    assert_eq!(fx.budget.steps_used(), 0);
}

// === Reflexivity over random types ===

#[derive(Clone, Debug)]
enum Shape {
    Prim(usize),
    Param,
    Array(Box<Shape>),
    Optional(Box<Shape>),
    Object(Vec<(usize, Shape)>),
    Func(Vec<Shape>, Box<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (0..Primitive::ALL.len()).prop_map(Shape::Prim),
        Just(Shape::Param),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Array(Box::new(s))),
            inner.clone().prop_map(|s| Shape::Optional(Box::new(s))),
            prop::collection::btree_map(0..5usize, inner.clone(), 0..3)
                .prop_map(|m| Shape::Object(m.into_iter().collect())),
            (prop::collection::vec(inner.clone(), 0..3), inner)
                .prop_map(|(ps, r)| Shape::Func(ps, Box::new(r))),
        ]
    })
}

fn build(fx: &mut Fixture, param: TypeId, shape: &Shape) -> TypeId {
    match shape {
        Shape::Prim(i) => Primitive::ALL[*i].type_id(),
        Shape::Param => param,
        Shape::Array(elem) => {
            let elem = build(fx, param, elem);
            fx.arena.fixed_array(elem)
        }
        Shape::Optional(inner) => {
            let inner = build(fx, param, inner);
            fx.arena.optional(inner)
        }
        Shape::Object(fields) => {
            let fields = fields
                .iter()
                .map(|(i, s)| {
                    let ty = build(fx, param, s);
                    StructField::new(fx.interner.intern(&format!("f{i}")), ty)
                })
                .collect();
            fx.arena.structural(fields)
        }
        Shape::Func(params, ret) => {
            let params = params
                .iter()
                .map(|p| FnParam::positional(build(fx, param, p)))
                .collect();
            let ret = build(fx, param, ret);
            fx.arena.function(params, ret, EffectRow::PURE)
        }
    }
}

proptest! {
    #[test]
    fn unification_is_reflexive(s in shape()) {
        let mut fx = Fixture::new();
        let (_, t_ref) = fx.param("T");
        let ty = build(&mut fx, t_ref, &s);
        prop_assert!(fx.unify(ty, ty, UnifyOptions::INVARIANT).is_ok());
        prop_assert!(fx.unify(ty, ty, UnifyOptions::COVARIANT).is_ok());
    }
}
