#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tern_ir::{EffectRow, Name, StringInterner, SymbolRef};

use super::*;
use crate::{FnParam, StructField};

#[test]
fn primitives_are_pre_interned() {
    let arena = TypeArena::new();
    for prim in Primitive::ALL {
        assert_eq!(arena.get(prim.type_id()), &TypeData::Primitive(prim));
    }
    assert_eq!(arena.get(TypeId::UNKNOWN), &TypeData::Unknown);
    assert_eq!(arena.len(), TypeId::FIRST_DYNAMIC as usize);
}

#[test]
fn structural_fields_are_order_independent() {
    let interner = StringInterner::new();
    let (x, y) = (interner.intern("x"), interner.intern("y"));
    let mut arena = TypeArena::new();

    let a = arena.structural(vec![
        StructField::new(x, TypeId::I32),
        StructField::new(y, TypeId::BOOL),
    ]);
    let b = arena.structural(vec![
        StructField::new(y, TypeId::BOOL),
        StructField::new(x, TypeId::I32),
    ]);
    assert_eq!(a, b);
    assert_eq!(arena.field(a, y).map(|f| f.ty), Some(TypeId::BOOL));
}

#[test]
#[should_panic(expected = "duplicate field")]
fn duplicate_fields_are_a_contract_violation() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let mut arena = TypeArena::new();
    arena.structural(vec![
        StructField::new(x, TypeId::I32),
        StructField::new(x, TypeId::BOOL),
    ]);
}

#[test]
fn unions_are_flattened_sorted_and_deduplicated() {
    let mut arena = TypeArena::new();
    let inner = arena.union(&[TypeId::BOOL, TypeId::STRING]);
    let a = arena.union(&[TypeId::I32, inner, TypeId::I32]);
    let b = arena.union(&[TypeId::STRING, TypeId::BOOL, TypeId::I32]);
    assert_eq!(a, b);
    assert_eq!(
        arena.get(a),
        &TypeData::Union(vec![TypeId::I32, TypeId::BOOL, TypeId::STRING].into_boxed_slice())
    );
}

#[test]
fn degenerate_unions_collapse() {
    let mut arena = TypeArena::new();
    assert_eq!(arena.union(&[TypeId::I32]), TypeId::I32);
    assert_eq!(arena.union(&[TypeId::I32, TypeId::NEVER]), TypeId::I32);
    assert_eq!(arena.union(&[]), TypeId::NEVER);
    assert_eq!(arena.union(&[TypeId::F32, TypeId::F32]), TypeId::F32);
}

#[test]
fn optional_detection() {
    let mut arena = TypeArena::new();
    let opt = arena.optional(TypeId::I32);
    assert!(arena.is_optional(opt));
    assert!(arena.is_optional(TypeId::NONE));
    assert!(!arena.is_optional(TypeId::I32));
}

#[test]
fn single_component_intersection_collapses() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let owner = SymbolRef::from_raw(0, 1);
    let nominal = arena.nominal(owner, interner.intern("Point"), &[]);
    assert_eq!(arena.intersection(Some(nominal), None, Vec::new()), nominal);

    let shape = arena.trait_type(SymbolRef::from_raw(0, 2), interner.intern("Shape"), &[]);
    let both = arena.intersection(Some(nominal), None, vec![shape, shape]);
    assert!(matches!(
        arena.get(both),
        TypeData::Intersection { traits, .. } if traits.len() == 1
    ));
    assert_eq!(arena.nominal_component(both), Some(nominal));
}

#[test]
fn flags_propagate_from_children() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let t = arena.fresh_type_param(interner.intern("T"));
    let t_ref = arena.param_ref(t);
    let arr = arena.fixed_array(t_ref);
    assert!(arena.flags(arr).has_params());
    assert!(arena.flags(arr).contains(TypeFlags::IS_ARRAY));

    let maybe = arena.optional(TypeId::UNKNOWN);
    assert!(arena.flags(maybe).has_unknown());
    assert!(arena.flags(TypeId::I32).is_concrete());
}

#[test]
fn substitution_replaces_bound_params_only() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let t = arena.fresh_type_param(interner.intern("T"));
    let u = arena.fresh_type_param(interner.intern("U"));
    let (t_ref, u_ref) = (arena.param_ref(t), arena.param_ref(u));
    let f = arena.function(vec![FnParam::positional(t_ref)], u_ref, EffectRow::PURE);

    let mut bindings = Substitution::default();
    bindings.insert(t, TypeId::I32);
    let g = arena.substitute(f, &bindings);

    let expected = arena.function(vec![FnParam::positional(TypeId::I32)], u_ref, EffectRow::PURE);
    assert_eq!(g, expected);
}

#[test]
fn recursive_type_guarded_by_array_is_accepted() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let list = arena
        .create_recursive_type(interner.intern("X"), |arena, me, _| arena.fixed_array(me))
        .unwrap();

    assert!(matches!(arena.get(list), TypeData::Recursive { .. }));
    assert!(!arena.flags(list).has_params());
    assert!(arena.flags(list).contains(TypeFlags::HAS_RECURSIVE));

    let unfolded = arena.unfold(list);
    assert_eq!(arena.get(unfolded), &TypeData::FixedArray(list));
    assert_eq!(arena.format_type(list, &interner), "FixedArray<X>");
}

#[test]
fn unguarded_self_reference_is_rejected() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let name = interner.intern("X");

    assert!(arena.create_recursive_type(name, |_, me, _| me).is_err());
    assert!(arena
        .create_recursive_type(name, |arena, me, _| arena.optional(me))
        .is_err());
}

#[test]
fn recursive_type_without_self_reference_is_its_body() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let ty = arena
        .create_recursive_type(interner.intern("X"), |arena, _, _| arena.fixed_array(TypeId::I32))
        .unwrap();
    assert_eq!(arena.get(ty), &TypeData::FixedArray(TypeId::I32));
}

#[test]
fn recursive_binder_shadows_substitution() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let t = arena.fresh_type_param(interner.intern("T"));
    let t_ref = arena.param_ref(t);
    let name = interner.intern("Node");
    let value = interner.intern("value");
    let next = interner.intern("next");

    // rec Node. { value: T, next: Node | None }
    let node = arena
        .create_recursive_type(name, |arena, me, _| {
            let next_ty = arena.optional(me);
            arena.structural(vec![
                StructField::new(value, t_ref),
                StructField::new(next, next_ty),
            ])
        })
        .unwrap();
    assert_eq!(arena.free_params(node).as_slice(), &[t]);

    let mut bindings = Substitution::default();
    bindings.insert(t, TypeId::STRING);
    let concrete = arena.substitute(node, &bindings);
    assert!(arena.free_params(concrete).is_empty());
    // Fields sort by interned name, union members by id.
    assert_eq!(
        arena.format_type(concrete, &interner),
        "{ value: string, next: None | Node }"
    );
}

#[test]
fn function_types_render_labels() {
    let interner = StringInterner::new();
    let mut arena = TypeArena::new();
    let x = interner.intern("x");
    let f = arena.function(
        vec![FnParam::labeled(x, TypeId::I32), FnParam::positional(TypeId::BOOL)],
        TypeId::VOID,
        EffectRow::PURE,
    );
    assert_eq!(arena.format_type(f, &interner), "(~x: i32, bool) -> void");
}

// === Property tests ===

/// Recipe for a random type, built into an arena on demand.
#[derive(Clone, Debug)]
enum Shape {
    Prim(usize),
    Param(usize),
    Array(Box<Shape>),
    Union(Vec<Shape>),
    Object(Vec<(usize, Shape)>),
    Func(Vec<Shape>, Box<Shape>),
}

fn shape(with_params: bool) -> impl Strategy<Value = Shape> {
    let leaf = if with_params {
        prop_oneof![
            (0..Primitive::ALL.len()).prop_map(Shape::Prim),
            (0..3usize).prop_map(Shape::Param),
        ]
        .boxed()
    } else {
        (0..Primitive::ALL.len()).prop_map(Shape::Prim).boxed()
    };
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Array(Box::new(s))),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Shape::Union),
            prop::collection::btree_map(0..6usize, inner.clone(), 0..4)
                .prop_map(|m| Shape::Object(m.into_iter().collect())),
            (prop::collection::vec(inner.clone(), 0..3), inner)
                .prop_map(|(ps, r)| Shape::Func(ps, Box::new(r))),
        ]
    })
}

struct Builder {
    interner: StringInterner,
    params: Vec<TypeParamId>,
}

impl Builder {
    fn new(arena: &mut TypeArena) -> Self {
        let interner = StringInterner::new();
        let params = ["A", "B", "C"]
            .iter()
            .map(|n| arena.fresh_type_param(interner.intern(n)))
            .collect();
        Builder { interner, params }
    }

    fn field_name(&self, i: usize) -> Name {
        self.interner.intern(&format!("f{i}"))
    }

    fn build(&self, arena: &mut TypeArena, shape: &Shape) -> TypeId {
        match shape {
            Shape::Prim(i) => Primitive::ALL[*i].type_id(),
            Shape::Param(i) => arena.param_ref(self.params[*i]),
            Shape::Array(elem) => {
                let elem = self.build(arena, elem);
                arena.fixed_array(elem)
            }
            Shape::Union(members) => {
                let members: Vec<TypeId> = members.iter().map(|m| self.build(arena, m)).collect();
                arena.union(&members)
            }
            Shape::Object(fields) => {
                let fields = fields
                    .iter()
                    .map(|(i, s)| StructField::new(self.field_name(*i), self.build(arena, s)))
                    .collect();
                arena.structural(fields)
            }
            Shape::Func(params, ret) => {
                let params = params
                    .iter()
                    .map(|p| FnParam::positional(self.build(arena, p)))
                    .collect();
                let ret = self.build(arena, ret);
                arena.function(params, ret, EffectRow::PURE)
            }
        }
    }
}

proptest! {
    #[test]
    fn interning_is_idempotent(s in shape(true)) {
        let mut arena = TypeArena::new();
        let builder = Builder::new(&mut arena);
        let first = builder.build(&mut arena, &s);
        let second = builder.build(&mut arena, &s);
        prop_assert_eq!(first, second);

        let data = arena.get(first).clone();
        prop_assert_eq!(arena.intern(data), first);
    }

    #[test]
    fn substitution_is_identity_on_ground_types(s in shape(false)) {
        let mut arena = TypeArena::new();
        let builder = Builder::new(&mut arena);
        let ty = builder.build(&mut arena, &s);
        let before = arena.len();

        prop_assert_eq!(arena.substitute(ty, &Substitution::default()), ty);

        let mut bindings = Substitution::default();
        bindings.insert(builder.params[0], TypeId::STRING);
        prop_assert_eq!(arena.substitute(ty, &bindings), ty);
        prop_assert_eq!(arena.len(), before);
    }

    #[test]
    fn full_substitution_leaves_no_free_params(s in shape(true)) {
        let mut arena = TypeArena::new();
        let builder = Builder::new(&mut arena);
        let ty = builder.build(&mut arena, &s);

        let bindings: Substitution = builder
            .params
            .iter()
            .map(|&p| (p, TypeId::I64))
            .collect();
        let ground = arena.substitute(ty, &bindings);
        prop_assert!(!arena.flags(ground).has_params());
        prop_assert!(arena.free_params(ground).is_empty());
    }
}
