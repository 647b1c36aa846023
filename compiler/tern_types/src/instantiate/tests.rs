#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use tern_diagnostic::ErrorCode;
use tern_ir::{HirObjectField, HirTypeExpr, StringInterner};

use super::*;
use crate::effects::CapabilitySetEffects;
use crate::{
    FieldDecl, ImplDecl, InheritedFieldProblem, ObjectDecl, TraitDecl, TypeAliasDecl,
    TypeCheckError, TypeData, TypeParamDecl, TypeckConfig, Visibility,
};

fn sym(n: u32) -> SymbolRef {
    SymbolRef::from_raw(0, n)
}

fn prim(interner: &StringInterner, name: &str) -> HirTypeExpr {
    HirTypeExpr::named(interner.intern(name), None)
}

fn object(
    interner: &StringInterner,
    symbol: SymbolRef,
    name: &str,
    type_params: Vec<TypeParamDecl>,
    fields: Vec<FieldDecl>,
) -> ObjectDecl {
    ObjectDecl {
        symbol,
        name: interner.intern(name),
        type_params,
        fields,
        base: None,
        visibility: Visibility::Public,
        package: None,
        span: Span::DUMMY,
    }
}

fn field(interner: &StringInterner, name: &str, ty: HirTypeExpr) -> FieldDecl {
    FieldDecl::new(interner.intern(name), ty)
}

fn codes(ctx: &TypingContext<'_>) -> Vec<ErrorCode> {
    ctx.errors().iter().map(TypeCheckError::code).collect()
}

/// `object Box<T> { value: T }`, with `T` bounded by `bound` if given.
fn register_box(
    ctx: &mut TypingContext<'_>,
    interner: &StringInterner,
    bound: Option<HirTypeExpr>,
) -> SymbolRef {
    let t = sym(11);
    let mut param = TypeParamDecl::new(t, interner.intern("T"));
    if let Some(bound) = bound {
        param = param.with_constraint(bound);
    }
    let t_ref = HirTypeExpr::named(interner.intern("T"), Some(t));
    ctx.register_object(object(
        interner,
        sym(10),
        "Box",
        vec![param],
        vec![field(interner, "value", t_ref)],
    ));
    sym(10)
}

#[test]
fn concrete_object_instances_are_shared() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let boxed = register_box(&mut ctx, &interner, None);

    let first = ctx.resolve_object(boxed, &[TypeId::I32], Span::DUMMY).unwrap();
    let second = ctx.resolve_object(boxed, &[TypeId::I32], Span::DUMMY).unwrap();
    let (first, second) = (first.info().unwrap(), second.info().unwrap());
    assert!(Rc::ptr_eq(first, second));

    let value = interner.intern("value");
    assert_eq!(ctx.arena().field(first.ty, value).map(|f| f.ty), Some(TypeId::I32));
    assert_eq!(first.fields[0].owner, Some(boxed));
    assert_eq!(
        ctx.resolution_state(&InstanceKey::new(boxed, &[TypeId::I32])),
        Some(ResolutionState::Done(first.ty))
    );
}

#[test]
fn failed_constraints_are_reported_once() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let boxed = register_box(&mut ctx, &interner, Some(prim(&interner, "string")));

    assert!(ctx.resolve_object(boxed, &[TypeId::I32], Span::DUMMY).is_err());
    assert!(ctx.resolve_object(boxed, &[TypeId::I32], Span::DUMMY).is_err());
    assert_eq!(codes(&ctx), vec![ErrorCode::E2009]);

    assert!(ctx.resolve_object(boxed, &[TypeId::STRING], Span::DUMMY).is_ok());
    assert_eq!(ctx.errors().len(), 1);
}

#[test]
fn too_many_type_arguments_is_an_error() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let boxed = register_box(&mut ctx, &interner, None);

    let result = ctx.resolve_object(boxed, &[TypeId::I32, TypeId::BOOL], Span::new(1, 2));
    assert_eq!(result, Err(ErrorReported));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2017]);
}

#[test]
fn missing_type_arguments_depend_on_mode() {
    let interner = StringInterner::new();

    let mut relaxed =
        TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let boxed = register_box(&mut relaxed, &interner, None);
    let resolved = relaxed.resolve_object(boxed, &[], Span::DUMMY).unwrap();
    assert_eq!(resolved.info().unwrap().args.as_slice(), &[TypeId::UNKNOWN]);
    // Instances mentioning `unknown` are never cached.
    assert_eq!(
        relaxed.resolution_state(&InstanceKey::new(boxed, &[TypeId::UNKNOWN])),
        None
    );
    assert!(relaxed.errors().is_empty());

    let mut strict = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::strict());
    let boxed = register_box(&mut strict, &interner, None);
    assert!(strict.resolve_object(boxed, &[], Span::DUMMY).is_err());
    assert_eq!(codes(&strict), vec![ErrorCode::E2016]);
}

#[test]
fn self_referential_objects_use_their_nominal() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let node = sym(20);
    let node_ref = HirTypeExpr::named(interner.intern("Node"), Some(node));
    let next = HirTypeExpr::union(vec![node_ref, prim(&interner, "None")]);
    ctx.register_object(object(
        &interner,
        node,
        "Node",
        Vec::new(),
        vec![field(&interner, "next", next)],
    ));

    let resolved = ctx.resolve_object(node, &[], Span::DUMMY).unwrap();
    let info = resolved.info().unwrap();
    let expected = ctx.arena_mut().union(&[info.nominal, TypeId::NONE]);
    assert_eq!(info.fields[0].ty, expected);
    assert!(ctx.errors().is_empty());
}

#[test]
fn inherited_fields_take_the_base_owner() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let (a, b) = (sym(1), sym(2));
    ctx.register_object(object(
        &interner,
        a,
        "A",
        Vec::new(),
        vec![field(&interner, "x", prim(&interner, "i32"))],
    ));
    let mut derived = object(
        &interner,
        b,
        "B",
        Vec::new(),
        vec![
            field(&interner, "x", prim(&interner, "i32")),
            field(&interner, "y", prim(&interner, "bool")),
        ],
    );
    derived.base = Some(HirTypeExpr::named(interner.intern("A"), Some(a)));
    ctx.register_object(derived);

    let resolved = ctx.resolve_object(b, &[], Span::DUMMY).unwrap();
    let info = resolved.info().unwrap();
    let owner = |name: &str| {
        let name = interner.intern(name);
        info.fields.iter().find(|f| f.name == name).and_then(|f| f.owner)
    };
    assert_eq!(owner("x"), Some(a));
    assert_eq!(owner("y"), Some(b));

    let base = ctx.resolve_object(a, &[], Span::DUMMY).unwrap();
    assert_eq!(info.base_nominal, Some(base.info().unwrap().nominal));
}

#[test]
fn inherited_fields_must_be_redeclared_compatibly() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let a = sym(1);
    ctx.register_object(object(
        &interner,
        a,
        "A",
        Vec::new(),
        vec![field(&interner, "x", prim(&interner, "i32"))],
    ));
    let base = HirTypeExpr::named(interner.intern("A"), Some(a));

    let mut missing = object(&interner, sym(2), "C", Vec::new(), Vec::new());
    missing.base = Some(base.clone());
    ctx.register_object(missing);
    let mut incompatible = object(
        &interner,
        sym(3),
        "D",
        Vec::new(),
        vec![field(&interner, "x", prim(&interner, "bool"))],
    );
    incompatible.base = Some(base);
    ctx.register_object(incompatible);

    assert!(ctx.resolve_object(sym(2), &[], Span::DUMMY).is_err());
    assert!(ctx.resolve_object(sym(3), &[], Span::DUMMY).is_err());
    let problems: Vec<_> = ctx
        .errors()
        .iter()
        .map(|e| match &e.kind {
            TypeErrorKind::InheritedField { problem, .. } => *problem,
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(
        problems,
        vec![
            InheritedFieldProblem::Missing,
            InheritedFieldProblem::Incompatible {
                own: TypeId::BOOL,
                base: TypeId::I32,
            },
        ]
    );
}

#[test]
fn generic_aliases_substitute_their_target() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let t = sym(31);
    let t_ref = HirTypeExpr::named(interner.intern("T"), Some(t));
    ctx.register_alias(TypeAliasDecl {
        symbol: sym(30),
        name: interner.intern("Pair"),
        type_params: vec![TypeParamDecl::new(t, interner.intern("T"))],
        target: HirTypeExpr::object(vec![
            HirObjectField::required(interner.intern("first"), t_ref.clone()),
            HirObjectField::required(interner.intern("second"), t_ref),
        ]),
        span: Span::DUMMY,
    });

    let ty = ctx.resolve_alias(sym(30), &[TypeId::BOOL], Span::DUMMY).unwrap();
    let arena = ctx.arena();
    assert_eq!(arena.field(ty, interner.intern("first")).map(|f| f.ty), Some(TypeId::BOOL));
    assert_eq!(arena.field(ty, interner.intern("second")).map(|f| f.ty), Some(TypeId::BOOL));
}

#[test]
fn unguarded_alias_is_not_contractive() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let x = sym(40);
    let name = interner.intern("X");
    ctx.register_alias(TypeAliasDecl {
        symbol: x,
        name,
        type_params: Vec::new(),
        target: HirTypeExpr::named(name, Some(x)),
        span: Span::new(0, 10),
    });

    assert_eq!(ctx.resolve_alias(x, &[], Span::DUMMY), Err(ErrorReported));
    assert_eq!(ctx.resolve_alias(x, &[], Span::DUMMY), Err(ErrorReported));
    assert_eq!(
        ctx.errors().iter().map(|e| e.kind.clone()).collect::<Vec<_>>(),
        vec![TypeErrorKind::NotContractive { name }]
    );
}

#[test]
fn guarded_alias_becomes_recursive() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let x = sym(40);
    let name = interner.intern("X");
    ctx.register_alias(TypeAliasDecl {
        symbol: x,
        name,
        type_params: Vec::new(),
        target: HirTypeExpr::fixed_array(HirTypeExpr::named(name, Some(x))),
        span: Span::DUMMY,
    });

    let ty = ctx.resolve_alias(x, &[], Span::DUMMY).unwrap();
    assert!(matches!(ctx.arena().get(ty), TypeData::Recursive { .. }));
    let unfolded = ctx.arena_mut().unfold(ty);
    let expected = ctx.arena_mut().fixed_array(ty);
    assert_eq!(unfolded, expected);
    assert!(ctx.errors().is_empty());
}

#[test]
fn generic_recursive_alias_instantiates_concretely() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let (list, t) = (sym(50), sym(51));
    let list_name = interner.intern("List");
    let t_ref = HirTypeExpr::named(interner.intern("T"), Some(t));
    let tail = HirTypeExpr::union(vec![
        HirTypeExpr::applied(list_name, Some(list), vec![t_ref.clone()]),
        prim(&interner, "None"),
    ]);
    ctx.register_alias(TypeAliasDecl {
        symbol: list,
        name: list_name,
        type_params: vec![TypeParamDecl::new(t, interner.intern("T"))],
        target: HirTypeExpr::object(vec![
            HirObjectField::required(interner.intern("head"), t_ref),
            HirObjectField::required(interner.intern("tail"), tail),
        ]),
        span: Span::DUMMY,
    });

    let ty = ctx.resolve_alias(list, &[TypeId::I32], Span::DUMMY).unwrap();
    assert!(matches!(ctx.arena().get(ty), TypeData::Recursive { .. }));
    assert!(ctx.arena().flags(ty).is_concrete());
    let again = ctx.resolve_alias(list, &[TypeId::I32], Span::DUMMY).unwrap();
    assert_eq!(ty, again);
}

#[test]
fn trait_types_resolve_through_type_expressions() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let show = sym(60);
    let name = interner.intern("Show");
    ctx.register_trait(TraitDecl {
        symbol: show,
        name,
        type_params: Vec::new(),
        methods: Vec::new(),
        span: Span::DUMMY,
    });

    let ty = ctx.resolve_type_expr(&HirTypeExpr::named(name, Some(show)));
    assert_eq!(ctx.arena().owner_of(ty), Some(show));
    assert!(matches!(ctx.arena().get(ty), TypeData::Trait { .. }));
    assert_eq!(
        ctx.resolution_state(&InstanceKey::new(show, &[])),
        Some(ResolutionState::Done(ty))
    );
}

#[test]
fn trait_bounds_accept_implementing_arguments() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let show = sym(60);
    let show_ref = HirTypeExpr::named(interner.intern("Show"), Some(show));
    ctx.register_trait(TraitDecl {
        symbol: show,
        name: interner.intern("Show"),
        type_params: Vec::new(),
        methods: Vec::new(),
        span: Span::DUMMY,
    });
    ctx.register_impl(ImplDecl {
        symbol: sym(61),
        type_params: Vec::new(),
        trait_ref: show_ref.clone(),
        target: prim(&interner, "i32"),
        methods: Vec::new(),
        span: Span::DUMMY,
    });
    let boxed = register_box(&mut ctx, &interner, Some(show_ref));

    assert!(ctx.resolve_object(boxed, &[TypeId::I32], Span::DUMMY).is_ok());
    assert!(ctx.resolve_object(boxed, &[TypeId::BOOL], Span::DUMMY).is_err());
    assert_eq!(codes(&ctx), vec![ErrorCode::E2009]);
}

#[test]
fn instance_state_machine_guards_reentry() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let key = InstanceKey::new(sym(70), &[TypeId::I32]);

    assert!(!ctx.is_cached_or_active(&key));
    assert!(ctx.begin_instance(key.clone(), TypeId::UNKNOWN));
    assert!(!ctx.begin_instance(key.clone(), TypeId::UNKNOWN));
    assert_eq!(
        ctx.resolution_state(&key),
        Some(ResolutionState::InProgress(TypeId::UNKNOWN))
    );

    ctx.finish_instance(key.clone(), Some(TypeId::BOOL));
    assert_eq!(ctx.resolution_state(&key), Some(ResolutionState::Done(TypeId::BOOL)));

    let open = InstanceKey::new(sym(70), &[TypeId::UNKNOWN]);
    assert!(ctx.begin_instance(open.clone(), TypeId::UNKNOWN));
    ctx.finish_instance(open.clone(), None);
    assert!(!ctx.is_cached_or_active(&open));
}

/// `type A = [B]` and `type B = A`, or any pair where lowering one alias
/// reaches the other before the first has closed.
fn register_alias_pair(
    ctx: &mut TypingContext<'_>,
    interner: &StringInterner,
    (a, a_target): (SymbolRef, HirTypeExpr),
    (b, b_target): (SymbolRef, HirTypeExpr),
) {
    for (symbol, name, target) in [(a, "A", a_target), (b, "B", b_target)] {
        ctx.register_alias(TypeAliasDecl {
            symbol,
            name: interner.intern(name),
            type_params: Vec::new(),
            target,
            span: Span::DUMMY,
        });
    }
}

#[test]
fn mutually_recursive_aliases_close_over_the_outer_alias() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let (a, b) = (sym(80), sym(81));
    let a_ref = HirTypeExpr::named(interner.intern("A"), Some(a));
    let b_ref = HirTypeExpr::named(interner.intern("B"), Some(b));
    register_alias_pair(
        &mut ctx,
        &interner,
        (a, HirTypeExpr::fixed_array(b_ref)),
        (b, a_ref),
    );

    let a_ty = ctx.resolve_alias(a, &[], Span::DUMMY).unwrap();
    assert!(matches!(ctx.arena().get(a_ty), TypeData::Recursive { .. }));
    let b_ty = ctx.resolve_alias(b, &[], Span::DUMMY).unwrap();
    assert_eq!(b_ty, a_ty);
    assert!(ctx.arena().free_params(b_ty).is_empty());
    assert!(ctx.errors().is_empty());
}

#[test]
fn inner_alias_resolved_first_is_still_closed() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let (json, array) = (sym(82), sym(83));
    let json_ref = HirTypeExpr::named(interner.intern("A"), Some(json));
    let array_ref = HirTypeExpr::named(interner.intern("B"), Some(array));
    // type A = i32 | B; type B = [A]
    register_alias_pair(
        &mut ctx,
        &interner,
        (json, HirTypeExpr::union(vec![prim(&interner, "i32"), array_ref])),
        (array, HirTypeExpr::fixed_array(json_ref)),
    );

    let array_ty = ctx.resolve_alias(array, &[], Span::DUMMY).unwrap();
    let json_ty = ctx.resolve_alias(json, &[], Span::DUMMY).unwrap();
    for ty in [array_ty, json_ty] {
        assert!(ctx.arena().free_params(ty).is_empty());
        assert!(ctx.arena().flags(ty).is_concrete());
    }
    assert_eq!(ctx.resolve_alias(json, &[], Span::DUMMY).unwrap(), json_ty);
    assert!(ctx.errors().is_empty());
}

#[test]
fn objects_lowered_inside_an_alias_are_rebuilt_closed() {
    let interner = StringInterner::new();
    let mut ctx = TypingContext::new(&interner, &CapabilitySetEffects, TypeckConfig::default());
    let (nodes, node) = (sym(84), sym(85));
    let nodes_name = interner.intern("Nodes");
    ctx.register_object(object(
        &interner,
        node,
        "Node",
        Vec::new(),
        vec![field(&interner, "next", HirTypeExpr::named(nodes_name, Some(nodes)))],
    ));
    ctx.register_alias(TypeAliasDecl {
        symbol: nodes,
        name: nodes_name,
        type_params: Vec::new(),
        target: HirTypeExpr::fixed_array(HirTypeExpr::named(interner.intern("Node"), Some(node))),
        span: Span::DUMMY,
    });

    let nodes_ty = ctx.resolve_alias(nodes, &[], Span::DUMMY).unwrap();
    assert!(matches!(ctx.arena().get(nodes_ty), TypeData::Recursive { .. }));

    let info = ctx.resolve_object(node, &[], Span::DUMMY).unwrap();
    let info = info.info().unwrap();
    assert_eq!(info.fields[0].ty, nodes_ty);
    assert!(ctx.arena().free_params(info.ty).is_empty());
    let again = ctx.resolve_object(node, &[], Span::DUMMY).unwrap();
    assert!(Rc::ptr_eq(info, again.info().unwrap()));
}
