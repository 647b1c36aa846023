//! Lowering of bound type expressions to type ids.

use tern_ir::{HirTypeExpr, HirTypeExprKind, Name, Span, SymbolRef};
use tern_stack::with_stack_guard;

use crate::effects::EffectRow;
use crate::{FnParam, Primitive, StructField, TypeData, TypeErrorKind, TypeId, UnifyOptions};

use super::TypingContext;

impl TypingContext<'_> {
    /// Lower a type annotation.
    ///
    /// Problems are reported and lower to `unknown`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn resolve_type_expr(&mut self, expr: &HirTypeExpr) -> TypeId {
        with_stack_guard(|| self.lower(expr))
    }

    fn lower(&mut self, expr: &HirTypeExpr) -> TypeId {
        let span = expr.span;
        match &expr.kind {
            HirTypeExprKind::Named {
                name,
                symbol,
                type_args,
            } => {
                let args: Vec<TypeId> = type_args.iter().map(|a| self.lower(a)).collect();
                match symbol {
                    Some(symbol) => self.resolve_named(*symbol, *name, &args, span),
                    None => self.resolve_primitive(*name, args.len(), span),
                }
            }
            HirTypeExprKind::Object(fields) => {
                let mut lowered: Vec<StructField> = Vec::with_capacity(fields.len());
                for f in fields {
                    let ty = self.lower(&f.ty);
                    if let Some(prev) = lowered.iter().find(|p| p.name == f.name) {
                        let first = prev.ty;
                        self.report(
                            f.span,
                            TypeErrorKind::IntersectionConflict {
                                field: Some(f.name),
                                first,
                                second: ty,
                            },
                        );
                        continue;
                    }
                    let field = StructField::new(f.name, ty);
                    lowered.push(if f.optional { field.optional() } else { field });
                }
                self.arena.structural(lowered)
            }
            HirTypeExprKind::Tuple(elems) => {
                let fields = elems
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        let ty = self.lower(e);
                        StructField::new(self.interner().intern(&i.to_string()), ty)
                    })
                    .collect();
                self.arena.structural(fields)
            }
            HirTypeExprKind::Function {
                params,
                ret,
                effects,
            } => {
                let params = params
                    .iter()
                    .map(|p| FnParam {
                        ty: self.lower(&p.ty),
                        label: p.label,
                        optional: p.optional,
                    })
                    .collect();
                let ret = self.lower(ret);
                self.arena
                    .function(params, ret, effects.unwrap_or(EffectRow::PURE))
            }
            HirTypeExprKind::Union(members) => {
                let members: Vec<TypeId> = members.iter().map(|m| self.lower(m)).collect();
                self.arena.union(&members)
            }
            HirTypeExprKind::Intersection(members) => {
                let members: Vec<TypeId> = members.iter().map(|m| self.lower(m)).collect();
                self.merge_intersection(&members, span)
            }
            HirTypeExprKind::FixedArray(elem) => {
                let elem = self.lower(elem);
                self.arena.fixed_array(elem)
            }
        }
    }

    fn resolve_primitive(&mut self, name: Name, arg_count: usize, span: Span) -> TypeId {
        let Some(primitive) = Primitive::from_name(self.interner().lookup(name)) else {
            self.report(span, TypeErrorKind::UndefinedType { name });
            return TypeId::UNKNOWN;
        };
        if arg_count > 0 {
            self.report(
                span,
                TypeErrorKind::TooManyTypeArguments {
                    name,
                    expected: 0,
                    found: arg_count,
                },
            );
        }
        primitive.type_id()
    }

    /// Resolve a named reference the binder bound to `symbol`.
    pub(crate) fn resolve_named(
        &mut self,
        symbol: SymbolRef,
        name: Name,
        args: &[TypeId],
        span: Span,
    ) -> TypeId {
        if let Some(&param) = self.params_by_symbol.get(&symbol) {
            if !args.is_empty() {
                self.report(
                    span,
                    TypeErrorKind::TooManyTypeArguments {
                        name,
                        expected: 0,
                        found: args.len(),
                    },
                );
            }
            return self.arena.param_ref(param);
        }
        if self.objects.contains_key(&symbol) {
            return self
                .resolve_object(symbol, args, span)
                .map_or(TypeId::UNKNOWN, |r| r.ty());
        }
        if self.trait_decls.contains_key(&symbol) {
            return self
                .resolve_trait_type(symbol, args, span)
                .unwrap_or(TypeId::UNKNOWN);
        }
        if self.aliases.contains_key(&symbol) {
            return self
                .resolve_alias(symbol, args, span)
                .unwrap_or(TypeId::UNKNOWN);
        }
        self.report(span, TypeErrorKind::UndefinedType { name });
        TypeId::UNKNOWN
    }

    /// Merge intersection members into one canonical intersection.
    ///
    /// At most one nominal member is allowed. Structural members merge
    /// field-wise: a field present in several members keeps the first
    /// contributor's owner and visibility and takes the more specific of
    /// the types. `unknown` members are absorbed.
    pub fn merge_intersection(&mut self, members: &[TypeId], span: Span) -> TypeId {
        let mut nominal: Option<TypeId> = None;
        let mut fields: Vec<StructField> = Vec::new();
        let mut has_structural = false;
        let mut traits: Vec<TypeId> = Vec::new();
        let mut failed = false;

        let mut work: Vec<TypeId> = members.to_vec();
        let mut i = 0;
        while i < work.len() {
            let member = work[i];
            i += 1;
            match self.arena.get(member) {
                TypeData::Unknown => {}
                TypeData::Intersection {
                    nominal: n,
                    structural: s,
                    traits: t,
                } => {
                    work.extend(n.iter().chain(s.iter()).chain(t.iter()).copied());
                }
                TypeData::Nominal { .. } => match nominal {
                    Some(prev) if prev != member => {
                        self.report(
                            span,
                            TypeErrorKind::IntersectionConflict {
                                field: None,
                                first: prev,
                                second: member,
                            },
                        );
                        failed = true;
                    }
                    _ => nominal = Some(member),
                },
                TypeData::Trait { .. } => traits.push(member),
                TypeData::Structural { fields: own } => {
                    has_structural = true;
                    let own = own.to_vec();
                    for field in own {
                        failed |= !self.merge_field(&mut fields, field, span);
                    }
                }
                _ => {
                    let first = members.iter().copied().find(|&m| m != member);
                    self.report(
                        span,
                        TypeErrorKind::IntersectionConflict {
                            field: None,
                            first: first.unwrap_or(member),
                            second: member,
                        },
                    );
                    failed = true;
                }
            }
        }

        if failed {
            return TypeId::UNKNOWN;
        }
        let structural = has_structural.then(|| self.arena.structural(fields));
        if nominal.is_none() && structural.is_none() && traits.is_empty() {
            return TypeId::UNKNOWN;
        }
        self.arena.intersection(nominal, structural, traits)
    }

    fn merge_field(&mut self, fields: &mut Vec<StructField>, field: StructField, span: Span) -> bool {
        let Some(existing) = fields.iter_mut().find(|f| f.name == field.name) else {
            fields.push(field);
            return true;
        };
        existing.optional &= field.optional;
        if existing.ty == field.ty || field.ty.is_unknown() {
            return true;
        }
        let options = Self::lenient(UnifyOptions::COVARIANT);
        if self.unify(field.ty, existing.ty, options).is_ok() {
            existing.ty = field.ty;
            return true;
        }
        if self.unify(existing.ty, field.ty, options).is_ok() {
            return true;
        }
        let (first, second) = (existing.ty, field.ty);
        self.report(
            span,
            TypeErrorKind::IntersectionConflict {
                field: Some(field.name),
                first,
                second,
            },
        );
        false
    }
}
