//! Object templates and their instances.

use std::rc::Rc;

use smallvec::SmallVec;
use tern_ir::{Name, Span, SymbolRef};

use crate::context::TypingContext;
use crate::{
    ErrorReported, InheritedFieldProblem, ObjectDecl, StructField, Substitution, TypeArena,
    TypeErrorKind, TypeId, UnifyOptions, Visibility,
};

use super::{bind_params, InstanceKey, ResolutionState, TemplateParam};

/// An object declaration lowered over its own type parameters.
///
/// Built once per declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectTemplate {
    pub symbol: SymbolRef,
    pub name: Name,
    pub params: Rc<[TemplateParam]>,
    pub nominal: TypeId,
    pub structural: TypeId,
    /// `nominal & structural`.
    pub ty: TypeId,
    pub fields: Vec<StructField>,
    pub visibility: Visibility,
    pub base_nominal: Option<TypeId>,
}

/// An object declaration applied to concrete arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectTypeInfo {
    pub symbol: SymbolRef,
    pub args: SmallVec<[TypeId; 4]>,
    pub nominal: TypeId,
    pub structural: TypeId,
    /// `nominal & structural`.
    pub ty: TypeId,
    pub fields: Vec<StructField>,
    pub visibility: Visibility,
    pub base_nominal: Option<TypeId>,
}

/// Outcome of an object request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectResolution {
    Ready(Rc<ObjectTypeInfo>),
    /// The object is being resolved further up the stack; this is its
    /// nominal placeholder.
    InProgress(TypeId),
}

impl ObjectResolution {
    /// The type to use for a reference to the object.
    pub fn ty(&self) -> TypeId {
        match self {
            ObjectResolution::Ready(info) => info.ty,
            ObjectResolution::InProgress(nominal) => *nominal,
        }
    }

    pub fn info(&self) -> Option<&Rc<ObjectTypeInfo>> {
        match self {
            ObjectResolution::Ready(info) => Some(info),
            ObjectResolution::InProgress(_) => None,
        }
    }
}

pub(crate) enum TemplateState {
    Building,
    Ready(Rc<ObjectTemplate>),
    Failed,
}

impl TypingContext<'_> {
    /// Resolve an object declaration applied to `args`.
    ///
    /// Concrete instances are cached: repeated requests return the same
    /// [`ObjectTypeInfo`] and report nothing new.
    #[tracing::instrument(level = "debug", skip(self, args, span), fields(%symbol))]
    pub fn resolve_object(
        &mut self,
        symbol: SymbolRef,
        args: &[TypeId],
        span: Span,
    ) -> Result<ObjectResolution, ErrorReported> {
        let Some(decl) = self.objects.get(&symbol).cloned() else {
            panic!("no object declaration registered for {symbol}");
        };
        let params = self.decl_params(symbol);
        let args = self.normalize_type_args(decl.name, params.len(), args, span)?;
        let key = InstanceKey::new(symbol, &args);

        match self.instances.states.get(&key) {
            Some(&ResolutionState::InProgress(placeholder)) => {
                return Ok(ObjectResolution::InProgress(placeholder));
            }
            Some(ResolutionState::Failed) => return Err(ErrorReported),
            Some(ResolutionState::Done(_)) => {
                if let Some(info) = self.instances.objects.get(&key) {
                    tracing::debug!(%key, "object instance cache hit");
                    return Ok(ObjectResolution::Ready(Rc::clone(info)));
                }
            }
            None => {}
        }

        let nominal = self.arena.nominal(symbol, decl.name, &args);
        let template = match self.instances.object_templates.get(&symbol) {
            Some(TemplateState::Building) => return Ok(ObjectResolution::InProgress(nominal)),
            Some(TemplateState::Failed) => return Err(ErrorReported),
            Some(TemplateState::Ready(template)) => Rc::clone(template),
            None => self.object_template(&decl, params)?,
        };

        self.instances
            .states
            .insert(key.clone(), ResolutionState::InProgress(nominal));
        let result = self.instantiate_object(&template, &args, span);
        match result {
            Ok(info) => {
                let info = Rc::new(info);
                if key.is_concrete(&self.arena) && !self.is_open_over_alias(symbol, info.ty) {
                    self.instances
                        .states
                        .insert(key.clone(), ResolutionState::Done(info.ty));
                    self.instances.objects.insert(key, Rc::clone(&info));
                    // Warm the trait index for the new nominal.
                    self.impls_for(info.nominal);
                } else {
                    self.instances.states.remove(&key);
                }
                Ok(ObjectResolution::Ready(info))
            }
            Err(reported) => {
                self.settle(key, ResolutionState::Failed);
                Err(reported)
            }
        }
    }

    /// The template of an object declaration, built on first request.
    pub fn object_template_of(
        &mut self,
        symbol: SymbolRef,
    ) -> Result<Option<Rc<ObjectTemplate>>, ErrorReported> {
        match self.instances.object_templates.get(&symbol) {
            Some(TemplateState::Ready(template)) => return Ok(Some(Rc::clone(template))),
            Some(TemplateState::Failed) => return Err(ErrorReported),
            Some(TemplateState::Building) => return Ok(None),
            None => {}
        }
        let Some(decl) = self.objects.get(&symbol).cloned() else {
            panic!("no object declaration registered for {symbol}");
        };
        let params = self.decl_params(symbol);
        self.object_template(&decl, params).map(Some)
    }

    fn object_template(
        &mut self,
        decl: &ObjectDecl,
        params: Rc<[TemplateParam]>,
    ) -> Result<Rc<ObjectTemplate>, ErrorReported> {
        self.instances
            .object_templates
            .insert(decl.symbol, TemplateState::Building);
        let built = self.build_object_template(decl, params);
        if matches!(&built, Ok(template) if self.is_open_over_alias(decl.symbol, template.ty)) {
            self.instances.object_templates.remove(&decl.symbol);
            return built;
        }
        let state = match &built {
            Ok(template) => TemplateState::Ready(Rc::clone(template)),
            Err(_) => TemplateState::Failed,
        };
        self.instances.object_templates.insert(decl.symbol, state);
        built
    }

    fn build_object_template(
        &mut self,
        decl: &ObjectDecl,
        params: Rc<[TemplateParam]>,
    ) -> Result<Rc<ObjectTemplate>, ErrorReported> {
        tracing::debug!(symbol = %decl.symbol, "building object template");
        let identity: Vec<TypeId> = params.iter().map(|p| self.arena.param_ref(p.param)).collect();
        let nominal = self.arena.nominal(decl.symbol, decl.name, &identity);

        let base = decl.base.as_ref().map(|b| self.resolve_type_expr(b));
        let base_nominal = base.and_then(|b| self.arena.nominal_component(b));
        let base_fields: Vec<StructField> = base
            .and_then(|b| self.fields_of(b))
            .unwrap_or_default();

        let mut fields: Vec<StructField> = Vec::with_capacity(decl.fields.len());
        let mut failed = false;
        for f in &decl.fields {
            let ty = self.resolve_type_expr(&f.ty);
            if let Some(prev) = fields.iter().find(|p| p.name == f.name) {
                let first = prev.ty;
                self.report(
                    f.span,
                    TypeErrorKind::IntersectionConflict {
                        field: Some(f.name),
                        first,
                        second: ty,
                    },
                );
                failed = true;
                continue;
            }
            let free = self.arena.free_params(ty);
            let declaring_params = params
                .iter()
                .map(|p| p.param)
                .filter(|p| free.contains(p))
                .collect();
            fields.push(StructField {
                name: f.name,
                ty,
                optional: f.optional,
                visibility: f.visibility,
                owner: Some(decl.symbol),
                package: decl.package,
                declaring_params,
            });
        }

        for inherited in &base_fields {
            let Some(own) = fields.iter_mut().find(|f| f.name == inherited.name) else {
                self.report(
                    decl.span,
                    TypeErrorKind::InheritedField {
                        object: decl.name,
                        field: inherited.name,
                        problem: InheritedFieldProblem::Missing,
                    },
                );
                failed = true;
                continue;
            };
            let own_ty = own.ty;
            own.owner = inherited.owner;
            own.package = inherited.package;
            own.visibility = inherited.visibility;
            let options = Self::lenient(UnifyOptions::COVARIANT);
            if self.unify(own_ty, inherited.ty, options).is_err() {
                self.report(
                    decl.span,
                    TypeErrorKind::InheritedField {
                        object: decl.name,
                        field: inherited.name,
                        problem: InheritedFieldProblem::Incompatible {
                            own: own_ty,
                            base: inherited.ty,
                        },
                    },
                );
                failed = true;
            }
        }

        if failed {
            return Err(ErrorReported);
        }

        let structural = self.arena.structural(fields.clone());
        let ty = self.arena.intersection(Some(nominal), Some(structural), Vec::new());
        self.structural_of.insert(nominal, structural);
        if let Some(base) = base_nominal {
            self.base_of.insert(nominal, base);
        }
        Ok(Rc::new(ObjectTemplate {
            symbol: decl.symbol,
            name: decl.name,
            params,
            nominal,
            structural,
            ty,
            fields,
            visibility: decl.visibility,
            base_nominal,
        }))
    }

    /// The fields visible on `ty`, widening a nominal to its projection.
    pub(crate) fn fields_of(&self, ty: TypeId) -> Option<Vec<StructField>> {
        if let Some(fields) = self.arena.structural_fields(ty) {
            return Some(fields.to_vec());
        }
        let nominal = self.arena.nominal_component(ty)?;
        let structural = *self.structural_of.get(&nominal)?;
        self.arena.structural_fields(structural).map(<[_]>::to_vec)
    }

    fn instantiate_object(
        &mut self,
        template: &ObjectTemplate,
        args: &[TypeId],
        span: Span,
    ) -> Result<ObjectTypeInfo, ErrorReported> {
        self.check_constraints(&template.params, args, span)?;
        let bindings = bind_params(&template.params, args);

        let nominal = self.arena.substitute(template.nominal, &bindings);
        let fields: Vec<StructField> = template
            .fields
            .iter()
            .map(|f| f.with_type(self.arena.substitute(f.ty, &bindings)))
            .collect();
        ensure_fields_substituted(&self.arena, &fields, &bindings);

        let structural = self.arena.structural(fields.clone());
        let ty = self.arena.intersection(Some(nominal), Some(structural), Vec::new());
        let base_nominal = template
            .base_nominal
            .map(|b| self.arena.substitute(b, &bindings));
        self.structural_of.insert(nominal, structural);
        if let Some(base) = base_nominal {
            self.base_of.insert(nominal, base);
        }
        tracing::debug!(symbol = %template.symbol, ty = ty.raw(), "instantiated object");

        Ok(ObjectTypeInfo {
            symbol: template.symbol,
            args: SmallVec::from_slice(args),
            nominal,
            structural,
            ty,
            fields,
            visibility: template.visibility,
            base_nominal,
        })
    }
}

/// Panic if a field still mentions a declaring parameter that `bindings`
/// replaced.
fn ensure_fields_substituted(arena: &TypeArena, fields: &[StructField], bindings: &Substitution) {
    for field in fields {
        for &param in field.declaring_params.iter() {
            let replaced = bindings
                .get(&param)
                .is_some_and(|&arg| !arena.mentions_param(arg, param));
            if replaced && arena.mentions_param(field.ty, param) {
                panic!(
                    "field {:?} still mentions declaring parameter {param:?} after instantiation",
                    field.name
                );
            }
        }
    }
}
