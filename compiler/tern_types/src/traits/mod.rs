//! Trait resolution.
//!
//! Impl declarations become templates; a template applies to a type when
//! the type unifies with the template's target and the derived arguments
//! satisfy the impl's bounds. Results are memoized per subject type and
//! indexed by trait for dynamic dispatch.
//!
//! # Design
//!
//! - Templates stored in a single `Vec`, indexes hold positions
//! - Local impl declarations are lowered on the first query
//! - Imported impl declarations are queued per module and lowered the first
//!   time a type or trait of that module misses the index
//! - Per-subject memo records how many templates were already matched, so
//!   templates hydrated later are matched incrementally

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tern_ir::{ModuleId, SymbolRef};

use crate::context::TypingContext;
use crate::instantiate::TemplateParam;
use crate::{ImplDecl, Substitution, TypeData, TypeId, UnifyOptions};

mod satisfy;


/// An impl declaration lowered over its own type parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplTemplate {
    pub impl_symbol: SymbolRef,
    pub trait_symbol: SymbolRef,
    /// The implemented trait type, over the impl's parameters.
    pub trait_ty: TypeId,
    /// The type the impl applies to, over the impl's parameters.
    pub target: TypeId,
    pub type_params: Rc<[TemplateParam]>,
    /// Trait method symbol to implementing function symbol.
    pub methods: Rc<[(SymbolRef, SymbolRef)]>,
}

/// An impl template applied to one concrete type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraitImplInstance {
    pub trait_ty: TypeId,
    pub trait_symbol: SymbolRef,
    pub target: TypeId,
    pub methods: Rc<[(SymbolRef, SymbolRef)]>,
    pub impl_symbol: SymbolRef,
}

impl TraitImplInstance {
    /// The function implementing `trait_method`.
    pub fn method(&self, trait_method: SymbolRef) -> Option<SymbolRef> {
        self.methods
            .iter()
            .find(|(m, _)| *m == trait_method)
            .map(|&(_, f)| f)
    }
}

/// Ties a function implementing a trait method to that method.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraitMethodLink {
    pub trait_symbol: SymbolRef,
    /// The trait's method declaration.
    pub method: SymbolRef,
    pub impl_symbol: SymbolRef,
}

#[derive(Default)]
struct SubjectImpls {
    instances: Vec<usize>,
    /// Templates `0..matched` have been tried against the subject.
    matched: usize,
    resolving: bool,
}

/// Impl templates, their instances and the indexes over them.
#[derive(Default)]
pub struct TraitRegistry {
    pending_local: Vec<ImplDecl>,
    pending_imports: FxHashMap<ModuleId, Vec<ImplDecl>>,
    templates: Vec<ImplTemplate>,
    instances: Vec<TraitImplInstance>,
    by_subject: FxHashMap<TypeId, SubjectImpls>,
    by_trait: FxHashMap<SymbolRef, Vec<usize>>,
    method_links: FxHashMap<SymbolRef, TraitMethodLink>,
}

impl TraitRegistry {
    pub(crate) fn queue_local(&mut self, decl: ImplDecl) {
        self.link_methods(&decl);
        self.pending_local.push(decl);
    }

    pub(crate) fn queue_import(&mut self, module: ModuleId, decl: ImplDecl) {
        self.link_methods(&decl);
        self.pending_imports.entry(module).or_default().push(decl);
    }

    fn link_methods(&mut self, decl: &ImplDecl) {
        let Some(trait_symbol) = decl.trait_symbol() else {
            return;
        };
        for &(method, implementation) in &decl.methods {
            self.method_links.insert(
                implementation,
                TraitMethodLink {
                    trait_symbol,
                    method,
                    impl_symbol: decl.symbol,
                },
            );
        }
    }

    /// The trait method a function implements, if any.
    pub fn method_link(&self, function: SymbolRef) -> Option<TraitMethodLink> {
        self.method_links.get(&function).copied()
    }

    /// Lowered impl templates.
    pub fn templates(&self) -> &[ImplTemplate] {
        &self.templates
    }

    /// Instances of `trait_symbol` found so far.
    pub fn impls_of_trait(&self, trait_symbol: SymbolRef) -> Vec<TraitImplInstance> {
        self.by_trait
            .get(&trait_symbol)
            .map(|ids| ids.iter().map(|&i| self.instances[i].clone()).collect())
            .unwrap_or_default()
    }

    fn has_pending(&self, module: ModuleId) -> bool {
        self.pending_imports.contains_key(&module)
    }
}

impl TypingContext<'_> {
    /// Trait implementations that apply to `subject`.
    ///
    /// Re-entrant requests for a subject already being resolved answer with
    /// the instances found so far.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn impls_for(&mut self, subject: TypeId) -> Vec<TraitImplInstance> {
        if matches!(
            self.arena.get(subject),
            TypeData::Unknown | TypeData::TypeParam(_)
        ) {
            return Vec::new();
        }
        self.hydrate_local_impls();
        if let Some(owner) = self.arena.owner_of(subject) {
            self.hydrate_module_impls(owner.module);
        }

        let entry = self.traits.by_subject.entry(subject).or_default();
        if !entry.resolving {
            entry.resolving = true;
            while let Some(index) = self.next_unmatched(subject) {
                let template = self.traits.templates[index].clone();
                if let Some(instance) = self.match_impl_template(&template, subject) {
                    tracing::debug!(
                        impl_symbol = %instance.impl_symbol,
                        subject = subject.raw(),
                        "trait impl applies"
                    );
                    let id = self.traits.instances.len();
                    self.traits
                        .by_trait
                        .entry(instance.trait_symbol)
                        .or_default()
                        .push(id);
                    self.traits.instances.push(instance);
                    if let Some(entry) = self.traits.by_subject.get_mut(&subject) {
                        entry.instances.push(id);
                    }
                }
            }
            if let Some(entry) = self.traits.by_subject.get_mut(&subject) {
                entry.resolving = false;
            }
        }

        self.traits.by_subject.get(&subject).map_or_else(Vec::new, |entry| {
            entry
                .instances
                .iter()
                .map(|&i| self.traits.instances[i].clone())
                .collect()
        })
    }

    /// Claim the next template not yet tried against `subject`.
    fn next_unmatched(&mut self, subject: TypeId) -> Option<usize> {
        let total = self.traits.templates.len();
        let entry = self.traits.by_subject.get_mut(&subject)?;
        (entry.matched < total).then(|| {
            entry.matched += 1;
            entry.matched - 1
        })
    }

    fn match_impl_template(
        &mut self,
        template: &ImplTemplate,
        subject: TypeId,
    ) -> Option<TraitImplInstance> {
        let options = Self::lenient(UnifyOptions::COVARIANT);
        let bindings = match self.unify(subject, template.target, options) {
            Ok(bindings) => bindings,
            Err(_) if template.type_params.is_empty() => {
                let owner = self.arena.owner_of(subject)?;
                if self.arena.owner_of(template.target) != Some(owner) {
                    return None;
                }
                Substitution::default()
            }
            Err(_) => return None,
        };

        for p in template.type_params.iter() {
            let Some(&arg) = bindings.get(&p.param) else {
                continue;
            };
            let Some(bound) = self.constraint_of(p.param) else {
                continue;
            };
            let bound = self.arena.substitute(bound, &bindings);
            if !self.type_satisfies(arg, bound) {
                tracing::debug!(impl_symbol = %template.impl_symbol, "impl bound not satisfied");
                return None;
            }
        }

        Some(TraitImplInstance {
            trait_ty: self.arena.substitute(template.trait_ty, &bindings),
            trait_symbol: template.trait_symbol,
            target: subject,
            methods: Rc::clone(&template.methods),
            impl_symbol: template.impl_symbol,
        })
    }

    fn hydrate_local_impls(&mut self) {
        let pending = std::mem::take(&mut self.traits.pending_local);
        if pending.is_empty() {
            return;
        }
        tracing::debug!(count = pending.len(), "lowering local impls");
        for decl in pending {
            self.lower_impl(&decl);
        }
    }

    /// Lower the impls queued for `module`. Returns whether any were queued.
    pub(crate) fn hydrate_module_impls(&mut self, module: ModuleId) -> bool {
        if !self.traits.has_pending(module) {
            return false;
        }
        let pending = self
            .traits
            .pending_imports
            .remove(&module)
            .unwrap_or_default();
        tracing::debug!(?module, count = pending.len(), "hydrating imported impls");
        for decl in pending {
            self.lower_impl(&decl);
        }
        true
    }

    fn lower_impl(&mut self, decl: &ImplDecl) {
        let Some(trait_symbol) = decl.trait_symbol() else {
            panic!("impl {} does not name a trait", decl.symbol);
        };
        let trait_ty = self.resolve_type_expr(&decl.trait_ref);
        let target = self.resolve_type_expr(&decl.target);
        if trait_ty.is_unknown() || target.is_unknown() {
            return;
        }
        let target = self.arena.nominal_component(target).unwrap_or(target);
        let type_params = self.decl_params(decl.symbol);
        self.traits.templates.push(ImplTemplate {
            impl_symbol: decl.symbol,
            trait_symbol,
            trait_ty,
            target,
            type_params,
            methods: decl.methods.clone().into(),
        });
    }

    /// Instances of `trait_symbol` known so far, hydrating the trait's module.
    pub fn impls_of_trait(&mut self, trait_symbol: SymbolRef) -> Vec<TraitImplInstance> {
        self.hydrate_local_impls();
        self.hydrate_module_impls(trait_symbol.module);
        self.traits.impls_of_trait(trait_symbol)
    }
}
