//! Per-compilation-unit typing context.
//!
//! The `TypingContext` owns every piece of mutable state the type core needs
//! for one compilation unit: the arena, the unify step budget, declaration
//! tables, instantiation caches, the trait index and the output tables.
//! Construct one per unit; nothing in it is shared across units.
//!
//! # Usage
//!
//! ```ignore
//! let mut ctx = TypingContext::new(&interner, &effects, TypeckConfig::default());
//! ctx.register_object(list_decl);
//! ctx.register_function(len_decl);
//! let resolution = ctx.resolve_call(&site);
//! ctx.emit_diagnostics(&mut queue);
//! ```

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tern_diagnostic::DiagnosticSink;
use tern_ir::{HirTypeExpr, ModuleId, Span, StringInterner, SymbolRef};

use crate::effects::{EffectRow, EffectSystem};
use crate::instantiate::{InstanceCache, TemplateParam};
use crate::traits::TraitRegistry;
use crate::{
    ErrorReported, FunctionDecl, FunctionSignature, ImplDecl, ObjectDecl, ResolutionTables,
    StepBudget, Substitution, TraitDecl, TypeAliasDecl, TypeArena, TypeCheckError, TypeErrorKind,
    TypeId, TypeParamDecl, TypeParamId, TypeckConfig, UnifyError, UnifyOptions, Unifier,
};

mod resolve;


/// Type checking state for one compilation unit.
///
/// # Component Structure
///
/// ```text
/// TypingContext
/// ├── Immutable Context
/// │   ├── interner: &StringInterner
/// │   ├── effects: &dyn EffectSystem
/// │   └── config: TypeckConfig
/// │
/// ├── Type Storage
/// │   ├── arena: TypeArena
/// │   └── budget: StepBudget      (shared by every unify of the pass)
/// │
/// ├── Declarations
/// │   ├── objects / trait_decls / aliases / functions
/// │   ├── decl_params             (declaration → its type parameters)
/// │   └── constraints             (type parameter → lowered bound)
/// │
/// ├── Instantiation
/// │   ├── instances: InstanceCache
/// │   ├── structural_of           (nominal → structural projection)
/// │   └── base_of                 (nominal → base nominal)
/// │
/// ├── traits: TraitRegistry
/// ├── signatures                  (function → lowered signature)
/// │
/// └── Output
///     ├── tables: ResolutionTables
///     └── errors: Vec<TypeCheckError>
/// ```
pub struct TypingContext<'a> {
    // === Immutable Context ===
    interner: &'a StringInterner,
    effects: &'a dyn EffectSystem,
    config: TypeckConfig,

    // === Type Storage ===
    pub(crate) arena: TypeArena,
    budget: StepBudget,

    // === Declarations ===
    pub(crate) objects: FxHashMap<SymbolRef, Rc<ObjectDecl>>,
    pub(crate) trait_decls: FxHashMap<SymbolRef, Rc<TraitDecl>>,
    pub(crate) aliases: FxHashMap<SymbolRef, Rc<TypeAliasDecl>>,
    pub(crate) functions: FxHashMap<SymbolRef, Rc<FunctionDecl>>,
    decl_params: FxHashMap<SymbolRef, Rc<[TemplateParam]>>,
    pub(crate) params_by_symbol: FxHashMap<SymbolRef, TypeParamId>,
    constraint_exprs: FxHashMap<TypeParamId, HirTypeExpr>,
    /// Lowered bounds. `None` while lowering, so a bound that mentions its
    /// own parameter reads as unconstrained.
    constraints: FxHashMap<TypeParamId, Option<TypeId>>,

    // === Instantiation ===
    pub(crate) instances: InstanceCache,
    pub(crate) structural_of: FxHashMap<TypeId, TypeId>,
    pub(crate) base_of: FxHashMap<TypeId, TypeId>,

    // === Traits ===
    pub(crate) traits: TraitRegistry,

    // === Signatures ===
    pub(crate) signatures: FxHashMap<SymbolRef, Rc<FunctionSignature>>,

    // === Output ===
    pub(crate) tables: ResolutionTables,
    errors: Vec<TypeCheckError>,
    pub(crate) current_span: Span,
}

impl<'a> TypingContext<'a> {
    /// Create an empty context for one compilation unit.
    pub fn new(
        interner: &'a StringInterner,
        effects: &'a dyn EffectSystem,
        config: TypeckConfig,
    ) -> Self {
        TypingContext {
            interner,
            effects,
            config,
            arena: TypeArena::new(),
            budget: StepBudget::new(config.max_unify_steps),
            objects: FxHashMap::default(),
            trait_decls: FxHashMap::default(),
            aliases: FxHashMap::default(),
            functions: FxHashMap::default(),
            decl_params: FxHashMap::default(),
            params_by_symbol: FxHashMap::default(),
            constraint_exprs: FxHashMap::default(),
            constraints: FxHashMap::default(),
            instances: InstanceCache::default(),
            structural_of: FxHashMap::default(),
            base_of: FxHashMap::default(),
            traits: TraitRegistry::default(),
            signatures: FxHashMap::default(),
            tables: ResolutionTables::new(),
            errors: Vec::new(),
            current_span: Span::DUMMY,
        }
    }

    // === Accessors ===

    #[inline]
    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    /// Mutable arena access, for callers building types directly.
    #[inline]
    pub fn arena_mut(&mut self) -> &mut TypeArena {
        &mut self.arena
    }

    #[inline]
    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    #[inline]
    pub fn config(&self) -> &TypeckConfig {
        &self.config
    }

    /// Tables handed to code generation.
    #[inline]
    pub fn tables(&self) -> &ResolutionTables {
        &self.tables
    }

    /// Render a type for messages and test assertions.
    pub fn format_type(&self, ty: TypeId) -> String {
        self.arena.format_type(ty, self.interner)
    }

    /// Consume the context, keeping what later phases need.
    pub fn finish(self) -> (TypeArena, ResolutionTables, Vec<TypeCheckError>) {
        (self.arena, self.tables, self.errors)
    }

    // === Registration ===

    /// Register an object declaration.
    pub fn register_object(&mut self, decl: ObjectDecl) {
        self.declare_type_params(decl.symbol, &decl.type_params);
        self.objects.insert(decl.symbol, Rc::new(decl));
    }

    /// Register a trait declaration.
    pub fn register_trait(&mut self, decl: TraitDecl) {
        self.declare_type_params(decl.symbol, &decl.type_params);
        self.trait_decls.insert(decl.symbol, Rc::new(decl));
    }

    /// Register a type alias declaration.
    pub fn register_alias(&mut self, decl: TypeAliasDecl) {
        self.declare_type_params(decl.symbol, &decl.type_params);
        self.aliases.insert(decl.symbol, Rc::new(decl));
    }

    /// Register a function declaration. Its signature is lowered on first use.
    pub fn register_function(&mut self, decl: FunctionDecl) {
        self.declare_type_params(decl.symbol, &decl.type_params);
        self.functions.insert(decl.symbol, Rc::new(decl));
    }

    /// Register an impl declared in this compilation unit.
    pub fn register_impl(&mut self, decl: ImplDecl) {
        self.declare_type_params(decl.symbol, &decl.type_params);
        self.traits.queue_local(decl);
    }

    /// Register an impl imported from `module`.
    ///
    /// Imported impls are lowered the first time a type owned by `module`
    /// (or a trait declared there) misses the index.
    pub fn register_imported_impl(&mut self, module: ModuleId, decl: ImplDecl) {
        self.declare_type_params(decl.symbol, &decl.type_params);
        self.traits.queue_import(module, decl);
    }

    fn declare_type_params(&mut self, owner: SymbolRef, decls: &[TypeParamDecl]) {
        let mut params = Vec::with_capacity(decls.len());
        for decl in decls {
            let param = match self.params_by_symbol.get(&decl.symbol) {
                Some(&param) => param,
                None => {
                    let param = self.arena.fresh_type_param(decl.name);
                    self.params_by_symbol.insert(decl.symbol, param);
                    param
                }
            };
            if let Some(constraint) = &decl.constraint {
                self.constraint_exprs.insert(param, constraint.clone());
            }
            params.push(TemplateParam {
                symbol: decl.symbol,
                name: decl.name,
                param,
            });
        }
        self.decl_params.insert(owner, params.into());
    }

    /// Type parameters declared by `owner`, in declaration order.
    pub(crate) fn decl_params(&self, owner: SymbolRef) -> Rc<[TemplateParam]> {
        self.decl_params
            .get(&owner)
            .cloned()
            .unwrap_or_else(|| Rc::from(Vec::new()))
    }

    /// The lowered bound of a type parameter, if it declares one.
    pub fn constraint_of(&mut self, param: TypeParamId) -> Option<TypeId> {
        if let Some(&lowered) = self.constraints.get(&param) {
            return lowered;
        }
        let expr = self.constraint_exprs.get(&param)?.clone();
        self.constraints.insert(param, None);
        let lowered = self.resolve_type_expr(&expr);
        let lowered = (!lowered.is_unknown()).then_some(lowered);
        self.constraints.insert(param, lowered);
        lowered
    }

    // === Errors ===

    /// Record a user-facing error.
    pub(crate) fn report(&mut self, span: Span, kind: TypeErrorKind) -> ErrorReported {
        tracing::debug!(?kind, ?span, "type error");
        self.errors.push(TypeCheckError::new(span, kind));
        ErrorReported
    }

    pub(crate) fn push_errors(&mut self, errors: impl IntoIterator<Item = TypeCheckError>) {
        self.errors.extend(errors);
    }

    /// Errors and warnings recorded so far.
    pub fn errors(&self) -> &[TypeCheckError] {
        &self.errors
    }

    /// Check if any recorded problem is an error rather than a warning.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| !e.is_warning())
    }

    /// Take the recorded problems, leaving none behind.
    pub fn take_errors(&mut self) -> Vec<TypeCheckError> {
        std::mem::take(&mut self.errors)
    }

    /// Convert the recorded problems to diagnostics and hand them to `sink`.
    pub fn emit_diagnostics(&mut self, sink: &mut dyn DiagnosticSink) {
        for error in std::mem::take(&mut self.errors) {
            sink.emit(error.to_diagnostic(self.interner, &self.arena));
        }
    }

    // === Unification ===

    /// Start a new type-check pass with a fresh step budget.
    pub fn reset_budget(&mut self) {
        self.budget.reset();
    }

    /// Unification steps used in the current pass.
    pub fn budget_used(&self) -> u32 {
        self.budget.steps_used()
    }

    /// Options used by internal compatibility checks.
    ///
    /// `unknown` only arises from reported errors, so it is always absorbed.
    #[inline]
    pub(crate) fn lenient(options: UnifyOptions) -> UnifyOptions {
        options.allowing_unknown(true)
    }

    /// Unify `actual` against `expected`, widening nominals through their
    /// structural projections.
    pub fn unify(
        &mut self,
        actual: TypeId,
        expected: TypeId,
        options: UnifyOptions,
    ) -> Result<Substitution, UnifyError> {
        self.unify_seeded(actual, expected, options, Substitution::default())
    }

    /// Unify starting from existing bindings.
    pub(crate) fn unify_seeded(
        &mut self,
        actual: TypeId,
        expected: TypeId,
        options: UnifyOptions,
        seed: Substitution,
    ) -> Result<Substitution, UnifyError> {
        let mut unifier = Unifier::new(&mut self.arena, self.effects, &mut self.budget, options)
            .with_resolver(&self.structural_of)
            .with_bindings(seed);
        let outcome = unifier.unify(actual, expected);
        let bindings = unifier.into_substitution();
        match outcome {
            Ok(()) => Ok(bindings),
            Err(err) => {
                if let UnifyError::BudgetExceeded { max_steps } = err {
                    if self.budget.take_first_report() {
                        tracing::warn!(max_steps, "unify budget exceeded");
                        self.report(
                            self.current_span,
                            TypeErrorKind::UnifyBudgetExceeded { max_steps },
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// Check if `actual` unifies with `expected` covariantly, discarding
    /// bindings.
    pub(crate) fn compatible(&mut self, actual: TypeId, expected: TypeId) -> bool {
        actual == expected
            || self
                .unify(actual, expected, Self::lenient(UnifyOptions::COVARIANT))
                .is_ok()
    }

    // === Signatures ===

    /// Replace the return type and effects of a function once its body has
    /// been typed.
    pub fn patch_signature(&mut self, symbol: SymbolRef, ret: TypeId, effects: EffectRow) {
        let mut sig = (*self.signature(symbol)).clone();
        sig.ret = ret;
        sig.effects = effects;
        tracing::debug!(%symbol, "patched signature");
        self.signatures.insert(symbol, Rc::new(sig));
    }

    /// Compose effect rows through the effect system.
    pub fn compose_effects(&self, rows: &[EffectRow]) -> EffectRow {
        self.effects.compose(rows)
    }
}
