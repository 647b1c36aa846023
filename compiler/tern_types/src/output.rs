//! Resolution results handed to code generation.

use rustc_hash::{FxHashMap, FxHashSet};
use tern_ir::{ExprId, SymbolRef};

use crate::{InstanceKey, TypeId};

/// The function a call resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallTarget {
    pub symbol: SymbolRef,
    /// Applied type arguments, in the callee's parameter order.
    pub type_args: Vec<TypeId>,
    /// Key of the callee instantiation.
    pub instance_key: InstanceKey,
}

/// Per-expression side tables.
#[derive(Clone, Debug, Default)]
pub struct ResolutionTables {
    expr_types: FxHashMap<ExprId, TypeId>,
    call_targets: FxHashMap<ExprId, CallTarget>,
    trait_dispatch: FxHashSet<ExprId>,
}

impl ResolutionTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolved type of an expression.
    pub fn record_type(&mut self, expr: ExprId, ty: TypeId) {
        self.expr_types.insert(expr, ty);
    }

    /// Record the target of a call expression.
    pub fn record_call(&mut self, expr: ExprId, target: CallTarget, trait_dispatch: bool) {
        self.call_targets.insert(expr, target);
        if trait_dispatch {
            self.trait_dispatch.insert(expr);
        } else {
            self.trait_dispatch.remove(&expr);
        }
    }

    pub fn expr_type(&self, expr: ExprId) -> Option<TypeId> {
        self.expr_types.get(&expr).copied()
    }

    pub fn call_target(&self, expr: ExprId) -> Option<&CallTarget> {
        self.call_targets.get(&expr)
    }

    /// Check if a call dispatches through a trait table.
    pub fn is_trait_dispatch(&self, expr: ExprId) -> bool {
        self.trait_dispatch.contains(&expr)
    }

    /// Number of typed expressions.
    pub fn len(&self) -> usize {
        self.expr_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expr_types.is_empty()
    }
}
