//! Type checker configuration.

/// How missing information is treated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TypingMode {
    /// Missing type arguments and uninferable parameters are errors.
    Strict,
    /// Missing information becomes `unknown`; results that mention it are
    /// never cached.
    #[default]
    Relaxed,
}

/// Limits and modes for one compilation unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeckConfig {
    pub mode: TypingMode,
    /// Unification steps allowed per pass.
    pub max_unify_steps: u32,
    /// States explored by union-expected inference before giving up.
    pub max_union_binding_states: usize,
}

impl TypeckConfig {
    /// Default unification step budget.
    pub const DEFAULT_MAX_UNIFY_STEPS: u32 = 1_000_000;

    /// Default union inference search budget.
    pub const DEFAULT_MAX_UNION_BINDING_STATES: usize = 4096;

    /// Strict configuration with default limits.
    pub fn strict() -> Self {
        TypeckConfig {
            mode: TypingMode::Strict,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TypingMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_max_unify_steps(mut self, steps: u32) -> Self {
        self.max_unify_steps = steps;
        self
    }

    #[must_use]
    pub fn with_max_union_binding_states(mut self, states: usize) -> Self {
        self.max_union_binding_states = states;
        self
    }

    /// Check if the configuration is strict.
    #[inline]
    pub fn is_strict(&self) -> bool {
        self.mode == TypingMode::Strict
    }
}

impl Default for TypeckConfig {
    fn default() -> Self {
        TypeckConfig {
            mode: TypingMode::default(),
            max_unify_steps: Self::DEFAULT_MAX_UNIFY_STEPS,
            max_union_binding_states: Self::DEFAULT_MAX_UNION_BINDING_STATES,
        }
    }
}
