//! Step budget shared by every unification of a type-check pass.

use super::UnifyError;

/// Counts recursive unification steps across a whole pass.
///
/// Exceeding `max_steps` makes every further step fail with
/// [`UnifyError::BudgetExceeded`] until the budget is reset.
#[derive(Clone, Debug)]
pub struct StepBudget {
    max_steps: u32,
    steps_used: u32,
    reported: bool,
}

impl StepBudget {
    /// Create a budget allowing `max_steps` steps.
    pub fn new(max_steps: u32) -> Self {
        StepBudget {
            max_steps,
            steps_used: 0,
            reported: false,
        }
    }

    /// Consume one step.
    #[inline]
    pub fn tick(&mut self) -> Result<(), UnifyError> {
        if self.steps_used >= self.max_steps {
            return Err(UnifyError::BudgetExceeded {
                max_steps: self.max_steps,
            });
        }
        self.steps_used += 1;
        Ok(())
    }

    /// Steps consumed so far.
    #[inline]
    pub fn steps_used(&self) -> u32 {
        self.steps_used
    }

    /// Configured limit.
    #[inline]
    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Check if the budget has run out.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.steps_used >= self.max_steps
    }

    /// Returns `true` exactly once per pass, the first time exhaustion is
    /// reported.
    pub fn take_first_report(&mut self) -> bool {
        !std::mem::replace(&mut self.reported, true)
    }

    /// Start a new pass.
    pub fn reset(&mut self) {
        self.steps_used = 0;
        self.reported = false;
    }
}
