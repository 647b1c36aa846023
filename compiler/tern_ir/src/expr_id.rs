use std::fmt;

/// Index of an expression in the binder's expression arena.
///
/// Opaque to the type core: it only keys the side tables handed to codegen
/// (resolved expression types, call targets).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr#{}", self.0)
    }
}
