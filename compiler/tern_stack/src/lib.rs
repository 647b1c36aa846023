//! Stack growth guard for recursive type walks.
//!
//! Substitution, unification and type-expression lowering recurse once per
//! level of type nesting. Generated code and deeply nested generic
//! instantiations can exceed the default thread stack, so every recursive
//! entry point wraps its body in [`with_stack_guard`].
//!
//! On native targets the stack is grown with `stacker`; on `wasm32` the
//! guard is a passthrough.

/// Grow when less than this many bytes remain.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if fewer than [`RED_ZONE`] bytes remain.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn with_stack_guard<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Passthrough on wasm32, whose engine manages the stack itself.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn with_stack_guard<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Nested {
        Leaf,
        Wrap(Box<Nested>),
    }

    fn depth(n: &Nested) -> usize {
        with_stack_guard(|| match n {
            Nested::Leaf => 0,
            Nested::Wrap(inner) => depth(inner) + 1,
        })
    }

    #[test]
    fn guard_returns_inner_value() {
        assert_eq!(with_stack_guard(|| "done"), "done");
    }

    #[test]
    fn deep_structural_walk_does_not_overflow() {
        let mut value = Nested::Leaf;
        for _ in 0..200_000 {
            value = Nested::Wrap(Box::new(value));
        }
        assert_eq!(depth(&value), 200_000);

        // Drop iteratively so the destructor does not recurse.
        let mut cur = value;
        while let Nested::Wrap(inner) = cur {
            cur = *inner;
        }
    }
}
