//! Stable codes for every diagnostic the type core can emit.
//!
//! `E2xxx` codes are type errors and `W29xx` codes are checker warnings.
//! The code, not the message text, is what tools and tests match on.

use std::fmt;

macro_rules! error_codes {
    ($($(#[$doc:meta])* $code:ident => $summary:literal,)*) => {
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
        pub enum ErrorCode {
            $($(#[$doc])* $code,)*
        }

        impl ErrorCode {
            /// Every code, in declaration order.
            pub const ALL: &[ErrorCode] = &[$(ErrorCode::$code,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ErrorCode::$code => stringify!($code),)*
                }
            }

            /// Short lowercase summary, used as the primary label text.
            pub fn description(&self) -> &'static str {
                match self {
                    $(ErrorCode::$code => $summary,)*
                }
            }
        }
    };
}

error_codes! {
    E2001 => "type mismatch",
    E2002 => "undefined type",
    /// Missing or extra argument.
    E2004 => "argument count mismatch",
    E2005 => "cannot infer type parameter",
    /// A recursive alias with no object, array or function between the
    /// alias and its self-reference.
    E2008 => "type is not contractive",
    E2009 => "type argument does not satisfy constraint",
    E2011 => "argument label mismatch",
    E2016 => "missing type argument",
    E2017 => "too many type arguments",
    /// More than one overload accepts the arguments.
    E2023 => "ambiguous overload",
    E2024 => "no matching overload",
    E2025 => "value is not callable",
    E2026 => "conflicting intersection members",
    E2027 => "inherited field missing or incompatible",
    E2028 => "curried call made no progress",
    W2901 => "unification step budget exceeded",
    W2902 => "union inference search budget exhausted",
}

impl ErrorCode {
    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W2901 | ErrorCode::W2902)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests;
