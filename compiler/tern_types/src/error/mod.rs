//! User-facing type errors.
//!
//! Everything a malformed program can trigger becomes a [`TypeCheckError`]
//! pushed into the [`TypingContext`](crate::TypingContext); the expression
//! that failed resolves to `unknown` and checking continues. Conversion to a
//! [`Diagnostic`] happens once, at the end of the pass.

use tern_diagnostic::{Diagnostic, ErrorCode};
use tern_ir::{Name, Span, StringInterner};

use crate::{TypeArena, TypeId};

/// Marker returned once an error has been recorded.
///
/// Holding one proves a diagnostic exists, so callers propagate it without
/// reporting again.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ErrorReported;

/// A type error with its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeCheckError {
    pub span: Span,
    pub kind: TypeErrorKind,
}

/// What went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeErrorKind {
    /// Argument or value does not have the required type.
    Mismatch { expected: TypeId, found: TypeId },
    /// A type name that resolves to nothing usable as a type.
    UndefinedType { name: Name },
    /// A required parameter received no argument.
    MissingArgument { param: Option<Name>, index: usize },
    /// More arguments than parameters.
    ExtraArguments { expected: usize, found: usize },
    /// A generic parameter could not be inferred.
    CannotInfer { param: Name },
    /// A type alias refers to itself without a guarding constructor.
    NotContractive { name: Name },
    /// A type argument does not satisfy its parameter's constraint.
    ConstraintViolation {
        param: Name,
        arg: TypeId,
        constraint: TypeId,
    },
    /// An argument's label does not fit the parameter at its position.
    LabelMismatch {
        expected: Option<Name>,
        found: Option<Name>,
    },
    /// Fewer type arguments than declared parameters (strict mode).
    MissingTypeArguments {
        name: Name,
        expected: usize,
        found: usize,
    },
    /// More type arguments than declared parameters.
    TooManyTypeArguments {
        name: Name,
        expected: usize,
        found: usize,
    },
    /// No overload accepts the arguments.
    NoMatchingOverload { name: Name, candidates: usize },
    /// More than one overload accepts the arguments.
    AmbiguousOverload { name: Name, candidates: usize },
    /// The callee's type is not a function.
    NotCallable { ty: TypeId },
    /// Members of an intersection disagree.
    IntersectionConflict {
        field: Option<Name>,
        first: TypeId,
        second: TypeId,
    },
    /// A base object's field is not redeclared or has an incompatible type.
    InheritedField {
        object: Name,
        field: Name,
        problem: InheritedFieldProblem,
    },
    /// A curried application stage consumed no arguments.
    CurriedNoProgress { remaining: usize },
    /// The unification step budget ran out (warning).
    UnifyBudgetExceeded { max_steps: u32 },
    /// Union inference gave up after exploring its state budget (warning).
    UnionSearchExhausted { max_states: usize },
}

/// How an inherited field is wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InheritedFieldProblem {
    /// The object does not redeclare the field.
    Missing,
    /// The redeclared type does not unify with the base field's type.
    Incompatible { own: TypeId, base: TypeId },
}

impl TypeCheckError {
    pub fn new(span: Span, kind: TypeErrorKind) -> Self {
        TypeCheckError { span, kind }
    }

    /// Diagnostic code of this error.
    pub fn code(&self) -> ErrorCode {
        match &self.kind {
            TypeErrorKind::Mismatch { .. } => ErrorCode::E2001,
            TypeErrorKind::UndefinedType { .. } => ErrorCode::E2002,
            TypeErrorKind::MissingArgument { .. } | TypeErrorKind::ExtraArguments { .. } => {
                ErrorCode::E2004
            }
            TypeErrorKind::CannotInfer { .. } => ErrorCode::E2005,
            TypeErrorKind::NotContractive { .. } => ErrorCode::E2008,
            TypeErrorKind::ConstraintViolation { .. } => ErrorCode::E2009,
            TypeErrorKind::LabelMismatch { .. } => ErrorCode::E2011,
            TypeErrorKind::MissingTypeArguments { .. } => ErrorCode::E2016,
            TypeErrorKind::TooManyTypeArguments { .. } => ErrorCode::E2017,
            TypeErrorKind::AmbiguousOverload { .. } => ErrorCode::E2023,
            TypeErrorKind::NoMatchingOverload { .. } => ErrorCode::E2024,
            TypeErrorKind::NotCallable { .. } => ErrorCode::E2025,
            TypeErrorKind::IntersectionConflict { .. } => ErrorCode::E2026,
            TypeErrorKind::InheritedField { .. } => ErrorCode::E2027,
            TypeErrorKind::CurriedNoProgress { .. } => ErrorCode::E2028,
            TypeErrorKind::UnifyBudgetExceeded { .. } => ErrorCode::W2901,
            TypeErrorKind::UnionSearchExhausted { .. } => ErrorCode::W2902,
        }
    }

    /// Check if this is a warning rather than an error.
    pub fn is_warning(&self) -> bool {
        self.code().is_warning()
    }

    /// Convert to a structured diagnostic.
    ///
    /// Type and symbol names are attached as parameters; the message is a
    /// short summary built from them.
    pub fn to_diagnostic(&self, interner: &StringInterner, arena: &TypeArena) -> Diagnostic {
        let code = self.code();
        let base = Diagnostic::new(code);
        let ty = |id: TypeId| arena.format_type(id, interner);
        let name = |n: Name| interner.lookup(n).to_owned();
        let opt_name = |n: Option<Name>| n.map_or_else(|| "<none>".to_owned(), name);

        let diag = match &self.kind {
            TypeErrorKind::Mismatch { expected, found } => base
                .with_message(format!(
                    "type mismatch: expected `{}`, found `{}`",
                    ty(*expected),
                    ty(*found)
                ))
                .with_param("expected", ty(*expected))
                .with_param("found", ty(*found)),
            TypeErrorKind::UndefinedType { name: n } => base
                .with_message(format!("cannot find type `{}`", name(*n)))
                .with_param("name", name(*n)),
            TypeErrorKind::MissingArgument { param, index } => base
                .with_message(format!(
                    "missing argument for parameter `{}`",
                    opt_name(*param)
                ))
                .with_param("param", opt_name(*param))
                .with_param("index", index.to_string()),
            TypeErrorKind::ExtraArguments { expected, found } => base
                .with_message(format!(
                    "expected {expected} arguments, found {found}"
                ))
                .with_param("expected", expected.to_string())
                .with_param("found", found.to_string()),
            TypeErrorKind::CannotInfer { param } => base
                .with_message(format!(
                    "cannot infer type parameter `{}`",
                    name(*param)
                ))
                .with_param("param", name(*param))
                .with_note("add an explicit type annotation"),
            TypeErrorKind::NotContractive { name: n } => base
                .with_message(format!("type alias {} is not contractive", name(*n)))
                .with_param("name", name(*n))
                .with_note("wrap the self-reference in an object, array or function type"),
            TypeErrorKind::ConstraintViolation {
                param,
                arg,
                constraint,
            } => base
                .with_message(format!(
                    "`{}` does not satisfy the constraint `{}` of `{}`",
                    ty(*arg),
                    ty(*constraint),
                    name(*param)
                ))
                .with_param("param", name(*param))
                .with_param("arg", ty(*arg))
                .with_param("constraint", ty(*constraint)),
            TypeErrorKind::LabelMismatch { expected, found } => base
                .with_message(format!(
                    "argument label mismatch: expected `{}`, found `{}`",
                    opt_name(*expected),
                    opt_name(*found)
                ))
                .with_param("expected", opt_name(*expected))
                .with_param("found", opt_name(*found)),
            TypeErrorKind::MissingTypeArguments {
                name: n,
                expected,
                found,
            } => base
                .with_message(format!(
                    "`{}` expects {expected} type arguments, found {found}",
                    name(*n)
                ))
                .with_param("name", name(*n))
                .with_param("expected", expected.to_string())
                .with_param("found", found.to_string()),
            TypeErrorKind::TooManyTypeArguments {
                name: n,
                expected,
                found,
            } => base
                .with_message(format!(
                    "`{}` takes {expected} type arguments but {found} were given",
                    name(*n)
                ))
                .with_param("name", name(*n))
                .with_param("expected", expected.to_string())
                .with_param("found", found.to_string()),
            TypeErrorKind::NoMatchingOverload {
                name: n,
                candidates,
            } => base
                .with_message(format!(
                    "no overload of `{}` matches these arguments",
                    name(*n)
                ))
                .with_param("name", name(*n))
                .with_param("candidates", candidates.to_string()),
            TypeErrorKind::AmbiguousOverload {
                name: n,
                candidates,
            } => base
                .with_message(format!(
                    "call to `{}` is ambiguous: {candidates} overloads match",
                    name(*n)
                ))
                .with_param("name", name(*n))
                .with_param("candidates", candidates.to_string()),
            TypeErrorKind::NotCallable { ty: t } => base
                .with_message(format!("`{}` is not callable", ty(*t)))
                .with_param("type", ty(*t)),
            TypeErrorKind::IntersectionConflict {
                field,
                first,
                second,
            } => {
                let what = field.map_or_else(
                    || "intersection members conflict".to_owned(),
                    |f| format!("intersection field `{}` has conflicting types", name(f)),
                );
                base.with_message(what)
                    .with_param("field", opt_name(*field))
                    .with_param("first", ty(*first))
                    .with_param("second", ty(*second))
            }
            TypeErrorKind::InheritedField {
                object,
                field,
                problem,
            } => {
                let base = base
                    .with_param("object", name(*object))
                    .with_param("field", name(*field));
                match problem {
                    InheritedFieldProblem::Missing => base.with_message(format!(
                        "`{}` must redeclare inherited field `{}`",
                        name(*object),
                        name(*field)
                    )),
                    InheritedFieldProblem::Incompatible { own, base: inherited } => base
                        .with_message(format!(
                            "field `{}` of `{}` is incompatible with the inherited field",
                            name(*field),
                            name(*object)
                        ))
                        .with_param("own", ty(*own))
                        .with_param("base", ty(*inherited)),
                }
            }
            TypeErrorKind::CurriedNoProgress { remaining } => base
                .with_message("curried call made no progress")
                .with_param("remaining", remaining.to_string()),
            TypeErrorKind::UnifyBudgetExceeded { max_steps } => base
                .with_message("unify budget exceeded")
                .with_param("max_steps", max_steps.to_string()),
            TypeErrorKind::UnionSearchExhausted { max_states } => base
                .with_message("union type inference gave up")
                .with_param("max_states", max_states.to_string()),
        };

        diag.with_label(self.span, code.description())
    }
}
