//! Argument-to-parameter matching.
//!
//! Two cursors walk the parameters and the arguments. Only shapes are
//! matched here (counts, labels, spreads); types are checked afterwards
//! against the bindings this produces.

use tern_ir::{Name, Span};

use crate::{ParamSignature, StructField, StructuralResolver, TypeArena, TypeId};

use super::{ArgBinding, CallArg};

/// Why arguments do not fit a parameter list.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("missing argument for parameter {index}")]
    Missing {
        index: usize,
        param: Option<Name>,
        span: Span,
    },
    #[error("label mismatch at parameter {index}")]
    Label {
        index: usize,
        expected: Option<Name>,
        found: Option<Name>,
        span: Span,
    },
    #[error("expected {expected} arguments, found {found}")]
    Extra {
        expected: usize,
        found: usize,
        span: Span,
    },
}

/// How lenient matching is.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Leave surplus arguments for a curried next stage.
    pub allow_trailing: bool,
    /// A parameter whose label equals its name accepts an unlabeled
    /// argument. Only for matching done to guide inference; call
    /// resolution always requires the label.
    pub punned_labels: bool,
}

/// Successful match: one binding per parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgMatch {
    pub bindings: Vec<ArgBinding>,
    /// Arguments consumed, counting a spread argument once.
    pub consumed: usize,
}

/// Match `args` against `params`.
///
/// `call_span` positions errors that have no argument to point at.
pub fn match_arguments(
    arena: &TypeArena,
    resolver: &dyn StructuralResolver,
    params: &[ParamSignature],
    args: &[CallArg],
    options: MatchOptions,
    call_span: Span,
) -> Result<ArgMatch, MatchError> {
    let mut bindings = Vec::with_capacity(params.len());
    let (mut ai, mut pi) = (0, 0);

    while pi < params.len() {
        let param = &params[pi];
        let Some(arg) = args.get(ai) else {
            if param.is_omittable(arena) {
                bindings.push(ArgBinding::Absent);
                pi += 1;
                continue;
            }
            return Err(MatchError::Missing {
                index: pi,
                param: param.label.or(param.name),
                span: call_span,
            });
        };

        if let (Some(label), None) = (param.label, arg.label) {
            let fields = spread_fields(arena, resolver, arg.ty);
            if has_field(fields, label) {
                while pi < params.len() {
                    let p = &params[pi];
                    let Some(l) = p.label else { break };
                    if has_field(fields, l) {
                        bindings.push(ArgBinding::Spread { arg: ai, field: l });
                    } else if p.is_omittable(arena) && !labeled_later(&args[ai + 1..], l) {
                        bindings.push(ArgBinding::Absent);
                    } else {
                        break;
                    }
                    pi += 1;
                }
                ai += 1;
                continue;
            }
        }

        if labels_agree(param, arg, options.punned_labels) {
            bindings.push(ArgBinding::Arg(ai));
            ai += 1;
            pi += 1;
            continue;
        }
        if param.is_omittable(arena) {
            bindings.push(ArgBinding::Absent);
            pi += 1;
            continue;
        }
        return Err(MatchError::Label {
            index: pi,
            expected: param.label,
            found: arg.label,
            span: arg.span,
        });
    }

    if ai < args.len() && !options.allow_trailing {
        return Err(MatchError::Extra {
            expected: params.len(),
            found: args.len(),
            span: args[ai].span,
        });
    }
    Ok(ArgMatch {
        bindings,
        consumed: ai,
    })
}

fn labels_agree(param: &ParamSignature, arg: &CallArg, punned_labels: bool) -> bool {
    match (param.label, arg.label) {
        (None, None) => true,
        (Some(expected), Some(found)) => expected == found,
        (Some(_), None) => punned_labels && param.is_punned(),
        (None, Some(_)) => false,
    }
}

/// Fields of an argument that could be spread over labeled parameters.
fn spread_fields<'a>(
    arena: &'a TypeArena,
    resolver: &dyn StructuralResolver,
    ty: TypeId,
) -> Option<&'a [StructField]> {
    arena.structural_fields(ty).or_else(|| {
        let nominal = arena.nominal_component(ty)?;
        arena.structural_fields(resolver.structural_of(nominal)?)
    })
}

fn has_field(fields: Option<&[StructField]>, name: Name) -> bool {
    fields.is_some_and(|fields| fields.iter().any(|f| f.name == name))
}

fn labeled_later(args: &[CallArg], label: Name) -> bool {
    args.iter().any(|a| a.label == Some(label))
}
