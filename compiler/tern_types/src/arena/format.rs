//! Human-readable rendering of types for diagnostic parameters.

use std::fmt::Write;

use tern_ir::StringInterner;

use super::TypeArena;
use crate::{TypeData, TypeId};

impl TypeArena {
    /// Render `id` in source-like syntax.
    ///
    /// Recursive types print their body; the binder prints under the name it
    /// was allocated with, so `type X = FixedArray<X>` renders as
    /// `FixedArray<X>`.
    pub fn format_type(&self, id: TypeId, interner: &StringInterner) -> String {
        let mut out = String::new();
        self.write_type(id, interner, &mut out);
        out
    }

    fn write_type(&self, id: TypeId, interner: &StringInterner, out: &mut String) {
        match self.get(id) {
            TypeData::Primitive(prim) => out.push_str(prim.name()),
            TypeData::Unknown => out.push_str("unknown"),
            TypeData::TypeParam(p) => out.push_str(interner.lookup(self.param_info(*p).name)),
            TypeData::Nominal { name, args, .. } | TypeData::Trait { name, args, .. } => {
                out.push_str(interner.lookup(*name));
                self.write_args(args, interner, out);
            }
            TypeData::Structural { fields } => {
                if fields.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str("{ ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(interner.lookup(field.name));
                    if field.optional {
                        out.push('?');
                    }
                    out.push_str(": ");
                    self.write_type(field.ty, interner, out);
                }
                out.push_str(" }");
            }
            TypeData::Function { params, ret, .. } => {
                out.push('(');
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if let Some(label) = param.label {
                        let _ = write!(out, "~{}", interner.lookup(label));
                        if param.optional {
                            out.push('?');
                        }
                        out.push_str(": ");
                    }
                    self.write_type(param.ty, interner, out);
                }
                out.push_str(") -> ");
                self.write_type(*ret, interner, out);
            }
            TypeData::Union(members) => self.write_joined(members, " | ", interner, out),
            TypeData::Intersection {
                nominal,
                structural,
                traits,
            } => {
                let parts: Vec<TypeId> = nominal
                    .iter()
                    .chain(structural.iter())
                    .chain(traits.iter())
                    .copied()
                    .collect();
                self.write_joined(&parts, " & ", interner, out);
            }
            TypeData::FixedArray(elem) => {
                out.push_str("FixedArray<");
                self.write_type(*elem, interner, out);
                out.push('>');
            }
            TypeData::Recursive { body, .. } => self.write_type(*body, interner, out),
        }
    }

    fn write_args(&self, args: &[TypeId], interner: &StringInterner, out: &mut String) {
        if args.is_empty() {
            return;
        }
        out.push('<');
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(arg, interner, out);
        }
        out.push('>');
    }

    fn write_joined(
        &self,
        parts: &[TypeId],
        separator: &str,
        interner: &StringInterner,
        out: &mut String,
    ) {
        for (i, &part) in parts.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            let wrap = matches!(
                self.get(part),
                TypeData::Function { .. } | TypeData::Union(_) | TypeData::Intersection { .. }
            );
            if wrap {
                out.push('(');
            }
            self.write_type(part, interner, out);
            if wrap {
                out.push(')');
            }
        }
    }
}
