//! Where diagnostics go.
//!
//! The type core only knows [`DiagnosticSink`]. [`DiagnosticQueue`] is the
//! collecting sink drivers and tests use: it drops repeats of the same
//! report, can cap the number of errors, and hands everything back in
//! source order.

use rustc_hash::FxHashSet;
use tern_ir::Span;

use crate::{Diagnostic, ErrorCode};

/// Receiver of structured diagnostics.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Identity used for deduplication.
type ReportKey = (ErrorCode, Option<Span>, String);

fn report_key(diag: &Diagnostic) -> ReportKey {
    (diag.code, diag.primary_span(), diag.message.clone())
}

#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    entries: Vec<Diagnostic>,
    seen: FxHashSet<ReportKey>,
    errors: usize,
    /// `None` accepts any number of errors. Warnings are never capped.
    max_errors: Option<usize>,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that stops accepting errors after `max_errors` of them.
    pub fn with_error_limit(max_errors: usize) -> Self {
        DiagnosticQueue {
            max_errors: Some(max_errors),
            ..Self::default()
        }
    }

    /// Queue `diag` unless it repeats an earlier report or the error cap
    /// is hit. Returns whether it was kept.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        let is_error = diag.is_error();
        if is_error && self.is_full() {
            return false;
        }
        if !self.seen.insert(report_key(&diag)) {
            return false;
        }
        self.errors += usize::from(is_error);
        self.entries.push(diag);
        true
    }

    pub fn is_full(&self) -> bool {
        self.max_errors.is_some_and(|max| self.errors >= max)
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn warnings(&self) -> usize {
        self.entries.len() - self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Everything queued so far, in arrival order.
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Empty the queue, returning its contents ordered by primary span.
    /// Diagnostics without a span come last; ties keep arrival order.
    pub fn drain_sorted(&mut self) -> Vec<Diagnostic> {
        let mut drained = std::mem::take(&mut self.entries);
        drained.sort_by_key(|d| d.primary_span().map(|span| span.start));
        drained.sort_by_key(|d| d.primary_span().is_none());
        self.seen.clear();
        self.errors = 0;
        drained
    }
}

impl DiagnosticSink for DiagnosticQueue {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests;
