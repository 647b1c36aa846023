//! Structured diagnostics.
//!
//! Nothing here renders for a terminal. A [`Diagnostic`] carries a stable
//! [`ErrorCode`], named parameters (type names, symbol names, counts) and
//! the spans involved; presentation is left to whoever drains the
//! [`DiagnosticSink`]. [`DiagnosticQueue`] is the stock collecting sink.

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, DiagnosticParam, Label, LabelRole, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticQueue, DiagnosticSink};
