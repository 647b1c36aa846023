use super::*;
use pretty_assertions::assert_eq;

fn mismatch(start: u32) -> Diagnostic {
    Diagnostic::new(ErrorCode::E2001)
        .with_message("type mismatch")
        .with_label(Span::new(start, start + 1), "here")
}

#[test]
fn repeated_reports_are_dropped() {
    let mut queue = DiagnosticQueue::new();
    assert!(queue.push(mismatch(3)));
    assert!(!queue.push(mismatch(3)));
    assert!(queue.push(mismatch(4)));
    assert!(queue.push(mismatch(3).with_message("other")));
    assert_eq!(queue.as_slice().len(), 3);
    assert_eq!(queue.errors(), 3);
}

#[test]
fn error_limit_leaves_warnings_alone() {
    let mut queue = DiagnosticQueue::with_error_limit(1);
    assert!(queue.push(mismatch(1)));
    assert!(queue.is_full());
    assert!(!queue.push(mismatch(2)));
    assert!(queue.push(Diagnostic::new(ErrorCode::W2901).with_message("budget")));
    assert_eq!((queue.errors(), queue.warnings()), (1, 1));
}

#[test]
fn drain_orders_by_span_with_unspanned_last() {
    let mut queue = DiagnosticQueue::new();
    queue.emit(Diagnostic::new(ErrorCode::W2902).with_message("no span"));
    queue.emit(mismatch(20));
    queue.emit(mismatch(5));

    let spans: Vec<_> = queue.drain_sorted().iter().map(Diagnostic::primary_span).collect();
    assert_eq!(spans, vec![Some(Span::new(5, 6)), Some(Span::new(20, 21)), None]);
    assert!(queue.is_empty());
    assert_eq!(queue.errors(), 0);

    // A drained report may be queued again.
    assert!(queue.push(mismatch(5)));
}
