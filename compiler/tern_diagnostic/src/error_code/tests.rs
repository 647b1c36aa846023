use super::*;
use pretty_assertions::assert_eq;

#[test]
fn codes_render_as_their_names() {
    let rendered: Vec<String> = ErrorCode::ALL.iter().map(ToString::to_string).collect();
    assert_eq!(rendered.len(), 17);
    assert_eq!(rendered[0], "E2001");
    assert_eq!(ErrorCode::E2024.to_string(), "E2024");
    assert!(ErrorCode::ALL.iter().all(|code| !code.description().is_empty()));
}

#[test]
fn only_w_codes_warn() {
    for code in ErrorCode::ALL {
        assert_eq!(code.is_warning(), code.as_str().starts_with('W'), "{code}");
    }
}
