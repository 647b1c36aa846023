use super::*;

#[test]
fn builtin_indices_are_stable() {
    assert_eq!(TypeId::I32.raw(), 0);
    assert_eq!(TypeId::BOOL.raw(), 4);
    assert_eq!(TypeId::NONE.raw(), 7);
    assert_eq!(TypeId::UNKNOWN.raw(), 9);
    assert_eq!(TypeId::FIRST_DYNAMIC, 10);
}

#[test]
fn builtin_check_works() {
    assert!(TypeId::I32.is_builtin());
    assert!(TypeId::UNKNOWN.is_builtin());
    assert!(!TypeId::from_raw(10).is_builtin());
    assert!(TypeId::UNKNOWN.is_unknown());
    assert!(TypeId::NEVER.is_never());
    assert!(!TypeId::I32.is_unknown());
}

#[test]
fn debug_uses_builtin_names() {
    assert_eq!(format!("{:?}", TypeId::STRING), "TypeId::string");
    assert_eq!(format!("{:?}", TypeId::from_raw(42)), "TypeId(42)");
    assert_eq!(format!("{:?}", TypeParamId::from_raw(3)), "'3");
}
