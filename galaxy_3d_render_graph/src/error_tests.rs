//! Unit tests for error.rs
//!
//! Tests Error variants, Display/Debug/Clone, and the rg_err!/rg_bail! macros.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("device lost".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("device lost"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("stale target set id 4".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("stale target set id 4"));
}

#[test]
fn test_validation_failed_display() {
    let err = Error::ValidationFailed("size reference cycle".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Validation failed"));
    assert!(display.contains("size reference cycle"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug_names_variant() {
    assert!(format!("{:?}", Error::BackendError("x".into())).contains("BackendError"));
    assert!(format!("{:?}", Error::InvalidResource("x".into())).contains("InvalidResource"));
    assert!(format!("{:?}", Error::ValidationFailed("x".into())).contains("ValidationFailed"));
}

#[test]
fn test_error_clone_keeps_message() {
    let err = Error::InvalidResource("texture 12".to_string());
    assert_eq!(format!("{}", err), format!("{}", err.clone()));
}

// ============================================================================
// MACROS
// ============================================================================

#[test]
fn test_rg_err_defaults_to_backend_error() {
    let err = crate::rg_err!("galaxy3d::Test", "pool {} exhausted", "targets");
    match err {
        Error::BackendError(msg) => assert_eq!(msg, "pool targets exhausted"),
        other => panic!("Expected BackendError, got {:?}", other),
    }
}

#[test]
fn test_rg_err_with_variant_selector() {
    let err = crate::rg_err!(ValidationFailed => "galaxy3d::Test", "cycle through {}", 3);
    match err {
        Error::ValidationFailed(msg) => assert!(msg.contains("cycle through 3")),
        other => panic!("Expected ValidationFailed, got {:?}", other),
    }
}

#[test]
fn test_rg_bail_returns_early() {
    fn fails(flag: bool) -> Result<u32> {
        if flag {
            crate::rg_bail!(InvalidResource => "galaxy3d::Test", "bad handle");
        }
        Ok(7)
    }

    assert_eq!(fails(false).unwrap(), 7);
    assert!(matches!(fails(true), Err(Error::InvalidResource(_))));
}

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::OutOfMemory)
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert!(matches!(outer(), Err(Error::OutOfMemory)));
}
