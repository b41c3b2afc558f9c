//! Assertions on failed operations, for unit tests

#![cfg(test)]

use crate::{SpecGenError, SpecGenResult};

/// Unwrap the error of a result that was expected to fail
///
/// # Panics
/// If `result` is `Ok`.
pub fn expect_failure<T>(result: SpecGenResult<T>, expected: &str) -> SpecGenError {
    match result {
        Ok(_) => panic!("operation succeeded, expected failure ({expected})"),
        Err(e) => e,
    }
}

/// # Panics
/// If `result` is `Ok` or fails with another SQLSTATE.
pub fn assert_error_sqlstate<T>(result: SpecGenResult<T>, sqlstate: &str) {
    let err = expect_failure(result, &format!("SQLSTATE {sqlstate}"));
    assert_eq!(err.sqlstate(), sqlstate, "unexpected error: {err}");
}

/// # Panics
/// If `result` is `Ok` or its message lacks `needle`.
pub fn assert_error_contains<T>(result: SpecGenResult<T>, needle: &str) {
    let message = expect_failure(result, needle).to_string();
    assert!(message.contains(needle), "'{message}' does not mention '{needle}'");
}
