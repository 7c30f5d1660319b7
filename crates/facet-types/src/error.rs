//! Unified error interface for facet.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that the
//! coordinating loop and the CLI can log and classify failures uniformly.
//!
//! # Example
//!
//! ```
//! use facet_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum LoadError {
//!     Missing(String),
//!     Busy,
//! }
//!
//! impl ErrorCode for LoadError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing(_) => "LOAD_MISSING",
//!             Self::Busy => "LOAD_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! let err = LoadError::Busy;
//! assert_eq!(err.code(), "LOAD_BUSY");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable classification of an error.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"UNDO_NOTHING_TO_UNDO"`
/// - **Prefixed with the owning crate's domain**: `EVENT_`, `SNAPSHOT_`,
///   `UNDO_`, `ACTION_`, `CACHE_`, `MANAGER_`, `CONFIG_`
/// - **Stable** once published
///
/// # Recoverability
///
/// An error is recoverable when retrying later may succeed (a timeout, a
/// transient lock, a full queue). Programmer errors and invalid input are not.
pub trait ErrorCode {
    /// Returns the stable machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE. Intended for tests.
///
/// # Example
///
/// ```
/// use facet_types::{assert_error_code, ErrorCode};
///
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "WAIT_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Timeout, "WAIT_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every variant of an error enum at once.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
