//! Error types for the Galaxy3D render graph
//!
//! Only recoverable failures are represented here (acquisition failures,
//! backend errors, stale ids, validation problems). Programming errors such as
//! arena overflow or exceeding the depth-level cap are panics.

use std::fmt;

/// Result type for render graph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Render graph errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error reported by the render system
    BackendError(String),

    /// Out of GPU memory while creating a pooled resource
    OutOfMemory,

    /// Invalid resource (stale id, stale pool handle, unknown resource...)
    InvalidResource(String),

    /// Graph validation failed (missing validate(), reference cycles...)
    ValidationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error (with file:line) and build the corresponding `Error`
///
/// Without a variant selector the error is a `BackendError`:
///
/// ```ignore
/// let err = rg_err!("galaxy3d::TargetSetPool", "lock poisoned");
/// let err = rg_err!(InvalidResource => "galaxy3d::RenderGraph", "stale id {}", id);
/// ```
#[macro_export]
macro_rules! rg_err {
    ($kind:ident => $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::Log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::error::Error::$kind(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::rg_err!(BackendError => $source, $($arg)*)
    };
}

/// Log an error and return it from the current function
#[macro_export]
macro_rules! rg_bail {
    ($kind:ident => $source:expr, $($arg:tt)*) => {
        return Err($crate::rg_err!($kind => $source, $($arg)*))
    };
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::rg_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
