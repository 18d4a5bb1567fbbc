//! Recoverable compiler errors.
//!
//! Invariant violations are not errors; they go through [`crate::ice!`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    /// The module cannot be expressed in SPIR-V, e.g. a function exceeds a hard target limit.
    #[error("SPIR-V generation error: {0}")]
    SpirvError(String),
}

pub type Result<T> = std::result::Result<T, CompilerError>;

/// Build a [`CompilerError::SpirvError`] from a format string.
#[macro_export]
macro_rules! err_spirv {
    ($($arg:tt)*) => {
        $crate::error::CompilerError::SpirvError(format!($($arg)*))
    };
}

/// Return early with a [`CompilerError::SpirvError`].
#[macro_export]
macro_rules! bail_spirv {
    ($($arg:tt)*) => {
        return Err($crate::err_spirv!($($arg)*))
    };
}
