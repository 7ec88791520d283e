//! Error types.

use thiserror::Error;

/// Errors the code generator can report.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// `BeginFunc`/`EndFunc` markers don't nest: a function boundary was
    /// crossed without a matching opener/closer. Fatal.
    #[error("malformed function boundaries: {0}")]
    MalformedTac(String),

    /// Writing the emitted assembly to the caller's sink failed.
    #[error("failed to write assembly output")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for this crate's fallible operations.
pub type CodegenResult<T> = Result<T, CodegenError>;
