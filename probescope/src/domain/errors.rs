//! Structured error types for probescope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

/// Fatal command-level failures. These abort the current operator command
/// before any side effect happens: nothing gets installed, nothing gets
/// written.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("no valid debug target selected")]
    NoTarget,

    #[error("tracing module '{0}' does not exist")]
    UnknownModule(String),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Host-side failures while reading the stopped frame.
///
/// A failed argument or memory read inside a handler indicates an ABI
/// mismatch between the tracer and the subject binary; it propagates as a
/// fatal session error rather than silently corrupting the profile.
#[derive(Error, Debug)]
pub enum FrameAccessError {
    #[error("failed to read argument {index} of the stopped frame: {reason}")]
    ArgumentRead { index: u32, reason: String },

    #[error("failed to read {len} bytes at {addr:#x}: {reason}")]
    MemoryRead { addr: u64, len: usize, reason: String },

    #[error("expected {expected} bytes at {addr:#x}, host returned {actual}")]
    ShortRead { addr: u64, expected: usize, actual: usize },
}

/// Failures while serializing or writing a profile report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write profile file: {0}")]
    WriteFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_display() {
        let err = CommandError::UnknownModule("heap".to_string());
        assert_eq!(err.to_string(), "tracing module 'heap' does not exist");
    }

    #[test]
    fn frame_access_error_display() {
        let err = FrameAccessError::ArgumentRead { index: 2, reason: "no such register".into() };
        assert!(err.to_string().contains("argument 2"));

        let err = FrameAccessError::ShortRead { addr: 0x1000, expected: 8, actual: 3 };
        assert!(err.to_string().contains("0x1000"));
        assert!(err.to_string().contains("host returned 3"));
    }
}
