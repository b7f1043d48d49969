//! Fatal error kinds for a generation run.
//!
//! Every error aborts the whole invocation: a job either fully completes or
//! the run stops. The variants exist so the CLI can map distinct failure
//! kinds to distinct exit codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveError {
    /// The schema compiler could not be found or probed. Raised once during
    /// preflight, before any job runs.
    #[error("schema compiler unavailable: {message}")]
    CompilerUnavailable { message: String },

    /// The delegated bundle generator exited with a failure status.
    #[error("bundle generator failed: {message}")]
    GeneratorFailed { message: String },

    /// Any other fatal job error (staging I/O, compiler invocation).
    #[error("{0:#}")]
    Fatal(#[from] anyhow::Error),
}

impl DriveError {
    /// Process exit code for this error. Preflight failures get their own
    /// code so callers can tell "tool not installed" from a broken run.
    pub fn exit_code(&self) -> u8 {
        match self {
            DriveError::CompilerUnavailable { .. } => 2,
            DriveError::GeneratorFailed { .. } | DriveError::Fatal(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DriveError;

    #[test]
    fn preflight_failure_reports_exit_code_2() {
        let err = DriveError::CompilerUnavailable {
            message: "protoc: not found".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn generator_failure_reports_exit_code_1() {
        let err = DriveError::GeneratorFailed {
            message: "exit status: 3".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("bundle generator"));
    }

    #[test]
    fn fatal_wraps_anyhow_with_full_chain() {
        let err = DriveError::from(anyhow::anyhow!("inner").context("outer"));
        assert_eq!(err.exit_code(), 1);
        let msg = err.to_string();
        assert!(msg.contains("outer") && msg.contains("inner"));
    }
}
