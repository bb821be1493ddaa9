//! Error types used by linevisor.
//!
//! - [`ClientError`]: failures reported by a [`UaClient`](crate::UaClient) call.
//! - [`SessionError`]: failures of the session lifecycle, tagged with the bootstrap phase.
//! - [`ConfigError`] / [`ValidationError`]: configuration could not be loaded or is inconsistent.
//!
//! Every type has an `as_label` returning a short stable snake_case label for logs.

use std::time::Duration;

use thiserror::Error;

use crate::session::{BootstrapPhase, ExitCode, SessionState, StatusCode};

/// # Errors produced by a protocol client.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a bad status code.
    #[error("service call failed with {status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
    },

    /// The call did not complete in time.
    #[error("timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Transport-level failure (resolve, connect, secure channel).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server certificate was refused by the trust policy.
    #[error("server certificate rejected: {subject}")]
    CertificateRejected { subject: String },
}

impl ClientError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ClientError::Status { .. } => "client_status",
            ClientError::Timeout { .. } => "client_timeout",
            ClientError::Connection(_) => "client_connection",
            ClientError::CertificateRejected { .. } => "certificate_rejected",
        }
    }

    /// Status code carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Timeout { .. } => Some(StatusCode::BAD_TIMEOUT),
            ClientError::CertificateRejected { .. } => Some(StatusCode::BAD_CERTIFICATE_UNTRUSTED),
            ClientError::Connection(_) => None,
        }
    }
}

/// # Errors produced by the session manager.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SessionError {
    /// A bootstrap phase failed; later phases were not attempted.
    #[error("bootstrap failed at {phase}: {source}")]
    Bootstrap {
        phase: BootstrapPhase,
        #[source]
        source: ClientError,
    },

    /// A phase was entered out of order.
    #[error("bootstrap phase {phase} entered out of order")]
    PhaseOrder { phase: BootstrapPhase },

    /// The bootstrap was overtaken by a keep-alive stop or a shutdown.
    #[error("bootstrap interrupted at {phase}: session is {state}")]
    Interrupted {
        phase: BootstrapPhase,
        state: SessionState,
    },

    /// The operation is not valid in the current state.
    #[error("{op} not allowed while {state}")]
    InvalidState {
        op: &'static str,
        state: SessionState,
    },
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::Bootstrap { .. } => "session_bootstrap",
            SessionError::PhaseOrder { .. } => "session_phase_order",
            SessionError::Interrupted { .. } => "session_interrupted",
            SessionError::InvalidState { .. } => "session_invalid_state",
        }
    }

    /// Phase the failure is attributed to.
    pub fn phase(&self) -> Option<BootstrapPhase> {
        match self {
            SessionError::Bootstrap { phase, .. }
            | SessionError::PhaseOrder { phase }
            | SessionError::Interrupted { phase, .. } => Some(*phase),
            SessionError::InvalidState { .. } => None,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> ExitCode {
        self.phase()
            .map_or(ExitCode::CreateApplication, ExitCode::from)
    }
}

/// # Configuration could not be loaded or is invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or deserializing the sources failed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are inconsistent.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Load(_) => "config_load",
            ConfigError::Validation(e) => e.as_label(),
        }
    }
}

/// # Semantic configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("endpoint '{0}' is not a url with a scheme")]
    InvalidEndpoint(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("no tags configured")]
    NoTags,

    #[error("tag '{0}' is configured more than once")]
    DuplicateTag(String),

    #[error("tag '{tag}' has an empty {set} value set")]
    EmptyValueSet { tag: String, set: &'static str },

    #[error("tag '{tag}' lists value {value} as both down and running")]
    OverlappingValues { tag: String, value: String },

    #[error("tag '{0}' has an empty address")]
    EmptyAddress(String),
}

impl ValidationError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ValidationError::InvalidEndpoint(_) => "config_invalid_endpoint",
            ValidationError::ZeroDuration { .. } => "config_zero_duration",
            ValidationError::NoTags => "config_no_tags",
            ValidationError::DuplicateTag(_) => "config_duplicate_tag",
            ValidationError::EmptyValueSet { .. } => "config_empty_value_set",
            ValidationError::OverlappingValues { .. } => "config_overlapping_values",
            ValidationError::EmptyAddress(_) => "config_empty_address",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_error_maps_to_phase_exit_code() {
        let err = SessionError::Bootstrap {
            phase: BootstrapPhase::CreateSession,
            source: ClientError::Connection("refused".into()),
        };
        assert_eq!(err.exit_code(), ExitCode::CreateSession);
        assert_eq!(err.as_label(), "session_bootstrap");
        assert!(err.to_string().contains("create_session"));
    }

    #[test]
    fn client_error_exposes_status() {
        let err = ClientError::Timeout {
            timeout: Duration::from_secs(15),
        };
        assert_eq!(err.status(), Some(StatusCode::BAD_TIMEOUT));
        assert_eq!(ClientError::Connection("x".into()).status(), None);
    }
}
