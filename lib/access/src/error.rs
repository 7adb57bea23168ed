//! Error types for the access crate.
//!
//! Errors are reported through rootcause `Report`s:
//! - `SessionSourceError`: failures talking to the identity service
//! - `LookupError`: failures querying the allow-list
//!
//! Neither ever reaches the UI. The gate converts every failure into a
//! status before publishing state.

use std::fmt;

/// Errors from the session source (identity service).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSourceError {
    /// The stored session could not be restored.
    RestoreFailed { reason: String },
    /// The OAuth login could not be initiated.
    LoginInitiationFailed { provider: String, reason: String },
    /// The session could not be ended remotely.
    EndSessionFailed { reason: String },
    /// The identity service could not be reached.
    Unavailable { reason: String },
}

impl fmt::Display for SessionSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestoreFailed { reason } => {
                write!(f, "failed to restore session: {reason}")
            }
            Self::LoginInitiationFailed { provider, reason } => {
                write!(f, "failed to start '{provider}' login: {reason}")
            }
            Self::EndSessionFailed { reason } => {
                write!(f, "failed to end session: {reason}")
            }
            Self::Unavailable { reason } => {
                write!(f, "identity service unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionSourceError {}

/// Errors from the allow-list lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The request never produced a response.
    Transport { reason: String },
    /// The table service answered with an error status.
    Rejected { status: u16, body: String },
    /// The response body could not be decoded.
    Decode { reason: String },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { reason } => {
                write!(f, "allow-list request failed: {reason}")
            }
            Self::Rejected { status, body } => {
                write!(f, "allow-list lookup rejected with status {status}: {body}")
            }
            Self::Decode { reason } => {
                write!(f, "failed to decode allow-list rows: {reason}")
            }
        }
    }
}

impl std::error::Error for LookupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_initiation_display() {
        let err = SessionSourceError::LoginInitiationFailed {
            provider: "google".to_string(),
            reason: "invalid redirect".to_string(),
        };
        assert!(err.to_string().contains("google"));
        assert!(err.to_string().contains("invalid redirect"));
    }

    #[test]
    fn end_session_display() {
        let err = SessionSourceError::EndSessionFailed {
            reason: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("end session"));
    }

    #[test]
    fn rejected_lookup_display() {
        let err = LookupError::Rejected {
            status: 406,
            body: "not acceptable".to_string(),
        };
        assert!(err.to_string().contains("406"));
        assert!(err.to_string().contains("not acceptable"));
    }

    #[test]
    fn transport_lookup_display() {
        let err = LookupError::Transport {
            reason: "dns failure".to_string(),
        };
        assert!(err.to_string().contains("dns failure"));
    }
}
