//! Error types for the Supabase adapter.

use std::fmt;
use std::path::PathBuf;

/// Errors from talking to a Supabase project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupabaseError {
    /// A required setting is missing or malformed.
    InvalidConfig { reason: String },
    /// The request never produced a response.
    Transport { reason: String },
    /// Supabase answered with an error status.
    Rejected { status: u16, body: String },
    /// The response body could not be decoded.
    Decode { reason: String },
    /// A code arrived without a login having been started.
    NoPendingLogin,
    /// The session file could not be used.
    Store(StoreError),
}

impl fmt::Display for SupabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid Supabase config: {reason}"),
            Self::Transport { reason } => write!(f, "Supabase request failed: {reason}"),
            Self::Rejected { status, body } => {
                write!(f, "Supabase rejected request with status {status}: {body}")
            }
            Self::Decode { reason } => write!(f, "failed to decode Supabase response: {reason}"),
            Self::NoPendingLogin => write!(f, "no login in progress for this callback"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SupabaseError {}

impl From<StoreError> for SupabaseError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Errors from the on-disk session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading or writing the file failed.
    Io { path: PathBuf, reason: String },
    /// The session could not be serialized.
    Encode { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => {
                write!(f, "session file {} unusable: {reason}", path.display())
            }
            Self::Encode { reason } => write!(f, "failed to encode session: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}
