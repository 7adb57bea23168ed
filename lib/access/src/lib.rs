//! Sessions and the allow-list access gate for allowgate.
//!
//! This crate provides:
//! - The signed-in user and session model (`AuthUser`, `Session`)
//! - Collaborator seams for the auth service (`SessionSource`, `AllowList`)
//! - The pure gate state machine (`GateState`)
//! - The async driver that runs it (`AccessGate`)
//!
//! # Access Model
//!
//! Signing in with the identity provider is not enough to use the
//! application. Every signed-in identity is looked up in an allow-list
//! table; exactly one matching row admits the user. Anything else denies
//! access and ends the session.
//!
//! # Example
//!
//! ```
//! use allowgate_access::{AuthUser, GateState, LookupOutcome, AllowListRow, Phase, Session, Effect};
//! use chrono::Duration;
//!
//! let user = AuthUser::new("user-1").with_email(Some("alice@example.com".to_string()));
//! let session = Session::new("token".to_string(), user, Duration::hours(1));
//!
//! let mut state = GateState::new();
//! let Some(Effect::Lookup(ticket)) = state.observe_session(Some(&session)) else {
//!     panic!("a new identity needs checking");
//! };
//! assert_eq!(state.phase(), Phase::Checking);
//!
//! state.complete_lookup(ticket, LookupOutcome::Rows(vec![AllowListRow::new("user-1")]));
//! assert_eq!(state.phase(), Phase::Admitted);
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod session;
pub mod source;
pub mod state;
pub mod user;

// Re-export main types at crate root
pub use auth::{AllowListRow, LoginInitiation, OAuthProvider};
pub use config::{GateConfig, GateConfigBuilder};
pub use error::{LookupError, SessionSourceError};
pub use gate::AccessGate;
pub use session::Session;
pub use source::{
    AllowList, AuthChange, AuthEvent, Listeners, SessionHandler, SessionSource, Subscription,
};
pub use state::{
    DenialReason, Effect, GateState, GateStatus, LookupCompletion, LookupOutcome, LookupTicket,
    Notice, Phase,
};
pub use user::AuthUser;
