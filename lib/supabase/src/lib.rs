//! Supabase adapter for the allowgate access gate.
//!
//! [`SupabaseClient`] talks to a Supabase project: the auth API for Google
//! login, sessions and sign-out, and the REST API for the allow-list table.
//! It implements both `SessionSource` and `AllowList`.

pub mod client;
pub mod config;
pub mod error;
pub mod store;
pub mod wire;

pub use client::SupabaseClient;
pub use config::SupabaseConfig;
pub use error::{StoreError, SupabaseError};
pub use store::SessionStore;
