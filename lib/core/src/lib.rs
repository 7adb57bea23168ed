//! Core types and utilities shared by the allowgate crates.
//!
//! This crate provides the identity key used to gate access and the
//! `Result` alias every other crate reports errors through.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{IdentityId, ParseIdError};
