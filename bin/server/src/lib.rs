//! allowgate web server and UI.
//!
//! This crate serves the access gate over HTTP: server-rendered Leptos
//! views for each gate phase, plus the login, callback, and logout routes.
//! Each browser gets its own gate, keyed by a session cookie.

#![allow(non_snake_case)]

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod sessions;
pub mod view;
