//! Error handling foundation for allowgate.
//!
//! Fallible APIs return [`Result`], a rootcause `Report` over a
//! crate-specific error enum. Domain errors become reports through `?`
//! or `.into()`.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
