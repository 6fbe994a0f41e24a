//! Shared types for the call-log ETL: domain models, row validation,
//! error types and command-line settings.

pub mod error;
pub mod models;
pub mod settings;
pub mod validation;

pub use error::{EtlError, Result};
