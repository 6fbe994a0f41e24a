//! Data layer for the call-log ETL.
//!
//! Owns the in-memory SQLite store, loads the users and call-logs CSVs into
//! it, writes the analytics and ordered-calls reports, and runs the whole
//! sequence as one pipeline.

pub mod loader;
pub mod pipeline;
pub mod reporter;
pub mod store;

pub use etl_core as core;
