//! Row-level validation for the two input CSVs.
//!
//! Each validator is a pure function from the raw fields of one record to
//! either a typed row or the [`Rejection`] that disqualified it.

use serde::Serialize;
use thiserror::Error;

use crate::models::{NewCallLog, NewUser};

/// Number of fields in a users CSV record.
pub const USER_FIELDS: usize = 2;

/// Number of fields in a call-logs CSV record.
pub const CALL_LOG_FIELDS: usize = 5;

// ── Rejection ─────────────────────────────────────────────────────────────────

/// Why a record was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field {index} is blank")]
    BlankField { index: usize },

    #[error("{field} is not an integer: {value:?}")]
    NotInteger { field: &'static str, value: String },
}

/// Per-reason tally of dropped records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub field_count: u64,
    pub blank_field: u64,
    pub not_integer: u64,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::FieldCount { .. } => self.field_count += 1,
            Rejection::BlankField { .. } => self.blank_field += 1,
            Rejection::NotInteger { .. } => self.not_integer += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.field_count + self.blank_field + self.not_integer
    }
}

// ── Validators ────────────────────────────────────────────────────────────────

/// Validate a `firstName,lastName` record.
pub fn validate_user(fields: &[&str]) -> Result<NewUser, Rejection> {
    let trimmed = trimmed_fields(fields, USER_FIELDS)?;
    Ok(NewUser {
        first_name: trimmed[0].to_string(),
        last_name: trimmed[1].to_string(),
    })
}

/// Validate a `phoneNumber,startTime,endTime,direction,userId` record.
///
/// The three numeric columns must parse as base-10 `i64`; a single failure
/// rejects the whole record.
pub fn validate_call_log(fields: &[&str]) -> Result<NewCallLog, Rejection> {
    let trimmed = trimmed_fields(fields, CALL_LOG_FIELDS)?;
    Ok(NewCallLog {
        phone_number: trimmed[0].to_string(),
        start_time: parse_integer("startTime", trimmed[1])?,
        end_time: parse_integer("endTime", trimmed[2])?,
        direction: trimmed[3].to_string(),
        user_id: parse_integer("userId", trimmed[4])?,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Check the field count, then trim every field and reject blanks.
fn trimmed_fields<'a>(fields: &[&'a str], expected: usize) -> Result<Vec<&'a str>, Rejection> {
    if fields.len() != expected {
        return Err(Rejection::FieldCount {
            expected,
            found: fields.len(),
        });
    }

    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let value = field.trim();
            if value.is_empty() {
                Err(Rejection::BlankField { index })
            } else {
                Ok(value)
            }
        })
        .collect()
}

fn parse_integer(field: &'static str, value: &str) -> Result<i64, Rejection> {
    value.parse::<i64>().map_err(|_| Rejection::NotInteger {
        field,
        value: value.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
