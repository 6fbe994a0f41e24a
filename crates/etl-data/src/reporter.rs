//! CSV report writers.
//!
//! Each writer runs its query first and only then truncates the destination,
//! so a failed query leaves any previous report untouched. The header row is
//! always written, even when there are no data rows. Lines end in `\r\n`.

use std::fs::File;
use std::path::Path;

use etl_core::models::{CallLog, UserAnalytics};
use etl_core::{EtlError, Result};
use serde::Serialize;
use tracing::debug;

use crate::store::Store;

pub const USER_ANALYTICS_HEADER: [&str; 3] = ["userId", "avgDuration", "numCalls"];

pub const ORDERED_CALLS_HEADER: [&str; 6] = [
    "callId",
    "phoneNumber",
    "startTime",
    "endTime",
    "direction",
    "userId",
];

/// Outcome of one report write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    /// Data rows written, excluding the header.
    pub rows_written: u64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Write `userId,avgDuration,numCalls`, one row per user id present in the
/// call logs, ascending by user id.
pub fn write_user_analytics(store: &Store, path: &Path) -> Result<ReportStats> {
    let rows = store.user_analytics()?;
    write_report(path, &USER_ANALYTICS_HEADER, rows.iter().map(analytics_record))
}

/// Write every call log ordered by user id, then start time.
pub fn write_ordered_calls(store: &Store, path: &Path) -> Result<ReportStats> {
    let rows = store.ordered_calls()?;
    write_report(path, &ORDERED_CALLS_HEADER, rows.iter().map(call_record))
}

/// Render a mean with the shortest round-trip digits.
///
/// Whole numbers keep a `.0` (`100.0`). Values outside `1e-4 <= |v| < 1e16`
/// use a signed, two-digit-minimum exponent (`1e+16`, `5e-05`).
pub fn format_avg_duration(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn analytics_record(row: &UserAnalytics) -> Vec<String> {
    vec![
        row.user_id.to_string(),
        format_avg_duration(row.avg_duration),
        row.num_calls.to_string(),
    ]
}

fn call_record(call: &CallLog) -> Vec<String> {
    vec![
        call.call_id.to_string(),
        call.phone_number.clone(),
        call.start_time.to_string(),
        call.end_time.to_string(),
        call.direction.clone(),
        call.user_id.to_string(),
    ]
}

fn write_report<I>(path: &Path, header: &[&str], records: I) -> Result<ReportStats>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let write_err = |source: std::io::Error| EtlError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);

    writer
        .write_record(header)
        .map_err(|e| write_err(e.into()))?;

    let mut stats = ReportStats::default();
    for record in records {
        writer
            .write_record(&record)
            .map_err(|e| write_err(e.into()))?;
        stats.rows_written += 1;
    }
    writer.flush().map_err(write_err)?;

    debug!("Wrote {} rows to {}", stats.rows_written, path.display());
    Ok(stats)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
