//! End-to-end pipeline: create schema, load both CSVs, write both reports.
//!
//! Per-step failures are logged and recorded in the [`PipelineReport`] but
//! never stop later steps. Only a store that cannot be opened is fatal.

use std::path::Path;

use chrono::Utc;
use etl_core::settings::PipelinePaths;
use etl_core::{EtlError, Result};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::loader::{load_call_logs, load_users, LoadStats};
use crate::reporter::{write_ordered_calls, write_user_analytics, ReportStats};
use crate::store::{Store, TableCounts};

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs that do not change what the pipeline produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Log every row of both tables at `debug` after loading.
    pub dump_tables: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    LoadUsers,
    LoadCallLogs,
    WriteUserAnalytics,
    WriteOrderedCalls,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    Loaded(LoadStats),
    Written(ReportStats),
    /// The input file did not exist; nothing was loaded from it.
    MissingSource { path: String },
    Failed { error: String },
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        matches!(self, StepResult::Loaded(_) | StepResult::Written(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub result: StepResult,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// RFC 3339 timestamp when the run finished.
    pub generated_at: String,
    /// Outcomes in execution order.
    pub steps: Vec<StepOutcome>,
    /// Row totals in the store once loading finished.
    pub table_counts: TableCounts,
}

impl PipelineReport {
    pub fn all_succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.result.is_success())
    }

    pub fn failed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|s| !s.result.is_success())
            .map(|s| s.step)
            .collect()
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| EtlError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline against a fresh in-memory store.
///
/// 1. Create the schema.
/// 2. Load users, then call logs.
/// 3. Write the analytics report, then the ordered calls report.
///
/// The store is dropped before returning on every path.
pub fn run_pipeline(paths: &PipelinePaths, options: PipelineOptions) -> Result<PipelineReport> {
    let mut store = Store::with_schema()?;
    let mut steps = Vec::with_capacity(4);

    // ── Step 1: Load ──────────────────────────────────────────────────────────
    let result = load_step(load_users(&mut store, &paths.users), &paths.users, "users");
    if result.is_success() {
        info!("Users data loaded and cleaned successfully");
    }
    steps.push(StepOutcome {
        step: Step::LoadUsers,
        result,
    });

    let result = load_step(
        load_call_logs(&mut store, &paths.call_logs),
        &paths.call_logs,
        "call logs",
    );
    if result.is_success() {
        info!("Call logs data loaded and cleaned successfully");
    }
    steps.push(StepOutcome {
        step: Step::LoadCallLogs,
        result,
    });

    let table_counts = store.counts()?;
    debug!(
        "Store holds {} users and {} call logs",
        table_counts.users, table_counts.call_logs
    );

    if options.dump_tables {
        log_tables(&store);
    }

    // ── Step 2: Reports ───────────────────────────────────────────────────────
    let result = write_step(
        write_user_analytics(&store, &paths.user_analytics),
        "user analytics",
    );
    if result.is_success() {
        info!("User analytics written successfully");
    }
    steps.push(StepOutcome {
        step: Step::WriteUserAnalytics,
        result,
    });

    let result = write_step(
        write_ordered_calls(&store, &paths.ordered_calls),
        "ordered calls",
    );
    if result.is_success() {
        info!("Ordered call logs written successfully");
    }
    steps.push(StepOutcome {
        step: Step::WriteOrderedCalls,
        result,
    });

    store.close()?;

    Ok(PipelineReport {
        generated_at: Utc::now().to_rfc3339(),
        steps,
        table_counts,
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn load_step(outcome: Result<LoadStats>, path: &Path, what: &str) -> StepResult {
    match outcome {
        Ok(stats) => StepResult::Loaded(stats),
        Err(EtlError::MissingSource(_)) => {
            warn!("File {} not found", path.display());
            StepResult::MissingSource {
                path: path.display().to_string(),
            }
        }
        Err(e) => {
            error!("Error loading {} data: {}", what, e);
            StepResult::Failed {
                error: e.to_string(),
            }
        }
    }
}

fn write_step(outcome: Result<ReportStats>, what: &str) -> StepResult {
    match outcome {
        Ok(stats) => StepResult::Written(stats),
        Err(e) => {
            error!("Error writing {}: {}", what, e);
            StepResult::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Debug dump of both tables. A failed dump is logged and the run goes on.
fn log_tables(store: &Store) {
    if let Err(e) = dump_tables(store) {
        warn!("Could not dump tables: {}", e);
    }
}

fn dump_tables(store: &Store) -> Result<()> {
    debug!("PRINTING DATA FROM USERS");
    for user in store.users()? {
        debug!("{:?}", user);
    }
    debug!("PRINTING DATA FROM CALLLOGS");
    for call in store.call_logs()? {
        debug!("{:?}", call);
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
