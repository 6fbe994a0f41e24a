mod bootstrap;

use std::process::ExitCode;

use anyhow::{Context, Result};
use etl_core::settings::Settings;
use etl_data::pipeline::{run_pipeline, PipelineOptions, PipelineReport};

fn main() -> Result<ExitCode> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("calllog-etl v{} starting", env!("CARGO_PKG_VERSION"));

    let paths = settings.resolve_paths();
    tracing::debug!("Resolved paths: {:?}", paths);

    let options = PipelineOptions {
        dump_tables: settings.dump_tables,
    };

    // Only a store failure escapes here; per-step failures are in the report.
    let report = run_pipeline(&paths, options).context("pipeline aborted")?;

    if let Some(summary) = settings.summary.as_ref() {
        match report.write_json(summary) {
            Ok(()) => tracing::info!("Run summary written to {}", summary.display()),
            Err(e) => tracing::error!("Error writing run summary: {}", e),
        }
    }

    Ok(ExitCode::from(exit_status(&report, settings.strict)))
}

/// Process exit status for a finished run: `1` only when `strict` is set and
/// some step did not succeed.
fn exit_status(report: &PipelineReport, strict: bool) -> u8 {
    if report.all_succeeded() {
        return 0;
    }

    tracing::warn!("Steps with errors: {:?}", report.failed_steps());
    if strict {
        1
    } else {
        0
    }
}
