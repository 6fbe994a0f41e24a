use clap::Parser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// ── File name defaults ─────────────────────────────────────────────────────────

pub const USERS_FILE: &str = "users.csv";
pub const CALL_LOGS_FILE: &str = "callLogs.csv";
pub const USER_ANALYTICS_FILE: &str = "userAnalytics.csv";
pub const ORDERED_CALLS_FILE: &str = "orderedCalls.csv";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Load user and call-log CSVs, clean them, and write call analytics reports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "calllog-etl",
    about = "Load user and call-log CSVs, clean them, and write call analytics reports",
    version
)]
pub struct Settings {
    /// Directory holding the input CSVs and receiving the reports
    #[arg(long, env = "CALLLOG_RESOURCES_DIR", default_value = "resources")]
    pub resources_dir: PathBuf,

    /// Users CSV (defaults to <resources-dir>/users.csv)
    #[arg(long, env = "CALLLOG_USERS")]
    pub users: Option<PathBuf>,

    /// Call-logs CSV (defaults to <resources-dir>/callLogs.csv)
    #[arg(long, env = "CALLLOG_CALL_LOGS")]
    pub call_logs: Option<PathBuf>,

    /// Analytics report (defaults to <resources-dir>/userAnalytics.csv)
    #[arg(long, env = "CALLLOG_ANALYTICS_OUT")]
    pub analytics_out: Option<PathBuf>,

    /// Ordered calls report (defaults to <resources-dir>/orderedCalls.csv)
    #[arg(long, env = "CALLLOG_ORDERED_OUT")]
    pub ordered_out: Option<PathBuf>,

    /// Write a JSON run summary to this path
    #[arg(long, env = "CALLLOG_SUMMARY")]
    pub summary: Option<PathBuf>,

    /// Log the contents of both tables after loading
    #[arg(long)]
    pub dump_tables: bool,

    /// Exit non-zero when any pipeline step fails
    #[arg(long)]
    pub strict: bool,

    /// Logging level
    #[arg(
        long,
        env = "CALLLOG_LOG_LEVEL",
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"]
    )]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── PipelinePaths ──────────────────────────────────────────────────────────────

/// Concrete file locations for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub users: PathBuf,
    pub call_logs: PathBuf,
    pub user_analytics: PathBuf,
    pub ordered_calls: PathBuf,
}

impl PipelinePaths {
    /// Every file under `dir` with its default name.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            users: dir.join(USERS_FILE),
            call_logs: dir.join(CALL_LOGS_FILE),
            user_analytics: dir.join(USER_ANALYTICS_FILE),
            ordered_calls: dir.join(ORDERED_CALLS_FILE),
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Parse an explicit argument list, exiting on `--help` or bad input.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::finish(Settings::parse_from(args))
    }

    /// Fallible variant of [`Settings::load_from_args`].
    pub fn try_load_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::finish)
    }

    /// Resolve each file path, letting explicit flags win over
    /// `--resources-dir`.
    pub fn resolve_paths(&self) -> PipelinePaths {
        let defaults = PipelinePaths::in_dir(&self.resources_dir);
        PipelinePaths {
            users: self.users.clone().unwrap_or(defaults.users),
            call_logs: self.call_logs.clone().unwrap_or(defaults.call_logs),
            user_analytics: self
                .analytics_out
                .clone()
                .unwrap_or(defaults.user_analytics),
            ordered_calls: self.ordered_out.clone().unwrap_or(defaults.ordered_calls),
        }
    }

    /// `--debug` overrides log level.
    fn finish(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
