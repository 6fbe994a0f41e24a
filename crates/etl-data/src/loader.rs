//! CSV ingestion for the users and call-logs files.
//!
//! The first physical line of each file is a header and is discarded without
//! being inspected, even when it is blank. Every later record goes through
//! the validators in [`etl_core::validation`]; accepted rows are inserted
//! into one [`Batch`] that is committed once the whole file has been read.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use etl_core::models::{NewCallLog, NewUser};
use etl_core::validation::{validate_call_log, validate_user, Rejection, RejectionCounts};
use etl_core::{EtlError, Result};
use serde::Serialize;
use tracing::{debug, trace};

use crate::store::{Batch, Store};

// ── LoadStats ─────────────────────────────────────────────────────────────────

/// What happened to the records of one source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Records seen after the header.
    pub rows_read: u64,
    /// Records that passed validation and were inserted.
    pub rows_loaded: u64,
    /// Records dropped, by reason.
    pub rejected: RejectionCounts,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a `firstName,lastName` CSV into the `users` table.
pub fn load_users(store: &mut Store, path: &Path) -> Result<LoadStats> {
    let stats = load_records(store, open_source(path)?, validate_user, insert_user)?;
    log_stats(path, &stats);
    Ok(stats)
}

/// Load a `phoneNumber,startTime,endTime,direction,userId` CSV into the
/// `callLogs` table.
pub fn load_call_logs(store: &mut Store, path: &Path) -> Result<LoadStats> {
    let stats = load_records(store, open_source(path)?, validate_call_log, insert_call_log)?;
    log_stats(path, &stats);
    Ok(stats)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| EtlError::from_open(path, e))
}

fn insert_user(batch: &Batch<'_>, user: &NewUser) -> Result<i64> {
    batch.insert_user(user)
}

fn insert_call_log(batch: &Batch<'_>, call: &NewCallLog) -> Result<i64> {
    batch.insert_call_log(call)
}

/// Shared read-validate-insert loop.
///
/// Any decode or store error aborts the file; the open batch is dropped and
/// nothing from this file is kept.
fn load_records<R, T>(
    store: &mut Store,
    source: R,
    validate: fn(&[&str]) -> std::result::Result<T, Rejection>,
    insert: fn(&Batch<'_>, &T) -> Result<i64>,
) -> Result<LoadStats>
where
    R: Read,
{
    // Skip header row. The csv reader ignores empty lines, so the header is
    // consumed as raw bytes before it sees the stream.
    let mut source = BufReader::new(source);
    let mut header = Vec::new();
    source.read_until(b'\n', &mut header)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let batch = store.batch()?;
    let mut stats = LoadStats::default();

    for record in reader.records() {
        let record = record?;
        stats.rows_read += 1;

        let fields: Vec<&str> = record.iter().collect();
        match validate(&fields) {
            Ok(row) => {
                insert(&batch, &row)?;
                stats.rows_loaded += 1;
            }
            Err(rejection) => {
                trace!("Dropping record {}: {}", stats.rows_read, rejection);
                stats.rejected.record(&rejection);
            }
        }
    }

    batch.commit()?;
    Ok(stats)
}

fn log_stats(path: &Path, stats: &LoadStats) {
    debug!(
        "File {}: {} read, {} loaded, {} dropped ({} field count, {} blank, {} non-integer)",
        path.display(),
        stats.rows_read,
        stats.rows_loaded,
        stats.rejected.total(),
        stats.rejected.field_count,
        stats.rejected.blank_field,
        stats.rejected.not_integer,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    // ── load_users ────────────────────────────────────────────────────────────

    #[test]
    fn test_load_users_skips_blank_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "users.csv",
            "firstName,lastName\nAnn,Lee\n,Bad\nBob,Kim\n",
        );
        let mut store = Store::with_schema().unwrap();

        let stats = load_users(&mut store, &path).unwrap();

        assert_eq!(stats.rows_read, 3);
        assert_eq!(stats.rows_loaded, 2);
        assert_eq!(stats.rejected.blank_field, 1);

        let users = store.users().unwrap();
        let names: Vec<(&str, &str)> = users
            .iter()
            .map(|u| (u.first_name.as_str(), u.last_name.as_str()))
            .collect();
        assert_eq!(names, vec![("Ann", "Lee"), ("Bob", "Kim")]);
    }

    #[test]
    fn test_load_users_rejects_wrong_field_count() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "users.csv",
            "firstName,lastName\nAnn\nBob,Kim,Extra\nCat,Doe\n",
        );
        let mut store = Store::with_schema().unwrap();

        let stats = load_users(&mut store, &path).unwrap();

        assert_eq!(stats.rows_loaded, 1);
        assert_eq!(stats.rejected.field_count, 2);
        assert_eq!(store.users().unwrap()[0].first_name, "Cat");
    }

    #[test]
    fn test_load_users_trims_and_keeps_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "users.csv",
            "firstName,lastName\n  Ann , Lee \nAnn,Lee\n",
        );
        let mut store = Store::with_schema().unwrap();

        load_users(&mut store, &path).unwrap();

        let users = store.users().unwrap();
        assert_eq!(users.len(), 2);
        assert!(users
            .iter()
            .all(|u| u.first_name == "Ann" && u.last_name == "Lee"));
    }

    #[test]
    fn test_load_users_without_header_loses_first_row() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "users.csv", "Ann,Lee\nBob,Kim\n");
        let mut store = Store::with_schema().unwrap();

        let stats = load_users(&mut store, &path).unwrap();

        assert_eq!(stats.rows_loaded, 1);
        assert_eq!(store.users().unwrap()[0].first_name, "Bob");
    }

    #[test]
    fn test_load_users_blank_first_line_is_the_header() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "users.csv", "\nfirstName,lastName\nAnn,Lee\n");
        let mut store = Store::with_schema().unwrap();

        let stats = load_users(&mut store, &path).unwrap();

        assert_eq!(stats.rows_read, 2);
        let names: Vec<String> = store
            .users()
            .unwrap()
            .into_iter()
            .map(|u| u.first_name)
            .collect();
        assert_eq!(names, vec!["firstName", "Ann"]);
    }

    #[test]
    fn test_load_users_malformed_header_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, b"\xff\xfe,\"unterminated\nAnn,Lee\r\nBob,Kim\r\n").unwrap();
        let mut store = Store::with_schema().unwrap();

        let stats = load_users(&mut store, &path).unwrap();

        assert_eq!(stats.rows_loaded, 2);
        assert_eq!(store.users().unwrap()[1].last_name, "Kim");
    }

    #[test]
    fn test_load_users_quoted_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "users.csv",
            "firstName,lastName\n\"Mary, Jo\",\"O'Neil\"\n",
        );
        let mut store = Store::with_schema().unwrap();

        load_users(&mut store, &path).unwrap();

        let users = store.users().unwrap();
        assert_eq!(users[0].first_name, "Mary, Jo");
        assert_eq!(users[0].last_name, "O'Neil");
    }

    #[test]
    fn test_load_users_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "users.csv", "");
        let mut store = Store::with_schema().unwrap();

        let stats = load_users(&mut store, &path).unwrap();

        assert_eq!(stats, LoadStats::default());
    }

    #[test]
    fn test_load_users_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::with_schema().unwrap();

        let err = load_users(&mut store, &dir.path().join("absent.csv")).unwrap_err();

        assert!(err.is_missing_source());
        assert!(store.users().unwrap().is_empty());
    }

    #[test]
    fn test_load_users_invalid_utf8_discards_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(&path, b"firstName,lastName\nAnn,Lee\n\xff\xfe,Bad\n").unwrap();
        let mut store = Store::with_schema().unwrap();

        let err = load_users(&mut store, &path).unwrap_err();

        assert!(matches!(err, EtlError::Csv(_)));
        assert!(store.users().unwrap().is_empty());
    }

    // ── load_call_logs ────────────────────────────────────────────────────────

    #[test]
    fn test_load_call_logs_drops_non_numeric_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "callLogs.csv",
            "phoneNumber,startTime,endTime,direction,userId\n\
             555-1111,100,150,in,1\n\
             555-2222,abc,200,out,2\n",
        );
        let mut store = Store::with_schema().unwrap();

        let stats = load_call_logs(&mut store, &path).unwrap();

        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.rows_loaded, 1);
        assert_eq!(stats.rejected.not_integer, 1);

        let calls = store.call_logs().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].phone_number, "555-1111");
        assert_eq!(calls[0].start_time, 100);
        assert_eq!(calls[0].end_time, 150);
        assert_eq!(calls[0].end_time - calls[0].start_time, 50);
        assert_eq!(calls[0].user_id, 1);
    }

    #[test]
    fn test_load_call_logs_mixed_rejections() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "callLogs.csv",
            "phoneNumber,startTime,endTime,direction,userId\n\
             555-1,10,20,in\n\
             555-2,10,20,,3\n\
             555-3,10,2x,in,3\n\
             555-4,10,20,in,3.0\n\
             \" 555-5 \", 10 , 25 , out , 3 \n",
        );
        let mut store = Store::with_schema().unwrap();

        let stats = load_call_logs(&mut store, &path).unwrap();

        assert_eq!(stats.rows_read, 5);
        assert_eq!(stats.rows_loaded, 1);
        assert_eq!(stats.rejected.field_count, 1);
        assert_eq!(stats.rejected.blank_field, 1);
        assert_eq!(stats.rejected.not_integer, 2);

        let calls = store.call_logs().unwrap();
        assert_eq!(calls[0].phone_number, "555-5");
        assert_eq!(calls[0].direction, "out");
        assert_eq!(calls[0].start_time, 10);
        assert_eq!(calls[0].end_time, 25);
    }

    #[test]
    fn test_load_call_logs_without_any_users_loaded() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "callLogs.csv",
            "phoneNumber,startTime,endTime,direction,userId\n\
             555-1111,100,150,in,1\n\
             555-9999,0,30,out,42\n",
        );
        let mut store = Store::with_schema().unwrap();

        let stats = load_call_logs(&mut store, &path).unwrap();

        assert_eq!(stats.rows_loaded, 2);
        assert!(store.users().unwrap().is_empty());
        let user_ids: Vec<i64> = store
            .call_logs()
            .unwrap()
            .iter()
            .map(|c| c.user_id)
            .collect();
        assert_eq!(user_ids, vec![1, 42]);
    }

    #[test]
    fn test_load_call_logs_missing_file() {
        let mut store = Store::with_schema().unwrap();
        let err = load_call_logs(&mut store, Path::new("/tmp/no-such-calllogs-xyz.csv"))
            .unwrap_err();
        assert!(err.is_missing_source());
    }

    #[test]
    fn test_loaders_append_across_files() {
        let dir = TempDir::new().unwrap();
        let calls = "phoneNumber,startTime,endTime,direction,userId\n555,1,2,in,1\n";
        let a = write_csv(dir.path(), "a.csv", calls);
        let b = write_csv(dir.path(), "b.csv", calls);
        let mut store = Store::with_schema().unwrap();

        load_call_logs(&mut store, &a).unwrap();
        load_call_logs(&mut store, &b).unwrap();

        assert_eq!(store.counts().unwrap().call_logs, 2);
    }
}
