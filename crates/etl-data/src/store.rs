//! In-memory SQLite store holding the `users` and `callLogs` tables.
//!
//! The store is owned by whoever opens it and dropped (closing the
//! connection) on every exit path. Writes go through a [`Batch`], one per
//! source file; a batch that is dropped without [`Batch::commit`] rolls back.

use rusqlite::{params, Connection, Row, Transaction};
use serde::Serialize;
use tracing::debug;

use etl_core::models::{CallLog, NewCallLog, NewUser, User, UserAnalytics};
use etl_core::Result;

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    userId INTEGER PRIMARY KEY,
    firstName TEXT,
    lastName TEXT
)";

// The foreign key is declarative only. The bundled SQLite build enables
// enforcement by default, so `open_in_memory` switches it off.
const CREATE_CALL_LOGS: &str = "CREATE TABLE IF NOT EXISTS callLogs (
    callId INTEGER PRIMARY KEY,
    phoneNumber TEXT,
    startTime INTEGER,
    endTime INTEGER,
    direction TEXT,
    userId INTEGER,
    FOREIGN KEY (userId) REFERENCES users(userId)
)";

const USER_ANALYTICS: &str = "SELECT userId,
       AVG(endTime - startTime) AS avgDuration,
       COUNT(*) AS numCalls
FROM callLogs
GROUP BY userId
ORDER BY userId";

const ORDERED_CALLS: &str = "SELECT callId, phoneNumber, startTime, endTime, direction, userId
FROM callLogs
ORDER BY userId, startTime, callId";

// ── TableCounts ───────────────────────────────────────────────────────────────

/// Row totals for both tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub users: u64,
    pub call_logs: u64,
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open a fresh in-memory database. Call [`Store::create_schema`] before
    /// loading.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database with both tables already created.
    pub fn with_schema() -> Result<Self> {
        let store = Self::open_in_memory()?;
        store.create_schema()?;
        Ok(store)
    }

    pub fn create_schema(&self) -> Result<()> {
        self.conn.execute(CREATE_USERS, [])?;
        self.conn.execute(CREATE_CALL_LOGS, [])?;
        debug!("Schema created");
        Ok(())
    }

    /// Start a write batch. Only one batch can be open at a time.
    pub fn batch(&mut self) -> Result<Batch<'_>> {
        let tx = self.conn.transaction()?;
        Ok(Batch { tx })
    }

    /// Average duration and call count per user id, ascending by user id.
    pub fn user_analytics(&self) -> Result<Vec<UserAnalytics>> {
        let mut stmt = self.conn.prepare(USER_ANALYTICS)?;
        let rows = stmt.query_map([], |row| {
            Ok(UserAnalytics {
                user_id: row.get(0)?,
                avg_duration: row.get(1)?,
                num_calls: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every call log ordered by user id, then start time.
    pub fn ordered_calls(&self) -> Result<Vec<CallLog>> {
        self.query_call_logs(ORDERED_CALLS)
    }

    /// Every user in insertion order.
    pub fn users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT userId, firstName, lastName FROM users ORDER BY userId")?;
        let rows = stmt.query_map([], |row| {
            Ok(User {
                user_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every call log in insertion order.
    pub fn call_logs(&self) -> Result<Vec<CallLog>> {
        self.query_call_logs(
            "SELECT callId, phoneNumber, startTime, endTime, direction, userId
             FROM callLogs ORDER BY callId",
        )
    }

    pub fn counts(&self) -> Result<TableCounts> {
        let users: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let call_logs: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM callLogs", [], |row| row.get(0))?;
        Ok(TableCounts {
            users: users as u64,
            call_logs: call_logs as u64,
        })
    }

    /// Close the connection, surfacing any error SQLite reports.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    fn query_call_logs(&self, sql: &str) -> Result<Vec<CallLog>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map_call_log)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn map_call_log(row: &Row<'_>) -> rusqlite::Result<CallLog> {
    Ok(CallLog {
        call_id: row.get(0)?,
        phone_number: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        direction: row.get(4)?,
        user_id: row.get(5)?,
    })
}

// ── Batch ─────────────────────────────────────────────────────────────────────

/// Pending inserts for one source file.
pub struct Batch<'a> {
    tx: Transaction<'a>,
}

impl Batch<'_> {
    /// Insert a user and return its assigned id.
    pub fn insert_user(&self, user: &NewUser) -> Result<i64> {
        let mut stmt = self
            .tx
            .prepare_cached("INSERT INTO users (firstName, lastName) VALUES (?1, ?2)")?;
        stmt.execute(params![user.first_name, user.last_name])?;
        Ok(self.tx.last_insert_rowid())
    }

    /// Insert a call log and return its assigned id.
    pub fn insert_call_log(&self, call: &NewCallLog) -> Result<i64> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO callLogs (phoneNumber, startTime, endTime, direction, userId)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![
            call.phone_number,
            call.start_time,
            call.end_time,
            call.direction,
            call.user_id,
        ])?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
