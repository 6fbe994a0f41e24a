use serde::{Deserialize, Serialize};

/// A validated user row, ready to be inserted. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
}

/// A user row as persisted in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned identifier.
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// A validated call-log row, ready to be inserted. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCallLog {
    /// Free-form phone number; never format-checked.
    pub phone_number: String,
    /// Epoch-like start timestamp.
    pub start_time: i64,
    /// Epoch-like end timestamp. May precede `start_time`.
    pub end_time: i64,
    /// Free-text direction such as `inbound` or `outbound`.
    pub direction: String,
    /// Weak reference to [`User::user_id`]; the user may not exist.
    pub user_id: i64,
}

/// A call-log row as persisted in the `callLogs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    /// Store-assigned identifier.
    pub call_id: i64,
    pub phone_number: String,
    pub start_time: i64,
    pub end_time: i64,
    pub direction: String,
    pub user_id: i64,
}

/// One row of the per-user analytics report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub user_id: i64,
    /// Arithmetic mean of call durations for this user.
    pub avg_duration: f64,
    pub num_calls: i64,
}
