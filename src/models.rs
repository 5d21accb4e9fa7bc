use crate::errors::{RecordError, StoreError};
use crate::timezone::DerivedTimes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Largest counter value accepted from an edit.
pub const COUNTER_MAX: u64 = i64::MAX as u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub local_date_time: String,
    pub weekday: String,
    pub zone_times: BTreeMap<String, String>,
    pub requests_sent: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub pending: i64,
    #[serde(default)]
    pub acceptance_rate: f64,
}

impl Entry {
    pub fn new(id: i64, local_date_time: String) -> Self {
        Self {
            id,
            local_date_time,
            ..Self::default()
        }
    }

    /// Builds an entry from a loosely typed remote record.
    ///
    /// Counters accept integers or numeric strings and fall back to 0 for
    /// anything else. The id must be an integer.
    pub fn from_remote(record: &Value) -> Result<Self, RecordError> {
        let raw_id = record.get("id").cloned().unwrap_or_default();
        let id = integer(&raw_id).ok_or_else(|| RecordError::InvalidId(raw_id.to_string()))?;

        let local_date_time = record
            .get("localDateTime")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut entry = Self {
            id,
            local_date_time,
            requests_sent: counter(record.get("requestsSent")),
            accepted: counter(record.get("accepted")),
            rejected: counter(record.get("rejected")),
            ..Self::default()
        };
        entry.recompute_counts();
        Ok(entry)
    }

    pub fn apply_derived(&mut self, derived: DerivedTimes) {
        self.weekday = derived.weekday;
        self.zone_times = derived.zone_times;
    }

    /// Refreshes `pending` and `acceptance_rate` after a counter change.
    ///
    /// `pending` may go negative; it saturates at the `i64` bounds.
    pub fn recompute_counts(&mut self) {
        let pending =
            i128::from(self.requests_sent) - i128::from(self.accepted) - i128::from(self.rejected);
        self.pending = i64::try_from(pending)
            .unwrap_or(if pending < 0 { i64::MIN } else { i64::MAX });
        self.acceptance_rate = rate(self.accepted, self.requests_sent);
    }
}

/// `accepted / sent` as a percentage rounded to one decimal, 0 when nothing was sent.
pub fn rate(accepted: u64, sent: u64) -> f64 {
    if sent == 0 {
        return 0.0;
    }
    (accepted as f64 / sent as f64 * 1000.0).round() / 10.0
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn counter(value: Option<&Value>) -> u64 {
    value
        .and_then(integer)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryField {
    LocalDateTime,
    RequestsSent,
    Accepted,
    Rejected,
}

impl EntryField {
    pub fn is_counter(self) -> bool {
        !matches!(self, Self::LocalDateTime)
    }

    pub fn parse_counter(self, value: &str) -> Result<u64, StoreError> {
        value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|count| *count <= COUNTER_MAX)
            .ok_or_else(|| {
                StoreError::InvalidInput(format!(
                    "{self:?} must be an integer between 0 and {COUNTER_MAX}, got '{value}'"
                ))
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub field: EntryField,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct DeriveQuery {
    #[serde(default)]
    pub local: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub entry: Entry,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub success: bool,
    pub data: Vec<Entry>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct SlotStat {
    pub weekday: String,
    pub hour: u32,
    pub sent: u64,
    pub accepted: u64,
    pub rate: f64,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct Totals {
    pub sent: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub pending: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub totals: Totals,
    pub acceptance_rate: f64,
    pub best_slot: String,
    pub slots: Vec<SlotStat>,
}
