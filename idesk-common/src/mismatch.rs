//! Round mismatch classification
//!
//! A task is a mismatch when its effective round resolves to something
//! outside the canonical set. Canonical values are never flagged, even when
//! the stored override and the text disagree.

use futures::{future, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rounds::{effective_round, is_canonical, normalize_round};
use crate::task::{fields, TaskRecord};
use crate::Result;

/// Reason attached to every emitted mismatch
pub const INVALID_ROUND_REASON: &str = "Invalid Round Detect";

/// Outcome of resolving a task's round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundVerdict {
    /// Effective round is one of the canonical labels
    Canonical(String),
    /// Effective round exists but is not canonical
    Invalid(String),
    /// No override, no mention, no legacy value
    Unresolved,
}

pub fn classify(task: &TaskRecord) -> RoundVerdict {
    match effective_round(task) {
        Some(round) if is_canonical(&round) => RoundVerdict::Canonical(round),
        Some(round) => RoundVerdict::Invalid(round),
        None => RoundVerdict::Unresolved,
    }
}

/// Task fields plus `currentRound`, `allowed` and `reason`
///
/// Serialized as one flat JSON object; the three added keys replace any
/// same-named keys on the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MismatchRecord(Map<String, Value>);

impl MismatchRecord {
    /// Build the record for a task whose effective round is `round`
    ///
    /// `currentRound` carries the normalized display form of `round`, which
    /// can itself be canonical (`"interview"` displays as
    /// `"On Demand or AI Interview"`). The stored value is left untouched in
    /// `actualRound`, and that is the value the verdict was made on.
    pub fn from_task(task: &TaskRecord, round: &str) -> Self {
        let mut fields_map = task.to_json_map();
        fields_map.insert(
            fields::CURRENT_ROUND.to_string(),
            Value::String(normalize_round(round)),
        );
        fields_map.insert("allowed".to_string(), Value::Bool(false));
        fields_map.insert(
            "reason".to_string(),
            Value::String(INVALID_ROUND_REASON.to_string()),
        );
        Self(fields_map)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(fields::ID).and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.str_field(fields::SUBJECT)
    }

    pub fn current_round(&self) -> Option<&str> {
        self.str_field(fields::CURRENT_ROUND)
    }

    pub fn actual_round(&self) -> Option<&str> {
        self.str_field(fields::ACTUAL_ROUND)
    }

    pub fn allowed(&self) -> bool {
        self.0.get("allowed").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn reason(&self) -> Option<&str> {
        self.str_field("reason")
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Overwrite a string field (used for local optimistic edits)
    pub fn set_str_field(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Mismatch record for `task`, or `None` when it is canonical or unresolved
pub fn mismatch_for(task: &TaskRecord) -> Option<MismatchRecord> {
    match classify(task) {
        RoundVerdict::Invalid(round) => Some(MismatchRecord::from_task(task, &round)),
        RoundVerdict::Canonical(_) | RoundVerdict::Unresolved => None,
    }
}

/// Lazily classify a task stream, passing through only mismatches
///
/// Order follows the source; an error from the source ends up in the output
/// at the position it occurred.
pub fn mismatch_stream<S>(source: S) -> impl Stream<Item = Result<MismatchRecord>>
where
    S: Stream<Item = Result<TaskRecord>>,
{
    source.try_filter_map(|task| future::ready(Ok(mismatch_for(&task))))
}
