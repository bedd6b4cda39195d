//! Local mismatch list with optimistic corrections
//!
//! Edits are applied to the local rows before the server call. If the call
//! fails the rows go back to the snapshot taken just before the edit and the
//! error is handed to the caller to report.

use idesk_common::api::RoundPatch;
use idesk_common::rounds::is_canonical;
use idesk_common::task::fields;
use idesk_common::MismatchRecord;
use tracing::{info, warn};

use crate::client::{ApiClient, ClientError};

pub const UPDATED_REASON: &str = "Updated - Refresh to clear";
pub const BULK_UPDATED_REASON: &str = "Bulk Updated - Refresh to clear";

/// Rows as they were before an optimistic edit
#[derive(Debug, Clone)]
pub struct Snapshot(Vec<MismatchRecord>);

#[derive(Debug, Clone, Default)]
pub struct MismatchBoard {
    rows: Vec<MismatchRecord>,
}

impl MismatchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MismatchRecord) {
        self.rows.push(record);
    }

    pub fn rows(&self) -> &[MismatchRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MismatchRecord> {
        self.rows.iter().find(|r| r.id() == Some(id))
    }

    pub fn ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect()
    }

    /// Rows whose candidate name or reason contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<&MismatchRecord> {
        self.rows.iter().filter(|r| Self::matches(r, query)).collect()
    }

    /// Search predicate used by [`Self::search`]
    pub fn matches(record: &MismatchRecord, query: &str) -> bool {
        let query = query.to_lowercase();
        let name = record
            .str_field(fields::CANDIDATE_NAME)
            .or_else(|| record.str_field("candidateName"))
            .unwrap_or_default();
        name.to_lowercase().contains(&query)
            || record
                .reason()
                .is_some_and(|reason| reason.to_lowercase().contains(&query))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.rows.clone())
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.rows = snapshot.0;
    }

    /// Show `round` on every row in `ids`, tagged with `reason`
    pub fn mark_updated(&mut self, ids: &[String], round: &str, reason: &str) {
        for row in self
            .rows
            .iter_mut()
            .filter(|r| r.id().is_some_and(|id| ids.iter().any(|wanted| wanted == id)))
        {
            row.set_str_field(fields::CURRENT_ROUND, round);
            row.set_str_field("reason", reason);
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.rows.retain(|r| r.id() != Some(id));
    }

    /// Set the round override on one task
    pub async fn fix_round(&mut self, client: &ApiClient, id: &str, round: &str) -> Result<(), ClientError> {
        ensure_canonical(round)?;
        let ids = [id.to_string()];

        let snapshot = self.snapshot();
        self.mark_updated(&ids, round, UPDATED_REASON);

        let patch = RoundPatch::single(id, Some(round.to_string()));
        self.commit(snapshot, client, &patch).await.map(|_| ())
    }

    /// Remove the round override from one task; the row leaves the board
    pub async fn clear_round(&mut self, client: &ApiClient, id: &str) -> Result<(), ClientError> {
        let snapshot = self.snapshot();
        self.remove(id);

        let patch = RoundPatch::single(id, None);
        self.commit(snapshot, client, &patch).await.map(|_| ())
    }

    /// Set the same round override on many tasks; returns the matched count
    pub async fn fix_rounds(&mut self, client: &ApiClient, ids: &[String], round: &str) -> Result<u64, ClientError> {
        ensure_canonical(round)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let snapshot = self.snapshot();
        self.mark_updated(ids, round, BULK_UPDATED_REASON);

        let patch = RoundPatch::bulk(ids.to_vec(), Some(round.to_string()));
        let count = self.commit(snapshot, client, &patch).await?;
        info!("Bulk round update matched {} of {} tasks", count, ids.len());
        Ok(count)
    }

    async fn commit(&mut self, snapshot: Snapshot, client: &ApiClient, patch: &RoundPatch) -> Result<u64, ClientError> {
        match client.patch_rounds(patch).await {
            Ok(response) => Ok(response.count.unwrap_or(1)),
            Err(e) => {
                warn!("Round update failed, restoring local state: {}", e);
                self.restore(snapshot);
                Err(e)
            }
        }
    }
}

fn ensure_canonical(round: &str) -> Result<(), ClientError> {
    if is_canonical(round) {
        Ok(())
    } else {
        Err(ClientError::Rejected(format!(
            "'{}' is not one of the allowed rounds",
            round
        )))
    }
}
