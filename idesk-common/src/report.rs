//! Branch reports: per-office task counts by status and by round
//!
//! The office is derived from keywords in the sender and CC addresses.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::store::TaskFilter;
use crate::task::{fields, TaskRecord};
use crate::{Error, Result};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Branch {
    #[serde(rename = "GGR")]
    Gurugram,
    #[serde(rename = "LKO")]
    Lucknow,
    #[serde(rename = "AHM")]
    Ahmedabad,
    Other,
}

impl Branch {
    pub const ALL: [Branch; 4] = [
        Branch::Gurugram,
        Branch::Lucknow,
        Branch::Ahmedabad,
        Branch::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Branch::Gurugram => "GGR",
            Branch::Lucknow => "LKO",
            Branch::Ahmedabad => "AHM",
            Branch::Other => "Other",
        }
    }
}

/// Office for a task, checked in order GGR, LKO, AHM
pub fn derive_branch(task: &TaskRecord) -> Branch {
    let mut text = task.sender().unwrap_or_default().to_string();
    for cc in task.cc() {
        text.push(' ');
        text.push_str(cc);
    }
    let text = text.to_lowercase();

    if text.contains("gurugram") || text.contains("ggr") {
        Branch::Gurugram
    } else if text.contains("lucknow") || text.contains("lko") {
        Branch::Lucknow
    } else if text.contains("ahmedabad") || text.contains("ahm") {
        Branch::Ahmedabad
    } else {
        Branch::Other
    }
}

/// Counts for one branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_round: BTreeMap<String, u64>,
}

/// Report keyed by branch code; every branch is present even when empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(BTreeMap<Branch, BranchStats>);

impl Default for Report {
    fn default() -> Self {
        Self(Branch::ALL.iter().map(|b| (*b, BranchStats::default())).collect())
    }
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one task
    pub fn record(&mut self, task: &TaskRecord) {
        let stats = self.0.entry(derive_branch(task)).or_default();
        stats.total += 1;

        let status = non_empty(task.status()).unwrap_or(UNKNOWN);
        *stats.by_status.entry(status.to_string()).or_default() += 1;

        let round = non_empty(task.actual_round())
            .or_else(|| non_empty(task.current_round()))
            .or_else(|| non_empty(task.legacy_round()))
            .unwrap_or(UNKNOWN);
        *stats.by_round.entry(round.to_string()).or_default() += 1;
    }

    pub fn branch(&self, branch: Branch) -> Option<&BranchStats> {
        self.0.get(&branch)
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|s| s.total).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Branch, &BranchStats)> {
        self.0.iter()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Which stored date a report range applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateField {
    #[default]
    Interview,
    Received,
}

impl DateField {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "interview" => Ok(Self::Interview),
            "received" => Ok(Self::Received),
            other => Err(Error::InvalidInput(format!(
                "dateField must be 'interview' or 'received', got '{}'",
                other
            ))),
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Interview => fields::DATE_OF_INTERVIEW,
            Self::Received => fields::RECEIVED_DATE_TIME,
        }
    }
}

/// Filter for an inclusive `YYYY-MM-DD` day range on `field`
///
/// The end bound becomes an exclusive bound on the following day so that
/// full timestamps on the end date still sort inside the range.
pub fn date_range_filter(
    start: Option<&str>,
    end: Option<&str>,
    field: DateField,
) -> Result<TaskFilter> {
    let start = non_empty(start).map(parse_day).transpose()?;
    let end = non_empty(end)
        .map(parse_day)
        .transpose()?
        .map(|day| day + Duration::days(1));

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(Error::InvalidInput(
                "startDate must not be after endDate".to_string(),
            ));
        }
    }

    Ok(TaskFilter::StringRange {
        field: field.field_name().to_string(),
        start: start.map(|d| d.format("%Y-%m-%d").to_string()),
        end: end.map(|d| d.format("%Y-%m-%d").to_string()),
    })
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("Invalid date '{}': {}", value, e)))
}
