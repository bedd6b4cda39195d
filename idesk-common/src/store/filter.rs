//! Task queries in one place: the MongoDB filter document and an in-process
//! evaluator with the same semantics for the in-memory store

use mongodb::bson::{doc, Bson, Document};

use crate::task::fields;

/// Final states: tasks in these are done and drop off the live feed
pub const FINAL_STATUSES: [&str; 4] = ["Completed", "Not Done", "Cancelled", "Rescheduled"];

/// States still awaiting action for today's and future interviews
pub const PENDING_STATUSES: [&str; 2] = ["Pending", "Assigned"];

/// Task selection used by the feeds and reports
#[derive(Debug, Clone, PartialEq)]
pub enum TaskFilter {
    /// Every task
    All,
    /// Tasks carrying a non-null `actualRound` override
    HasActualRound,
    /// Case-insensitive literal substring match on `receivedDateTime`
    ReceivedContains(String),
    /// Live feed: overdue open tasks plus today's/future pending ones
    ///
    /// `today` is a `YYYY-MM-DD` string compared lexically against the
    /// stored `Date of Interview`.
    LiveFeed { today: String },
    /// Lexical string range on a single field, `start` inclusive and `end`
    /// exclusive; either bound may be absent
    StringRange {
        field: String,
        start: Option<String>,
        end: Option<String>,
    },
}

impl TaskFilter {
    /// MongoDB filter document
    pub fn to_document(&self) -> Document {
        match self {
            Self::All => doc! {},
            Self::HasActualRound => doc! {
                fields::ACTUAL_ROUND: { "$exists": true, "$ne": Bson::Null }
            },
            Self::ReceivedContains(needle) => doc! {
                fields::RECEIVED_DATE_TIME: { "$regex": regex::escape(needle), "$options": "i" }
            },
            Self::LiveFeed { today } => doc! {
                "$or": [
                    { "$and": [
                        { fields::DATE_OF_INTERVIEW: { "$lt": today.as_str() } },
                        { fields::STATUS: { "$nin": FINAL_STATUSES.to_vec() } }
                    ] },
                    { "$and": [
                        { fields::DATE_OF_INTERVIEW: { "$gte": today.as_str() } },
                        { fields::STATUS: { "$in": PENDING_STATUSES.to_vec() } }
                    ] }
                ]
            },
            Self::StringRange { field, start, end } => {
                let mut bounds = Document::new();
                if let Some(start) = start {
                    bounds.insert("$gte", start.as_str());
                }
                if let Some(end) = end {
                    bounds.insert("$lt", end.as_str());
                }
                if bounds.is_empty() {
                    doc! {}
                } else {
                    doc! { field.as_str(): bounds }
                }
            }
        }
    }

    /// Evaluate the filter against a document the way MongoDB would
    ///
    /// String comparisons only match string-typed fields; a missing field
    /// never satisfies `$lt`/`$gte`/`$in` but does satisfy `$nin`.
    pub fn matches(&self, doc: &Document) -> bool {
        let string_field = |key: &str| doc.get_str(key).ok();

        match self {
            Self::All => true,
            Self::HasActualRound => matches!(doc.get(fields::ACTUAL_ROUND), Some(value) if *value != Bson::Null),
            Self::ReceivedContains(needle) => string_field(fields::RECEIVED_DATE_TIME)
                .map(|received| received.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Self::LiveFeed { today } => {
                let date = string_field(fields::DATE_OF_INTERVIEW);
                let status = string_field(fields::STATUS);

                let overdue_open = date.is_some_and(|d| d < today.as_str())
                    && !status.is_some_and(|s| FINAL_STATUSES.contains(&s));
                let upcoming_pending = date.is_some_and(|d| d >= today.as_str())
                    && status.is_some_and(|s| PENDING_STATUSES.contains(&s));

                overdue_open || upcoming_pending
            }
            Self::StringRange { field, start, end } => {
                if start.is_none() && end.is_none() {
                    return true;
                }
                match string_field(field) {
                    Some(value) => {
                        start.as_deref().map_or(true, |start| value >= start)
                            && end.as_deref().map_or(true, |end| value < end)
                    }
                    None => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(today: &str) -> TaskFilter {
        TaskFilter::LiveFeed {
            today: today.to_string(),
        }
    }

    #[test]
    fn test_has_actual_round_excludes_missing_and_null() {
        let filter = TaskFilter::HasActualRound;
        assert!(filter.matches(&doc! { "actualRound": "Final Round" }));
        assert!(filter.matches(&doc! { "actualRound": "" }));
        assert!(!filter.matches(&doc! { "actualRound": Bson::Null }));
        assert!(!filter.matches(&doc! { "subject": "x" }));

        assert_eq!(
            filter.to_document(),
            doc! { "actualRound": { "$exists": true, "$ne": Bson::Null } }
        );
    }

    #[test]
    fn test_received_contains_is_case_insensitive_literal() {
        let filter = TaskFilter::ReceivedContains("2026-01-26T".to_string());
        assert!(filter.matches(&doc! { "receivedDateTime": "2026-01-26t14:00:00Z" }));
        assert!(!filter.matches(&doc! { "receivedDateTime": "2026-01-27T14:00:00Z" }));
        assert!(!filter.matches(&doc! { "subject": "2026-01-26T" }));

        let dotted = TaskFilter::ReceivedContains("1.2".to_string());
        assert_eq!(
            dotted.to_document(),
            doc! { "receivedDateTime": { "$regex": "1\\.2", "$options": "i" } }
        );
        assert!(!dotted.matches(&doc! { "receivedDateTime": "142" }));
    }

    #[test]
    fn test_live_feed_overdue_tasks_need_open_status() {
        let filter = live("2026-01-26");
        assert!(filter.matches(&doc! { "Date of Interview": "2026-01-25", "status": "Assigned" }));
        assert!(filter.matches(&doc! { "Date of Interview": "2026-01-25", "status": "Escalated" }));
        assert!(filter.matches(&doc! { "Date of Interview": "2026-01-25" }));
        assert!(!filter.matches(&doc! { "Date of Interview": "2026-01-25", "status": "Completed" }));
        assert!(!filter.matches(&doc! { "Date of Interview": "2026-01-25", "status": "Rescheduled" }));
    }

    #[test]
    fn test_live_feed_today_and_future_need_pending_status() {
        let filter = live("2026-01-26");
        assert!(filter.matches(&doc! { "Date of Interview": "2026-01-26", "status": "Pending" }));
        assert!(filter.matches(&doc! { "Date of Interview": "2026-02-01", "status": "Assigned" }));
        assert!(!filter.matches(&doc! { "Date of Interview": "2026-01-26", "status": "Escalated" }));
        assert!(!filter.matches(&doc! { "Date of Interview": "2026-01-26" }));
    }

    #[test]
    fn test_live_feed_without_date_never_matches() {
        assert!(!live("2026-01-26").matches(&doc! { "status": "Pending" }));
    }

    #[test]
    fn test_live_feed_compares_lexically() {
        // A MM/DD/YYYY value sorts before any YYYY-MM-DD string, so it always reads as overdue
        let filter = live("2026-01-26");
        assert!(filter.matches(&doc! { "Date of Interview": "12/31/2030", "status": "Pending" }));
        assert!(!filter.matches(&doc! { "Date of Interview": "12/31/2030", "status": "Completed" }));
    }

    #[test]
    fn test_string_range_bounds() {
        let filter = TaskFilter::StringRange {
            field: "receivedDateTime".to_string(),
            start: Some("2026-01-01".to_string()),
            end: Some("2026-02-01".to_string()),
        };
        assert!(filter.matches(&doc! { "receivedDateTime": "2026-01-01T00:00:00Z" }));
        assert!(filter.matches(&doc! { "receivedDateTime": "2026-01-31T23:59:59Z" }));
        assert!(!filter.matches(&doc! { "receivedDateTime": "2026-02-01T00:00:00Z" }));
        assert!(!filter.matches(&doc! { "receivedDateTime": "2025-12-31T23:59:59Z" }));
        assert!(!filter.matches(&doc! { "subject": "x" }));

        assert_eq!(
            filter.to_document(),
            doc! { "receivedDateTime": { "$gte": "2026-01-01", "$lt": "2026-02-01" } }
        );
    }

    #[test]
    fn test_unbounded_range_matches_everything() {
        let filter = TaskFilter::StringRange {
            field: "receivedDateTime".to_string(),
            start: None,
            end: None,
        };
        assert!(filter.matches(&doc! { "subject": "x" }));
        assert_eq!(filter.to_document(), doc! {});
    }
}
