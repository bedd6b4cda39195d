//! Subject-line validation
//!
//! Notification subjects are built from a fixed formula:
//! `Interview Support - {Candidate Name} - {Technology} - {Mon D, YYYY} at {Start Time} EST`.
//! A task passes validation when its subject matches the formula exactly
//! (after trimming) and its round is canonical.

use chrono::NaiveDate;

use crate::rounds::is_canonical;
use crate::task::TaskRecord;

/// `Date of Interview` as stored, e.g. `01/26/2026`
const STORED_DATE_FORMAT: &str = "%m/%d/%Y";

/// Date as it appears in subjects, e.g. `Jan 26, 2026`
const SUBJECT_DATE_FORMAT: &str = "%b %-d, %Y";

pub const MISSING_SUBJECT: &str = "Missing Subject";
pub const MISSING_FIELDS: &str = "Missing fields for Subject Validation (Name, Tech, Date, Time)";
pub const BAD_DATE: &str = "Error constructing expected subject (Date/Time format invalid)";

/// Subject the formula produces, or `None` when the date cannot be parsed
pub fn expected_subject(
    candidate_name: &str,
    technology: &str,
    date_of_interview: &str,
    start_time: &str,
) -> Option<String> {
    let date = NaiveDate::parse_from_str(date_of_interview.trim(), STORED_DATE_FORMAT).ok()?;
    Some(format!(
        "Interview Support - {} - {} - {} at {} EST",
        candidate_name,
        technology,
        date.format(SUBJECT_DATE_FORMAT),
        start_time
    ))
}

/// Every formatting problem found on `task`; empty means it passes
pub fn validation_issues(task: &TaskRecord) -> Vec<String> {
    let mut issues = Vec::new();

    let subject = task.subject().filter(|s| !s.is_empty());
    let parts = (
        non_empty(task.candidate_name()),
        non_empty(task.technology()),
        non_empty(task.date_of_interview()),
        non_empty(task.start_time()),
    );

    match (subject, parts) {
        (None, _) => issues.push(MISSING_SUBJECT.to_string()),
        (Some(subject), (Some(name), Some(tech), Some(date), Some(start))) => {
            match expected_subject(name, tech, date, start) {
                Some(expected) if subject.trim() != expected.trim() => {
                    issues.push(format!("Subject Mismatch. Expected: \"{}\"", expected));
                }
                Some(_) => {}
                None => issues.push(BAD_DATE.to_string()),
            }
        }
        (Some(_), _) => issues.push(MISSING_FIELDS.to_string()),
    }

    let round = non_empty(task.current_round()).or_else(|| non_empty(task.legacy_round()));
    match round {
        Some(round) if is_canonical(round) => {}
        other => issues.push(format!(
            "Invalid Interview Round: \"{}\"",
            other.unwrap_or("N/A")
        )),
    }

    issues
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, Document};

    fn valid_task() -> Document {
        doc! {
            "subject": "Interview Support - Sushmitha Pallela - Data Engineer - Jan 26, 2026 at 01:00 PM EST",
            "Candidate Name": "Sushmitha Pallela",
            "Technology": "Data Engineer",
            "Date of Interview": "01/26/2026",
            "Start Time Of Interview": "01:00 PM",
            "currentRound": "2nd Round",
        }
    }

    #[test]
    fn test_expected_subject_formats_date() {
        assert_eq!(
            expected_subject("Jane Doe", "Rust", "03/05/2026", "09:30 AM").as_deref(),
            Some("Interview Support - Jane Doe - Rust - Mar 5, 2026 at 09:30 AM EST")
        );
        assert_eq!(expected_subject("Jane Doe", "Rust", "2026-03-05", "09:30 AM"), None);
    }

    #[test]
    fn test_valid_task_has_no_issues() {
        assert!(validation_issues(&TaskRecord::new(valid_task())).is_empty());
    }

    #[test]
    fn test_subject_comparison_trims_whitespace() {
        let mut doc = valid_task();
        doc.insert(
            "subject",
            "  Interview Support - Sushmitha Pallela - Data Engineer - Jan 26, 2026 at 01:00 PM EST ",
        );
        assert!(validation_issues(&TaskRecord::new(doc)).is_empty());
    }

    #[test]
    fn test_subject_mismatch_reports_expected() {
        let mut doc = valid_task();
        doc.insert("subject", "Interview Support - S. Pallela - Data Engineer");

        let issues = validation_issues(&TaskRecord::new(doc));
        assert_eq!(
            issues,
            vec![
                "Subject Mismatch. Expected: \"Interview Support - Sushmitha Pallela - Data Engineer - Jan 26, 2026 at 01:00 PM EST\""
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_missing_subject_and_fields() {
        let mut doc = valid_task();
        doc.remove("subject");
        assert_eq!(validation_issues(&TaskRecord::new(doc)), vec![MISSING_SUBJECT.to_string()]);

        let mut doc = valid_task();
        doc.remove("Technology");
        assert_eq!(validation_issues(&TaskRecord::new(doc)), vec![MISSING_FIELDS.to_string()]);
    }

    #[test]
    fn test_unparseable_date() {
        let mut doc = valid_task();
        doc.insert("Date of Interview", "26th Jan");
        assert_eq!(validation_issues(&TaskRecord::new(doc)), vec![BAD_DATE.to_string()]);
    }

    #[test]
    fn test_round_check_uses_current_then_legacy() {
        let mut doc = valid_task();
        doc.remove("currentRound");
        doc.insert("Interview Round", "Final Round");
        assert!(validation_issues(&TaskRecord::new(doc)).is_empty());

        let mut doc = valid_task();
        doc.insert("currentRound", "final");
        assert_eq!(
            validation_issues(&TaskRecord::new(doc)),
            vec!["Invalid Interview Round: \"final\"".to_string()]
        );

        let mut doc = valid_task();
        doc.remove("currentRound");
        assert_eq!(
            validation_issues(&TaskRecord::new(doc)),
            vec!["Invalid Interview Round: \"N/A\"".to_string()]
        );
    }
}
