//! Interview round extraction and normalization
//!
//! Tasks carry their round in free text (reply bodies, the subject line) and
//! optionally in a stored `actualRound` override. This module turns either
//! source into one of the canonical round labels, or into a title-cased
//! fallback that is guaranteed not to be canonical.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::task::TaskRecord;

/// The eleven round labels the dashboard accepts, in matching priority order.
pub const CANONICAL_ROUNDS: [&str; 11] = [
    "1st Round",
    "2nd Round",
    "3rd Round",
    "4th Round",
    "Screening",
    "On Demand or AI Interview",
    "5th Round",
    "Technical Round",
    "Coding Round",
    "Final Round",
    "Loop Round",
];

static ROUND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(1st|2nd|3rd|4th|5th|final|coding|technical|screening|loop|on demand|ai)\s*round")
        .expect("round pattern is a valid regex")
});

/// Byte-exact membership test against [`CANONICAL_ROUNDS`]
pub fn is_canonical(round: &str) -> bool {
    CANONICAL_ROUNDS.contains(&round)
}

/// Find the first round mention in `text` and return the raw matched slice
pub fn find_round_mention(text: &str) -> Option<&str> {
    ROUND_PATTERN.find(text).map(|m| m.as_str())
}

/// Map a raw round mention onto a canonical label
///
/// The lowercased mention has its first `" round"` removed, then the first
/// canonical entry that either contains the stripped token or is contained in
/// the full lowercased mention wins. Mentions that hit nothing come back
/// title-cased, which never yields a canonical label.
///
/// Anything containing "ai" collapses to "On Demand or AI Interview".
pub fn normalize_round(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let lower = raw.to_lowercase();
    let stripped = lower.replacen(" round", "", 1);

    CANONICAL_ROUNDS
        .iter()
        .find(|canonical| {
            let canonical = canonical.to_lowercase();
            canonical.contains(&stripped) || lower.contains(&canonical)
        })
        .map(|canonical| (*canonical).to_string())
        .unwrap_or_else(|| title_case(raw))
}

/// Uppercase the first ASCII word character after every word boundary
///
/// Characters that are not at a boundary are left alone, so `"round 2"`
/// becomes `"Round 2"` and `"ROUND two"` stays `"ROUND Two"`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_is_word = false;

    for c in raw.chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }

    out
}

/// Scan a task for a round mention: replies first (body, then snippet, in
/// stored order), then the subject line
pub fn extract_round(task: &TaskRecord) -> Option<String> {
    let from_replies = task.replies().find_map(|reply| {
        reply
            .body()
            .and_then(find_round_mention)
            .or_else(|| reply.snippet().and_then(find_round_mention))
    });

    from_replies
        .or_else(|| task.subject().and_then(find_round_mention))
        .map(normalize_round)
}

/// Resolve the round a task is treated as having
///
/// Precedence: non-empty `actualRound` override, then the extractor, then
/// the legacy `Interview Round` field.
pub fn effective_round(task: &TaskRecord) -> Option<String> {
    task.actual_round()
        .filter(|round| !round.is_empty())
        .map(str::to_string)
        .or_else(|| extract_round(task))
        .or_else(|| {
            task.legacy_round()
                .filter(|round| !round.is_empty())
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_canonical_labels_normalize_to_themselves() {
        for label in CANONICAL_ROUNDS {
            assert_eq!(normalize_round(label), label, "exact label {label}");
            assert_eq!(normalize_round(&label.to_lowercase()), label, "lowercase {label}");
            assert_eq!(normalize_round(&label.to_uppercase()), label, "uppercase {label}");

            let bare = label.trim_end_matches(" Round");
            assert_eq!(normalize_round(bare), label, "without suffix {label}");
        }
    }

    #[test]
    fn test_normalization_table() {
        let cases = [
            ("1st round", "1st Round"),
            ("2nd Round", "2nd Round"),
            ("3RD ROUND", "3rd Round"),
            ("4th  round", "4th Round"),
            ("5th round", "5th Round"),
            ("final round", "Final Round"),
            ("Final", "Final Round"),
            ("coding round", "Coding Round"),
            ("technical round", "Technical Round"),
            ("screening round", "Screening"),
            ("loop round", "Loop Round"),
            ("on demand round", "On Demand or AI Interview"),
            ("AI round", "On Demand or AI Interview"),
            ("ai", "On Demand or AI Interview"),
        ];

        for (raw, expected) in cases {
            assert_eq!(normalize_round(raw), expected, "normalizing {raw:?}");
        }
    }

    #[test]
    fn test_unmatched_values_fall_back_to_title_case() {
        assert_eq!(normalize_round("round 2"), "Round 2");
        assert_eq!(normalize_round("hr discussion"), "Hr Discussion");
        assert!(!is_canonical(&normalize_round("round 2")));
    }

    #[test]
    fn test_ambiguous_collapses_are_kept() {
        // Any token contained in a canonical label resolves to the first such label
        assert_eq!(normalize_round("round"), "1st Round");
        assert_eq!(normalize_round("interview"), "On Demand or AI Interview");
    }

    #[test]
    fn test_empty_input_normalizes_to_empty() {
        assert_eq!(normalize_round(""), "");
    }

    #[test]
    fn test_title_case_only_touches_word_starts() {
        assert_eq!(title_case("round 2"), "Round 2");
        assert_eq!(title_case("ROUND two"), "ROUND Two");
        assert_eq!(title_case("o'neil-smith"), "O'Neil-Smith");
        assert_eq!(title_case("2ndround"), "2ndround");
    }

    #[test]
    fn test_find_round_mention_requires_round_word() {
        assert_eq!(find_round_mention("Moving to the final round today"), Some("final round"));
        assert_eq!(find_round_mention("Coding Round scheduled"), Some("Coding Round"));
        assert_eq!(find_round_mention("2ndround"), Some("2ndround"));
        assert_eq!(find_round_mention("final interview"), None);
        assert_eq!(find_round_mention("email about the candidate"), None);
    }

    #[test]
    fn test_is_canonical_is_byte_exact() {
        assert!(is_canonical("Final Round"));
        assert!(!is_canonical("final round"));
        assert!(!is_canonical("Final Round "));
    }

    #[test]
    fn test_reply_match_wins_over_subject() {
        let task = TaskRecord::new(doc! {
            "subject": "Interview Support - Jane Doe - 2nd round",
            "replies": [
                { "sender": "a@example.com", "date": "2026-01-02", "body": "Candidate cleared, final round next" },
            ],
        });

        assert_eq!(extract_round(&task).as_deref(), Some("Final Round"));
    }

    #[test]
    fn test_body_checked_before_snippet_and_replies_in_order() {
        let task = TaskRecord::new(doc! {
            "subject": "no mention here",
            "replies": [
                { "sender": "a", "date": "1", "body": "nothing", "snippet": "thanks" },
                { "sender": "b", "date": "2", "body": "coding round", "snippet": "technical round" },
                { "sender": "c", "date": "3", "body": "loop round" },
            ],
        });

        assert_eq!(extract_round(&task).as_deref(), Some("Coding Round"));
    }

    #[test]
    fn test_snippet_used_when_body_missing_or_without_match() {
        let missing_body = TaskRecord::new(doc! {
            "subject": "x",
            "replies": [ { "sender": "a", "date": "1", "snippet": "screening round done" } ],
        });
        assert_eq!(extract_round(&missing_body).as_deref(), Some("Screening"));

        let empty_body = TaskRecord::new(doc! {
            "subject": "x",
            "replies": [ { "sender": "a", "date": "1", "body": "", "snippet": "3rd round" } ],
        });
        assert_eq!(extract_round(&empty_body).as_deref(), Some("3rd Round"));
    }

    #[test]
    fn test_subject_used_when_replies_have_no_match() {
        let task = TaskRecord::new(doc! {
            "subject": "Interview Support - Jane Doe - 2nd round",
            "replies": [],
        });
        assert_eq!(extract_round(&task).as_deref(), Some("2nd Round"));
    }

    #[test]
    fn test_extract_returns_none_without_mentions() {
        let task = TaskRecord::new(doc! { "subject": "Interview Support - Jane Doe" });
        assert_eq!(extract_round(&task), None);
    }

    #[test]
    fn test_effective_round_precedence() {
        let with_override = TaskRecord::new(doc! {
            "subject": "final round",
            "actualRound": "round 2",
            "Interview Round": "Screening",
        });
        assert_eq!(effective_round(&with_override).as_deref(), Some("round 2"));

        let empty_override = TaskRecord::new(doc! {
            "subject": "final round",
            "actualRound": "",
            "Interview Round": "Screening",
        });
        assert_eq!(effective_round(&empty_override).as_deref(), Some("Final Round"));

        let legacy_only = TaskRecord::new(doc! {
            "subject": "no mention",
            "Interview Round": "Panel",
        });
        assert_eq!(effective_round(&legacy_only).as_deref(), Some("Panel"));

        let nothing = TaskRecord::new(doc! { "subject": "no mention", "Interview Round": "" });
        assert_eq!(effective_round(&nothing), None);
    }
}
