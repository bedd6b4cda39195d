//! Shared API request/response types
//!
//! Used by the idesk-api handlers and by the idesk terminal client.

use serde::{Deserialize, Deserializer, Serialize};

/// `PATCH /api/mismatches` body
///
/// Bulk when `ids` is present, single otherwise. `actual_round` keeps the
/// absent/null distinction: `None` means the key was missing, `Some(None)`
/// is an explicit `actualRound: null`, which removes the override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(
        default,
        rename = "actualRound",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_round: Option<Option<String>>,
}

/// Maps a present key to `Some`, so `null` becomes `Some(None)`
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl RoundPatch {
    pub fn single(id: impl Into<String>, actual_round: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            ids: None,
            actual_round: Some(actual_round),
        }
    }

    pub fn bulk(ids: Vec<String>, actual_round: Option<String>) -> Self {
        Self {
            id: None,
            ids: Some(ids),
            actual_round: Some(actual_round),
        }
    }
}

/// `PATCH /api/validations` body; bulk when `ids` is present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Success body for PATCH endpoints; `count` only for bulk updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl PatchResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            count: None,
        }
    }

    pub fn with_count(count: u64) -> Self {
        Self {
            success: true,
            count: Some(count),
        }
    }
}

/// Error body returned with every 4xx/5xx
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_patch_unset_serializes_explicit_null() {
        let body = serde_json::to_value(RoundPatch::single("t-1", None)).unwrap();
        assert_eq!(body, json!({ "id": "t-1", "actualRound": null }));
    }

    #[test]
    fn test_round_patch_accepts_missing_fields() {
        let patch: RoundPatch = serde_json::from_value(json!({ "actualRound": "Final Round" })).unwrap();
        assert_eq!(patch.id, None);
        assert_eq!(patch.ids, None);
        assert_eq!(patch.actual_round, Some(Some("Final Round".to_string())));
    }

    #[test]
    fn test_round_patch_distinguishes_null_from_absent() {
        let cleared: RoundPatch = serde_json::from_value(json!({ "id": "t-1", "actualRound": null })).unwrap();
        assert_eq!(cleared.actual_round, Some(None));

        let untouched: RoundPatch = serde_json::from_value(json!({ "id": "t-1" })).unwrap();
        assert_eq!(untouched.actual_round, None);
        assert_eq!(serde_json::to_value(&untouched).unwrap(), json!({ "id": "t-1" }));
    }

    #[test]
    fn test_patch_response_omits_count_for_single() {
        assert_eq!(serde_json::to_value(PatchResponse::ok()).unwrap(), json!({ "success": true }));
        assert_eq!(
            serde_json::to_value(PatchResponse::with_count(3)).unwrap(),
            json!({ "success": true, "count": 3 })
        );
    }
}
