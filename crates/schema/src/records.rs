use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

/// Canonical identity row from the Source-of-Truth roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SotRecord {
    /// Stable primary key: lowercase email when present, employee id
    /// otherwise. Empty when the row carries neither.
    pub canonical_id: String,
    pub employee_id: String,
    pub display_name: String,
    /// Fuzzy-comparison key, see [`crate::normalize::normalize_name`].
    pub normalized_name: String,
    /// Always lowercase.
    pub email: String,
    pub department: String,
    pub manager: String,
    /// Always lowercase.
    pub employment_status: String,
    /// Nonempty values of every column whose header contains `admin`
    /// (case-insensitive), joined with `"; "` in sorted-header order.
    pub admin_info: String,
}

/// Observed access row from a downstream system export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteRecord {
    /// Always lowercase.
    pub email: String,
    pub user_id: String,
    pub display_name: String,
    /// Mapped role value, extended with admin-column values.
    pub role: String,
    pub entitlement: String,
    pub last_login: String,
    /// Always lowercase.
    pub account_status: String,
    /// Caller-supplied system label (`okta`, `aws-iam`, ...).
    pub source_file: String,
    /// 1-indexed row number in the original CSV; the header is row 0.
    pub source_row: usize,
}

// ---------------------------------------------------------------------------
// Column-map spec
// ---------------------------------------------------------------------------

/// Caller-supplied column map, decoded from the JSON spec string.
///
/// `direct` maps source headers to canonical field names; `concat` builds a
/// synthesized target from several source columns. An empty map means
/// "infer from header names".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMap {
    pub direct: HashMap<String, String>,
    pub concat: Vec<ConcatTransform>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatTransform {
    pub source_columns: Vec<String>,
    #[serde(default)]
    pub separator: String,
    pub target_field: String,
}

impl ColumnMap {
    /// Decode a caller-supplied spec. Empty or unparseable input yields the
    /// empty map, which makes downstream mapping fall back to inference.
    pub fn from_spec(spec: &str) -> ColumnMap {
        if spec.trim().is_empty() {
            return ColumnMap::default();
        }
        serde_json::from_str(spec).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.concat.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_spec_empty_string() {
        assert!(ColumnMap::from_spec("").is_empty());
        assert!(ColumnMap::from_spec("   ").is_empty());
    }

    #[test]
    fn from_spec_unparseable_falls_back_to_empty() {
        assert!(ColumnMap::from_spec("{not json").is_empty());
        assert!(ColumnMap::from_spec("[1,2,3]").is_empty());
    }

    #[test]
    fn from_spec_direct_and_concat() {
        let map = ColumnMap::from_spec(
            r#"{
                "direct": {"Work Email": "email"},
                "concat": [{
                    "sourceColumns": ["First", "Last"],
                    "separator": " ",
                    "targetField": "displayName"
                }]
            }"#,
        );
        assert_eq!(map.direct["Work Email"], "email");
        assert_eq!(map.concat.len(), 1);
        assert_eq!(map.concat[0].source_columns, vec!["First", "Last"]);
        assert_eq!(map.concat[0].separator, " ");
        assert_eq!(map.concat[0].target_field, "displayName");
        assert!(!map.is_empty());
    }
}
