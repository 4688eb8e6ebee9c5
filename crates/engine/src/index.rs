//! The indexed Source-of-Truth directory.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use attest_schema::SotRecord;

use crate::error::EngineError;

/// Aggregate statistics computed when the index is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_records: usize,
    pub active_count: usize,
    pub terminated_count: usize,
    pub unique_emails: usize,
}

/// Read-only directory of SoT records, indexed three ways.
///
/// Built once from a record list and never mutated afterwards. Email and
/// employee-id lookups keep the first occurrence on duplicate keys; the name
/// multimap keeps every record in insertion order. The name map is a
/// `BTreeMap` so the broad fuzzy scan walks keys in a deterministic order.
#[derive(Debug)]
pub struct SotIndex {
    records: Vec<SotRecord>,
    by_email: HashMap<String, usize>,
    by_employee_id: HashMap<String, usize>,
    by_name: BTreeMap<String, Vec<usize>>,
    stats: IndexStats,
}

/// Transport form: the record list in insertion order plus the stats
/// computed at build time. The three lookup maps are rebuilt on hydration.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerializedIndex {
    records: Vec<SotRecord>,
    stats: IndexStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SerializedIndexRef<'a> {
    records: &'a [SotRecord],
    stats: IndexStats,
}

impl SotIndex {
    pub fn build(records: Vec<SotRecord>) -> SotIndex {
        let mut by_email = HashMap::with_capacity(records.len());
        let mut by_employee_id = HashMap::with_capacity(records.len());
        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut active_count = 0;
        let mut terminated_count = 0;

        for (i, record) in records.iter().enumerate() {
            if !record.email.is_empty() {
                by_email.entry(record.email.to_lowercase()).or_insert(i);
            }
            if !record.employee_id.is_empty() {
                by_employee_id.entry(record.employee_id.clone()).or_insert(i);
            }
            if !record.normalized_name.is_empty() {
                by_name
                    .entry(record.normalized_name.clone())
                    .or_default()
                    .push(i);
            }
            // Leave, contractor, and empty statuses all count as active.
            if record.employment_status == "terminated" {
                terminated_count += 1;
            } else {
                active_count += 1;
            }
        }

        let stats = IndexStats {
            total_records: records.len(),
            active_count,
            terminated_count,
            unique_emails: by_email.len(),
        };

        SotIndex {
            records,
            by_email,
            by_employee_id,
            by_name,
            stats,
        }
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    pub fn records(&self) -> &[SotRecord] {
        &self.records
    }

    pub fn lookup_email(&self, email: &str) -> Option<&SotRecord> {
        self.by_email.get(email).map(|&i| &self.records[i])
    }

    pub fn lookup_employee_id(&self, id: &str) -> Option<&SotRecord> {
        self.by_employee_id.get(id).map(|&i| &self.records[i])
    }

    /// Records sharing the given normalized name, in insertion order.
    pub fn lookup_name(&self, normalized: &str) -> Option<Vec<&SotRecord>> {
        self.by_name
            .get(normalized)
            .map(|ids| ids.iter().map(|&i| &self.records[i]).collect())
    }

    /// Every name-indexed record, walking normalized names in sorted order
    /// and candidate lists in insertion order. This is the broad-scan
    /// traversal; its determinism is what makes fuzzy ties reproducible.
    pub fn name_candidates(&self) -> impl Iterator<Item = &SotRecord> + '_ {
        self.by_name
            .values()
            .flat_map(move |ids| ids.iter().map(move |&i| &self.records[i]))
    }

    /// Serialize for transport to another worker instance.
    pub fn serialize(&self) -> String {
        serde_json::to_string(&SerializedIndexRef {
            records: &self.records,
            stats: self.stats,
        })
        .unwrap_or_else(|_| {
            String::from(
                r#"{"records":[],"stats":{"totalRecords":0,"activeCount":0,"terminatedCount":0,"uniqueEmails":0}}"#,
            )
        })
    }

    /// Rebuild an index from its serialized form.
    ///
    /// The lookup maps are reconstructed from the record list; the stats are
    /// restored verbatim from the payload rather than recomputed, because
    /// they were computed where the roster was parsed.
    pub fn deserialize(data: &str) -> Result<SotIndex, EngineError> {
        let payload: SerializedIndex = serde_json::from_str(data)
            .map_err(|e| EngineError::DeserializeIndex(e.to_string()))?;
        let mut index = SotIndex::build(payload.records);
        index.stats = payload.stats;
        Ok(index)
    }
}
