//! The engine instance: one per worker, holding at most one SoT index.

use serde::Serialize;

use attest_engine::{join, IndexStats, JoinResult, SotIndex};
use attest_ingest::ParseWarning;
use attest_schema::{build_satellite_records, build_sot_records, ColumnMap};

use crate::error::WorkerError;

/// Success payload of [`Engine::parse_sot`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SotParseOutput {
    pub stats: IndexStats,
    /// Transport form of the built index, for hydration in other instances.
    pub serialized_index: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

/// A worker-instance engine.
///
/// The index slot goes uninitialized, then initialized by `parse_sot` or
/// `load_sot_index`, then replaced wholesale by any later successful call.
/// A failed operation returns an error and leaves the slot untouched; there
/// is no partial state.
#[derive(Debug, Default)]
pub struct Engine {
    index: Option<SotIndex>,
}

impl Engine {
    pub fn new() -> Engine {
        Engine { index: None }
    }

    /// Parse the Source-of-Truth roster, build and install the index, and
    /// return its stats plus the serialized form for other instances.
    pub fn parse_sot(
        &mut self,
        csv_bytes: &[u8],
        column_map_spec: &str,
    ) -> Result<SotParseOutput, WorkerError> {
        let parsed = attest_ingest::parse(csv_bytes)?;
        let map = ColumnMap::from_spec(column_map_spec);
        let records = build_sot_records(&parsed, &map);
        let index = SotIndex::build(records);

        let output = SotParseOutput {
            stats: index.stats(),
            serialized_index: index.serialize(),
            warnings: parsed.warnings,
        };
        self.index = Some(index);
        Ok(output)
    }

    /// Hydrate the index slot from another instance's serialized payload.
    pub fn load_sot_index(&mut self, serialized: &str) -> Result<(), WorkerError> {
        let index = SotIndex::deserialize(serialized)?;
        self.index = Some(index);
        Ok(())
    }

    /// Join one satellite export against the loaded index.
    pub fn parse_satellite(
        &self,
        csv_bytes: &[u8],
        system_name: &str,
        column_map_spec: &str,
    ) -> Result<JoinResult<'_>, WorkerError> {
        let index = self.index.as_ref().ok_or(WorkerError::PreconditionIndex)?;
        let parsed = attest_ingest::parse(csv_bytes)?;
        let map = ColumnMap::from_spec(column_map_spec);
        let satellites = build_satellite_records(&parsed, system_name, &map);
        Ok(join(index, &satellites))
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }
}
