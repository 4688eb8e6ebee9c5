//! `attest-schema` — canonical identity records, column mapping, and
//! unicode-aware name normalization.
//!
//! Sits between the raw CSV parser and the join engine: raw rows go in,
//! canonical [`SotRecord`]s and [`SatelliteRecord`]s come out.

pub mod mapping;
pub mod normalize;
pub mod records;

pub use mapping::{infer_mappings, FieldMapper};
pub use normalize::{build_satellite_records, build_sot_records, normalize_name};
pub use records::{ColumnMap, ConcatTransform, SatelliteRecord, SotRecord};
