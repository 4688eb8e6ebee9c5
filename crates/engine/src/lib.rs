//! `attest-engine` — SoT directory, join cascade, conflict detection, and
//! risk scoring.
//!
//! Pure engine crate: receives canonical records, returns classified
//! findings. No IO dependencies.

pub mod conflict;
pub mod error;
pub mod index;
pub mod join;
pub mod risk;
pub mod similarity;

pub use conflict::{detect_conflicts, FieldConflict};
pub use error::EngineError;
pub use index::{IndexStats, SotIndex};
pub use join::{join, JoinResult, JoinStats, MatchType, MatchedRecord, OrphanRecord};
pub use risk::{RiskLevel, DEFAULT_PRIVILEGED_KEYWORDS};
pub use similarity::similarity;
