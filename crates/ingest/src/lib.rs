//! `attest-ingest` — encoding detection and forgiving CSV parsing.
//!
//! Pure ingestion crate: raw export bytes in, header + rows + warnings out.
//! No file or network IO.

pub mod csv;
pub mod encoding;
pub mod error;

pub use self::csv::{parse, DataRow, ParseWarning, ParsedCsv};
pub use self::encoding::{detect_and_decode, SourceEncoding};
pub use self::error::IngestError;
