//! `attest-worker` — the per-instance engine façade.
//!
//! One [`Engine`] lives in each isolated worker. The SoT index is built by
//! `parse_sot` or hydrated by `load_sot_index`, then satellite files are
//! joined against it. Instances never share memory; the serialized index is
//! the only thing that travels between them.

pub mod envelope;
pub mod error;
mod instance;

pub use error::WorkerError;
pub use instance::{Engine, SotParseOutput};
