//! JSON result envelopes for the instance boundary.
//!
//! Whatever transport hosts the engine (wasm bridge, IPC, tests) calls
//! these and ships the string. Success envelopes serialize the operation
//! result; failures are `{"error": "..."}` with the error's display text
//! passed through verbatim.

use serde_json::json;

use crate::error::WorkerError;
use crate::instance::Engine;

pub fn parse_sot(engine: &mut Engine, csv_bytes: &[u8], column_map_spec: &str) -> String {
    match engine.parse_sot(csv_bytes, column_map_spec) {
        Ok(output) => to_json(&output),
        Err(e) => error_envelope(&e),
    }
}

pub fn load_sot_index(engine: &mut Engine, serialized: &str) -> String {
    match engine.load_sot_index(serialized) {
        Ok(()) => r#"{"ok":true}"#.to_string(),
        Err(e) => error_envelope(&e),
    }
}

pub fn parse_satellite(
    engine: &Engine,
    csv_bytes: &[u8],
    system_name: &str,
    column_map_spec: &str,
) -> String {
    match engine.parse_satellite(csv_bytes, system_name, column_map_spec) {
        Ok(result) => to_json(&result),
        Err(e) => error_envelope(&e),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
}

fn error_envelope(error: &WorkerError) -> String {
    json!({ "error": error.to_string() }).to_string()
}
