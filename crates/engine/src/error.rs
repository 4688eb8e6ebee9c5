use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// Malformed serialized index payload.
    DeserializeIndex(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeserializeIndex(msg) => {
                write!(f, "failed to deserialize SoT index: {msg}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
