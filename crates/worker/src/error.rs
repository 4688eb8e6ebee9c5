use std::fmt;

use attest_engine::EngineError;
use attest_ingest::IngestError;

#[derive(Debug)]
pub enum WorkerError {
    Ingest(IngestError),
    Engine(EngineError),
    /// Satellite join requested before an index was built or loaded.
    PreconditionIndex,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingest(e) => write!(f, "{e}"),
            Self::Engine(e) => write!(f, "{e}"),
            Self::PreconditionIndex => {
                write!(f, "SoT index not loaded: call load_sot_index first")
            }
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ingest(e) => Some(e),
            Self::Engine(e) => Some(e),
            Self::PreconditionIndex => None,
        }
    }
}

impl From<IngestError> for WorkerError {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

impl From<EngineError> for WorkerError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}
