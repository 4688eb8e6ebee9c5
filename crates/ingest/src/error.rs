use std::fmt;

#[derive(Debug)]
pub enum IngestError {
    /// Input ended before a header row was produced.
    EmptyFile,
    /// A header row exists but no data row survived parsing.
    NoDataRows,
    /// The first line could not be read as a CSV record.
    HeaderRead(String),
    /// Hard decoding failure. Soft failures (lone surrogates, invalid
    /// sequences) are mapped to U+FFFD instead of raising this.
    EncodingDecode(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFile => write!(f, "empty file: no header row found"),
            Self::NoDataRows => write!(f, "file contains no data rows"),
            Self::HeaderRead(msg) => write!(f, "failed to read header row: {msg}"),
            Self::EncodingDecode(msg) => write!(f, "encoding decode failed: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}
