use thiserror::Error;

/// Failure to decode a UI messages document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error parsing JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no messages found in the file")]
    Empty,
}
