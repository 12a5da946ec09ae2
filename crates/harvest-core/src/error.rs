use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read or write HAR file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid HAR structure: {0}")]
    InvalidStructure(String),

    #[error("Malformed {mime_type} post data: {reason}")]
    MalformedPostData { mime_type: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
