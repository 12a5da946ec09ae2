use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] harvest_core::Error),

    #[error("Malformed {method} payload: {source}")]
    MalformedPayload {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unreadable event stream: {0}")]
    Input(String),

    #[error("Event #{index} ({method}) could not be processed: {source}")]
    Event {
        index: usize,
        method: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
