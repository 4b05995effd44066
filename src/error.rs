use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required environment variable {0}")]
    MissingCredential(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The exchange rejected the request. These bodies can arrive with a 200
    /// status as well as 4xx/5xx.
    #[error("exchange error {code}: {msg}")]
    Exchange { code: i64, msg: String },

    #[error("failed to decode {context} response: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected {status} response from {context}: {body}")]
    UnexpectedResponse {
        context: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("empty ticker array from {0}")]
    EmptyTicker(&'static str),

    #[error("unparsable amount {value:?} for asset {asset}")]
    InvalidAmount { asset: String, value: String },
}
