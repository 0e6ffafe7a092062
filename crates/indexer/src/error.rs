use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("request to index failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed index response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0} returned neither result nor error")]
    EmptyResult(String),
}
