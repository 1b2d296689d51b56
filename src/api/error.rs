use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {path}")]
    Status { status: u16, path: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Response carried no data")]
    MissingData,
}
