//! Error types for the Epson Connect SDK

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Token exchange failed, either via an explicit error code in the
    /// response body or any failure during the exchange itself.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The service answered the transport successfully but embedded an
    /// application-level error code in the body.
    #[error("api error: {0}")]
    Api(String),

    #[error("{0}")]
    Client(String),

    #[error("{0}")]
    Printer(String),

    #[error("{0}")]
    Scanner(String),

    #[error("{0}")]
    PrintSetting(String),

    #[error(transparent)]
    Transport(#[from] reqwest_middleware::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
