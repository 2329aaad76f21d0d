use thiserror::Error;

/// Failures talking to the Log Service. Engine operations log these and
/// report an outcome instead of returning them.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to log service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("log service answered {0}")]
    Status(reqwest::StatusCode),

    #[error("push channel error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
}
