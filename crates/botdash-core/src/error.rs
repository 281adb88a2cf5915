use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Dashboard API error: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
