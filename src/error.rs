use thiserror::Error;

#[derive(Error, Debug)]
pub enum SumforgeError {
    #[error("unknown pool: {0}")]
    UnknownPool(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("unknown target constant: {0}")]
    UnknownTarget(String),

    #[error("invalid seed formula: {0}")]
    ParseFormula(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SumforgeError>;
