use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Serenity(#[from] serenity::Error),

    #[error("invalid discord config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("no discord token configured")]
    MissingToken,
}

pub type Result<T> = std::result::Result<T, Error>;
