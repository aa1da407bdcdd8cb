use diesel::r2d2::PoolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Db(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("failed to serialize stored data: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The stored payload could not be turned back into a domain object.
    #[error("failed to deserialize stored data: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The token sweep needs a tokio runtime to run on.
    #[error("no tokio runtime to drive the token sweep: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}
