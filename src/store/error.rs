//! Error types for link store operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token collision persisted after {attempts} attempts")]
    TokenCollision { attempts: u32 },
}
