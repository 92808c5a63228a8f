// database/error.rs - error type shared by every shop query

use mongodb::error::{ErrorKind, WriteFailure};

// Server code returned when a unique index rejects a write
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("shop not found: {0}")]
    NotFound(String),
    #[error("shop already exists: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ShopError {
    /// Maps a driver error raised while writing the record for `domain`.
    pub fn from_write(domain: &str, error: mongodb::error::Error) -> Self {
        if is_duplicate_key(&error) {
            ShopError::Conflict(domain.to_string())
        } else {
            ShopError::Db(error.to_string())
        }
    }
}

impl From<mongodb::error::Error> for ShopError {
    fn from(error: mongodb::error::Error) -> Self {
        ShopError::Db(error.to_string())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
