//! Extraction failure taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is password protected; supply a password")]
    PasswordRequired,

    #[error("the supplied password was rejected")]
    WrongPassword,

    #[error("document produced no extractable text")]
    Empty,

    #[error("could not read document: {0}")]
    Unreadable(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
