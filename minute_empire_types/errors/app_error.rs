use thiserror::Error;

/// Errors for app logic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidCommand(String),

    #[error("Malformed document id: {0}")]
    MalformedId(String),

    #[error("Wrong authentication credentials")]
    WrongAuthCredentials,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Could not find a free map location for a new village")]
    NoFreeLocation,

    #[error(transparent)]
    PasswordHash(#[from] argon2::password_hash::Error),
}
