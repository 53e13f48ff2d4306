//! The error type shared by the store, the recorder, and the HTTP layer.

use crate::models::Role;

/// Convenient result alias for attendance operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An account with this email already exists for the given role.
    #[error("email already registered as {0}")]
    DuplicateEmail(Role),

    /// Login failed. Deliberately does not say whether the email or the password was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A required form field was blank or absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A required form field was present but malformed.
    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The session refers to an account that is no longer in the store.
    #[error("{0} not found")]
    NotFound(Role),

    /// No students matched the section key, so there is nothing to record.
    #[error("no students found for this section")]
    EmptyRoster,

    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Connection(#[from] diesel::ConnectionError),

    #[error("failed to run migrations: {0}")]
    Migration(String),

    /// The store could not be reached from the request thread.
    #[error("attendance store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error comes from a caller mistake rather than a broken server.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateEmail(_)
                | Error::InvalidCredentials
                | Error::MissingField(_)
                | Error::InvalidField { .. }
                | Error::NotFound(_)
                | Error::EmptyRoster
        )
    }

    /// The message shown to the person using the site.
    pub fn user_message(&self) -> String {
        match self {
            Error::DuplicateEmail(role) => format!("Email already registered as {role}."),
            Error::InvalidCredentials => "Invalid email or password.".to_string(),
            Error::MissingField(_) => "Please fill all fields.".to_string(),
            Error::InvalidField { field, .. } => format!("Invalid value for {field}."),
            Error::NotFound(role) => format!("{} not found.", role.title()),
            Error::EmptyRoster => "No students found for this section.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}
