use super::validate::ValidationErrors;
use crate::db::TokenAuthDbError;
use crate::gettext;

/// Failures of the authentication subsystem
#[derive(Debug)]
pub enum AuthError {
    /// Email or password is wrong. Never tells which one.
    InvalidCredentials,
    /// Registration payload is invalid. Holds every failing field.
    Validation(ValidationErrors),
    TokenNotFound,
    /// The token was expired and has been deleted.
    TokenExpired,
    /// The token is valid but its owner does not exist (deleted user or null owner).
    UserNotFound,
    Db(TokenAuthDbError),
    /// The password could not be hashed.
    PasswordHash(String),
}

impl AuthError {
    /// HTTP status used at the boundary
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidCredentials => 401,
            Self::Validation(_) => 422,
            Self::TokenNotFound => 404,
            Self::TokenExpired => 401,
            Self::UserNotFound => 500,
            Self::Db(_) => 500,
            Self::PasswordHash(_) => 500,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "{}", gettext("Invalid login credentials!")),
            Self::Validation(e) => match e.first_message() {
                Some(msg) => write!(f, "{}", msg),
                None => write!(f, "{}", gettext("The given data was invalid.")),
            },
            Self::TokenNotFound => write!(f, "{}", gettext("Token not found")),
            Self::TokenExpired => write!(f, "{}", gettext("Token has expired")),
            Self::UserNotFound => write!(f, "{}", gettext("No corresponding user was found.")),
            Self::Db(e) => write!(f, "{} {}", gettext("Failed to operate the database:"), e),
            Self::PasswordHash(e) => write!(f, "{} {}", gettext("Failed to hash password:"), e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenAuthDbError> for AuthError {
    fn from(e: TokenAuthDbError) -> Self {
        Self::Db(e)
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}
