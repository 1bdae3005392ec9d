pub mod credential;
pub mod error;
pub mod password;
pub mod session;
pub mod token;
pub mod validate;

pub use credential::{Authenticator, LoginOutcome};
pub use error::AuthError;
pub use password::{CredentialHasher, Pbkdf2Hasher, PASSWORD_ITER};
pub use session::{MemorySessionStore, Session, SessionStore};
pub use token::{TokenIssuer, TokenResolver, TOKEN_EXPIRY_DAYS, TOKEN_LENGTH};
pub use validate::{RegisterForm, ValidationErrors};
