pub mod config;
#[cfg(feature = "db_sqlite")]
pub mod sqlite;
pub mod token;
pub mod traits;
pub mod user;

pub use config::check_db_config;
pub use config::TokenAuthDbConfig;
#[cfg(feature = "db_sqlite")]
pub use config::TokenAuthSqliteConfig;
#[cfg(feature = "db_sqlite")]
pub use sqlite::{SqliteError, TokenAuthSqlite};
pub use token::Token;
pub use traits::TokenAuthDb;
pub use user::{User, UserInfo};
pub type TokenAuthDbError = Box<dyn std::error::Error + Send + Sync>;
/// A database handle shared between the server context and the auth services
pub type TokenAuthDbRef = std::sync::Arc<Box<dyn TokenAuthDb + Send + Sync>>;

use crate::gettext;

#[cfg(not(feature = "db_sqlite"))]
compile_error!("No database backend is enabled.");

/// Open the database
pub fn open_database<R: AsRef<TokenAuthDbConfig> + ?Sized>(
    cfg: &R,
) -> Result<Box<dyn TokenAuthDb + Send + Sync>, TokenAuthDbError> {
    let cfg = cfg.as_ref();
    if cfg.is_none() {
        return Err(Box::from(gettext("No database configuration provided.")));
    }
    #[cfg(feature = "db_sqlite")]
    {
        if matches!(cfg, TokenAuthDbConfig::Sqlite(_)) {
            return Ok(Box::new(TokenAuthSqlite::new(cfg)?));
        }
    }
    Err(Box::from(gettext("Unknown database type.")))
}

/// Open the database and initialize it
pub async fn open_and_init_database<R: AsRef<TokenAuthDbConfig> + ?Sized>(
    cfg: &R,
) -> Result<Box<dyn TokenAuthDb + Send + Sync>, TokenAuthDbError> {
    let db = open_database(cfg)?;
    db.init().await?;
    Ok(db)
}

/// Whether the error is caused by adding a user with a taken email
pub fn is_email_conflict(e: &TokenAuthDbError) -> bool {
    #[cfg(feature = "db_sqlite")]
    {
        if matches!(
            e.downcast_ref::<SqliteError>(),
            Some(SqliteError::EmailAlreadyExists)
        ) {
            return true;
        }
    }
    false
}
