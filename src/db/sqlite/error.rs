#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum SqliteError {
    DbError(rusqlite::Error),
    #[display(fmt = "The database was created by a newer version.")]
    DatabaseVersionTooNew,
    #[display(fmt = "Email already exists.")]
    EmailAlreadyExists,
}

impl std::error::Error for SqliteError {}
