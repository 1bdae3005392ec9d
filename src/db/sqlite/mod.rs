pub mod db;
pub mod error;

pub use db::TokenAuthSqlite;
pub use error::SqliteError;
