use super::super::{
    Token, TokenAuthDb, TokenAuthDbConfig, TokenAuthDbError, TokenAuthSqliteConfig, User,
};
use super::SqliteError;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use futures_util::lock::Mutex;
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};

/// Schema version. Bump the first element on incompatible changes.
const DB_VERSION: [u8; 4] = [1, 0, 0, 0];

const VERSION_TABLE: &'static str = "CREATE TABLE version (
id TEXT,
v1 INT,
v2 INT,
v3 INT,
v4 INT,
PRIMARY KEY (id)
);";
const USERS_TABLE: &'static str = "CREATE TABLE users (
id INTEGER PRIMARY KEY AUTOINCREMENT,
name TEXT NOT NULL,
email TEXT NOT NULL UNIQUE,
email_verified_at DATETIME,
password BLOB NOT NULL,
remember_token TEXT,
last_activity DATETIME,
created_at DATETIME NOT NULL,
updated_at DATETIME NOT NULL
);";
const TOKEN_TABLE: &'static str = "CREATE TABLE token (
id INTEGER PRIMARY KEY AUTOINCREMENT,
token TEXT NOT NULL,
user_id INTEGER,
expires_at DATETIME NOT NULL,
created_at DATETIME NOT NULL
);
CREATE INDEX token_token ON token (token);
CREATE INDEX token_expires_at ON token (expires_at);";

const USER_COLUMNS: &'static str = "id, name, email, email_verified_at, password, remember_token, last_activity, created_at, updated_at";

pub struct TokenAuthSqlite {
    db: Mutex<Connection>,
}

fn row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let password: Vec<u8> = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        email_verified_at: row.get(3)?,
        password: BytesMut::from(password.as_slice()),
        remember_token: row.get(5)?,
        last_activity: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn row_to_token(row: &Row) -> Result<Token, rusqlite::Error> {
    Ok(Token {
        id: row.get(0)?,
        token: row.get(1)?,
        user_id: row.get(2)?,
        expires_at: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl TokenAuthSqlite {
    fn _new(cfg: &TokenAuthSqliteConfig) -> Result<Self, SqliteError> {
        let con = Connection::open_with_flags(
            &cfg.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self {
            db: Mutex::new(con),
        })
    }

    async fn _add_token(
        &self,
        token: &str,
        user_id: Option<u64>,
        created_at: &DateTime<Utc>,
        expires_at: &DateTime<Utc>,
    ) -> Result<Token, SqliteError> {
        let con = self.db.lock().await;
        con.execute(
            "INSERT INTO token (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?);",
            params![token, user_id, expires_at, created_at],
        )?;
        Ok(Token {
            id: con.last_insert_rowid() as u64,
            user_id,
            token: token.to_owned(),
            created_at: created_at.clone(),
            expires_at: expires_at.clone(),
        })
    }

    async fn _add_user(
        &self,
        name: &str,
        email: &str,
        password: &[u8],
    ) -> Result<User, SqliteError> {
        let now = Utc::now();
        let con = self.db.lock().await;
        match con.execute(
            "INSERT INTO users (name, email, password, created_at, updated_at) VALUES (?, ?, ?, ?, ?);",
            params![name, email, password, now, now],
        ) {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(SqliteError::EmailAlreadyExists);
            }
            Err(e) => return Err(SqliteError::from(e)),
        }
        Ok(User {
            id: con.last_insert_rowid() as u64,
            name: name.to_owned(),
            email: email.to_owned(),
            email_verified_at: None,
            password: BytesMut::from(password),
            remember_token: None,
            last_activity: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn _check_database(&self) -> Result<(), SqliteError> {
        let con = self.db.lock().await;
        let exists = con
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='version';",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .is_some();
        if !exists {
            let tx = con.unchecked_transaction()?;
            tx.execute_batch(VERSION_TABLE)?;
            tx.execute_batch(USERS_TABLE)?;
            tx.execute_batch(TOKEN_TABLE)?;
            tx.execute(
                "INSERT INTO version VALUES ('main', ?, ?, ?, ?);",
                params![DB_VERSION[0], DB_VERSION[1], DB_VERSION[2], DB_VERSION[3]],
            )?;
            tx.commit()?;
            return Ok(());
        }
        let v1: u8 = con.query_row("SELECT v1 FROM version WHERE id = 'main';", [], |row| {
            row.get(0)
        })?;
        if v1 > DB_VERSION[0] {
            return Err(SqliteError::DatabaseVersionTooNew);
        }
        Ok(())
    }

    async fn _delete_token(&self, id: u64) -> Result<(), SqliteError> {
        let con = self.db.lock().await;
        con.execute("DELETE FROM token WHERE id = ?;", [id])?;
        Ok(())
    }

    async fn _delete_user(&self, id: u64) -> Result<bool, SqliteError> {
        let con = self.db.lock().await;
        Ok(con.execute("DELETE FROM users WHERE id = ?;", [id])? > 0)
    }

    async fn _get_token_by_value(&self, token: &str) -> Result<Option<Token>, SqliteError> {
        let con = self.db.lock().await;
        Ok(con
            .query_row(
                "SELECT id, token, user_id, expires_at, created_at FROM token WHERE token = ? LIMIT 1;",
                [token],
                row_to_token,
            )
            .optional()?)
    }

    async fn _get_user(&self, id: u64) -> Result<Option<User>, SqliteError> {
        let con = self.db.lock().await;
        Ok(con
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?;", USER_COLUMNS),
                [id],
                row_to_user,
            )
            .optional()?)
    }

    async fn _get_user_by_email(&self, email: &str) -> Result<Option<User>, SqliteError> {
        let con = self.db.lock().await;
        Ok(con
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?;", USER_COLUMNS),
                [email],
                row_to_user,
            )
            .optional()?)
    }

    async fn _revoke_expired_tokens(&self, now: &DateTime<Utc>) -> Result<usize, SqliteError> {
        let con = self.db.lock().await;
        Ok(con.execute("DELETE FROM token WHERE expires_at <= ?;", [now])?)
    }

    async fn _update_user_last_activity(
        &self,
        id: u64,
        at: &DateTime<Utc>,
    ) -> Result<(), SqliteError> {
        let con = self.db.lock().await;
        con.execute(
            "UPDATE users SET last_activity = ?, updated_at = ? WHERE id = ?;",
            params![at, at, id],
        )?;
        Ok(())
    }
}

#[async_trait]
impl TokenAuthDb for TokenAuthSqlite {
    #[allow(unreachable_patterns)]
    fn new<R: AsRef<TokenAuthDbConfig> + ?Sized>(cfg: &R) -> Result<Self, TokenAuthDbError> {
        match cfg.as_ref() {
            TokenAuthDbConfig::Sqlite(cfg) => {
                let db = Self::_new(cfg)?;
                Ok(db)
            }
            _ => Err(Box::from("Config mismatched.")),
        }
    }

    async fn add_token(
        &self,
        token: &str,
        user_id: Option<u64>,
        created_at: &DateTime<Utc>,
        expires_at: &DateTime<Utc>,
    ) -> Result<Token, TokenAuthDbError> {
        Ok(self._add_token(token, user_id, created_at, expires_at).await?)
    }

    async fn add_user(
        &self,
        name: &str,
        email: &str,
        password: &[u8],
    ) -> Result<User, TokenAuthDbError> {
        Ok(self._add_user(name, email, password).await?)
    }

    async fn delete_token(&self, id: u64) -> Result<(), TokenAuthDbError> {
        Ok(self._delete_token(id).await?)
    }

    async fn delete_user(&self, id: u64) -> Result<bool, TokenAuthDbError> {
        Ok(self._delete_user(id).await?)
    }

    async fn get_token_by_value(&self, token: &str) -> Result<Option<Token>, TokenAuthDbError> {
        Ok(self._get_token_by_value(token).await?)
    }

    async fn get_user(&self, id: u64) -> Result<Option<User>, TokenAuthDbError> {
        Ok(self._get_user(id).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TokenAuthDbError> {
        Ok(self._get_user_by_email(email).await?)
    }

    async fn init(&self) -> Result<(), TokenAuthDbError> {
        Ok(self._check_database().await?)
    }

    async fn revoke_expired_tokens(&self, now: &DateTime<Utc>) -> Result<usize, TokenAuthDbError> {
        Ok(self._revoke_expired_tokens(now).await?)
    }

    async fn update_user_last_activity(
        &self,
        id: u64,
        at: &DateTime<Utc>,
    ) -> Result<(), TokenAuthDbError> {
        Ok(self._update_user_last_activity(id, at).await?)
    }
}

#[cfg(test)]
async fn open_memory() -> TokenAuthSqlite {
    let db = TokenAuthSqlite::new(&TokenAuthDbConfig::memory()).unwrap();
    db.init().await.unwrap();
    db
}

#[tokio::test]
async fn test_sqlite_users() {
    let db = open_memory().await;
    db.init().await.unwrap();
    let user = db.add_user("test", "test@example.com", b"hash").await.unwrap();
    assert_eq!(user.name, "test");
    assert!(user.last_activity.is_none());
    let re = db.add_user("test2", "test@example.com", b"hash").await;
    assert!(re.is_err());
    let found = db.get_user_by_email("test@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(&found.password[..], b"hash");
    assert!(db.get_user_by_email("TEST@example.org").await.unwrap().is_none());
    let now = Utc::now();
    db.update_user_last_activity(user.id, &now).await.unwrap();
    let found = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(found.last_activity, Some(now));
    assert!(db.delete_user(user.id).await.unwrap());
    assert!(!db.delete_user(user.id).await.unwrap());
    assert!(db.get_user(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_sqlite_tokens() {
    let db = open_memory().await;
    let now = Utc::now();
    let expired = db
        .add_token("expired", Some(1), &now, &(now - chrono::Duration::seconds(1)))
        .await
        .unwrap();
    let edge = db.add_token("edge", Some(1), &now, &now).await.unwrap();
    let valid = db
        .add_token("valid", None, &now, &(now + chrono::Duration::days(1)))
        .await
        .unwrap();
    let found = db.get_token_by_value("valid").await.unwrap().unwrap();
    assert_eq!(found, valid);
    assert!(db.get_token_by_value("VALID").await.unwrap().is_none());
    assert_eq!(db.revoke_expired_tokens(&now).await.unwrap(), 2);
    assert!(db.get_token_by_value(&expired.token).await.unwrap().is_none());
    assert!(db.get_token_by_value(&edge.token).await.unwrap().is_none());
    assert!(db.get_token_by_value("valid").await.unwrap().is_some());
    db.delete_token(valid.id).await.unwrap();
    db.delete_token(valid.id).await.unwrap();
    assert!(db.get_token_by_value("valid").await.unwrap().is_none());
}
