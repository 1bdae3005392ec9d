use crate::ext::try_err::TryErr;
use crate::gettext;
use json::JsonValue;

#[cfg(feature = "db_sqlite")]
#[derive(Clone, Debug)]
pub struct TokenAuthSqliteConfig {
    /// The path of database file. `:memory:` keeps everything in memory.
    pub path: String,
}

#[cfg(feature = "db_sqlite")]
impl Default for TokenAuthSqliteConfig {
    fn default() -> Self {
        Self {
            path: "tokenauth.db".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum TokenAuthDbConfig {
    #[cfg(feature = "db_sqlite")]
    Sqlite(TokenAuthSqliteConfig),
    #[allow(dead_code)]
    /// No default config is provided
    None,
}

#[derive(Debug)]
pub enum TokenAuthDbConfigError {
    UnkonwnDbType,
    MissingField(String),
}

impl std::fmt::Display for TokenAuthDbConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnkonwnDbType => write!(f, "{}", gettext("Unknown database type.")),
            Self::MissingField(s) => write!(f, "{} {}", gettext("Missing field:"), s),
        }
    }
}

impl std::error::Error for TokenAuthDbConfigError {}

impl TokenAuthDbConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn new(value: &JsonValue) -> Result<Self, TokenAuthDbConfigError> {
        let db_type = value["type"]
            .as_str()
            .try_err(TokenAuthDbConfigError::UnkonwnDbType)?;
        match db_type {
            #[cfg(feature = "db_sqlite")]
            "sqlite" => {
                let path = value["path"]
                    .as_str()
                    .try_err(TokenAuthDbConfigError::MissingField("path".to_string()))?;
                Ok(Self::Sqlite(TokenAuthSqliteConfig {
                    path: path.to_string(),
                }))
            }
            _ => Err(TokenAuthDbConfigError::UnkonwnDbType),
        }
    }

    #[cfg(feature = "db_sqlite")]
    /// An in-memory sqlite database
    pub fn memory() -> Self {
        Self::Sqlite(TokenAuthSqliteConfig {
            path: ":memory:".to_string(),
        })
    }
}

impl AsRef<TokenAuthDbConfig> for TokenAuthDbConfig {
    fn as_ref(&self) -> &TokenAuthDbConfig {
        self
    }
}

impl Default for TokenAuthDbConfig {
    fn default() -> Self {
        #[cfg(feature = "db_sqlite")]
        return Self::Sqlite(TokenAuthSqliteConfig::default());
        #[cfg(not(feature = "db_sqlite"))]
        return Self::None;
    }
}

pub fn check_db_config(value: &JsonValue) -> bool {
    TokenAuthDbConfig::new(value).is_ok()
}

#[test]
fn test_db_config() {
    let cfg = TokenAuthDbConfig::new(&json::object! {"type": "sqlite", "path": "a.db"}).unwrap();
    match cfg {
        TokenAuthDbConfig::Sqlite(c) => assert_eq!(c.path, "a.db"),
        _ => panic!("Config mismatched."),
    }
    assert!(matches!(
        TokenAuthDbConfig::new(&json::object! {"type": "sqlite"}),
        Err(TokenAuthDbConfigError::MissingField(_))
    ));
    assert!(!check_db_config(&json::object! {"type": "mysql"}));
    assert!(!check_db_config(&json::object! {}));
}
