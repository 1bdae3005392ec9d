#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum TokenAuthError {
    String(String),
    Auth(crate::auth::AuthError),
    DbError(crate::db::TokenAuthDbError),
    Hyper(hyper::Error),
    HTTP(http::Error),
    IOError(std::io::Error),
    FromUtf8Error(std::string::FromUtf8Error),
    ToStrError(http::header::ToStrError),
    JSONError(json::Error),
    SerdeJSONError(serde_json::Error),
}

impl std::error::Error for TokenAuthError {}

impl From<&str> for TokenAuthError {
    fn from(p: &str) -> Self {
        Self::String(String::from(p))
    }
}

impl From<http::header::InvalidHeaderValue> for TokenAuthError {
    fn from(v: http::header::InvalidHeaderValue) -> Self {
        Self::HTTP(http::Error::from(v))
    }
}
