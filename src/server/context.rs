use super::cookie::{parse_cookie_header, SetCookie, AUTH_TOKEN_COOKIE, COOKIE_EXPIRY_DAYS};
use super::cors::CorsContext;
use super::result::{JSONResult, SerdeJSONResult, SerdeJSONResult2};
use crate::auth::{
    Authenticator, CredentialHasher, MemorySessionStore, Pbkdf2Hasher, SessionStore, TokenResolver,
};
use crate::db::{open_and_init_database, TokenAuthDbRef};
use crate::error::TokenAuthError;
use crate::ext::json::ToJson2;
use crate::gettext;
use crate::opthelper::OptHelper;
use chrono::{DateTime, Duration, Utc};
use hyper::{http::response::Builder, Body, Request, Response};
use json::JsonValue;
use std::sync::Arc;

/// Default name of the session cookie
pub const DEFAULT_SESSION_COOKIE: &'static str = "tokenauth_session";

/// Cookie related settings
#[derive(Clone, Debug)]
pub struct CookieConfig {
    /// Domain attribute of issued cookies. Host-only when unset.
    pub domain: Option<String>,
    /// Name of the session cookie
    pub session_cookie: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: None,
            session_cookie: String::from(DEFAULT_SESSION_COOKIE),
        }
    }
}

pub struct ServerContext {
    pub cors: CorsContext,
    pub db: TokenAuthDbRef,
    pub auth: Authenticator,
    pub resolver: TokenResolver,
    pub cookie: CookieConfig,
}

impl ServerContext {
    pub fn new(
        db: TokenAuthDbRef,
        hasher: Arc<dyn CredentialHasher + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
        cors: CorsContext,
        cookie: CookieConfig,
    ) -> Self {
        Self {
            cors,
            auth: Authenticator::new(db.clone(), hasher, sessions),
            resolver: TokenResolver::new(db.clone()),
            db,
            cookie,
        }
    }

    /// Open the database and build every collaborator from the settings.
    pub async fn from_helper(helper: &OptHelper<'_>) -> Result<Self, TokenAuthError> {
        let db = match open_and_init_database(&helper.db()).await {
            Ok(db) => Arc::new(db),
            Err(e) => {
                log::error!(target: "tokenauth::server", "{} {}", gettext("Failed to open database:"), e);
                return Err(TokenAuthError::DbError(e));
            }
        };
        let cors = match CorsContext::from_strings(
            helper.cors_allow_all(),
            &helper.cors_entries(),
            &helper.cors_patterns(),
        ) {
            Ok(cors) => cors,
            Err(e) => {
                return Err(TokenAuthError::String(format!(
                    "{} {}",
                    gettext("Invalid CORS settings:"),
                    e
                )))
            }
        };
        Ok(Self::new(
            db,
            Arc::new(Pbkdf2Hasher::new(helper.password_iterations())),
            Arc::new(MemorySessionStore::new()),
            cors,
            CookieConfig {
                domain: helper.cookie_domain(),
                session_cookie: helper.session_cookie(),
            },
        ))
    }

    /// The session identifier sent by the client, if any
    pub fn session_id<T>(&self, req: &Request<T>) -> Option<String> {
        for value in req.headers().get_all(hyper::header::COOKIE) {
            if let Ok(value) = value.to_str() {
                let mut cookies = parse_cookie_header(value);
                if let Some(id) = cookies.remove(&self.cookie.session_cookie) {
                    if !id.is_empty() {
                        return Some(id);
                    }
                }
            }
        }
        None
    }

    pub fn session_cookie(&self, id: &str) -> SetCookie {
        SetCookie::new(&self.cookie.session_cookie, id)
            .domain(self.cookie.domain.as_deref())
            .http_only()
    }

    /// Cookie carrying a freshly issued token. Outlives the token itself.
    pub fn token_cookie(&self, token: &str, now: &DateTime<Utc>) -> SetCookie {
        SetCookie::new(AUTH_TOKEN_COOKIE, token)
            .domain(self.cookie.domain.as_deref())
            .lifetime(now, Duration::days(COOKIE_EXPIRY_DAYS))
    }

    pub fn clear_token_cookie(&self, now: &DateTime<Utc>) -> SetCookie {
        SetCookie::new(AUTH_TOKEN_COOKIE, "")
            .domain(self.cookie.domain.as_deref())
            .expired(now)
    }

    pub fn response_json_result(
        &self,
        builder: Builder,
        re: JSONResult,
    ) -> Result<Response<JsonValue>, TokenAuthError> {
        let builder = match &re {
            Ok(_) => builder,
            Err(err) => {
                log_json_error(err);
                builder.status(err.status())
            }
        };
        Ok(builder.body(re.to_json2())?)
    }

    pub fn response_serde_json_result(
        &self,
        builder: Builder,
        re: SerdeJSONResult,
    ) -> Result<Response<Body>, TokenAuthError> {
        let builder = match &re {
            Ok(_) => builder,
            Err(err) => {
                log_json_error(err);
                builder.status(err.status())
            }
        };
        let s = SerdeJSONResult2::new(re);
        Ok(builder
            .header(
                hyper::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .body(Body::from(serde_json::to_string(&s)?))?)
    }
}

fn log_json_error(err: &super::result::JSONError) {
    if err.status() >= 500 {
        match &err.debug_msg {
            Some(d) => log::error!(target: "tokenauth::server", "{} ({})", err.msg, d),
            None => log::error!(target: "tokenauth::server", "{}", err.msg),
        }
    } else {
        log::debug!(target: "tokenauth::server", "Request failed: {}", err.msg);
    }
}
