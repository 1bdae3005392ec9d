mod auth;
mod token;

use super::context::{CookieConfig, ServerContext};
use super::cors::CorsContext;
use super::service::TokenAuthSvc;
use super::route::ServerRoutes;
use crate::auth::{MemorySessionStore, Pbkdf2Hasher};
use crate::db::{open_and_init_database, TokenAuthDbConfig};
use crate::error::TokenAuthError;
use hyper::header::HeaderMap;
use hyper::service::Service;
use hyper::{Body, Request, StatusCode};
use json::JsonValue;
use std::sync::Arc;

pub const TEST_ORIGIN: &'static str = "http://localhost:3000";

/// A response read back in full
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: JsonValue,
}

impl TestResponse {
    /// Values of every `Set-Cookie` header
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(hyper::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.to_owned())
            .collect()
    }

    /// The full `Set-Cookie` header for the named cookie
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with(&prefix))
    }

    /// The value set for the named cookie
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookie(name).map(|c| {
            let v = &c[name.len() + 1..];
            match v.find(';') {
                Some(pos) => v[..pos].to_owned(),
                None => v.to_owned(),
            }
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct UnitTestContext {
    ctx: Arc<ServerContext>,
    routes: Arc<ServerRoutes>,
}

impl UnitTestContext {
    pub async fn new() -> Self {
        let db = Arc::new(
            open_and_init_database(&TokenAuthDbConfig::memory())
                .await
                .unwrap(),
        );
        let cors = CorsContext::from_strings(
            false,
            &[String::from(TEST_ORIGIN)],
            &[String::from(r"^https://[A-Za-z0-9-]+\.example\.com$")],
        )
        .unwrap();
        Self {
            ctx: Arc::new(ServerContext::new(
                db,
                Arc::new(Pbkdf2Hasher::new(10)),
                Arc::new(MemorySessionStore::new()),
                cors,
                CookieConfig {
                    domain: Some(String::from("example.com")),
                    ..CookieConfig::default()
                },
            )),
            routes: Arc::new(ServerRoutes::new()),
        }
    }

    pub fn ctx(&self) -> &Arc<ServerContext> {
        &self.ctx
    }

    /// Send a request through the whole service, unknown routes included.
    pub async fn request(&self, req: Request<Body>) -> Result<TestResponse, TokenAuthError> {
        let mut svc = TokenAuthSvc::new(Arc::clone(&self.ctx), Arc::clone(&self.routes));
        let res = svc.call(req).await?;
        let (parts, body) = res.into_parts();
        let body = hyper::body::to_bytes(body).await?;
        let text = String::from_utf8_lossy(&body);
        let json = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            json::parse(&text)?
        };
        Ok(TestResponse {
            status: parts.status,
            headers: parts.headers,
            json,
        })
    }

    pub async fn post_form(
        &self,
        uri: &str,
        params: &JsonValue,
        session: Option<&str>,
    ) -> Result<TestResponse, TokenAuthError> {
        let mut par = Vec::new();
        for (key, obj) in params.entries() {
            let value = match obj.as_str() {
                Some(s) => s.to_owned(),
                None => obj.dump(),
            };
            par.push(format!(
                "{}={}",
                urlparse::quote_plus(key, b"")?,
                urlparse::quote_plus(&value, b"")?
            ));
        }
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded");
        if let Some(session) = session {
            builder = builder.header(
                "Cookie",
                format!("{}={}", self.ctx.cookie.session_cookie, session),
            );
        }
        self.request(builder.body(Body::from(par.join("&")))?)
            .await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: &JsonValue,
    ) -> Result<TestResponse, TokenAuthError> {
        self.post_raw(uri, "application/json", body.dump()).await
    }

    /// Post a body as is
    pub async fn post_raw<B: Into<Body>>(
        &self,
        uri: &str,
        content_type: &str,
        body: B,
    ) -> Result<TestResponse, TokenAuthError> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", content_type)
            .body(body.into())?;
        self.request(req).await
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse, TokenAuthError> {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())?;
        self.request(req).await
    }
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test(flavor = "multi_thread")]
async fn test() -> Result<(), TokenAuthError> {
    let ctx = UnitTestContext::new().await;
    auth::test(&ctx).await?;
    let ctx = UnitTestContext::new().await;
    token::test(&ctx).await?;
    Ok(())
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test(flavor = "multi_thread")]
async fn test_unreadable_bodies() -> Result<(), TokenAuthError> {
    let ctx = UnitTestContext::new().await;
    let re = ctx
        .post_raw("/login", "application/json", r#"{"email": "#)
        .await?;
    assert_eq!(re.status, 401);
    assert_eq!(
        re.json,
        json::object! {"success": false, "message": "Invalid login credentials!"}
    );
    let re = ctx
        .post_raw("/register", "application/json", r#"{"email": "#)
        .await?;
    assert_eq!(re.status, 422);
    assert!(re.json["errors"]["name"].is_array());
    assert!(re.json["errors"]["email"].is_array());
    assert!(re.json["errors"]["password"].is_array());
    let re = ctx
        .post_raw(
            "/register",
            "application/x-www-form-urlencoded",
            vec![0xffu8, 0xfe, b'=', b'x'],
        )
        .await?;
    assert_eq!(re.status, 422);
    assert!(re.json["errors"]["email"].is_array());
    Ok(())
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_route_and_methods() -> Result<(), TokenAuthError> {
    let ctx = UnitTestContext::new().await;
    let re = ctx.get("/nowhere").await?;
    assert_eq!(re.status, 404);
    assert_eq!(
        re.json,
        json::object! {"success": false, "message": "Not found."}
    );
    let re = ctx.get("/login").await?;
    assert_eq!(re.status, 405);
    assert_eq!(re.header("Allow"), Some("POST"));
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/user/token/abc")
        .body(Body::empty())?;
    let re = ctx.request(req).await?;
    assert_eq!(re.status, 405);
    assert_eq!(re.header("Allow"), Some("GET, OPTIONS"));
    Ok(())
}
