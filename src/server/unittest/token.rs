use super::{UnitTestContext, TEST_ORIGIN};
use crate::error::TokenAuthError;
use crate::server::timer::revoke_expired_tokens;
use chrono::{Duration, Utc};
use hyper::{Body, Request};

/// Test resolving tokens through `/api/user/token/{token}`
pub async fn test(ctx: &UnitTestContext) -> Result<(), TokenAuthError> {
    let db = &ctx.ctx().db;
    let user = db.add_user("John Doe", "john@example.com", b"x").await?;
    let now = Utc::now();
    let tomorrow = now + Duration::days(1);
    let valid = db
        .add_token("ValidToken-_123", Some(user.id), &now, &tomorrow)
        .await?;

    let re = ctx
        .get(&format!("/api/user/token/{}", valid.token))
        .await?;
    assert_eq!(re.status, 200);
    assert_eq!(
        re.header("Content-Type"),
        Some("application/json; charset=utf-8")
    );
    assert_eq!(re.json["user"]["id"].as_u64(), Some(user.id));
    assert_eq!(re.json["user"]["name"].as_str(), Some("John Doe"));
    assert_eq!(re.json["user"]["email"].as_str(), Some("john@example.com"));
    assert!(re.json["user"]["password"].is_null());
    assert!(re.json["user"]["remember_token"].is_null());
    assert!(re.json["user"]["last_activity"].is_string());
    let stored = db.get_user(user.id).await?.unwrap();
    let last = stored.last_activity.unwrap();
    assert!((Utc::now() - last) < Duration::seconds(5));

    // Exact, case sensitive matching
    let re = ctx.get("/api/user/token/validtoken-_123").await?;
    assert_eq!(re.status, 404);
    assert_eq!(
        re.json,
        json::object! {"success": false, "message": "Token not found"}
    );
    let re = ctx
        .get(&format!("/api/user/token/{}", "a".repeat(1000)))
        .await?;
    assert_eq!(re.status, 404);
    let re = ctx.get("/api/user/token/").await?;
    assert_eq!(re.status, 404);
    let re = ctx.get("/api/user/token").await?;
    assert_eq!(re.status, 404);
    let re = ctx.get("/api/user/token/%25%20weird").await?;
    assert_eq!(re.status, 404);

    // Expired tokens are rejected once, then gone.
    let expired = db
        .add_token(
            "ExpiredToken",
            Some(user.id),
            &(now - Duration::days(2)),
            &(now - Duration::days(1)),
        )
        .await?;
    let re = ctx
        .get(&format!("/api/user/token/{}", expired.token))
        .await?;
    assert_eq!(re.status, 401);
    assert_eq!(
        re.json,
        json::object! {"success": false, "message": "Token has expired"}
    );
    assert!(db.get_token_by_value("ExpiredToken").await?.is_none());
    let re = ctx
        .get(&format!("/api/user/token/{}", expired.token))
        .await?;
    assert_eq!(re.status, 404);

    // Tokens without a usable owner
    let orphan = db.add_token("OrphanToken", None, &now, &tomorrow).await?;
    let re = ctx
        .get(&format!("/api/user/token/{}", orphan.token))
        .await?;
    assert_eq!(re.status, 500);
    assert_eq!(
        re.json["message"].as_str(),
        Some("No corresponding user was found.")
    );
    let gone = db.add_user("Gone", "gone@example.com", b"x").await?;
    let gone_token = db
        .add_token("GoneToken", Some(gone.id), &now, &tomorrow)
        .await?;
    assert!(db.delete_user(gone.id).await?);
    let re = ctx
        .get(&format!("/api/user/token/{}", gone_token.token))
        .await?;
    assert_eq!(re.status, 500);

    // CORS
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/user/token/abc")
        .header("Origin", TEST_ORIGIN)
        .header("Access-Control-Request-Method", "GET")
        .body(Body::empty())?;
    let re = ctx.request(req).await?;
    assert_eq!(re.status, 200);
    assert_eq!(re.header("Access-Control-Allow-Origin"), Some(TEST_ORIGIN));
    assert_eq!(re.header("Access-Control-Allow-Credentials"), Some("true"));
    assert_eq!(re.header("Access-Control-Allow-Methods"), Some("GET, OPTIONS"));
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/user/token/abc")
        .header("Origin", TEST_ORIGIN)
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "x-csrf-token, accept")
        .body(Body::empty())?;
    let re = ctx.request(req).await?;
    assert_eq!(re.status, 200);
    let allowed = re
        .header("Access-Control-Allow-Headers")
        .unwrap_or("")
        .to_ascii_lowercase();
    let allowed: Vec<&str> = allowed.split(',').map(|h| h.trim()).collect();
    assert!(allowed.contains(&"x-csrf-token"));
    assert!(allowed.contains(&"accept"));
    assert!(allowed.contains(&"content-type"));
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/user/token/abc")
        .header("Origin", "https://evil.com")
        .body(Body::empty())?;
    assert_eq!(ctx.request(req).await?.status, 400);
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/user/token/{}", valid.token))
        .header("Origin", "https://app.example.com")
        .body(Body::empty())?;
    let re = ctx.request(req).await?;
    assert_eq!(re.status, 200);
    assert_eq!(
        re.header("Access-Control-Allow-Origin"),
        Some("https://app.example.com")
    );
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/user/token/{}", valid.token))
        .header("Origin", "https://evil.com")
        .body(Body::empty())?;
    assert_eq!(ctx.request(req).await?.status, 403);

    // Sweep
    db.add_token(
        "StaleToken",
        Some(user.id),
        &(now - Duration::days(3)),
        &(now - Duration::days(2)),
    )
    .await?;
    assert_eq!(revoke_expired_tokens(ctx.ctx()).await, 1);
    assert!(db.get_token_by_value("StaleToken").await?.is_none());
    assert!(db.get_token_by_value(&valid.token).await?.is_some());
    Ok(())
}
