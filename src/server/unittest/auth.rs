use super::UnitTestContext;
use crate::auth::TOKEN_LENGTH;
use crate::error::TokenAuthError;
use crate::server::cookie::AUTH_TOKEN_COOKIE;

/// Test registration, login and logout through the routes
pub async fn test(ctx: &UnitTestContext) -> Result<(), TokenAuthError> {
    let session_cookie = ctx.ctx().cookie.session_cookie.clone();
    // Every failing field is reported at once.
    let re = ctx
        .post_form(
            "/register",
            &json::object! {"name": "", "email": "invalid-email", "password": "short"},
            None,
        )
        .await?;
    assert_eq!(re.status, 422);
    assert_eq!(re.json["success"].as_bool(), Some(false));
    assert!(re.json["errors"]["name"].is_array());
    assert_eq!(
        re.json["errors"]["email"][0].as_str(),
        Some("The email field must be a valid email address.")
    );
    assert_eq!(
        re.json["errors"]["password"][0].as_str(),
        Some("The password field must be at least 8 characters.")
    );
    assert!(ctx.ctx().db.get_user_by_email("invalid-email").await?.is_none());

    let re = ctx
        .post_json(
            "/register",
            &json::object! {
                "name": "Test User",
                "email": "test@example.com",
                "password": "password123",
            },
        )
        .await?;
    assert_eq!(re.status, 200);
    assert_eq!(
        re.json,
        json::object! {"success": true, "message": "Registration successful!"}
    );
    let registered_session = re.cookie_value(&session_cookie).unwrap();
    assert!(!registered_session.is_empty());
    assert!(re.set_cookie(AUTH_TOKEN_COOKIE).is_none());
    let user = ctx
        .ctx()
        .db
        .get_user_by_email("test@example.com")
        .await?
        .unwrap();
    assert_eq!(user.name, "Test User");
    assert_ne!(&user.password[..], b"password123");
    let session = ctx
        .ctx()
        .auth
        .sessions()
        .get(&registered_session)
        .await
        .unwrap();
    assert_eq!(session.user_id, Some(user.id));

    // Duplicate email
    let re = ctx
        .post_form(
            "/register",
            &json::object! {
                "name": "Other",
                "email": "test@example.com",
                "password": "password123",
            },
            None,
        )
        .await?;
    assert_eq!(re.status, 422);
    assert_eq!(
        re.json["errors"]["email"][0].as_str(),
        Some("The email has already been taken.")
    );
    assert!(re.json["errors"]["name"].is_null());

    // Wrong password and unknown email give the same answer.
    let re = ctx
        .post_form(
            "/login",
            &json::object! {"email": "test@example.com", "password": "wrong-password"},
            None,
        )
        .await?;
    assert_eq!(re.status, 401);
    assert_eq!(
        re.json,
        json::object! {"success": false, "message": "Invalid login credentials!"}
    );
    assert!(re.set_cookie(AUTH_TOKEN_COOKIE).is_none());
    let re2 = ctx
        .post_form(
            "/login",
            &json::object! {"email": "nobody@example.com", "password": "password123"},
            None,
        )
        .await?;
    assert_eq!(re2.status, 401);
    assert_eq!(re.json, re2.json);
    let re = ctx
        .post_form("/login", &json::object! {}, None)
        .await?;
    assert_eq!(re.status, 401);

    let re = ctx
        .post_form(
            "/login",
            &json::object! {"email": "test@example.com", "password": "password123"},
            Some(registered_session.as_str()),
        )
        .await?;
    assert_eq!(re.status, 200);
    assert_eq!(
        re.json,
        json::object! {"success": true, "message": "Login successful!"}
    );
    let token = re.cookie_value(AUTH_TOKEN_COOKIE).unwrap();
    assert_eq!(token.len(), TOKEN_LENGTH);
    let cookie = re.set_cookie(AUTH_TOKEN_COOKIE).unwrap();
    assert!(cookie.contains("; Max-Age=864000"));
    assert!(cookie.contains("; Path=/"));
    assert!(cookie.contains("; Domain=example.com"));
    let stored = ctx.ctx().db.get_token_by_value(&token).await?.unwrap();
    assert_eq!(stored.user_id, Some(user.id));
    assert_eq!(
        stored.expires_at - stored.created_at,
        chrono::Duration::days(1)
    );
    // The session id changes on login.
    let login_session = re.cookie_value(&session_cookie).unwrap();
    assert_ne!(login_session, registered_session);
    assert!(ctx
        .ctx()
        .auth
        .sessions()
        .get(&registered_session)
        .await
        .is_none());
    let user = ctx.ctx().db.get_user(user.id).await?.unwrap();
    assert!(user.last_activity.is_some());

    // Logging in again issues another token. Both stay valid.
    let re = ctx
        .post_json(
            "/login",
            &json::object! {"email": "test@example.com", "password": "password123"},
        )
        .await?;
    assert_eq!(re.status, 200);
    let token2 = re.cookie_value(AUTH_TOKEN_COOKIE).unwrap();
    assert_ne!(token, token2);
    assert!(ctx.ctx().db.get_token_by_value(&token).await?.is_some());

    let re = ctx
        .post_form("/logout", &json::object! {}, Some(login_session.as_str()))
        .await?;
    assert_eq!(re.status, 200);
    assert_eq!(
        re.json,
        json::object! {"message": "Successfully logged out!"}
    );
    let logout_session = re.cookie_value(&session_cookie).unwrap();
    assert_ne!(logout_session, login_session);
    assert!(ctx
        .ctx()
        .auth
        .sessions()
        .get(&login_session)
        .await
        .is_none());
    assert_eq!(re.cookie_value(AUTH_TOKEN_COOKIE).as_deref(), Some(""));
    assert!(re
        .set_cookie(AUTH_TOKEN_COOKIE)
        .unwrap()
        .contains("; Max-Age=0"));
    // Tokens outlive the session.
    let re = ctx.get(&format!("/api/user/token/{}", token)).await?;
    assert_eq!(re.status, 200);

    // Guests can log out too.
    let re = ctx.post_form("/logout", &json::object! {}, None).await?;
    assert_eq!(re.status, 200);
    Ok(())
}
