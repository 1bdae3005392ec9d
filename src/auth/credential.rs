use super::error::AuthError;
use super::password::CredentialHasher;
use super::session::{Session, SessionStore};
use super::token::TokenIssuer;
use super::validate::RegisterForm;
use crate::db::{is_email_conflict, Token, TokenAuthDbRef, User};
use crate::gettext;
use chrono::Utc;
use std::sync::Arc;

/// Result of a successful login
#[derive(Clone, Debug)]
pub struct LoginOutcome {
    /// The regenerated session, bound to the user
    pub session: Session,
    /// The newly issued bearer token
    pub token: Token,
    pub user: User,
}

/// Username/password flows on top of the user store, sessions and token issuer.
pub struct Authenticator {
    db: TokenAuthDbRef,
    hasher: Arc<dyn CredentialHasher + Send + Sync>,
    sessions: Arc<dyn SessionStore + Send + Sync>,
    issuer: TokenIssuer,
}

impl Authenticator {
    pub fn new(
        db: TokenAuthDbRef,
        hasher: Arc<dyn CredentialHasher + Send + Sync>,
        sessions: Arc<dyn SessionStore + Send + Sync>,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(db.clone()),
            db,
            hasher,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore + Send + Sync> {
        &self.sessions
    }

    /// Check the credentials, regenerate the session and issue a token.
    ///
    /// Unknown email and wrong password give the same error and create nothing.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        current_session: Option<&str>,
    ) -> Result<LoginOutcome, AuthError> {
        let mut user = match self.db.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                log::info!(target: "tokenauth::auth", "Login failed: unknown account.");
                return Err(AuthError::InvalidCredentials);
            }
        };
        if !self.hasher.verify(password, &user.password) {
            log::info!(target: "tokenauth::auth", "Login failed for user {}.", user.id);
            return Err(AuthError::InvalidCredentials);
        }
        let now = Utc::now();
        let session = self
            .sessions
            .regenerate(current_session, Some(user.id))
            .await;
        let token = self.issuer.issue_token_at(user.id, &now).await?;
        self.db.update_user_last_activity(user.id, &now).await?;
        user.last_activity = Some(now.clone());
        user.updated_at = now;
        log::info!(target: "tokenauth::auth", "User {} logged in.", user.id);
        Ok(LoginOutcome {
            session,
            token,
            user,
        })
    }

    /// End the current session. Always succeeds, even for guests.
    ///
    /// Issued bearer tokens are left untouched.
    pub async fn logout(&self, current_session: Option<&str>) -> Session {
        if let Some(id) = current_session {
            if let Some(Some(user_id)) = self.sessions.get(id).await.map(|s| s.user_id) {
                log::info!(target: "tokenauth::auth", "User {} logged out.", user_id);
            }
        }
        self.sessions.regenerate(current_session, None).await
    }

    /// Validate the form, create the user and log them in.
    ///
    /// No bearer token is issued here.
    pub async fn register(
        &self,
        form: &RegisterForm,
        current_session: Option<&str>,
    ) -> Result<(User, Session), AuthError> {
        let mut errors = form.validate();
        if let Some(email) = &form.email {
            if !errors.contains("email") && self.db.get_user_by_email(email).await?.is_some() {
                errors.add("email", gettext("The email has already been taken."));
            }
        }
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let (name, email, password) = match (&form.name, &form.email, &form.password) {
            (Some(name), Some(email), Some(password)) => (name, email, password),
            _ => return Err(AuthError::Validation(form.validate())),
        };
        let hashed = match self.hasher.hash(password) {
            Ok(hashed) => hashed,
            Err(e) => return Err(AuthError::PasswordHash(e.to_string())),
        };
        let user = match self.db.add_user(name, email, hashed.as_bytes()).await {
            Ok(user) => user,
            Err(e) if is_email_conflict(&e) => {
                let mut errors = super::validate::ValidationErrors::new();
                errors.add("email", gettext("The email has already been taken."));
                return Err(AuthError::Validation(errors));
            }
            Err(e) => return Err(AuthError::Db(e)),
        };
        let session = self
            .sessions
            .regenerate(current_session, Some(user.id))
            .await;
        log::info!(target: "tokenauth::auth", "User {} registered.", user.id);
        Ok((user, session))
    }
}

#[cfg(test)]
async fn test_authenticator() -> (Authenticator, TokenAuthDbRef) {
    use super::password::Pbkdf2Hasher;
    use super::session::MemorySessionStore;
    use crate::db::{open_and_init_database, TokenAuthDbConfig};
    let db: TokenAuthDbRef = Arc::new(
        open_and_init_database(&TokenAuthDbConfig::memory())
            .await
            .unwrap(),
    );
    let auth = Authenticator::new(
        db.clone(),
        Arc::new(Pbkdf2Hasher::new(10)),
        Arc::new(MemorySessionStore::new()),
    );
    (auth, db)
}

#[cfg(test)]
fn register_form(name: &str, email: &str, password: &str) -> RegisterForm {
    RegisterForm {
        name: Some(name.to_owned()),
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
    }
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_register_and_login() {
    let (auth, db) = test_authenticator().await;
    let guest = auth.sessions().create(None).await;
    let (user, session) = auth
        .register(
            &register_form("Test User", "test@example.com", "password123"),
            Some(&guest.id),
        )
        .await
        .unwrap();
    assert_eq!(session.user_id, Some(user.id));
    assert_ne!(session.id, guest.id);
    assert_ne!(&user.password[..], b"password123");
    let out = auth
        .login("test@example.com", "password123", Some(&session.id))
        .await
        .unwrap();
    assert_eq!(out.user.id, user.id);
    assert_eq!(out.token.user_id, Some(user.id));
    assert!(out.user.last_activity.is_some());
    assert_ne!(out.session.id, session.id);
    assert!(auth.sessions().get(&session.id).await.is_none());
    assert!(db.get_token_by_value(&out.token.token).await.unwrap().is_some());
    let after = auth.logout(Some(&out.session.id)).await;
    assert_eq!(after.user_id, None);
    assert!(auth.sessions().get(&out.session.id).await.is_none());
    // Logging out leaves the bearer token alone.
    assert!(db.get_token_by_value(&out.token.token).await.unwrap().is_some());
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_login_failures() {
    let (auth, db) = test_authenticator().await;
    auth.register(&register_form("John", "john@example.com", "password123"), None)
        .await
        .unwrap();
    let wrong = auth.login("john@example.com", "wrong-password", None).await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    let unknown = auth.login("nobody@example.com", "password123", None).await;
    assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    assert_eq!(
        wrong.unwrap_err().to_string(),
        unknown.unwrap_err().to_string()
    );
    // No token rows were written.
    let now = chrono::Utc::now();
    assert_eq!(db.revoke_expired_tokens(&(now + chrono::Duration::days(30))).await.unwrap(), 0);
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_register_validation() {
    let (auth, _db) = test_authenticator().await;
    match auth.register(&RegisterForm::default(), None).await {
        Err(AuthError::Validation(e)) => {
            assert!(e.contains("name"));
            assert!(e.contains("email"));
            assert!(e.contains("password"));
        }
        _ => panic!("Validation should fail."),
    }
    auth.register(&register_form("A", "taken@example.com", "password123"), None)
        .await
        .unwrap();
    match auth
        .register(&register_form("B", "taken@example.com", "short"), None)
        .await
    {
        Err(AuthError::Validation(e)) => {
            assert_eq!(
                e.to_json()["email"][0].as_str(),
                Some("The email has already been taken.")
            );
            assert!(e.contains("password"));
            assert!(!e.contains("name"));
        }
        _ => panic!("Validation should fail."),
    }
}
