use super::error::AuthError;
use crate::db::{Token, TokenAuthDbRef, User};
use crate::utils::random_alphanumeric;
use chrono::{DateTime, Duration, Utc};

/// Length of issued tokens
pub const TOKEN_LENGTH: usize = 60;
/// How long an issued token stays valid
pub const TOKEN_EXPIRY_DAYS: i64 = 1;

/// Creates bearer tokens for authenticated users.
pub struct TokenIssuer {
    db: TokenAuthDbRef,
}

impl TokenIssuer {
    pub fn new(db: TokenAuthDbRef) -> Self {
        Self { db }
    }

    /// Issue a new token for the user. Existing tokens of the user are kept.
    pub async fn issue_token(&self, user_id: u64) -> Result<Token, AuthError> {
        self.issue_token_at(user_id, &Utc::now()).await
    }

    pub async fn issue_token_at(
        &self,
        user_id: u64,
        now: &DateTime<Utc>,
    ) -> Result<Token, AuthError> {
        let value = random_alphanumeric(TOKEN_LENGTH);
        let expires_at = *now + Duration::days(TOKEN_EXPIRY_DAYS);
        let token = self
            .db
            .add_token(&value, Some(user_id), now, &expires_at)
            .await?;
        log::debug!(target: "tokenauth::token", "Issued token {} for user {}.", token.id, user_id);
        Ok(token)
    }
}

/// Turns a presented token into its owner.
pub struct TokenResolver {
    db: TokenAuthDbRef,
}

impl TokenResolver {
    pub fn new(db: TokenAuthDbRef) -> Self {
        Self { db }
    }

    pub async fn resolve_token(&self, token: &str) -> Result<User, AuthError> {
        self.resolve_token_at(token, &Utc::now()).await
    }

    /// Resolve a token at the given time.
    ///
    /// An expired token is deleted before [AuthError::TokenExpired] is returned.
    /// On success the owner's last activity is set to `now`.
    pub async fn resolve_token_at(
        &self,
        token: &str,
        now: &DateTime<Utc>,
    ) -> Result<User, AuthError> {
        if token.is_empty() {
            return Err(AuthError::TokenNotFound);
        }
        let t = match self.db.get_token_by_value(token).await? {
            Some(t) => t,
            None => return Err(AuthError::TokenNotFound),
        };
        if t.is_expired_at(now) {
            self.db.delete_token(t.id).await?;
            log::info!(target: "tokenauth::token", "Deleted expired token {}.", t.id);
            return Err(AuthError::TokenExpired);
        }
        let user_id = match t.user_id {
            Some(id) => id,
            None => {
                log::warn!(target: "tokenauth::token", "Token {} has no owner.", t.id);
                return Err(AuthError::UserNotFound);
            }
        };
        let mut user = match self.db.get_user(user_id).await? {
            Some(u) => u,
            None => {
                log::warn!(target: "tokenauth::token", "Owner {} of token {} does not exist.", user_id, t.id);
                return Err(AuthError::UserNotFound);
            }
        };
        self.db.update_user_last_activity(user.id, now).await?;
        user.last_activity = Some(now.clone());
        user.updated_at = now.clone();
        Ok(user)
    }

    /// Delete every token expired at `now`.
    pub async fn revoke_expired_tokens(&self, now: &DateTime<Utc>) -> Result<usize, AuthError> {
        Ok(self.db.revoke_expired_tokens(now).await?)
    }
}

#[cfg(test)]
async fn open_test_db() -> TokenAuthDbRef {
    use crate::db::{open_and_init_database, TokenAuthDbConfig};
    std::sync::Arc::new(
        open_and_init_database(&TokenAuthDbConfig::memory())
            .await
            .unwrap(),
    )
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_issue_and_resolve() {
    let db = open_test_db().await;
    let user = db.add_user("John", "john@example.com", b"x").await.unwrap();
    let issuer = TokenIssuer::new(db.clone());
    let resolver = TokenResolver::new(db.clone());
    let now = Utc::now();
    let t1 = issuer.issue_token_at(user.id, &now).await.unwrap();
    let t2 = issuer.issue_token_at(user.id, &now).await.unwrap();
    assert_eq!(t1.token.len(), TOKEN_LENGTH);
    assert!(t1.token.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(t1.token, t2.token);
    assert_eq!(t1.expires_at - t1.created_at, Duration::days(1));
    let later = now + Duration::hours(23);
    let u = resolver.resolve_token_at(&t1.token, &later).await.unwrap();
    assert_eq!(u.id, user.id);
    assert_eq!(u.last_activity, Some(later));
    let stored = db.get_user(user.id).await.unwrap().unwrap();
    assert!(stored.last_activity.is_some());
    // Both tokens of the user stay usable.
    assert!(resolver.resolve_token_at(&t2.token, &later).await.is_ok());
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_resolve_failures() {
    let db = open_test_db().await;
    let user = db.add_user("John", "john@example.com", b"x").await.unwrap();
    let issuer = TokenIssuer::new(db.clone());
    let resolver = TokenResolver::new(db.clone());
    let now = Utc::now();
    assert!(matches!(
        resolver.resolve_token_at("", &now).await,
        Err(AuthError::TokenNotFound)
    ));
    assert!(matches!(
        resolver.resolve_token_at("missing", &now).await,
        Err(AuthError::TokenNotFound)
    ));
    let mixed = db
        .add_token("AbC-_xYz", Some(user.id), &now, &(now + Duration::days(1)))
        .await
        .unwrap();
    assert!(resolver.resolve_token_at(&mixed.token, &now).await.is_ok());
    assert!(matches!(
        resolver.resolve_token_at("abc-_xyz", &now).await,
        Err(AuthError::TokenNotFound)
    ));
    assert!(matches!(
        resolver.resolve_token_at(&"a".repeat(1000), &now).await,
        Err(AuthError::TokenNotFound)
    ));
    let t = issuer.issue_token_at(user.id, &now).await.unwrap();
    // Expiring exactly now counts as expired, and the row goes away.
    let expired = t.expires_at.clone();
    assert!(matches!(
        resolver.resolve_token_at(&t.token, &expired).await,
        Err(AuthError::TokenExpired)
    ));
    assert!(db.get_token_by_value(&t.token).await.unwrap().is_none());
    assert!(matches!(
        resolver.resolve_token_at(&t.token, &expired).await,
        Err(AuthError::TokenNotFound)
    ));
    let orphan = db
        .add_token("orphan", None, &now, &(now + Duration::days(1)))
        .await
        .unwrap();
    assert!(matches!(
        resolver.resolve_token_at(&orphan.token, &now).await,
        Err(AuthError::UserNotFound)
    ));
    let t = issuer.issue_token_at(user.id, &now).await.unwrap();
    assert!(db.delete_user(user.id).await.unwrap());
    assert!(matches!(
        resolver.resolve_token_at(&t.token, &now).await,
        Err(AuthError::UserNotFound)
    ));
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_revoke_expired_tokens() {
    let db = open_test_db().await;
    let user = db.add_user("John", "john@example.com", b"x").await.unwrap();
    let issuer = TokenIssuer::new(db.clone());
    let resolver = TokenResolver::new(db.clone());
    let now = Utc::now();
    let old = issuer
        .issue_token_at(user.id, &(now - Duration::days(2)))
        .await
        .unwrap();
    let fresh = issuer.issue_token_at(user.id, &now).await.unwrap();
    assert_eq!(resolver.revoke_expired_tokens(&now).await.unwrap(), 1);
    assert!(db.get_token_by_value(&old.token).await.unwrap().is_none());
    assert!(db.get_token_by_value(&fresh.token).await.unwrap().is_some());
    assert_eq!(resolver.revoke_expired_tokens(&now).await.unwrap(), 0);
}
