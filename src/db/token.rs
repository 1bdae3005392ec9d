use chrono::{DateTime, Utc};

/// A token in the database
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The token ID
    pub id: u64,
    /// The user ID of the token. Always set by the issuer, but the column is nullable.
    pub user_id: Option<u64>,
    /// The token
    pub token: String,
    /// The token's creation time
    pub created_at: DateTime<Utc>,
    /// The token's expiration time
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Whether the token is no longer usable at `now`.
    ///
    /// A token expiring exactly at `now` is already expired.
    pub fn is_expired_at(&self, now: &DateTime<Utc>) -> bool {
        *now >= self.expires_at
    }
}

#[test]
fn test_token_is_expired_at() {
    let now = Utc::now();
    let mut token = Token {
        id: 1,
        user_id: Some(1),
        token: String::from("abc"),
        created_at: now,
        expires_at: now + chrono::Duration::seconds(1),
    };
    assert!(!token.is_expired_at(&now));
    token.expires_at = now;
    assert!(token.is_expired_at(&now));
    token.expires_at = now - chrono::Duration::seconds(1);
    assert!(token.is_expired_at(&now));
}
