use bytes::BytesMut;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A user in the database
#[derive(Clone, Debug)]
pub struct User {
    /// The user ID
    pub id: u64,
    /// The user's display name
    pub name: String,
    /// Unique email address
    pub email: String,
    /// When the email was verified
    pub email_verified_at: Option<DateTime<Utc>>,
    /// hashed password
    pub password: BytesMut,
    /// Remember-me token. Never exposed.
    pub remember_token: Option<String>,
    /// Last time the user was seen
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public view of a [User]. Secrets are left out.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserInfo {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            email_verified_at: self.email_verified_at.clone(),
            last_activity: self.last_activity.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[test]
fn test_user_info_hides_secrets() {
    let now = Utc::now();
    let user = User {
        id: 3,
        name: String::from("John Doe"),
        email: String::from("john@example.com"),
        email_verified_at: None,
        password: BytesMut::from(&b"hashed"[..]),
        remember_token: Some(String::from("remember")),
        last_activity: Some(now),
        created_at: now,
        updated_at: now,
    };
    let value = serde_json::to_value(user.to_info()).unwrap();
    assert_eq!(value["id"], 3);
    assert_eq!(value["name"], "John Doe");
    assert_eq!(value["email"], "john@example.com");
    assert!(value.get("password").is_none());
    assert!(value.get("remember_token").is_none());
}
