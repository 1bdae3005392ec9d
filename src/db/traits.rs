use super::TokenAuthDbConfig;
use super::TokenAuthDbError;
use super::{Token, User};
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TokenAuthDb {
    /// Create a new instance of database
    /// * `cfg` - The database configuration
    fn new<R: AsRef<TokenAuthDbConfig> + ?Sized>(cfg: &R) -> Result<Self, TokenAuthDbError>
    where
        Self: Sized + Send + Sync;
    /// Add a new token
    /// * `token` - The token string
    /// * `user_id` - The owner of the token
    /// * `created_at` - Creation time
    /// * `expires_at` - Expiration time
    async fn add_token(
        &self,
        token: &str,
        user_id: Option<u64>,
        created_at: &DateTime<Utc>,
        expires_at: &DateTime<Utc>,
    ) -> Result<Token, TokenAuthDbError>;
    /// Add a new user.
    /// * `name` - Display name
    /// * `email` - Unique email address
    /// * `password` - Hashed password
    async fn add_user(
        &self,
        name: &str,
        email: &str,
        password: &[u8],
    ) -> Result<User, TokenAuthDbError>;
    /// Delete a token by ID. Deleting a missing token is not an error.
    async fn delete_token(&self, id: u64) -> Result<(), TokenAuthDbError>;
    /// Delete a user by ID. Returns false if the user did not exist.
    async fn delete_user(&self, id: u64) -> Result<bool, TokenAuthDbError>;
    /// Get a token by its exact (case-sensitive) value
    async fn get_token_by_value(&self, token: &str) -> Result<Option<Token>, TokenAuthDbError>;
    /// Get a user by ID
    /// * `id`: The user's ID
    async fn get_user(&self, id: u64) -> Result<Option<User>, TokenAuthDbError>;
    /// Get a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TokenAuthDbError>;
    /// Initialize the database (create tables, migrate data, etc.)
    async fn init(&self) -> Result<(), TokenAuthDbError>;
    /// Remove all tokens expired at `now`. Returns the count of removed tokens.
    async fn revoke_expired_tokens(&self, now: &DateTime<Utc>) -> Result<usize, TokenAuthDbError>;
    /// Update the last activity time of a user
    async fn update_user_last_activity(
        &self,
        id: u64,
        at: &DateTime<Utc>,
    ) -> Result<(), TokenAuthDbError>;
}
