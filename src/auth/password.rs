use pbkdf2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use pbkdf2::{Algorithm, Params, Pbkdf2};
use rand::RngCore;

/// Default PBKDF2 iteration count
pub const PASSWORD_ITER: u32 = 10000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 64;

/// Hashes passwords for storage and checks them back.
pub trait CredentialHasher {
    /// Hash a plaintext password into a PHC string. The result is stored as is.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;
    /// Check a plaintext password against a stored hash.
    /// Malformed hashes never match.
    fn verify(&self, password: &str, hashed: &[u8]) -> bool;
}

/// PBKDF2-HMAC-SHA512 with a random per-password salt, stored as a PHC string
/// (`$pbkdf2-sha512$i=10000,l=64$<salt>$<hash>`).
pub struct Pbkdf2Hasher {
    params: Params,
}

impl Pbkdf2Hasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            params: Params {
                rounds: iterations.max(1),
                output_length: KEY_LEN,
            },
        }
    }

    fn salt() -> Result<SaltString, PasswordHashError> {
        let mut bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        SaltString::encode_b64(&bytes)
    }
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self::new(PASSWORD_ITER)
    }
}

impl CredentialHasher for Pbkdf2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt = Self::salt()?;
        let hash = Pbkdf2.hash_password_customized(
            password.as_bytes(),
            Some(Algorithm::Pbkdf2Sha512.ident()),
            None,
            self.params.clone(),
            &salt,
        )?;
        Ok(hash.to_string())
    }

    /// Uses the parameters stored in the hash, not the configured ones.
    fn verify(&self, password: &str, hashed: &[u8]) -> bool {
        let hashed = match std::str::from_utf8(hashed) {
            Ok(s) => s,
            Err(_) => return false,
        };
        match PasswordHash::new(hashed) {
            Ok(hash) => Pbkdf2.verify_password(password.as_bytes(), &hash).is_ok(),
            Err(_) => false,
        }
    }
}

#[test]
fn test_pbkdf2_hasher() {
    let hasher = Pbkdf2Hasher::new(100);
    let hashed = hasher.hash("password123").unwrap();
    assert!(hashed.starts_with("$pbkdf2-sha512$i=100,l=64$"));
    assert!(hasher.verify("password123", hashed.as_bytes()));
    assert!(!hasher.verify("password124", hashed.as_bytes()));
    assert!(!hasher.verify("", hashed.as_bytes()));
    // Salted, so the same password hashes differently.
    assert_ne!(hashed, hasher.hash("password123").unwrap());
    // The iteration count travels with the hash.
    assert!(Pbkdf2Hasher::new(5).verify("password123", hashed.as_bytes()));
    assert!(!hasher.verify("password123", &hashed.as_bytes()[1..]));
    assert!(!hasher.verify("password123", b""));
    assert!(!hasher.verify("password123", &[0xff, 0xfe]));
}
