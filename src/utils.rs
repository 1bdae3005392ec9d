use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::env;
use std::path::{Path, PathBuf};

pub fn get_exe_path_else_current() -> PathBuf {
    let re = env::current_exe();
    match re {
        Ok(pa) => {
            let mut p = pa.clone();
            p.pop();
            p
        }
        Err(_) => {
            let p = Path::new("./");
            p.to_path_buf()
        }
    }
}

pub fn check_file_exists(path: &str) -> bool {
    let p = Path::new(path);
    p.exists()
}

/// Generate a random string over `[A-Za-z0-9]`.
///
/// Uses the thread-local CSPRNG.
pub fn random_alphanumeric(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[test]
fn test_random_alphanumeric() {
    let s = random_alphanumeric(60);
    assert_eq!(s.len(), 60);
    assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(s, random_alphanumeric(60));
    assert_eq!(random_alphanumeric(0), "");
}
