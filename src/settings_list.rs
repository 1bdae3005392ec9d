use crate::db::check_db_config;
use crate::gettext;
use crate::server::cors::CorsHost;
use crate::settings::JsonValueType;
use crate::settings::SettingDes;
use json::JsonValue;
use regex::Regex;
use std::net::SocketAddr;
use std::str::FromStr;

pub fn get_settings_list() -> Vec<SettingDes> {
    vec![
        SettingDes::new("db", gettext("Database settings. For example: {\"type\": \"sqlite\", \"path\": \"tokenauth.db\"}"), JsonValueType::Object, Some(check_db_config)).unwrap(),
        SettingDes::new("server", gettext("Server listen address."), JsonValueType::Str, Some(check_socket_addr)).unwrap(),
        SettingDes::new("cookie_domain", gettext("The domain attribute of issued cookies."), JsonValueType::Str, None).unwrap(),
        SettingDes::new("session_cookie", gettext("The name of session cookie."), JsonValueType::Str, Some(check_nonempty_str)).unwrap(),
        SettingDes::new("token_sweep_interval", gettext("Interval in seconds between two expired token sweeps. 0 disables it."), JsonValueType::Number, Some(check_u64)).unwrap(),
        SettingDes::new("password_iterations", gettext("PBKDF2 iterations used when hashing new passwords."), JsonValueType::Number, Some(check_iterations)).unwrap(),
        SettingDes::new("cors_allow_all", gettext("Allow requests from every origin."), JsonValueType::Boolean, None).unwrap(),
        SettingDes::new("cors_entries", gettext("Allowed origins. For example: [\"http://localhost:3000\"]"), JsonValueType::Array, Some(check_cors_entries)).unwrap(),
        SettingDes::new("cors_patterns", gettext("Regular expressions matched against the origin."), JsonValueType::Array, Some(check_cors_patterns)).unwrap(),
    ]
}

fn check_socket_addr(obj: &JsonValue) -> bool {
    obj.as_str()
        .map(|s| SocketAddr::from_str(s).is_ok())
        .unwrap_or(false)
}

fn check_nonempty_str(obj: &JsonValue) -> bool {
    obj.as_str().map(|s| !s.is_empty()).unwrap_or(false)
}

fn check_u64(obj: &JsonValue) -> bool {
    obj.as_u64().is_some()
}

fn check_iterations(obj: &JsonValue) -> bool {
    matches!(obj.as_u32(), Some(i) if i > 0)
}

fn check_cors_entries(obj: &JsonValue) -> bool {
    obj.members().all(|o| match o.as_str() {
        Some(s) => CorsHost::from_str(s).is_ok(),
        None => false,
    })
}

fn check_cors_patterns(obj: &JsonValue) -> bool {
    obj.members().all(|o| match o.as_str() {
        Some(s) => Regex::new(s).is_ok(),
        None => false,
    })
}

#[test]
fn test_settings_checks() {
    assert!(check_socket_addr(&"127.0.0.1:8080".into()));
    assert!(!check_socket_addr(&"localhost".into()));
    assert!(!check_nonempty_str(&"".into()));
    assert!(check_u64(&0.into()));
    assert!(!check_u64(&(-1).into()));
    assert!(!check_iterations(&0.into()));
    assert!(check_iterations(&10000.into()));
    assert!(check_cors_entries(&json::array!["http://localhost:3000", "https://a.com"]));
    assert!(!check_cors_entries(&json::array![1]));
    assert!(check_cors_patterns(&json::array![r"^https://.*\.example\.com$"]));
    assert!(!check_cors_patterns(&json::array!["("]));
}
