use crate::auth::PASSWORD_ITER;
use crate::db::TokenAuthDbConfig;
use crate::opts::CommandOpts;
use crate::server::context::DEFAULT_SESSION_COOKIE;
use crate::settings::SettingStore;
use std::net::SocketAddr;
use std::str::FromStr;

/// Default listen address
pub const DEFAULT_SERVER: &'static str = "127.0.0.1:8080";
/// Default interval between two expired token sweeps
pub const DEFAULT_TOKEN_SWEEP_INTERVAL: u64 = 3600;

/// Merge command line options with the settings file.
/// Command line options win.
#[derive(Clone)]
pub struct OptHelper<'a> {
    opt: &'a CommandOpts,
    settings: &'a SettingStore,
}

impl<'a> OptHelper<'a> {
    pub fn cookie_domain(&self) -> Option<String> {
        if self.opt.cookie_domain.is_some() {
            self.opt.cookie_domain.clone()
        } else {
            self.settings.get_str("cookie_domain")
        }
    }

    pub fn cors_allow_all(&self) -> bool {
        self.settings.get_bool("cors_allow_all").unwrap_or(false)
    }

    pub fn cors_entries(&self) -> Vec<String> {
        self.settings.get_str_list("cors_entries").unwrap_or_default()
    }

    pub fn cors_patterns(&self) -> Vec<String> {
        self.settings.get_str_list("cors_patterns").unwrap_or_default()
    }

    /// Database settings. Falls back to `tokenauth.db` when unset.
    pub fn db(&self) -> TokenAuthDbConfig {
        match self.settings.get("db") {
            Some(obj) => match TokenAuthDbConfig::new(obj) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("{}", e);
                    TokenAuthDbConfig::default()
                }
            },
            None => TokenAuthDbConfig::default(),
        }
    }

    pub fn new(opt: &'a CommandOpts, settings: &'a SettingStore) -> Self {
        Self { opt, settings }
    }

    pub fn password_iterations(&self) -> u32 {
        match self.settings.get("password_iterations").and_then(|o| o.as_u32()) {
            Some(i) if i > 0 => i,
            _ => PASSWORD_ITER,
        }
    }

    pub fn server(&self) -> SocketAddr {
        if let Some(server) = self.opt.server {
            return server;
        }
        let s = self
            .settings
            .get_str("server")
            .unwrap_or_else(|| String::from(DEFAULT_SERVER));
        match SocketAddr::from_str(&s) {
            Ok(addr) => addr,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }

    pub fn session_cookie(&self) -> String {
        match self.settings.get_str("session_cookie") {
            Some(s) if !s.is_empty() => s,
            _ => String::from(DEFAULT_SESSION_COOKIE),
        }
    }

    pub fn token_sweep_interval(&self) -> u64 {
        match self.opt.token_sweep_interval {
            Some(i) => i,
            None => self
                .settings
                .get_u64("token_sweep_interval")
                .unwrap_or(DEFAULT_TOKEN_SWEEP_INTERVAL),
        }
    }

    pub fn verbose(&self) -> bool {
        self.opt.verbose
    }
}

#[test]
fn test_opthelper() {
    use crate::opts::Command;
    let mut settings = SettingStore::default();
    assert!(settings.read_str(
        r#"{"server": "0.0.0.0:80", "cookie_domain": "a.com", "token_sweep_interval": 60, "cors_entries": ["http://localhost:3000"], "password_iterations": 20}"#,
        false
    ));
    let mut opt = CommandOpts::new(Command::Server);
    {
        let helper = OptHelper::new(&opt, &settings);
        assert_eq!(helper.server(), SocketAddr::from(([0, 0, 0, 0], 80)));
        assert_eq!(helper.cookie_domain().as_deref(), Some("a.com"));
        assert_eq!(helper.token_sweep_interval(), 60);
        assert_eq!(helper.password_iterations(), 20);
        assert_eq!(helper.cors_entries(), vec![String::from("http://localhost:3000")]);
        assert!(helper.cors_patterns().is_empty());
        assert!(!helper.cors_allow_all());
        assert_eq!(helper.session_cookie(), DEFAULT_SESSION_COOKIE);
        assert!(matches!(helper.db(), TokenAuthDbConfig::Sqlite(_)));
    }
    opt.server = Some(SocketAddr::from(([127, 0, 0, 1], 9000)));
    opt.cookie_domain = Some(String::from("b.com"));
    opt.token_sweep_interval = Some(0);
    let helper = OptHelper::new(&opt, &settings);
    assert_eq!(helper.server().port(), 9000);
    assert_eq!(helper.cookie_domain().as_deref(), Some("b.com"));
    assert_eq!(helper.token_sweep_interval(), 0);
    let empty = SettingStore::default();
    let helper = OptHelper::new(&opt, &empty);
    assert_eq!(helper.password_iterations(), PASSWORD_ITER);
}
