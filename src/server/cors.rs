use crate::gettext;
use http::uri::InvalidUri;
use http::uri::Scheme;
use http::Uri;
use regex::Regex;
use std::cmp::PartialEq;
use std::convert::TryFrom;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
/// An allowed origin
pub struct CorsHost {
    host: String,
    port: u16,
    scheme: Scheme,
}

fn default_port(scheme: &Scheme) -> Option<u16> {
    match scheme.as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

impl CorsHost {
    pub fn new(url: Uri) -> Result<Self, &'static str> {
        match url.host() {
            Some(host) => {
                let scheme = match url.scheme() {
                    Some(scheme) => scheme.to_owned(),
                    None => Scheme::HTTP,
                };
                let port = match url.port() {
                    Some(port) => port.as_u16(),
                    None => match default_port(&scheme) {
                        Some(port) => port,
                        None => return Err(gettext("port not found.")),
                    },
                };
                Ok(Self {
                    host: host.to_owned(),
                    port,
                    scheme,
                })
            }
            None => Err(gettext("hostname not found.")),
        }
    }
}

impl Display for CorsHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if default_port(&self.scheme) == Some(self.port) {
            f.write_fmt(format_args!("{}://{}", self.scheme, self.host))
        } else {
            f.write_fmt(format_args!("{}://{}:{}", self.scheme, self.host, self.port))
        }
    }
}

impl FromStr for CorsHost {
    type Err = CorsHostError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl PartialEq<Uri> for CorsHost {
    fn eq(&self, other: &Uri) -> bool {
        match CorsHost::new(other.clone()) {
            Ok(host) => host == *self,
            Err(_) => false,
        }
    }
}

impl PartialEq<CorsHost> for Uri {
    fn eq(&self, other: &CorsHost) -> bool {
        other == self
    }
}

impl PartialEq<str> for CorsHost {
    fn eq(&self, other: &str) -> bool {
        match Uri::from_str(other) {
            Ok(uri) => *self == uri,
            Err(_) => false,
        }
    }
}

impl PartialEq<&str> for CorsHost {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl TryFrom<Uri> for CorsHost {
    type Error = &'static str;
    fn try_from(value: Uri) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CorsHost {
    type Error = CorsHostError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(Self::try_from(Uri::from_str(value)?)?)
    }
}

#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum CorsHostError {
    String(String),
    InvaildUri(InvalidUri),
    Regex(regex::Error),
}

impl From<&str> for CorsHostError {
    fn from(v: &str) -> Self {
        Self::String(String::from(v))
    }
}

impl std::error::Error for CorsHostError {}

#[derive(Clone, Debug, PartialEq)]
/// Result of checking a request origin
pub enum CorsResult {
    /// The origin is allowed explicitly. The origin should be echoed back.
    Allowed,
    /// Every origin is allowed.
    AllowedAll,
    /// The origin is not allowed.
    NotAllowed,
}

impl CorsResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed | Self::AllowedAll)
    }
}

/// Allowed cross-origin sources
pub struct CorsContext {
    allow_all: bool,
    entries: Vec<CorsHost>,
    patterns: Vec<Regex>,
}

impl CorsContext {
    pub fn new(allow_all: bool, entries: Vec<CorsHost>, patterns: Vec<Regex>) -> Self {
        Self {
            allow_all,
            entries,
            patterns,
        }
    }

    /// Build from the string lists found in the settings.
    pub fn from_strings(
        allow_all: bool,
        entries: &[String],
        patterns: &[String],
    ) -> Result<Self, CorsHostError> {
        let mut hosts = Vec::new();
        for e in entries {
            hosts.push(CorsHost::try_from(e.as_str())?);
        }
        let mut regexes = Vec::new();
        for p in patterns {
            regexes.push(Regex::new(p)?);
        }
        Ok(Self::new(allow_all, hosts, regexes))
    }

    /// Check the `Origin` header value of a request.
    pub fn matches(&self, origin: &str) -> CorsResult {
        if self.allow_all {
            return CorsResult::AllowedAll;
        }
        for e in self.entries.iter() {
            if e == origin {
                return CorsResult::Allowed;
            }
        }
        for p in self.patterns.iter() {
            if p.is_match(origin) {
                return CorsResult::Allowed;
            }
        }
        CorsResult::NotAllowed
    }
}

impl Default for CorsContext {
    fn default() -> Self {
        Self::new(false, Vec::new(), Vec::new())
    }
}

#[test]
fn test_cors_host() {
    let host = CorsHost::try_from("127.0.0.1:8080").unwrap();
    let uri = Uri::from_str("http://127.0.0.1:8080").unwrap();
    assert!(host == uri);
    assert!(uri == host);
    assert!(host != Uri::from_str("127.0.0.1").unwrap());
    assert!(host != Uri::from_str("https://127.0.0.1:8080").unwrap());
    let host2 = CorsHost::try_from("https://app.example.com").unwrap();
    assert!(host2 == "https://app.example.com:443");
    assert!(host2 != "http://app.example.com");
    assert_eq!(host.to_string(), "http://127.0.0.1:8080");
    assert_eq!(host2.to_string(), "https://app.example.com");
}

#[test]
fn test_cors_context() {
    let ctx = CorsContext::from_strings(
        false,
        &[String::from("http://localhost:3000")],
        &[String::from(r"^https://[A-Za-z0-9-]+\.example\.com$")],
    )
    .unwrap();
    assert_eq!(
        ctx.matches("http://localhost:3000"),
        CorsResult::Allowed
    );
    assert_eq!(
        ctx.matches("https://app.example.com"),
        CorsResult::Allowed
    );
    assert_eq!(
        ctx.matches("https://evil.com"),
        CorsResult::NotAllowed
    );
    let all = CorsContext::new(true, vec![], vec![]);
    assert!(all.matches("https://evil.com").is_allowed());
    assert!(CorsContext::from_strings(false, &[], &[String::from("(")]).is_err());
}
