use chrono::{DateTime, Duration, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::HashMap;

/// Name of the cookie carrying the bearer token
pub const AUTH_TOKEN_COOKIE: &'static str = "auth_token";
/// Lifetime of the token cookie. Longer than the token itself.
pub const COOKIE_EXPIRY_DAYS: i64 = 10;

const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'\\');

#[derive(Clone, Debug, PartialEq)]
/// A `Set-Cookie` header to send
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub same_site: Option<&'static str>,
}

impl SetCookie {
    pub fn new<N: AsRef<str> + ?Sized, V: AsRef<str> + ?Sized>(name: &N, value: &V) -> Self {
        Self {
            name: name.as_ref().to_owned(),
            value: value.as_ref().to_owned(),
            path: Some(String::from("/")),
            domain: None,
            expires: None,
            max_age: None,
            http_only: false,
            same_site: None,
        }
    }

    pub fn domain(mut self, domain: Option<&str>) -> Self {
        self.domain = domain.map(|d| d.to_owned());
        self
    }

    /// Keep the cookie for `dur` from `now`.
    pub fn lifetime(mut self, now: &DateTime<Utc>, dur: Duration) -> Self {
        self.expires = Some(*now + dur);
        self.max_age = Some(dur.num_seconds());
        self
    }

    /// Tell the client to drop the cookie.
    pub fn expired(mut self, now: &DateTime<Utc>) -> Self {
        self.value.clear();
        self.expires = Some(*now - Duration::hours(1));
        self.max_age = Some(0);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self.same_site = Some("Lax");
        self
    }

    pub fn to_header_value(&self) -> String {
        let mut s = format!(
            "{}={}",
            self.name,
            utf8_percent_encode(&self.value, COOKIE_VALUE)
        );
        if let Some(expires) = &self.expires {
            s += &format!("; Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT"));
        }
        if let Some(max_age) = self.max_age {
            s += &format!("; Max-Age={}", max_age);
        }
        if let Some(path) = &self.path {
            s += &format!("; Path={}", path);
        }
        if let Some(domain) = &self.domain {
            s += &format!("; Domain={}", domain);
        }
        if self.http_only {
            s += "; HttpOnly";
        }
        if let Some(same_site) = self.same_site {
            s += &format!("; SameSite={}", same_site);
        }
        s
    }
}

/// Parse the `Cookie` request header. The first value of a name wins.
pub fn parse_cookie_header(value: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for pair in value.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (name, value) = match pair.find('=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => continue,
        };
        let value = value.trim().trim_matches('"');
        let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
        map.entry(name.trim().to_owned()).or_insert(value);
    }
    map
}

#[test]
fn test_set_cookie() {
    let now = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&Utc);
    let c = SetCookie::new(AUTH_TOKEN_COOKIE, "abc")
        .domain(Some("example.com"))
        .lifetime(&now, Duration::days(COOKIE_EXPIRY_DAYS));
    assert_eq!(
        c.to_header_value(),
        "auth_token=abc; Expires=Fri, 12 Jan 2024 03:04:05 GMT; Max-Age=864000; Path=/; Domain=example.com"
    );
    let c = SetCookie::new(AUTH_TOKEN_COOKIE, "abc").expired(&now);
    assert_eq!(
        c.to_header_value(),
        "auth_token=; Expires=Tue, 02 Jan 2024 02:04:05 GMT; Max-Age=0; Path=/"
    );
    let c = SetCookie::new("tokenauth_session", "id").http_only();
    assert_eq!(
        c.to_header_value(),
        "tokenauth_session=id; Path=/; HttpOnly; SameSite=Lax"
    );
}

#[test]
fn test_parse_cookie_header() {
    let map = parse_cookie_header("a=1; tokenauth_session=xyz;b=%20c ; a=2; broken");
    assert_eq!(map.get("a").map(|s| s.as_str()), Some("1"));
    assert_eq!(map.get("tokenauth_session").map(|s| s.as_str()), Some("xyz"));
    assert_eq!(map.get("b").map(|s| s.as_str()), Some(" c"));
    assert!(map.get("broken").is_none());
}
