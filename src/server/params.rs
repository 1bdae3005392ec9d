use super::traits::GetRequestParams;
use crate::error::TokenAuthError;
use bytes::BytesMut;
use hyper::{body::HttpBody, Body, Request};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RequestParams {
    pub params: HashMap<String, Vec<String>>,
}

impl RequestParams {
    pub fn get<S: AsRef<str> + ?Sized>(&self, name: &S) -> Option<&str> {
        match self.params.get(name.as_ref()) {
            Some(v) => {
                if v.len() > 0 {
                    Some(&v[0])
                } else {
                    None
                }
            }
            None => None,
        }
    }

    /// Get an owned copy of a parameter
    pub fn get_owned<S: AsRef<str> + ?Sized>(&self, name: &S) -> Option<String> {
        self.get(name).map(|s| s.to_owned())
    }

    fn extend(&mut self, other: HashMap<String, Vec<String>>) {
        for (k, v) in other {
            match self.params.get_mut(&k) {
                Some(l) => {
                    l.extend(v);
                }
                None => {
                    self.params.insert(k, v);
                }
            }
        }
    }
}

/// Flatten a JSON object body. Nested values are kept as their JSON text.
fn json_to_params(value: &json::JsonValue) -> HashMap<String, Vec<String>> {
    let mut params = HashMap::new();
    for (key, obj) in value.entries() {
        let mut list = Vec::new();
        if obj.is_array() {
            for s in obj.members() {
                match s.as_str() {
                    Some(s) => list.push(s.to_owned()),
                    None => list.push(s.dump()),
                }
            }
        } else if let Some(s) = obj.as_str() {
            list.push(s.to_owned());
        } else if !obj.is_null() {
            list.push(obj.dump());
        }
        params.insert(key.to_owned(), list);
    }
    params
}

async fn read_body(req: &mut Request<Body>) -> Result<String, TokenAuthError> {
    let mut body = BytesMut::new();
    loop {
        if let Some(d) = req.body_mut().data().await {
            body.extend_from_slice(&d?);
        } else {
            break;
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}

#[async_trait]
impl GetRequestParams for Request<Body> {
    async fn get_params(&mut self) -> Result<RequestParams, TokenAuthError> {
        let mut params = RequestParams {
            params: HashMap::new(),
        };
        if let Some(query) = self.uri().query() {
            params.params = urlparse::parse_qs(query);
        }
        if let Some(ct) = self.headers().get(hyper::header::CONTENT_TYPE) {
            let cts = ct.to_str()?.to_lowercase();
            let mime = cts.split(';').next().unwrap_or("").trim().to_owned();
            if mime == "application/x-www-form-urlencoded" {
                let body = read_body(self).await?;
                params.extend(urlparse::parse_qs(&body));
            } else if mime == "application/json" {
                let body = read_body(self).await?;
                if !body.trim().is_empty() {
                    let value = json::parse(&body)?;
                    params.extend(json_to_params(&value));
                }
            }
        }
        Ok(params)
    }
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_get_params() -> Result<(), TokenAuthError> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/login?lang=en")
        .header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")
        .body(Body::from("email=john%40example.com&password=a+b"))?;
    let params = req.get_params().await?;
    assert_eq!(params.get("email"), Some("john@example.com"));
    assert_eq!(params.get("password"), Some("a b"));
    assert_eq!(params.get("lang"), Some("en"));
    let mut req = Request::builder()
        .method("POST")
        .uri("/register")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"name":"John","email":"john@example.com","age":3,"x":null}"#))?;
    let params = req.get_params().await?;
    assert_eq!(params.get("name"), Some("John"));
    assert_eq!(params.get("age"), Some("3"));
    assert_eq!(params.get("x"), None);
    assert_eq!(params.get("missing"), None);
    let mut req = Request::builder()
        .method("POST")
        .uri("/logout")
        .body(Body::empty())?;
    assert!(req.get_params().await?.params.is_empty());
    Ok(())
}
