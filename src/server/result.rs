use crate::auth::{AuthError, ValidationErrors};
use crate::ext::json::ToJson2;
use crate::gettext;
use json::JsonValue;
use serde::ser::SerializeMap;
use serde::Serialize;

#[derive(Clone, Debug)]
/// Error information of a request
pub struct JSONError {
    /// Error code. Codes in `-600..=-400` are used as the HTTP status.
    pub code: i32,
    /// Error message
    pub msg: String,
    /// The debug information of the error. Only logged.
    pub debug_msg: Option<JsonValue>,
    /// Field errors of a failed validation
    pub errors: Option<ValidationErrors>,
}

impl JSONError {
    /// HTTP status of the error
    pub fn status(&self) -> u16 {
        if self.code <= -400 && self.code >= -600 {
            (-self.code) as u16
        } else if self.code < 0 {
            500
        } else if self.code > 0 {
            400
        } else {
            200
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut obj = json::object! {
            "success": false,
            "message": self.msg.as_str(),
        };
        if let Some(errors) = &self.errors {
            obj["errors"] = errors.to_json();
        }
        obj
    }
}

impl From<(i32, String)> for JSONError {
    fn from((code, msg): (i32, String)) -> Self {
        Self {
            code,
            msg,
            debug_msg: None,
            errors: None,
        }
    }
}

impl<S> From<(i32, &S)> for JSONError
where
    S: AsRef<str> + ?Sized,
{
    fn from((code, msg): (i32, &S)) -> Self {
        Self {
            code,
            msg: msg.as_ref().to_owned(),
            debug_msg: None,
            errors: None,
        }
    }
}

impl From<(i32, String, Option<JsonValue>)> for JSONError {
    fn from((code, msg, debug_msg): (i32, String, Option<JsonValue>)) -> Self {
        Self {
            code,
            msg,
            debug_msg,
            errors: None,
        }
    }
}

impl From<AuthError> for JSONError {
    fn from(e: AuthError) -> Self {
        let code = -(e.status() as i32);
        match e {
            AuthError::Validation(errors) => Self {
                code,
                msg: match errors.first_message() {
                    Some(m) => m.to_owned(),
                    None => gettext("The given data was invalid.").to_owned(),
                },
                debug_msg: None,
                errors: Some(errors),
            },
            AuthError::Db(e) => Self::from((
                code,
                gettext("Internal server error.").to_owned(),
                Some(JsonValue::from(format!(
                    "{} {}",
                    gettext("Failed to operate the database:"),
                    e
                ))),
            )),
            AuthError::PasswordHash(msg) => Self::from((
                code,
                gettext("Internal server error.").to_owned(),
                Some(JsonValue::from(format!(
                    "{} {}",
                    gettext("Failed to hash password:"),
                    msg
                ))),
            )),
            e => Self::from((code, e.to_string())),
        }
    }
}

impl From<crate::db::TokenAuthDbError> for JSONError {
    fn from(e: crate::db::TokenAuthDbError) -> Self {
        Self::from(AuthError::Db(e))
    }
}

impl From<crate::error::TokenAuthError> for JSONError {
    fn from(e: crate::error::TokenAuthError) -> Self {
        match e {
            crate::error::TokenAuthError::Auth(e) => Self::from(e),
            e => Self::from((
                -500,
                gettext("Internal server error.").to_owned(),
                Some(JsonValue::from(format!("{}", e))),
            )),
        }
    }
}

pub type JSONResult = Result<JsonValue, JSONError>;

impl ToJson2 for JSONResult {
    fn to_json2(&self) -> JsonValue {
        match self {
            Self::Ok(v) => v.clone(),
            Self::Err(e) => e.to_json(),
        }
    }
}

pub type SerdeJSONResult = Result<serde_json::Value, JSONError>;

/// Serializable view of a [SerdeJSONResult]
pub struct SerdeJSONResult2 {
    re: SerdeJSONResult,
}

impl SerdeJSONResult2 {
    pub fn new(re: SerdeJSONResult) -> Self {
        Self { re }
    }
}

impl Serialize for SerdeJSONResult2 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match &self.re {
            Ok(v) => v.serialize(serializer),
            Err(e) => {
                let len = if e.errors.is_some() { 3 } else { 2 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("message", &e.msg)?;
                if let Some(errors) = &e.errors {
                    map.serialize_entry("errors", errors)?;
                }
                map.end()
            }
        }
    }
}

#[test]
fn test_json_error_from_auth_error() {
    let e = JSONError::from(AuthError::TokenNotFound);
    assert_eq!(e.status(), 404);
    assert_eq!(
        e.to_json(),
        json::object! {"success": false, "message": "Token not found"}
    );
    assert_eq!(JSONError::from(AuthError::TokenExpired).status(), 401);
    assert_eq!(JSONError::from(AuthError::UserNotFound).status(), 500);
    let mut errors = ValidationErrors::new();
    errors.add("email", "The email has already been taken.");
    let e = JSONError::from(AuthError::Validation(errors));
    assert_eq!(e.status(), 422);
    assert_eq!(
        e.to_json()["errors"]["email"][0].as_str(),
        Some("The email has already been taken.")
    );
    let e = JSONError::from(AuthError::Db(Box::from("disk full")));
    assert_eq!(e.status(), 500);
    assert_eq!(e.msg, "Internal server error.");
    assert!(e.debug_msg.as_ref().unwrap().as_str().unwrap().contains("disk full"));
    assert!(e.to_json()["debug_msg"].is_null());
    let e = JSONError::from(AuthError::PasswordHash(String::from("salt invalid")));
    assert_eq!(e.status(), 500);
    assert_eq!(e.msg, "Internal server error.");
    assert_eq!(JSONError::from((1, "bad")).status(), 400);
    let e = JSONError::from(crate::error::TokenAuthError::from("boom"));
    assert_eq!(e.status(), 500);
    assert_eq!(e.msg, "Internal server error.");
    assert_eq!(e.debug_msg.unwrap().as_str(), Some("boom"));
    let e = JSONError::from(crate::error::TokenAuthError::Auth(AuthError::TokenExpired));
    assert_eq!(e.status(), 401);
}

#[test]
fn test_serde_json_result() {
    let re: SerdeJSONResult = Err(JSONError::from((-404, "Token not found")));
    let s = serde_json::to_value(&SerdeJSONResult2::new(re)).unwrap();
    assert_eq!(
        s,
        serde_json::json!({"success": false, "message": "Token not found"})
    );
    let re: SerdeJSONResult = Ok(serde_json::json!({"user": {"id": 1}}));
    let s = serde_json::to_value(&SerdeJSONResult2::new(re)).unwrap();
    assert_eq!(s["user"]["id"], 1);
}
