pub use super::context::ServerContext;
pub use super::result::{JSONError, JSONResult, SerdeJSONResult};
pub use super::route::ResponseForType;
pub use super::traits::{GetRequestParams, MatchRoute, ResponseFor, ResponseJsonFor};
pub use crate::error::TokenAuthError;
pub use crate::gettext;
pub use hyper::Body;
pub use hyper::Method;
pub use hyper::Request;
pub use hyper::Response;
pub use json::JsonValue;
pub use proc_macros::filter_http_methods;
pub use regex::Regex;
pub use std::sync::Arc;
