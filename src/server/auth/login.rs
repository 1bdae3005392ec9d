use super::super::params::RequestParams;
use super::super::preclude::*;
use chrono::Utc;

pub struct LoginContext {
    ctx: Arc<ServerContext>,
}

impl LoginContext {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ResponseJsonFor<Body> for LoginContext {
    async fn response_json(
        &self,
        mut req: Request<Body>,
    ) -> Result<Response<JsonValue>, TokenAuthError> {
        filter_http_methods!(req, method_not_allowed(), false, POST);
        // An unreadable body counts as missing fields.
        let params = match req.get_params().await {
            Ok(params) => params,
            Err(e) => {
                log::debug!(target: "tokenauth::server", "Failed to parse request body: {}", e);
                RequestParams::default()
            }
        };
        let email = params.get("email").unwrap_or("");
        let password = params.get("password").unwrap_or("");
        let session = self.ctx.session_id(&req);
        match self.ctx.auth.login(email, password, session.as_deref()).await {
            Ok(out) => {
                let now = Utc::now();
                let builder = builder
                    .header(
                        hyper::header::SET_COOKIE,
                        self.ctx.session_cookie(&out.session.id).to_header_value(),
                    )
                    .header(
                        hyper::header::SET_COOKIE,
                        self.ctx
                            .token_cookie(&out.token.token, &now)
                            .to_header_value(),
                    );
                self.ctx.response_json_result(
                    builder,
                    Ok(json::object! {
                        "success": true,
                        "message": gettext("Login successful!"),
                    }),
                )
            }
            Err(e) => self.ctx.response_json_result(builder, Err(JSONError::from(e))),
        }
    }
}

/// Body of a `405 Method Not Allowed` response
pub fn method_not_allowed() -> JsonValue {
    json::object! {
        "success": false,
        "message": gettext("Method not allowed."),
    }
}

pub struct LoginRoute {
    regex: Regex,
}

impl LoginRoute {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"^/+login/*$").unwrap(),
        }
    }
}

impl MatchRoute<Body, Body> for LoginRoute {
    fn match_route(
        &self,
        ctx: &Arc<ServerContext>,
        req: &http::Request<Body>,
    ) -> Option<Box<ResponseForType>> {
        if self.regex.is_match(req.uri().path()) {
            Some(Box::new(LoginContext::new(Arc::clone(ctx))))
        } else {
            None
        }
    }
}
