use super::super::params::RequestParams;
use super::super::preclude::*;
use super::login::method_not_allowed;
use crate::auth::RegisterForm;

pub struct RegisterContext {
    ctx: Arc<ServerContext>,
}

impl RegisterContext {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ResponseJsonFor<Body> for RegisterContext {
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
        let form = RegisterForm {
            name: params.get_owned("name"),
            email: params.get_owned("email"),
            password: params.get_owned("password"),
        };
        let session = self.ctx.session_id(&req);
        match self.ctx.auth.register(&form, session.as_deref()).await {
            Ok((_, session)) => {
                let builder = builder.header(
                    hyper::header::SET_COOKIE,
                    self.ctx.session_cookie(&session.id).to_header_value(),
                );
                self.ctx.response_json_result(
                    builder,
                    Ok(json::object! {
                        "success": true,
                        "message": gettext("Registration successful!"),
                    }),
                )
            }
            Err(e) => self.ctx.response_json_result(builder, Err(JSONError::from(e))),
        }
    }
}

pub struct RegisterRoute {
    regex: Regex,
}

impl RegisterRoute {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"^/+register/*$").unwrap(),
        }
    }
}

impl MatchRoute<Body, Body> for RegisterRoute {
    fn match_route(
        &self,
        ctx: &Arc<ServerContext>,
        req: &http::Request<Body>,
    ) -> Option<Box<ResponseForType>> {
        if self.regex.is_match(req.uri().path()) {
            Some(Box::new(RegisterContext::new(Arc::clone(ctx))))
        } else {
            None
        }
    }
}
