use super::super::preclude::*;
use super::login::method_not_allowed;
use chrono::Utc;

pub struct LogoutContext {
    ctx: Arc<ServerContext>,
}

impl LogoutContext {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ResponseJsonFor<Body> for LogoutContext {
    async fn response_json(
        &self,
        req: Request<Body>,
    ) -> Result<Response<JsonValue>, TokenAuthError> {
        filter_http_methods!(req, method_not_allowed(), false, POST);
        let session = self.ctx.session_id(&req);
        let session = self.ctx.auth.logout(session.as_deref()).await;
        let builder = builder
            .header(
                hyper::header::SET_COOKIE,
                self.ctx.session_cookie(&session.id).to_header_value(),
            )
            .header(
                hyper::header::SET_COOKIE,
                self.ctx.clear_token_cookie(&Utc::now()).to_header_value(),
            );
        self.ctx.response_json_result(
            builder,
            Ok(json::object! {"message": gettext("Successfully logged out!")}),
        )
    }
}

pub struct LogoutRoute {
    regex: Regex,
}

impl LogoutRoute {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"^/+logout/*$").unwrap(),
        }
    }
}

impl MatchRoute<Body, Body> for LogoutRoute {
    fn match_route(
        &self,
        ctx: &Arc<ServerContext>,
        req: &http::Request<Body>,
    ) -> Option<Box<ResponseForType>> {
        if self.regex.is_match(req.uri().path()) {
            Some(Box::new(LogoutContext::new(Arc::clone(ctx))))
        } else {
            None
        }
    }
}
