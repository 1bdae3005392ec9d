use super::super::preclude::*;
use super::login::method_not_allowed;
use crate::auth::AuthError;
use percent_encoding::percent_decode_str;

pub struct UserTokenContext {
    ctx: Arc<ServerContext>,
    token: String,
}

impl UserTokenContext {
    pub fn new(ctx: Arc<ServerContext>, token: String) -> Self {
        Self { ctx, token }
    }

    async fn handle(&self) -> SerdeJSONResult {
        if self.token.is_empty() {
            return Err(JSONError::from(AuthError::TokenNotFound));
        }
        let user = self.ctx.resolver.resolve_token(&self.token).await?;
        Ok(serde_json::json!({ "user": user.to_info() }))
    }
}

#[async_trait]
impl ResponseFor<Body, Body> for UserTokenContext {
    async fn response(&self, req: Request<Body>) -> Result<Response<Body>, TokenAuthError> {
        filter_http_methods!(
            req,
            Body::from(method_not_allowed().dump()),
            true,
            self.ctx,
            allow_headers = [CONTENT_TYPE, ACCEPT, X_CSRF_TOKEN, X_REQUESTED_WITH],
            GET,
            OPTIONS,
        );
        let re = self.handle().await;
        self.ctx.response_serde_json_result(builder, re)
    }
}

pub struct UserTokenRoute {
    regex: Regex,
}

impl UserTokenRoute {
    pub fn new() -> Self {
        Self {
            regex: Regex::new(r"^/+api/+user/+token(?:/+([^/]*))?/*$").unwrap(),
        }
    }
}

impl MatchRoute<Body, Body> for UserTokenRoute {
    fn match_route(
        &self,
        ctx: &Arc<ServerContext>,
        req: &http::Request<Body>,
    ) -> Option<Box<ResponseForType>> {
        let path = req.uri().path();
        match self.regex.captures(path) {
            Some(cap) => {
                let token = match cap.get(1) {
                    Some(m) => percent_decode_str(m.as_str())
                        .decode_utf8_lossy()
                        .into_owned(),
                    None => String::new(),
                };
                Some(Box::new(UserTokenContext::new(Arc::clone(ctx), token)))
            }
            None => None,
        }
    }
}
