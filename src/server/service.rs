use super::context::ServerContext;
use super::route::ServerRoutes;
use crate::gettext;
use hyper::server::conn::AddrIncoming;
use hyper::server::Server;
use hyper::service::Service;
use hyper::Body;
use hyper::Request;
use hyper::Response;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

fn json_response(status: u16, message: &str) -> Response<Body> {
    let body = json::object! {
        "success": false,
        "message": message,
    };
    let mut res = Response::new(Body::from(body.dump()));
    *res.status_mut() = hyper::StatusCode::from_u16(status)
        .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
    res.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json; charset=utf-8"),
    );
    res
}

pub struct TokenAuthSvc {
    ctx: Arc<ServerContext>,
    routes: Arc<ServerRoutes>,
}

impl TokenAuthSvc {
    pub fn new(ctx: Arc<ServerContext>, routes: Arc<ServerRoutes>) -> Self {
        Self { ctx, routes }
    }
}

impl Service<Request<Body>> for TokenAuthSvc {
    type Response = Response<Body>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        log::debug!(target: "tokenauth::server", "{} {}", req.method(), req.uri().path());
        match self.routes.match_route(&req, &self.ctx) {
            Some(route) => Box::pin(async move {
                match route.response(req).await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        log::error!(target: "tokenauth::server", "{}", e);
                        Ok(json_response(500, gettext("Internal server error.")))
                    }
                }
            }),
            None => Box::pin(async { Ok(json_response(404, gettext("Not found."))) }),
        }
    }
}

pub struct TokenAuthMakeSvc {
    ctx: Arc<ServerContext>,
    routes: Arc<ServerRoutes>,
}

impl TokenAuthMakeSvc {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self {
            ctx,
            routes: Arc::new(ServerRoutes::new()),
        }
    }
}

impl<T> Service<T> for TokenAuthMakeSvc {
    type Response = TokenAuthSvc;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        let ctx = Arc::clone(&self.ctx);
        let routes = Arc::clone(&self.routes);
        let fut = async move { Ok(TokenAuthSvc::new(ctx, routes)) };
        Box::pin(fut)
    }
}

/// Start the server
pub fn start_server(
    addr: &SocketAddr,
    ctx: Arc<ServerContext>,
) -> Result<Server<AddrIncoming, TokenAuthMakeSvc>, hyper::Error> {
    Ok(Server::try_bind(addr)?.serve(TokenAuthMakeSvc::new(ctx)))
}

#[test]
fn test_json_response() {
    let res = json_response(404, "Not found.");
    assert_eq!(res.status(), 404);
    assert_eq!(
        res.headers()
            .get(hyper::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/json; charset=utf-8")
    );
}
