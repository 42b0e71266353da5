//! may_minihttp adapter for [`Router`].

use super::router::{Router, JSON_CONTENT_TYPE};
use crate::labels::TSPL_CONTENT_TYPE;
use crate::store::Store;
use may::coroutine::JoinHandle;
use may_minihttp::{HttpServer, HttpService, Request, Response};
use std::io::{self, Read};
use std::sync::Arc;

pub struct ApiService<S> {
    router: Arc<Router<S>>,
}

impl<S> ApiService<S> {
    pub fn new(router: Arc<Router<S>>) -> Self {
        Self { router }
    }
}

// Derived Clone would require `S: Clone`.
impl<S> Clone for ApiService<S> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl<S: Store> HttpService for ApiService<S> {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;

        let reply = self.router.handle(&method, &path, &body);
        res.status_code(reply.status as usize, reason(reply.status));
        res.header(content_type_header(reply.content_type));
        res.body_vec(reply.body);
        Ok(())
    }
}

fn content_type_header(content_type: &str) -> &'static str {
    match content_type {
        JSON_CONTENT_TYPE => "Content-Type: application/json",
        TSPL_CONTENT_TYPE => "Content-Type: text/plain; charset=utf-8",
        #[cfg(feature = "metrics")]
        super::router::METRICS_CONTENT_TYPE => "Content-Type: text/plain; version=0.0.4",
        _ => "Content-Type: application/octet-stream",
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        _ => "Internal Server Error",
    }
}

/// Serve `router` on `listen` until the returned handle is joined
pub fn start<S: Store>(router: Router<S>, listen: &str) -> io::Result<JoinHandle<()>> {
    let handle = HttpServer(ApiService::new(Arc::new(router))).start(listen)?;
    log::info!("cabletrack API listening on {listen}");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_follow_content_type() {
        assert_eq!(
            content_type_header(JSON_CONTENT_TYPE),
            "Content-Type: application/json"
        );
        assert_eq!(
            content_type_header(TSPL_CONTENT_TYPE),
            "Content-Type: text/plain; charset=utf-8"
        );
        assert_eq!(
            content_type_header("image/png"),
            "Content-Type: application/octet-stream"
        );
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(reason(201), "Created");
        assert_eq!(reason(409), "Conflict");
        assert_eq!(reason(503), "Internal Server Error");
    }
}
