//! HTTP front for the print path.
//!
//! Routing is a plain function over `(method, path, body)` so it can be
//! exercised without a socket; [`PrintService`] adapts it to may_minihttp.

use crate::error::PrintError;
use crate::job::{self, PrintJob};
use crate::registry::DriverRegistry;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io::{self, Read};
use std::sync::Arc;

/// Status code plus JSON body
pub type Reply = (u16, serde_json::Value);

/// Dispatch one request
pub fn handle(registry: &DriverRegistry, method: &str, path: &str, body: &[u8]) -> Reply {
    let path = path.split('?').next().unwrap_or(path);
    match (method, path) {
        ("GET", "/health") => (
            200,
            json!({ "status": "ok", "languages": registry.languages() }),
        ),
        ("POST", "/print") => print(registry, body),
        (_, "/health") | (_, "/print") => envelope(405, "method_not_allowed", "method not allowed"),
        _ => envelope(404, "not_found", "not found"),
    }
}

fn print(registry: &DriverRegistry, body: &[u8]) -> Reply {
    let job: PrintJob = match serde_json::from_slice(body) {
        Ok(job) => job,
        Err(e) => return error_reply(&PrintError::InvalidJob(e.to_string())),
    };
    match job::print(registry, &job) {
        Ok(receipt) => (200, json!(receipt)),
        Err(e) => error_reply(&e),
    }
}

fn error_reply(err: &PrintError) -> Reply {
    let status = match err {
        PrintError::InvalidJob(_) => 400,
        PrintError::UnsupportedDriver(_) => 422,
        PrintError::Io(_) => {
            log::error!("print failed: {err}");
            500
        }
    };
    envelope(status, err.kind(), &err.public_message())
}

fn envelope(status: u16, kind: &str, message: &str) -> Reply {
    (
        status,
        json!({ "error": { "kind": kind, "message": message } }),
    )
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        422 => "Unprocessable Entity",
        _ => "Internal Server Error",
    }
}

/// may_minihttp adapter around [`handle`]
#[derive(Clone)]
pub struct PrintService {
    registry: Arc<DriverRegistry>,
}

impl PrintService {
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self { registry }
    }
}

impl HttpService for PrintService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;

        let (status, payload) = handle(&self.registry, &method, &path, &body);
        res.status_code(status as usize, reason(status));
        res.header("Content-Type: application/json");
        res.body_vec(serde_json::to_vec(&payload)?);
        Ok(())
    }
}
