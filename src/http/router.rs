//! Request routing for the inventory API.

use crate::error::{ErrorKind, LedgerError};
use crate::model::{CloseBox, NewBox, NewCableType, NewProject};
use crate::service::Inventory;
use crate::store::Store;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

pub const JSON_CONTENT_TYPE: &str = "application/json";
#[cfg(feature = "metrics")]
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Label of requests that matched no route
const UNMATCHED: &str = "unmatched";

/// A fully rendered response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                content_type: JSON_CONTENT_TYPE,
                body,
            },
            Err(e) => {
                log::error!("failed to encode response: {e}");
                Self::error_envelope(500, ErrorKind::Internal.as_str(), "internal error")
            }
        }
    }

    pub fn error(err: &LedgerError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Internal {
            log::error!("request failed: {err}");
        }
        Self::error_envelope(status_for(kind), kind.as_str(), &err.public_message())
    }

    fn error_envelope(status: u16, kind: &str, message: &str) -> Self {
        let body = json!({ "error": { "kind": kind, "message": message } });
        Self {
            status,
            content_type: JSON_CONTENT_TYPE,
            body: body.to_string().into_bytes(),
        }
    }

    fn method_not_allowed() -> Self {
        Self::error_envelope(405, "method_not_allowed", "method not allowed")
    }

    fn not_found() -> Self {
        Self::error_envelope(404, ErrorKind::NotFound.as_str(), "not found")
    }

    /// JSON body as a value, for tests and logging
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

pub fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Validation => 400,
        ErrorKind::NotFound => 404,
        ErrorKind::InvalidTransition => 409,
        ErrorKind::Internal => 500,
    }
}

fn respond<T: Serialize>(status: u16, result: Result<T, LedgerError>) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::json(status, &value),
        Err(e) => ApiResponse::error(&e),
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, LedgerError> {
    serde_json::from_slice(body)
        .map_err(|e| LedgerError::validation(format!("invalid request body: {e}")))
}

fn box_id(raw: &str) -> Result<i64, LedgerError> {
    raw.parse().map_err(|_| LedgerError::not_found("box", raw))
}

/// Maps `(method, path, body)` onto inventory operations
pub struct Router<S> {
    inventory: Inventory<S>,
}

impl<S: Store> Router<S> {
    pub fn new(inventory: Inventory<S>) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &Inventory<S> {
        &self.inventory
    }

    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> ApiResponse {
        let path = path.split('?').next().unwrap_or(path);
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let (route, response) = self.dispatch(method, &segments, body);
        log::debug!("{method} {path} -> {}", response.status);
        #[cfg(feature = "metrics")]
        crate::metrics::METRICS.record_request(route, response.status);
        #[cfg(not(feature = "metrics"))]
        let _ = route;
        response
    }

    fn dispatch(&self, method: &str, segments: &[&str], body: &[u8]) -> (&'static str, ApiResponse) {
        let inventory = &self.inventory;
        match segments {
            ["api", "health"] => (
                "/api/health",
                match method {
                    "GET" => ApiResponse::json(
                        200,
                        &json!({ "status": "ok", "timestamp": Utc::now() }),
                    ),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "cable-types"] => (
                "/api/cable-types",
                match method {
                    "GET" => respond(200, inventory.cable_types().list()),
                    "POST" => respond(
                        201,
                        parse::<NewCableType>(body)
                            .and_then(|request| inventory.cable_types().create(request)),
                    ),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "projects"] => (
                "/api/projects",
                match method {
                    "GET" => respond(200, inventory.projects().list()),
                    "POST" => respond(
                        201,
                        parse::<NewProject>(body)
                            .and_then(|request| inventory.projects().create(request)),
                    ),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "boxes"] => (
                "/api/boxes",
                match method {
                    "GET" => respond(200, inventory.ledger().list()),
                    "POST" => respond(
                        201,
                        parse::<NewBox>(body).and_then(|request| inventory.ledger().create(request)),
                    ),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "boxes", "by-number", number] => (
                "/api/boxes/by-number/{number}",
                match method {
                    "GET" => respond(200, inventory.ledger().find_by_number(number)),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "boxes", id, "open"] => (
                "/api/boxes/{id}/open",
                match method {
                    "POST" => respond(200, box_id(id).and_then(|id| inventory.ledger().open(id))),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "boxes", id, "close"] => (
                "/api/boxes/{id}/close",
                match method {
                    "POST" => respond(
                        200,
                        box_id(id).and_then(|id| {
                            let request = parse::<CloseBox>(body)?;
                            inventory.ledger().close(id, request)
                        }),
                    ),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "boxes", id, "usages"] => (
                "/api/boxes/{id}/usages",
                match method {
                    "GET" => respond(
                        200,
                        box_id(id).and_then(|id| inventory.ledger().usage_history(id)),
                    ),
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            ["api", "boxes", id, "label"] => (
                "/api/boxes/{id}/label",
                match method {
                    "GET" => match box_id(id).and_then(|id| inventory.ledger().label(id)) {
                        Ok(artifact) => ApiResponse {
                            status: 200,
                            content_type: artifact.content_type,
                            body: artifact.bytes,
                        },
                        Err(e) => ApiResponse::error(&e),
                    },
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            #[cfg(feature = "metrics")]
            ["metrics"] => (
                "/metrics",
                match method {
                    "GET" => ApiResponse {
                        status: 200,
                        content_type: METRICS_CONTENT_TYPE,
                        body: crate::metrics::render(),
                    },
                    _ => ApiResponse::method_not_allowed(),
                },
            ),
            _ => (UNMATCHED, ApiResponse::not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{LabelArtifact, LabelError, LabelIssuer};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    struct NoLabels;

    impl LabelIssuer for NoLabels {
        fn issue(&self, identifier: &str) -> Result<LabelArtifact, LabelError> {
            Err(LabelError::InvalidIdentifier(identifier.to_string()))
        }
    }

    fn router() -> Router<MemoryStore> {
        Router::new(Inventory::new(MemoryStore::new(), Arc::new(NoLabels)))
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), 400);
        assert_eq!(status_for(ErrorKind::NotFound), 404);
        assert_eq!(status_for(ErrorKind::InvalidTransition), 409);
        assert_eq!(status_for(ErrorKind::Internal), 500);
    }

    #[test]
    fn test_health() {
        let response = router().handle("GET", "/api/health?probe=1", b"");
        assert_eq!(response.status, 200);
        let body = response.json_body().unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_unknown_path_and_wrong_method() {
        let router = router();
        assert_eq!(router.handle("GET", "/api/spools", b"").status, 404);
        assert_eq!(router.handle("DELETE", "/api/boxes", b"").status, 405);
        assert_eq!(router.handle("GET", "/api/boxes/1/open", b"").status, 405);
    }

    #[test]
    fn test_non_numeric_box_id_is_not_found() {
        let response = router().handle("POST", "/api/boxes/abc/open", b"");
        assert_eq!(response.status, 404);
        assert_eq!(response.json_body().unwrap()["error"]["kind"], "not_found");
    }

    #[test]
    fn test_malformed_json_is_validation_error() {
        let response = router().handle("POST", "/api/cable-types", b"{\"name\":");
        assert_eq!(response.status, 400);
        assert_eq!(response.json_body().unwrap()["error"]["kind"], "validation");
    }
}
