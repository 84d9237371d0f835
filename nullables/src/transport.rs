//! Nullable transport — scripted gateway replies, recorded requests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use phillet_gateway::{GatewayError, GatewayRequest, Method, RawResponse, Transport};

type Route = (Method, String);

struct Scripted {
    reply: Result<RawResponse, GatewayError>,
    delay: Option<Duration>,
}

/// A gateway transport that answers from a script instead of the network.
///
/// Replies are queued per `(method, path)` and consumed in order. The last
/// queued reply for a route is sticky: it keeps answering once the queue
/// drains. Unscripted routes answer `404`.
#[derive(Default)]
pub struct NullTransport {
    scripts: Mutex<HashMap<Route, VecDeque<Scripted>>>,
    requests: Mutex<Vec<GatewayRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) -> &Self {
        lock(&self.scripts)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
        self
    }

    /// Queue a raw reply.
    pub fn respond(&self, method: Method, path: &str, response: RawResponse) -> &Self {
        self.push(
            method,
            path,
            Scripted {
                reply: Ok(response),
                delay: None,
            },
        )
    }

    /// Queue a JSON reply with the given status.
    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.respond(method, path, RawResponse::json(status, &body))
    }

    /// Queue a reply that only resolves after `delay`.
    pub fn respond_after(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        response: RawResponse,
    ) -> &Self {
        self.push(
            method,
            path,
            Scripted {
                reply: Ok(response),
                delay: Some(delay),
            },
        )
    }

    /// Queue a transport-level failure (no response at all).
    pub fn fail(&self, method: Method, path: &str, error: GatewayError) -> &Self {
        self.push(
            method,
            path,
            Scripted {
                reply: Err(error),
                delay: None,
            },
        )
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<GatewayRequest> {
        lock(&self.requests).clone()
    }

    /// Requests sent to `path`, in order.
    pub fn requests_to(&self, path: &str) -> Vec<GatewayRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Number of requests sent to `path`.
    pub fn count(&self, path: &str) -> usize {
        lock(&self.requests).iter().filter(|r| r.path == path).count()
    }

    /// Forget recorded requests, keeping the script.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn next(&self, request: &GatewayRequest) -> Option<Scripted> {
        let mut scripts = lock(&self.scripts);
        let queue = scripts.get_mut(&(request.method.clone(), request.path.clone()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|s| Scripted {
                reply: s.reply.clone(),
                delay: s.delay,
            })
        }
    }
}

#[async_trait]
impl Transport for NullTransport {
    async fn send(&self, request: &GatewayRequest) -> Result<RawResponse, GatewayError> {
        lock(&self.requests).push(request.clone());

        let Some(scripted) = self.next(request) else {
            return Ok(RawResponse::json(
                404,
                &json!({ "message": format!("no scripted reply for {} {}", request.method, request.path) }),
            ));
        };

        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_in_order_and_last_one_sticks() {
        let transport = NullTransport::new();
        transport
            .respond(Method::GET, "/v1/health", RawResponse::new(401, ""))
            .respond(Method::GET, "/v1/health", RawResponse::new(200, "{}"));

        let request = GatewayRequest::get("/v1/health");
        assert_eq!(transport.send(&request).await.unwrap().status, 401);
        assert_eq!(transport.send(&request).await.unwrap().status, 200);
        assert_eq!(transport.send(&request).await.unwrap().status, 200);
        assert_eq!(transport.count("/v1/health"), 3);
    }

    #[tokio::test]
    async fn unscripted_route_is_not_found() {
        let transport = NullTransport::new();
        let response = transport
            .send(&GatewayRequest::post("/v1/wallet/send"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn scripted_failure_is_returned() {
        let transport = NullTransport::new();
        transport.fail(
            Method::GET,
            "/v1/health",
            GatewayError::Network("connection refused".into()),
        );
        let result = transport.send(&GatewayRequest::get("/v1/health")).await;
        assert_eq!(result, Err(GatewayError::Network("connection refused".into())));
    }

    #[tokio::test]
    async fn records_requests_with_bearer() {
        let transport = NullTransport::new();
        let mut request = GatewayRequest::get("/v1/wallet/addresses").with_query("network", "goerli");
        request.bearer = Some("a1".into());
        transport.send(&request).await.unwrap();

        let sent = transport.requests_to("/v1/wallet/addresses");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].bearer.as_deref(), Some("a1"));
        assert_eq!(sent[0].query_value("network"), Some("goerli"));
    }
}
