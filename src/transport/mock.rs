//! Scripted in-memory transport for unit tests.

use crate::errors::{SwiftError, SwiftResult};
use crate::transport::{Request, Response, Transport};
use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) const BASE_URL: &str = "http://swift.example.org";

struct Scripted {
    outcome: Result<Response, String>,
    delay: Duration,
}

/// Replies to `(method, path)` pairs from per-route queues and records every
/// request it receives. Unscripted requests fail as transport errors.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(&self, method: Method, path: &str, response: Response) -> &Self {
        self.script(method, path, Ok(response), Duration::ZERO)
    }

    pub(crate) fn on_status(&self, method: Method, path: &str, status: u16) -> &Self {
        self.on(method, path, reply(status))
    }

    /// Reply only after `delay`, to force out-of-order completion.
    pub(crate) fn on_delayed(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        response: Response,
    ) -> &Self {
        self.script(method, path, Ok(response), delay)
    }

    /// Fail without a response, like a dropped connection.
    pub(crate) fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.script(method, path, Err(message.to_string()), Duration::ZERO)
    }

    fn script(
        &self,
        method: Method,
        path: &str,
        outcome: Result<Response, String>,
        delay: Duration,
    ) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Scripted { outcome, delay });
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// `METHOD path` of every request, in arrival order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub(crate) fn count(&self, method: &Method) -> usize {
        self.requests()
            .iter()
            .filter(|r| &r.method == method)
            .count()
    }

    /// Whether every scripted reply has been consumed.
    pub(crate) fn is_drained(&self) -> bool {
        self.routes.lock().unwrap().values().all(VecDeque::is_empty)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn send(&self, request: Request) -> SwiftResult<Response> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().unwrap().push(request);

        let scripted = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let Some(scripted) = scripted else {
            return Err(SwiftError::TransportMessage {
                method: key.0,
                path: key.1,
                message: "no scripted response".into(),
            });
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted
            .outcome
            .map_err(|message| SwiftError::TransportMessage {
                method: key.0,
                path: key.1,
                message,
            })
    }
}

pub(crate) fn reply(status: u16) -> Response {
    Response::new(StatusCode::from_u16(status).unwrap())
}

pub(crate) fn reply_with(status: u16, headers: &[(&str, &str)], body: &str) -> Response {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    reply(status).with_headers(map).with_body(body.to_string())
}
