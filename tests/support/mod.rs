//! Shared helpers for integration tests: a scripted in-process transport,
//! response body builders and a settings factory with instant backoff.

#![allow(dead_code)]

pub mod socket_guard;

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ikfetch_core::{
    DocumentId, FetchContext, FetchSettings, RetryPolicy, Transport, TransportError,
    TransportResponse,
};
use serde_json::json;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A body delivered with status 200.
    Body(String),
    /// A body delivered with an explicit status.
    Status(u16, String),
    /// A transport-level failure (no body).
    Fault,
}

#[derive(Debug)]
struct Route {
    prefix: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from per-endpoint scripts and recording every call.
///
/// An endpoint is served by the route with the longest matching prefix.
/// Replies are consumed in order; the last one repeats. Unscripted endpoints
/// fail at the transport level.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends `reply` to the script for endpoints starting with `prefix`.
    pub fn on(&self, prefix: impl Into<String>, reply: Reply) -> &Self {
        let prefix = prefix.into();
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|route| route.prefix == prefix) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                prefix,
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Scripts a 200 body for `prefix`.
    pub fn respond(&self, prefix: impl Into<String>, body: impl Into<String>) -> &Self {
        self.on(prefix, Reply::Body(body.into()))
    }

    /// All endpoints called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose endpoint starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|endpoint| endpoint.starts_with(prefix))
            .count()
    }

    fn next_reply(&self, endpoint: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .filter(|route| endpoint.starts_with(&route.prefix))
            .max_by_key(|route| route.prefix.len())?;
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, endpoint: &str) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(endpoint.to_string());
        match self.next_reply(endpoint) {
            Some(Reply::Body(body)) => Ok(TransportResponse::with_status(200, body)),
            Some(Reply::Status(status, body)) => Ok(TransportResponse::with_status(status, body)),
            Some(Reply::Fault) => Err(TransportError::other(endpoint, "scripted fault")),
            None => Err(TransportError::other(endpoint, "no scripted reply")),
        }
    }
}

/// Settings rooted at `data_dir` with a zero backoff unit.
pub fn test_settings(data_dir: &Path) -> FetchSettings {
    let mut settings = FetchSettings::new("test-token", data_dir);
    settings.retry = RetryPolicy::new(3, Duration::ZERO);
    settings
}

/// Builds a context over `transport`.
pub fn test_context(settings: &FetchSettings, transport: &Arc<ScriptedTransport>) -> FetchContext {
    let transport: Arc<dyn Transport> = transport.clone();
    FetchContext::new(settings, transport)
}

/// Search window body with `(tid, title, publishdate, docsource)` hits.
pub fn search_body(hits: &[(DocumentId, &str, &str, &str)]) -> String {
    let docs: Vec<_> = hits
        .iter()
        .map(|(tid, title, date, source)| {
            json!({"tid": tid, "title": title, "publishdate": date, "docsource": source})
        })
        .collect();
    json!({"found": format!("1 - {} of {}", hits.len(), hits.len()), "docs": docs}).to_string()
}

/// Search window body with no hits.
pub fn empty_search_body() -> String {
    json!({"found": "0", "docs": []}).to_string()
}

/// Document detail body.
pub fn detail_body(title: &str, courtcopy: bool, content: &str) -> String {
    json!({"tid": 1, "title": title, "courtcopy": courtcopy, "doc": content}).to_string()
}

/// Original court copy body.
pub fn original_body(base64_doc: &str, content_type: &str) -> String {
    json!({"doc": base64_doc, "Content-Type": content_type}).to_string()
}

/// Application-level rejection body.
pub fn errmsg_body(message: &str) -> String {
    json!({"errmsg": message}).to_string()
}
