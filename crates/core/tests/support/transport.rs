//! Scripted dashboard transport that records every request

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use recreviews_core::{ApiRequest, ApiResponse, ApiTransport};
use recreviews_domain::ApiError;
use serde_json::{json, Value};

type Reply = Result<ApiResponse, ApiError>;
type RequestHook = Arc<dyn Fn(&ApiRequest) + Send + Sync>;

/// Replies are queued per path. When a path's queue is empty its fallback
/// is used, and without a fallback the call fails with `Unknown`.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<ApiRequest>>,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Mutex<HashMap<String, Reply>>,
    delay: Mutex<Option<Duration>>,
    hook: Mutex<Option<RequestHook>>,
}

impl RecordingTransport {
    pub fn respond(&self, path: &str, reply: Reply) {
        self.queued.lock().unwrap().entry(path.to_string()).or_default().push_back(reply);
    }

    pub fn respond_always(&self, path: &str, reply: Reply) {
        self.fallback.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn respond_json(&self, path: &str, body: Value) {
        self.respond(path, Ok(ApiResponse::Json(body)));
    }

    pub fn accept_always(&self, path: &str) {
        self.respond_always(path, Ok(ApiResponse::Json(json!({ "result": true }))));
    }

    /// Hold every reply for `delay` so concurrent callers overlap.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Run `hook` on every request before it is answered.
    pub fn on_request(&self, hook: impl Fn(&ApiRequest) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn calls(&self, path: &str) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().iter().filter(|r| r.path == path).cloned().collect()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiTransport for RecordingTransport {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let path = request.path.clone();
        let hook = self.hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(&request);
        }
        self.requests.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reply) = self.queued.lock().unwrap().get_mut(&path).and_then(VecDeque::pop_front) {
            return reply;
        }
        self.fallback
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Unknown(format!("no scripted reply for {path}"))))
    }
}
