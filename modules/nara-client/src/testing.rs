// Scripted transport for exercising retry and paging without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{NaraError, Result};
use crate::transport::{RawResponse, Transport};

/// Replays queued outcomes in order and records every request.
/// Returns a network error once the script runs out.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse>>>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub fn respond_json(self, body: serde_json::Value) -> Self {
        self.respond(200, &body.to_string())
    }

    pub fn fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(NaraError::Network(message.to_string())));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), query.to_vec()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(NaraError::Network("script exhausted".to_string())))
    }
}
