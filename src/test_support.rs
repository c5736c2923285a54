//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use serde_json::{json, Value};

use crate::gateway::{Backend, BackendRequest, BackendResponse, TransportError};
use crate::notify::{Notice, Notifier};

/// Answers requests from a queue of canned responses and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<BackendResponse, TransportError>>>,
    requests: Mutex<Vec<BackendRequest>>,
    pause: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(BackendResponse::new(status, body)));
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError(message.to_string())));
    }

    /// Hold the next request after it took its response, until the returned
    /// handle is notified.
    pub fn pause_next(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.pause.lock().unwrap() = Some(release.clone());
        release
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BackendResponse::new(500, json!({ "message": "No scripted response" }))));

        let pause = self.pause.lock().unwrap().take();
        if let Some(release) = pause {
            release.notified().await;
        }
        response
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Keeps every notification in memory, oldest first.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice);
    }
}
