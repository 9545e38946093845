//! Scripted backend for controller tests

use super::{Backend, HealthReport, QueryRequest};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub enum Reply {
    Answer(String),
    Service(String),
    Transport(String),
    Panic,
}

#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<QueryRequest>>,
    health_label: Option<String>,
    online: bool,
    hang_health: bool,
    health_calls: AtomicUsize,
    hold: bool,
    release: Notify,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            online: true,
            ..Default::default()
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.health_label = Some(label.to_string());
        self
    }

    /// Make the health check never answer
    pub fn with_hung_health(mut self) -> Self {
        self.hang_health = true;
        self
    }

    /// Make every query wait for `release()` before answering
    pub fn held(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn health(&self) -> Result<HealthReport> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_health {
            std::future::pending::<()>().await;
        }
        if self.online {
            Ok(HealthReport {
                status: "online".to_string(),
                source: self.health_label.clone(),
            })
        } else {
            Err(Error::Transport("connection refused".to_string()))
        }
    }

    async fn respond(&self, request: &QueryRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.hold {
            self.release.notified().await;
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Answer("default answer".to_string()));
        match reply {
            Reply::Answer(text) => Ok(text),
            Reply::Service(message) => Err(Error::Service(message)),
            Reply::Transport(message) => Err(Error::Transport(message)),
            Reply::Panic => panic!("scripted backend failure"),
        }
    }

    fn base_url(&self) -> &str {
        "scripted://backend"
    }
}
