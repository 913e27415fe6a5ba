//! In-memory backend used by the unit tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::Semaphore;

use crate::auth::AuthSession;
use crate::cache::QueryCache;
use crate::client::JudgeClient;
use crate::error::TransportError;
use crate::portal::Portal;
use crate::transport::{ApiRequest, Transport};
use crate::types::{AppConfig, Credential, Student};

/// Answers by path suffix, later registrations first; unknown paths get a
/// 404. Requests to held suffixes wait until
/// [`release`](FakeTransport::release) hands out a permit.
pub struct FakeTransport {
    responses: Vec<(String, Result<Value, TransportError>)>,
    held: Vec<String>,
    gate: Semaphore,
    calls: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            held: Vec::new(),
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, suffix: &str, body: Value) -> Self {
        self.responses.push((suffix.to_string(), Ok(body)));
        self
    }

    pub fn fail(mut self, suffix: &str, error: TransportError) -> Self {
        self.responses.push((suffix.to_string(), Err(error)));
        self
    }

    pub fn hold(mut self, suffix: &str) -> Self {
        self.held.push(suffix.to_string());
        self
    }

    pub fn release(&self, requests: usize) {
        self.gate.add_permits(requests);
    }

    pub fn calls_to(&self, suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.path.ends_with(suffix))
            .count()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let path = request.path.clone();
        self.calls.lock().unwrap().push(request);

        if self.held.iter().any(|suffix| path.ends_with(suffix.as_str())) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        self.responses
            .iter()
            .rev()
            .find(|(suffix, _)| path.ends_with(suffix.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| {
                Err(TransportError::Status {
                    status: 404,
                    message: format!("no route for {path}"),
                })
            })
    }
}

pub fn logged_in_auth() -> Arc<AuthSession> {
    let auth = Arc::new(AuthSession::new());
    auth.establish(Credential {
        access_token: "token-1".to_string(),
        student: Student {
            id: "s1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        },
    });
    auth
}

pub fn portal_with(transport: FakeTransport) -> Portal<FakeTransport> {
    let config = AppConfig::default();
    let client = JudgeClient::new(transport, logged_in_auth(), config.api_prefix);
    Portal::new(client, Arc::new(QueryCache::new()), config.preferred_languages)
}
