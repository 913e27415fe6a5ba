use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::utils::{gen_request_id, join_url};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub id: String,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: gen_request_id(8),
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Flattens a serialisable filter into query pairs, dropping unset
    /// fields.
    pub fn with_query<Q: Serialize>(mut self, query: &Q) -> Self {
        if let Ok(Value::Object(fields)) = serde_json::to_value(query) {
            self.query = fields
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::Null => None,
                    Value::String(s) => Some((key, s)),
                    other => Some((key, other.to_string())),
                })
                .collect();
        }
        self
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self, TransportError> {
        let body = serde_json::to_value(body).map_err(|e| TransportError::Encode(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Sends one request to the backend and returns the decoded JSON body.
/// Implementations report failures; they never retry and never touch
/// authentication state.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}

pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = join_url(&self.base_url, &request.path);
        tracing::debug!(id = %request.id, method = %request.method, %url, "dispatching request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .timeout(self.timeout)
            .header("Accept", "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let body = decode_body(&request.id, &text);

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }
}

fn decode_body(request_id: &str, text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|e| {
        tracing::warn!(id = %request_id, "response body is not JSON: {}", e);
        Value::Null
    })
}

/// `message`, else `error.message`, else a generic description.
pub fn error_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/error/message").and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .unwrap_or("Request failed")
        .to_string()
}
