use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::core::config::ServiceConfig;

/// Reply from a backend call. Only `status_code == 200` counts as success;
/// anything else is "no data", not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub status_code: u16,
    pub body: Value,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Generic POST collaborator. `Err` means the call itself was rejected
/// (transport failure, timeout, unknown service).
#[async_trait]
pub trait Backend: Send + Sync {
    async fn post(&self, service: &str, path: &str, body: Value) -> Result<ServiceResponse>;
}

/// Validate that a resolved endpoint URL uses HTTPS.
///
/// Base URLs come from user config and may carry an API key, so this runs
/// for every service before a client is built.
pub fn validate_endpoint(url: &str, service_name: &str) -> Result<()> {
    if !url.starts_with("https://") {
        anyhow::bail!(
            "{}: endpoint must use HTTPS, got: {}",
            service_name,
            url
        );
    }
    Ok(())
}

/// Split a backend reply into status and body.
///
/// Backends answer with a lambda-style `{ "statusCode", "body" }` envelope,
/// sometimes with `body` JSON-encoded as a string. Replies without the
/// envelope fall back to the HTTP status.
pub fn unwrap_envelope(http_status: u16, value: Value) -> ServiceResponse {
    let status_code = value
        .get("statusCode")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok());

    match status_code {
        Some(status_code) => {
            let body = match value.get("body").cloned().unwrap_or(Value::Null) {
                Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
                other => other,
            };
            ServiceResponse { status_code, body }
        }
        None => ServiceResponse {
            status_code: http_status,
            body: value,
        },
    }
}

/// Parse a raw reply body. An empty body is `Null`; text that isn't JSON is
/// kept as a string so callers expecting structured data reject it.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

struct Endpoint {
    base_url: String,
    api_key: Option<String>,
}

/// `Backend` over HTTPS, one base URL per service.
pub struct HttpBackend {
    client: reqwest::Client,
    endpoints: HashMap<String, Endpoint>,
}

impl HttpBackend {
    pub fn new(services: &[ServiceConfig], timeout: Duration) -> Result<Self> {
        let mut endpoints = HashMap::new();
        for service in services {
            validate_endpoint(&service.base_url, &service.name)?;
            endpoints.insert(
                service.name.clone(),
                Endpoint {
                    base_url: service.base_url.trim_end_matches('/').to_string(),
                    api_key: service.api_key.clone(),
                },
            );
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn post(&self, service: &str, path: &str, body: Value) -> Result<ServiceResponse> {
        let endpoint = self
            .endpoints
            .get(service)
            .with_context(|| format!("No endpoint configured for service '{}'", service))?;
        let url = format!("{}{}", endpoint.base_url, path);

        let mut request = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(key) = &endpoint.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))?;
        let reply = unwrap_envelope(status, parse_body(&text));
        debug!(service, path, status = reply.status_code, "backend reply");
        Ok(reply)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    enum Reply {
        Respond(ServiceResponse),
        Reject(String),
    }

    /// In-memory backend keyed on `path` plus the `task_id` (or `TaskType`)
    /// of the request body. Unmatched calls answer 404.
    #[derive(Default)]
    pub struct FakeBackend {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
    }

    fn key(path: &str, selector: &str) -> String {
        format!("{}#{}", path, selector)
    }

    fn selector(body: &Value) -> &str {
        body.get("task_id")
            .or_else(|| body.get("TaskType"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, path: &str, selector: &str, status: u16, body: Value) -> Self {
            self.replies.insert(
                key(path, selector),
                Reply::Respond(ServiceResponse {
                    status_code: status,
                    body,
                }),
            );
            self
        }

        pub fn reject(mut self, path: &str, selector: &str, message: &str) -> Self {
            self.replies
                .insert(key(path, selector), Reply::Reject(message.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn post(&self, service: &str, path: &str, body: Value) -> Result<ServiceResponse> {
            let k = key(path, selector(&body));
            self.calls.lock().unwrap().push(format!("{} {}", service, k));
            match self.replies.get(&k) {
                Some(Reply::Respond(r)) => Ok(r.clone()),
                Some(Reply::Reject(msg)) => anyhow::bail!("{}", msg),
                None => Ok(ServiceResponse {
                    status_code: 404,
                    body: Value::Null,
                }),
            }
        }
    }
}
