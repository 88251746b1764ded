//! Thin HTTP client over the fieldops-api surface.

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// JSON-over-HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?;
        Self::into_json(path, response).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {path} failed"))?;
        Self::into_json(path, response).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {path} failed"))?;
        Self::into_json(path, response).await
    }

    async fn into_json(path: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("reading response body of {path} failed"))?;
        if !status.is_success() {
            // Error bodies carry `{ "error": { "code", "message" } }`;
            // surface the message when present.
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(text);
            bail!("{path}: {status}: {message}");
        }
        serde_json::from_str(&text).with_context(|| format!("{path}: response is not JSON"))
    }
}
