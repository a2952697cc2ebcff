pub mod client;

pub use client::HttpClient;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A single outbound call. Built by callers, executed by [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiCall {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            bearer: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            bearer: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, CallError> {
        let value = serde_json::to_value(body)
            .map_err(|e| CallError::InvalidRequest(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A completed exchange. By the time a `CallOutcome` exists the response body
/// has been read to completion, so the pooled connection is safe to reuse.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub status: u16,
    pub body: Vec<u8>,
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CallError> {
        serde_json::from_slice(&self.body).map_err(CallError::Decode)
    }
}

/// Failure modes of a single call. Timeouts are distinguished from other
/// transport failures so callers can tell a slow target from a dead one.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(serde_json::Error),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CallError::Timeout
        } else {
            CallError::Transport(err)
        }
    }
}
