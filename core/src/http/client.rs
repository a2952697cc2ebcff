use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use super::{ApiCall, CallError, CallOutcome};

// Transport tuning for long runs against a single host: generous idle pool
// so senders reuse connections instead of renegotiating TLS per request.
const POOL_MAX_IDLE_PER_HOST: usize = 100;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Shared reqwest wrapper used by both the poll-worker pool and the
/// dispatcher. Every call produces a definite outcome: the response body is
/// always read to completion, and timeouts surface as their own error kind.
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let inner = ClientBuilder::new()
            .timeout(timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self { inner }
    }

    pub async fn call(&self, call: &ApiCall) -> Result<CallOutcome, CallError> {
        let mut builder = self.inner.request(call.method.clone(), &call.url);

        if let Some(token) = &call.bearer {
            builder = builder.bearer_auth(token);
        }

        for (name, value) in &call.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &call.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(CallError::from)?;
        let status = response.status().as_u16();

        // Drain unconditionally, success or failure, so the connection is
        // never returned to the pool half-read.
        let body = response.bytes().await.map_err(CallError::from)?.to_vec();

        Ok(CallOutcome { status, body })
    }
}
