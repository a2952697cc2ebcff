//! Client for the order-processing API consumed by the poll workers.
//!
//! Thin request/response plumbing: every method resolves to either a typed
//! payload or a [`CallError`]; interpreting outcomes (idle vs error, fatal vs
//! transient) is the poller's job.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::{ApiCall, CallError, HttpClient};

/// Standard response wrapper used by every endpoint of the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthData {
    pub access_token: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub role: String,
}

/// Bearer credential obtained once per worker at startup. Owned exclusively
/// by the worker that logged in; dropped when the worker exits.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
}

/// One sub-item of a fetched work unit.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub fulfillment_id: String,
    #[serde(default)]
    pub sku: String,
    pub customer_img_url: String,
    #[serde(default)]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
struct FinalizeRequest<'a> {
    final_img_url: &'a str,
}

pub struct OrderApi {
    client: Arc<HttpClient>,
    base_url: String,
}

impl OrderApi {
    pub fn new(client: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// `POST /auth/login`. Called once per worker; a failure here is fatal
    /// for the calling worker.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, CallError> {
        let call = ApiCall::post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest { username, password })?;

        let outcome = self.client.call(&call).await?;
        if !outcome.is_success() {
            return Err(CallError::Status(outcome.status));
        }

        let envelope: Envelope<AuthData> = outcome.json()?;
        let auth = envelope
            .data
            .ok_or_else(|| CallError::InvalidRequest("login response had no data".to_string()))?;

        Ok(Session { access_token: auth.access_token })
    }

    /// `GET /orders/next`. An empty item list is the idle signal.
    pub async fn next_order(&self, session: &Session) -> Result<Vec<OrderItem>, CallError> {
        let call = ApiCall::get(format!("{}/orders/next", self.base_url))
            .bearer(&session.access_token);

        let outcome = self.client.call(&call).await?;
        if !outcome.is_success() {
            return Err(CallError::Status(outcome.status));
        }

        let envelope: Envelope<Vec<OrderItem>> = outcome.json()?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// `POST /orders/{order_id}/products/{fulfillment_id}` with the finalized
    /// artifact reference for one sub-item.
    pub async fn finalize_item(
        &self,
        session: &Session,
        order_id: i64,
        fulfillment_id: &str,
        final_img_url: &str,
    ) -> Result<(), CallError> {
        let call = ApiCall::post(format!(
            "{}/orders/{}/products/{}",
            self.base_url, order_id, fulfillment_id
        ))
        .bearer(&session.access_token)
        .json(&FinalizeRequest { final_img_url })?;

        let outcome = self.client.call(&call).await?;
        if !outcome.is_success() {
            return Err(CallError::Status(outcome.status));
        }
        Ok(())
    }

    /// `POST /orders/{order_id}/designer` — closes out a fully finalized unit.
    pub async fn approve_order(&self, session: &Session, order_id: i64) -> Result<(), CallError> {
        let call = ApiCall::post(format!("{}/orders/{}/designer", self.base_url, order_id))
            .bearer(&session.access_token);

        let outcome = self.client.call(&call).await?;
        if !outcome.is_success() {
            return Err(CallError::Status(outcome.status));
        }
        Ok(())
    }
}
