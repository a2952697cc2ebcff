pub mod api;
pub mod core;
pub mod http;
pub mod utils;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use crate::api::{OrderApi, OrderItem, Session};
pub use crate::core::backoff::BackoffState;
pub use crate::core::dispatcher::{run_flood, tick_interval, FloodReport};
pub use crate::core::poller::{run_poll_pool, PollReport};
pub use crate::core::stats::{Stats, StatsSnapshot};
pub use crate::core::CycleOutcome;
pub use crate::http::{ApiCall, CallError, CallOutcome, HttpClient};
pub use crate::utils::fixtures::{sample_reference_table, FinalizedLookup, TableLookup};
pub use crate::utils::order_synth::{OrderSynthesizer, SynthTables, WebhookOrder};

/// Login accounts rotated across poll workers when no explicit credentials
/// are configured. These match the seeded accounts on the staging API.
const ROTATING_ACCOUNTS: &[(&str, &str)] = &[
    ("admin", "admin"),
    ("designer1", "designer"),
    ("designer2", "designer"),
];

/// Configuration for the polling finalize-worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub workers: usize,
    /// Poll cycles each worker runs before exiting (successful or idle).
    pub cycle_limit: u64,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            username: String::new(),
            password: String::new(),
            workers: 20,
            cycle_limit: 500,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 300_000,
            timeout_secs: 30,
        }
    }
}

impl PollConfig {
    /// Credentials for a given worker slot. An explicitly configured username
    /// wins; otherwise workers rotate through the seeded staging accounts.
    pub fn credentials_for(&self, worker: usize) -> (&str, &str) {
        if !self.username.is_empty() {
            return (&self.username, &self.password);
        }
        ROTATING_ACCOUNTS[worker % ROTATING_ACCOUNTS.len()]
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }
}

/// Configuration for the rate-limited webhook dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FloodConfig {
    pub webhook_url: String,
    pub total: u64,
    pub rate_per_minute: u64,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub report_interval_secs: u64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:8000/webhooks/test/orders/create".to_string(),
            total: 80_000,
            rate_per_minute: 2_000,
            concurrency: 10,
            timeout_secs: 180,
            report_interval_secs: 10,
        }
    }
}

impl FloodConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.max(1))
    }

    /// Bounded queue capacity between the generator and the sender pool.
    pub fn queue_capacity(&self) -> usize {
        self.concurrency.max(1) * 2
    }
}
