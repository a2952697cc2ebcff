//! Polling finalize-worker pool.
//!
//! Each worker owns one session (established once at startup), then runs a
//! fixed number of poll cycles: fetch the next work unit, finalize its
//! sub-items in server order, approve the unit, sleep per the backoff policy.
//! A login failure is fatal for that worker only; everything past login is
//! downgraded to a per-cycle outcome, including panics, which are caught at
//! the cycle boundary so a bad unit can never take the pool down.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::time::sleep;

use crate::api::{OrderApi, Session};
use crate::core::backoff::BackoffState;
use crate::core::CycleOutcome;
use crate::http::HttpClient;
use crate::utils::fixtures::FinalizedLookup;
use crate::PollConfig;

/// Aggregated result of a pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub workers_completed: usize,
    pub login_failures: usize,
    pub success_cycles: u64,
    pub idle_cycles: u64,
    pub error_cycles: u64,
}

impl PollReport {
    pub fn cycles(&self) -> u64 {
        self.success_cycles + self.idle_cycles + self.error_cycles
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct WorkerTally {
    success: u64,
    idle: u64,
    error: u64,
}

impl WorkerTally {
    fn count(&mut self, outcome: CycleOutcome) {
        match outcome {
            CycleOutcome::Success => self.success += 1,
            CycleOutcome::Idle => self.idle += 1,
            CycleOutcome::Error => self.error += 1,
        }
    }
}

/// Runs `config.workers` poll workers to completion and returns the merged
/// tallies. Workers that fail login exit early; the rest keep going.
pub async fn run_poll_pool(config: &PollConfig, lookup: Arc<dyn FinalizedLookup>) -> PollReport {
    let client = Arc::new(HttpClient::new(config.timeout()));
    let api = Arc::new(OrderApi::new(client, &config.base_url));

    let mut handles = Vec::with_capacity(config.workers);
    for idx in 0..config.workers {
        let api = Arc::clone(&api);
        let lookup = Arc::clone(&lookup);
        let config = config.clone();
        handles.push(tokio::spawn(run_worker(idx, config, api, lookup)));
    }

    let mut report = PollReport::default();
    for handle in handles {
        match handle.await {
            Ok(Some(tally)) => {
                report.workers_completed += 1;
                report.success_cycles += tally.success;
                report.idle_cycles += tally.idle;
                report.error_cycles += tally.error;
            }
            Ok(None) => report.login_failures += 1,
            Err(e) => error!("worker task aborted: {}", e),
        }
    }
    report
}

/// One worker's lifetime: login, then `cycle_limit` cycles. Returns `None`
/// when login fails (the fatal case).
async fn run_worker(
    idx: usize,
    config: PollConfig,
    api: Arc<OrderApi>,
    lookup: Arc<dyn FinalizedLookup>,
) -> Option<WorkerTally> {
    info!("worker-{}: started", idx);

    let (username, password) = config.credentials_for(idx);
    let session = match api.login(username, password).await {
        Ok(session) => session,
        Err(e) => {
            // Fatal for this worker: a permanent auth failure must not spin.
            error!("worker-{}: login failed, exiting: {}", idx, e);
            return None;
        }
    };

    let mut backoff = BackoffState::new(config.backoff_base(), config.backoff_cap());
    let mut tally = WorkerTally::default();

    for cycle in 0..config.cycle_limit {
        let outcome = run_guarded_cycle(idx, &api, &session, lookup.as_ref()).await;
        tally.count(outcome);

        let delay = backoff.next_delay(outcome);
        debug!("worker-{}: cycle {} => {}, next poll in {:?}", idx, cycle, outcome, delay);

        if cycle + 1 < config.cycle_limit && delay > Duration::ZERO {
            sleep(delay).await;
        }
    }

    info!(
        "worker-{}: done ({} success / {} idle / {} error)",
        idx, tally.success, tally.idle, tally.error
    );
    Some(tally)
}

/// Fault boundary around one cycle: a panic anywhere inside is logged and
/// downgraded to an ERROR outcome so the worker stays alive.
async fn run_guarded_cycle(
    idx: usize,
    api: &OrderApi,
    session: &Session,
    lookup: &dyn FinalizedLookup,
) -> CycleOutcome {
    match AssertUnwindSafe(run_cycle(idx, api, session, lookup))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("worker-{}: panic inside cycle: {}", idx, msg);
            CycleOutcome::Error
        }
    }
}

async fn run_cycle(
    idx: usize,
    api: &OrderApi,
    session: &Session,
    lookup: &dyn FinalizedLookup,
) -> CycleOutcome {
    // 1. Fetch the next unit of work.
    let items = match api.next_order(session).await {
        Ok(items) => items,
        Err(e) => {
            warn!("worker-{}: failed to fetch next order: {}", idx, e);
            return CycleOutcome::Error;
        }
    };

    let Some(first) = items.first() else {
        debug!("worker-{}: no pending orders", idx);
        return CycleOutcome::Idle;
    };
    let order_id = first.order_id;

    // 2. Finalize each sub-item in the order the server returned them. The
    //    first failure aborts the rest of the unit.
    for item in &items {
        let Some(final_ref) = lookup.resolve(&item.customer_img_url) else {
            warn!(
                "worker-{}: no finalized reference for {} (order {})",
                idx, item.customer_img_url, item.order_id
            );
            return CycleOutcome::Error;
        };

        if let Err(e) = api
            .finalize_item(session, item.order_id, &item.fulfillment_id, &final_ref)
            .await
        {
            warn!(
                "worker-{}: failed to finalize item {} of order {}: {}",
                idx, item.fulfillment_id, item.order_id, e
            );
            return CycleOutcome::Error;
        }
    }

    // 3. Close the unit out. A failure here is an error but step 2 stands.
    if let Err(e) = api.approve_order(session, order_id).await {
        warn!("worker-{}: failed to approve order {}: {}", idx, order_id, e);
        return CycleOutcome::Error;
    }

    info!("worker-{}: approved order {}", idx, order_id);
    CycleOutcome::Success
}
