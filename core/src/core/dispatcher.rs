//! Rate-limited webhook dispatcher.
//!
//! One ticking generator emits job ids onto a bounded queue; a fixed pool of
//! senders drains it, synthesizes an order payload per id, and posts it to
//! the webhook receiver. Shared atomic [`Stats`] absorb every outcome and a
//! periodic reporter logs progress. The queue capacity is twice the pool
//! size, so a slow receiver backpressures the generator instead of growing
//! an unbounded buffer.

use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, MissedTickBehavior};

use crate::core::stats::{Stats, StatsSnapshot};
use crate::http::{ApiCall, CallError, HttpClient};
use crate::utils::order_synth::{OrderSynthesizer, WebhookOrder};
use crate::FloodConfig;

/// Final result of a flood run, captured after the sender pool has fully
/// drained.
#[derive(Debug, Clone, Copy)]
pub struct FloodReport {
    pub snapshot: StatsSnapshot,
    pub elapsed: Duration,
}

/// Gap between generated jobs for a given per-minute rate. Never zero, which
/// `tokio::time::interval` rejects.
pub fn tick_interval(rate_per_minute: u64) -> Duration {
    Duration::from_secs_f64(60.0 / rate_per_minute.max(1) as f64).max(Duration::from_nanos(1))
}

/// Drives `config.total` synthetic sends to completion (or until `cancel` is
/// set) and returns the final stats. The pool join is the only barrier: once
/// this returns, every accepted job has a recorded outcome.
pub async fn run_flood(
    config: &FloodConfig,
    synth: Arc<OrderSynthesizer>,
    cancel: Arc<AtomicBool>,
) -> FloodReport {
    let client = Arc::new(HttpClient::new(config.timeout()));
    let stats = Arc::new(Stats::new());
    let started = Instant::now();

    let (tx, rx) = mpsc::channel::<u64>(config.queue_capacity());
    let rx = Arc::new(Mutex::new(rx));

    // Generator: one ticking task gates the rate ceiling. Enqueueing blocks
    // when the queue is full, which is the backpressure path. Dropping the
    // sender at the end closes the queue and lets the pool drain out.
    let generator = {
        let total = config.total;
        let rate = config.rate_per_minute;
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            let mut ticker = interval(tick_interval(rate));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for id in 1..=total {
                ticker.tick().await;
                if cancel.load(Relaxed) {
                    info!("generator: cancelled after {} of {} jobs", id - 1, total);
                    break;
                }
                if tx.send(id).await.is_err() {
                    break;
                }
            }
        })
    };

    let concurrency = config.concurrency.max(1);
    let mut senders = Vec::with_capacity(concurrency);
    for worker_id in 0..concurrency {
        senders.push(tokio::spawn(run_sender(
            worker_id,
            config.webhook_url.clone(),
            Arc::clone(&rx),
            Arc::clone(&client),
            Arc::clone(&synth),
            Arc::clone(&stats),
        )));
    }

    let reporter = {
        let stats = Arc::clone(&stats);
        let report_interval = config.report_interval();
        tokio::spawn(async move {
            let mut ticker = interval(report_interval);
            // interval fires immediately; skip the zero-elapsed tick.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let snap = stats.snapshot();
                info!(
                    "stats: total={} success={} failed={} rps={:.2} avg_latency={}ms",
                    snap.total,
                    snap.success,
                    snap.failed,
                    snap.requests_per_second(started.elapsed()),
                    snap.avg_latency_ms()
                );
            }
        })
    };

    for sender in senders {
        let _ = sender.await;
    }
    let _ = generator.await;
    reporter.abort();

    FloodReport { snapshot: stats.snapshot(), elapsed: started.elapsed() }
}

/// One sender: drains the shared queue until it closes. The receiver lock is
/// released before the network call, never held across it.
async fn run_sender(
    worker_id: usize,
    url: String,
    rx: Arc<Mutex<mpsc::Receiver<u64>>>,
    client: Arc<HttpClient>,
    synth: Arc<OrderSynthesizer>,
    stats: Arc<Stats>,
) {
    loop {
        let job = { rx.lock().await.recv().await };
        let Some(order_id) = job else { break };

        let order = synth.generate(order_id);
        let started = Instant::now();
        let result = send_order(&client, &url, &order).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => stats.record_success(latency_ms),
            Err(e) => {
                stats.record_failure(latency_ms);
                warn!("sender-{}: order {} failed: {}", worker_id, order_id, e);
            }
        }
    }
}

async fn send_order(client: &HttpClient, url: &str, order: &WebhookOrder) -> Result<(), CallError> {
    let call = ApiCall::post(url)
        .header("X-Shopify-Topic", "orders/create")
        .header("X-Shopify-Hmac-SHA256", "test-signature")
        .header("X-Shopify-Shop-Domain", "dtfgangsheet.myshopify.com")
        .json(order)?;

    let outcome = client.call(&call).await?;
    if !outcome.is_success() {
        return Err(CallError::Status(outcome.status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval_matches_rate() {
        assert_eq!(tick_interval(60), Duration::from_secs(1));
        assert_eq!(tick_interval(6_000), Duration::from_millis(10));
        assert_eq!(tick_interval(120), Duration::from_millis(500));
    }

    #[test]
    fn test_tick_interval_guards_zero_rate() {
        assert_eq!(tick_interval(0), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_bounded_queue_blocks_producer_at_capacity() {
        let (tx, mut rx) = mpsc::channel::<u64>(2);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        // Queue full: a further send must not complete until a consumer reads.
        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.send(3)).await;
        assert!(blocked.is_err());

        assert_eq!(rx.recv().await, Some(1));
        tokio::time::timeout(Duration::from_millis(50), tx.send(3))
            .await
            .expect("send should unblock after a recv")
            .unwrap();
    }
}
