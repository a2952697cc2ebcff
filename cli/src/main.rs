use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::*;
use log::warn;

use orderstorm_core::{
    run_flood, run_poll_pool, sample_reference_table, FloodConfig, OrderSynthesizer, PollConfig,
    TableLookup,
};

#[derive(Parser, Debug)]
#[command(
    name = "orderstorm",
    version,
    about = "Load and automation tools for the order-processing API",
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Poll and finalize orders:   orderstorm poll --base-url https://api.example.com -w 20 --limit 500
  Webhook load test:          orderstorm flood --url https://api.example.com/webhooks/test/orders/create --total 80000 --rate 2000 -c 10
  Dry-run either tool:        orderstorm flood --total 100 --dry-run"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the polling worker pool that finalizes and approves pending orders
    Poll {
        #[arg(long, default_value = "http://localhost:8000", help = "Order API base URL")]
        base_url: String,

        #[arg(long, default_value = "", help = "Login username (empty = rotate seeded accounts)")]
        username: String,

        #[arg(long, default_value = "", help = "Login password")]
        password: String,

        #[arg(short = 'w', long, default_value_t = 20, help = "Number of poll workers")]
        workers: usize,

        #[arg(long = "limit", default_value_t = 500, help = "Poll cycles per worker before it exits")]
        cycle_limit: u64,

        #[arg(long, default_value_t = 1000, help = "Base poll backoff in milliseconds")]
        backoff_base_ms: u64,

        #[arg(long, default_value_t = 300_000, help = "Backoff cap in milliseconds")]
        backoff_cap_ms: u64,

        #[arg(long, default_value_t = 30, help = "Per-request timeout in seconds")]
        timeout: u64,

        #[arg(long, help = "Print the resolved configuration without sending requests")]
        dry_run: bool,
    },
    /// Flood the webhook receiver with synthetic orders at a fixed rate
    Flood {
        #[arg(
            long,
            default_value = "http://localhost:8000/webhooks/test/orders/create",
            help = "Webhook endpoint URL"
        )]
        url: String,

        #[arg(long, default_value_t = 80_000, help = "Total number of orders to send")]
        total: u64,

        #[arg(long, default_value_t = 2_000, help = "Requests per minute")]
        rate: u64,

        #[arg(short = 'c', long, default_value_t = 10, help = "Number of concurrent senders")]
        concurrency: usize,

        #[arg(long, default_value_t = 180, help = "Per-request timeout in seconds")]
        timeout: u64,

        #[arg(long, default_value_t = 10, help = "Stats report interval in seconds")]
        report_interval: u64,

        #[arg(long, help = "Print the resolved configuration without sending requests")]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match args.command {
        Command::Poll {
            base_url,
            username,
            password,
            workers,
            cycle_limit,
            backoff_base_ms,
            backoff_cap_ms,
            timeout,
            dry_run,
        } => {
            let config = PollConfig {
                base_url,
                username,
                password,
                workers,
                cycle_limit,
                backoff_base_ms,
                backoff_cap_ms,
                timeout_secs: timeout,
            };
            run_poll(config, dry_run).await;
        }
        Command::Flood {
            url,
            total,
            rate,
            concurrency,
            timeout,
            report_interval,
            dry_run,
        } => {
            let config = FloodConfig {
                webhook_url: url,
                total,
                rate_per_minute: rate,
                concurrency,
                timeout_secs: timeout,
                report_interval_secs: report_interval,
            };
            run_flood_command(config, dry_run).await;
        }
    }
    Ok(())
}

async fn run_poll(config: PollConfig, dry_run: bool) {
    let lookup = Arc::new(TableLookup::new(sample_reference_table()));

    println!("{}", format!("[+] API:       {}", config.base_url).green().bold());
    println!("{}", format!("[+] Workers:   {}", config.workers).blue());
    println!("{}", format!("[+] Cycles:    {} per worker", config.cycle_limit).blue());
    println!(
        "{}",
        format!(
            "[+] Backoff:   {}ms base, {}ms cap",
            config.backoff_base_ms, config.backoff_cap_ms
        )
        .blue()
    );
    println!("{}", format!("[+] Timeout:   {}s", config.timeout_secs).blue());
    println!("{}", format!("[+] Fixtures:  {} reference mappings", lookup.len()).blue());
    println!("{}", "──────────────────────────────────────────────────".dimmed());

    if dry_run {
        println!("[DRY RUN] Would poll {} with {} workers", config.base_url, config.workers);
        return;
    }

    let report = run_poll_pool(&config, lookup).await;

    println!();
    println!("{}", "=== Poll Results ===".bright_white().bold());
    println!("Workers completed: {}", report.workers_completed);
    if report.login_failures > 0 {
        println!("{}", format!("Login failures:    {}", report.login_failures).red());
    }
    println!("Cycles:            {}", report.cycles());
    println!("{}", format!("  success: {}", report.success_cycles).green());
    println!("  idle:    {}", report.idle_cycles);
    if report.error_cycles > 0 {
        println!("{}", format!("  error:   {}", report.error_cycles).red());
    } else {
        println!("  error:   0");
    }
}

async fn run_flood_command(config: FloodConfig, dry_run: bool) {
    println!("{}", format!("[+] Target:      {}", config.webhook_url).green().bold());
    println!("{}", format!("[+] Total:       {}", config.total).blue());
    println!("{}", format!("[+] Rate:        {} req/min", config.rate_per_minute).blue());
    println!("{}", format!("[+] Concurrency: {}", config.concurrency).blue());
    println!("{}", format!("[+] Timeout:     {}s", config.timeout_secs).blue());
    println!("{}", "──────────────────────────────────────────────────".dimmed());

    if dry_run {
        println!(
            "[DRY RUN] Would send {} orders to {} at {} req/min",
            config.total, config.webhook_url, config.rate_per_minute
        );
        return;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping generation");
                cancel.store(true, Relaxed);
            }
        });
    }

    let synth = Arc::new(OrderSynthesizer::default());
    let report = run_flood(&config, synth, cancel).await;
    let snap = report.snapshot;

    println!();
    println!("{}", "=== Final Results ===".bright_white().bold());
    println!("Total Time:      {:.2?}", report.elapsed);
    println!("Total Requests:  {}", snap.total);
    println!("{}", format!("Successful:      {}", snap.success).green());
    if snap.failed > 0 {
        println!("{}", format!("Failed:          {}", snap.failed).red());
    } else {
        println!("Failed:          0");
    }
    println!("Success Rate:    {:.2}%", snap.success_rate());
    println!("Average RPS:     {:.2}", snap.requests_per_second(report.elapsed));
    println!("Average Latency: {}ms", snap.avg_latency_ms());
}
