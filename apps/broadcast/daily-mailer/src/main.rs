//! Daily Mailer
//!
//! Sends the daily message to every active subscriber on a cron cadence in
//! a fixed timezone, recording one delivery log entry per recipient. Also
//! exposes the subscriber list and delivery log for operators.

use chrono::Utc;
use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use domain_broadcast::{BroadcastConfig, Dispatcher, Scheduler, SmtpTransport, TriggerOutcome};
use domain_subscribers::{PgRecipientStore, SubscriptionService};
use eyre::Result;
use migration::Migrator;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

mod config;
mod metrics;

use config::{database_config, smtp_transport, Config};

#[derive(Parser)]
#[command(name = "daily-mailer")]
#[command(about = "Send the daily message to every active subscriber")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run as a scheduled service (default)
    Schedule,

    /// Run one broadcast immediately and exit
    RunOnce,

    /// Print the next fire times of the configured schedule
    Next {
        #[arg(short, long, default_value_t = 5)]
        count: usize,
    },

    /// Add a subscriber, or re-activate an unsubscribed address
    Subscribe {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Stop sending to an address
    Unsubscribe {
        #[arg(long)]
        email: String,
    },

    /// List active subscribers
    Subscribers,

    /// Show the most recent delivery log entries
    Logs {
        #[arg(short, long)]
        limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let environment = Environment::from_env();
    init_tracing(&environment);

    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Schedule) {
        Commands::Schedule => {
            metrics::init_metrics(config.metrics_addr)?;
            let scheduler = build_scheduler(&config.broadcast, connect_store().await?)?;
            scheduler.run(shutdown_receiver()).await;
        }

        Commands::RunOnce => {
            let scheduler = build_scheduler(&config.broadcast, connect_store().await?)?;
            match scheduler.trigger(shutdown_receiver()).await {
                TriggerOutcome::Completed(report) => info!(
                    run_id = %report.run_id,
                    sent = report.sent,
                    failed = report.failed,
                    cancelled = report.cancelled,
                    "Broadcast complete"
                ),
                TriggerOutcome::Aborted(e) => return Err(e.into()),
                TriggerOutcome::Skipped => warn!("Broadcast skipped"),
            }
        }

        Commands::Next { count } => {
            let broadcast = &config.broadcast;
            let now = Utc::now().with_timezone(&broadcast.timezone);
            for fire in broadcast.schedule.upcoming(&now, count) {
                println!("{}", fire.to_rfc3339());
            }
        }

        Commands::Subscribe { name, email } => {
            let service = SubscriptionService::with_arc(connect_store().await?);
            let recipient = service.subscribe(&name, &email).await?;
            println!("{}", serde_json::to_string_pretty(&recipient)?);
        }

        Commands::Unsubscribe { email } => {
            let service = SubscriptionService::with_arc(connect_store().await?);
            service.unsubscribe(&email).await?;
        }

        Commands::Subscribers => {
            let service = SubscriptionService::with_arc(connect_store().await?);
            let recipients = service.active_subscribers().await?;
            println!("{}", serde_json::to_string_pretty(&recipients)?);
        }

        Commands::Logs { limit } => {
            let service = SubscriptionService::with_arc(connect_store().await?);
            let entries = service.recent_deliveries(limit).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

/// Connect with retry and apply pending migrations
async fn connect_store() -> Result<Arc<PgRecipientStore>> {
    let database = database_config()?;
    info!("Connecting to database...");
    let db = database::postgres::connect_with_retry(database, None).await?;
    database::postgres::run_migrations::<Migrator>(&db, "daily-mailer").await?;

    Ok(Arc::new(PgRecipientStore::new(db)))
}

fn build_scheduler(
    broadcast: &BroadcastConfig,
    store: Arc<PgRecipientStore>,
) -> Result<Scheduler<PgRecipientStore, SmtpTransport>> {
    let transport = Arc::new(smtp_transport()?);
    let dispatcher = Dispatcher::new(store, transport, broadcast.pacing);

    Ok(Scheduler::new(
        dispatcher,
        broadcast.schedule.clone(),
        broadcast.timezone,
    ))
}

/// Receiver that flips to `true` on SIGINT or SIGTERM
fn shutdown_receiver() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });

    rx
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }
}
