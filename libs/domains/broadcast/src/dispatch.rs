//! One broadcast run over a snapshot of active recipients.

use chrono::{DateTime, NaiveDate, Utc};
use domain_subscribers::{DeliveryStatus, Recipient, RecipientStore};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{DispatchError, TransportError};
use crate::message::build_message;
use crate::transport::{MailTransport, OutboundMail};

/// Outcome of one recipient within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed(TransportError),
}

impl DeliveryOutcome {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            DeliveryOutcome::Sent => DeliveryStatus::Ok,
            DeliveryOutcome::Failed(_) => DeliveryStatus::Error,
        }
    }
}

/// Aggregate counts for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Recipients in the snapshot
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    /// Outcomes that could not be written to the delivery log
    pub log_write_failures: usize,
    /// Stopped early by the shutdown signal
    pub cancelled: bool,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.sent + self.failed
    }
}

/// Sends the daily message to each recipient in turn and records the outcome.
///
/// Recipients are handled sequentially in snapshot order with a fixed pause
/// between consecutive sends. A failed send or a failed log write only
/// affects its own recipient.
pub struct Dispatcher<S: RecipientStore, T: MailTransport> {
    store: Arc<S>,
    transport: Arc<T>,
    pacing: Duration,
}

impl<S: RecipientStore, T: MailTransport> Dispatcher<S, T> {
    pub fn new(store: Arc<S>, transport: Arc<T>, pacing: Duration) -> Self {
        Self {
            store,
            transport,
            pacing,
        }
    }

    /// Execute one run.
    ///
    /// `today` is the date rendered into the message. The shutdown receiver
    /// is checked before every recipient; once it reads `true` the run stops
    /// and the report is marked cancelled.
    pub async fn run(
        &self,
        today: NaiveDate,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport, DispatchError> {
        let run_id = Uuid::now_v7();
        self.run_inner(run_id, today, shutdown)
            .instrument(info_span!("dispatch_run", %run_id))
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        today: NaiveDate,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport, DispatchError> {
        let started_at = Utc::now();
        let timer = std::time::Instant::now();

        let recipients = self.store.list_active_recipients().await.map_err(|e| {
            error!(error = %e, "Failed to load active recipients, aborting run");
            DispatchError::Snapshot(e)
        })?;

        info!(recipients = recipients.len(), %today, "Starting broadcast run");

        let mut report = RunReport {
            run_id,
            started_at,
            finished_at: started_at,
            total: recipients.len(),
            sent: 0,
            failed: 0,
            log_write_failures: 0,
            cancelled: false,
        };

        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                self.pace(&mut shutdown).await;
            }

            if *shutdown.borrow() {
                warn!(
                    remaining = recipients.len() - index,
                    "Received shutdown signal, stopping run"
                );
                report.cancelled = true;
                break;
            }

            let outcome = self.deliver(recipient, today).await;
            match outcome {
                DeliveryOutcome::Sent => report.sent += 1,
                DeliveryOutcome::Failed(_) => report.failed += 1,
            }

            if !self.record(recipient, &outcome).await {
                report.log_write_failures += 1;
            }
        }

        report.finished_at = Utc::now();
        histogram!("broadcast_run_duration_seconds").record(timer.elapsed().as_secs_f64());

        info!(
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            log_write_failures = report.log_write_failures,
            cancelled = report.cancelled,
            "Broadcast run finished"
        );

        Ok(report)
    }

    async fn deliver(&self, recipient: &Recipient, today: NaiveDate) -> DeliveryOutcome {
        let mail = OutboundMail::new(recipient, build_message(recipient, today));

        match self.transport.send(&mail).await {
            Ok(()) => {
                info!(recipient_id = recipient.id, email = %recipient.email, "Sent daily message");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                warn!(
                    recipient_id = recipient.id,
                    email = %recipient.email,
                    error = %e,
                    "Failed to send daily message"
                );
                DeliveryOutcome::Failed(e)
            }
        }
    }

    /// Write the delivery log entry; returns false if the write failed.
    ///
    /// The message has already gone out at this point, so a failed write is
    /// reported and never retried.
    async fn record(&self, recipient: &Recipient, outcome: &DeliveryOutcome) -> bool {
        let status = outcome.status();
        let info = match outcome {
            DeliveryOutcome::Sent => format!("sent via {}", self.transport.name()),
            DeliveryOutcome::Failed(e) => e.to_string(),
        };

        counter!("broadcast_deliveries_total", "status" => status.to_string()).increment(1);

        match self.store.record_delivery(recipient.id, status, &info).await {
            Ok(_) => true,
            Err(e) => {
                counter!("broadcast_delivery_log_failures_total").increment(1);
                error!(
                    recipient_id = recipient.id,
                    status = %status,
                    error = %e,
                    "Failed to record delivery outcome"
                );
                false
            }
        }
    }

    /// Wait out the pacing interval, returning early on shutdown
    async fn pace(&self, shutdown: &mut watch::Receiver<bool>) {
        if self.pacing.is_zero() {
            return;
        }

        let sleep = tokio::time::sleep(self.pacing);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return,
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow() => return,
                    Ok(()) => continue,
                    // Sender gone: nobody can signal shutdown any more
                    Err(_) => {
                        sleep.as_mut().await;
                        return;
                    }
                },
            }
        }
    }
}
