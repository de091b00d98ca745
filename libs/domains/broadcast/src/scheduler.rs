//! Recurring trigger and run lifecycle.
//!
//! At most one dispatch run is in flight. A trigger that fires while a run
//! is still going is skipped and logged; it is not queued.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use domain_subscribers::RecipientStore;
use metrics::counter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::schedule::CronSchedule;
use crate::dispatch::{Dispatcher, RunReport};
use crate::error::DispatchError;
use crate::transport::MailTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// What happened to one trigger firing
#[derive(Debug)]
pub enum TriggerOutcome {
    /// A run was already in progress
    Skipped,
    Completed(RunReport),
    Aborted(DispatchError),
}

/// Held for the duration of a run; clears the running flag on drop
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(Arc::clone(flag)))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Scheduler<S: RecipientStore, T: MailTransport> {
    dispatcher: Arc<Dispatcher<S, T>>,
    schedule: CronSchedule,
    timezone: Tz,
    running: Arc<AtomicBool>,
}

impl<S: RecipientStore, T: MailTransport> Clone for Scheduler<S, T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            schedule: self.schedule.clone(),
            timezone: self.timezone,
            running: Arc::clone(&self.running),
        }
    }
}

impl<S, T> Scheduler<S, T>
where
    S: RecipientStore + 'static,
    T: MailTransport + 'static,
{
    pub fn new(dispatcher: Dispatcher<S, T>, schedule: CronSchedule, timezone: Tz) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            schedule,
            timezone,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Handle one firing now.
    pub async fn trigger(&self, shutdown: watch::Receiver<bool>) -> TriggerOutcome {
        self.trigger_at(Utc::now(), shutdown).await
    }

    /// Handle one firing at `fired_at`: run the dispatch unless a run is
    /// already active. The message date is `fired_at` in the configured
    /// timezone.
    pub async fn trigger_at(
        &self,
        fired_at: DateTime<Utc>,
        shutdown: watch::Receiver<bool>,
    ) -> TriggerOutcome {
        let Some(_guard) = RunGuard::try_acquire(&self.running) else {
            warn!("Previous broadcast run still in progress, skipping this trigger");
            counter!("broadcast_runs_total", "outcome" => "skipped").increment(1);
            return TriggerOutcome::Skipped;
        };

        let today = fired_at.with_timezone(&self.timezone).date_naive();

        match self.dispatcher.run(today, shutdown).await {
            Ok(report) => {
                let outcome = if report.cancelled { "cancelled" } else { "completed" };
                counter!("broadcast_runs_total", "outcome" => outcome).increment(1);
                TriggerOutcome::Completed(report)
            }
            Err(e) => {
                counter!("broadcast_runs_total", "outcome" => "aborted").increment(1);
                TriggerOutcome::Aborted(e)
            }
        }
    }

    /// Fire on schedule until the shutdown signal is received.
    ///
    /// Each firing runs on its own task so that a later firing can see an
    /// in-progress run and skip. On shutdown the in-flight run is awaited;
    /// it stops at the next recipient boundary.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            schedule = %self.schedule,
            timezone = %self.timezone,
            "Starting broadcast scheduler"
        );

        let mut in_flight = JoinSet::new();
        let mut last_fire: Option<DateTime<Tz>> = None;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping scheduler");
                break;
            }

            // Never compute from before the previous firing, even if the
            // wall clock lags the timer
            let now = Utc::now().with_timezone(&self.timezone);
            let from = match last_fire {
                Some(last) if last > now => last,
                _ => now,
            };

            let Some(next) = self.schedule.next_after(&from) else {
                error!(schedule = %self.schedule, "Schedule has no future fire time, stopping scheduler");
                break;
            };

            let wait = (next.with_timezone(&Utc) - Utc::now())
                .to_std()
                .unwrap_or_default();
            info!(next_fire = %next, wait_secs = wait.as_secs(), "Waiting for next trigger");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_fire = Some(next);
                    let scheduler = self.clone();
                    let shutdown = shutdown.clone();
                    let fired_at = next.with_timezone(&Utc);
                    in_flight.spawn(async move { scheduler.trigger_at(fired_at, shutdown).await });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Received shutdown signal, stopping scheduler");
                        break;
                    }
                }
            }

            while let Some(joined) = in_flight.try_join_next() {
                log_firing(joined);
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            log_firing(joined);
        }

        info!("Broadcast scheduler stopped");
    }
}

fn log_firing(joined: Result<TriggerOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(TriggerOutcome::Aborted(e)) => error!(error = %e, "Broadcast run aborted"),
        Ok(_) => {}
        Err(e) => error!(error = %e, "Broadcast run task failed"),
    }
}
