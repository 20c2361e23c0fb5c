//! Virtual user scheduler
//!
//! Ticks on a short interval, compares the number of active VUs with the
//! load profile's target and spawns or retires VUs to match. Each VU runs in
//! its own task with its own context; they share nothing but the client and
//! the metrics sink.

use anyhow::Result;
use chrono::Utc;
use probe_client::{BackendClient, Credential, TaskPoller};
use probe_core::domain::report::RunSummary;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::Config;
use crate::context::VuContext;
use crate::scenario::Scenario;
use crate::service::{InMemoryMetrics, MetricsSink};

/// How often the VU count is reconciled with the profile
const CONTROL_TICK: Duration = Duration::from_millis(100);

/// A running VU task and the switch that retires it
struct ActiveVu {
    id: u32,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Drives a scenario with a varying number of virtual users
pub struct VuScheduler {
    config: Config,
    scenario: Arc<dyn Scenario>,
    client: Arc<BackendClient>,
    credentials: Arc<Vec<Credential>>,
    poller: TaskPoller,
    metrics: InMemoryMetrics,
}

impl VuScheduler {
    /// Creates a new scheduler
    pub fn new(
        config: Config,
        scenario: Arc<dyn Scenario>,
        client: Arc<BackendClient>,
        credentials: Vec<Credential>,
        poller: TaskPoller,
        metrics: InMemoryMetrics,
    ) -> Self {
        Self {
            config,
            scenario,
            client,
            credentials: Arc::new(credentials),
            poller,
            metrics,
        }
    }

    /// Runs the load profile to its end (or until Ctrl-C) and summarises it
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Runs the load profile until it ends or `interrupt` resolves with `Ok`
    ///
    /// An `Err` from `interrupt` only disables the interruption.
    async fn run_until<F>(&self, interrupt: F) -> Result<RunSummary>
    where
        F: Future<Output = io::Result<()>>,
    {
        let total = self.config.load.total_duration();
        info!(
            "Running scenario '{}' for {:?} with up to {} VU(s)",
            self.scenario.name(),
            total,
            self.config.load.max_vus()
        );

        let started_at = Utc::now();
        let started = Instant::now();

        let mut active: Vec<ActiveVu> = Vec::new();
        let mut retiring: Vec<ActiveVu> = Vec::new();
        let mut next_id = 0u32;

        let mut ticker = time::interval(CONTROL_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(interrupt);
        let mut interruptible = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                result = &mut interrupt, if interruptible => match result {
                    Ok(()) => {
                        warn!("Interrupted, stopping virtual users");
                        break;
                    }
                    Err(e) => {
                        warn!("Cannot listen for Ctrl-C, running the full profile: {}", e);
                        interruptible = false;
                        continue;
                    }
                },
            }

            let elapsed = started.elapsed();
            if elapsed >= total {
                break;
            }

            let target = self.config.load.target_at(elapsed) as usize;

            if active.len() != target {
                debug!("Adjusting VUs {} -> {}", active.len(), target);
            }

            while active.len() < target {
                active.push(self.spawn_vu(next_id));
                next_id += 1;
            }

            while active.len() > target {
                if let Some(vu) = active.pop() {
                    let _ = vu.stop.send(true);
                    retiring.push(vu);
                }
            }

            retiring.retain(|vu| !vu.handle.is_finished());
            self.metrics.record_active_vus(active.len() as u32);
        }

        info!("Load profile finished, stopping {} VU(s)", active.len());
        active.append(&mut retiring);
        self.stop_all(active).await;

        Ok(self
            .metrics
            .summarize(self.scenario.name(), started_at, Utc::now()))
    }

    /// Spawns the task of one virtual user
    fn spawn_vu(&self, id: u32) -> ActiveVu {
        let credential = match self.credentials.len() {
            0 => None,
            n => Some(self.credentials[id as usize % n].clone()),
        };

        let ctx = VuContext::new(
            id,
            Arc::clone(&self.client),
            credential,
            self.poller,
            self.config.poll_results,
            Arc::new(self.metrics.clone()),
        );

        let scenario = Arc::clone(&self.scenario);
        let think_time = self.config.think_time;
        let (stop, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(
            async move {
                debug!("VU started");

                loop {
                    if *stop_rx.borrow() {
                        break;
                    }

                    if let Err(e) = scenario.iteration(&ctx).await {
                        warn!("Iteration failed: {:#}", e);
                    }
                    ctx.metrics().record_iteration();

                    tokio::select! {
                        _ = time::sleep(think_time) => {}
                        _ = stop_rx.changed() => break,
                    }
                }

                debug!("VU stopped");
            }
            .instrument(info_span!("vu", id)),
        );

        ActiveVu { id, stop, handle }
    }

    /// Signals every VU to stop and waits for in-flight iterations
    ///
    /// VUs still busy after the graceful-stop window are aborted.
    async fn stop_all(&self, vus: Vec<ActiveVu>) {
        for vu in &vus {
            let _ = vu.stop.send(true);
        }

        let deadline = Instant::now() + self.config.graceful_stop;

        for mut vu in vus {
            match time::timeout_at(deadline, &mut vu.handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("VU {} task panicked: {}", vu.id, e),
                Err(_) => {
                    warn!("VU {} did not stop within the graceful window, aborting", vu.id);
                    vu.handle.abort();
                }
            }
        }
    }
}
