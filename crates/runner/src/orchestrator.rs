//! Orchestrator - the tick loop
//!
//! Owns every twin and drives them through one lifecycle:
//!
//! ```text
//! Idle ──► Connecting ──► Running ──► Draining ──► Stopped
//!              │                          ▲
//!              └── failure / shutdown ────┘
//! ```
//!
//! Connect failures abort the run; publish failures are counted per twin and
//! the loop keeps going. Shutdown is observed before each tick and while
//! waiting, so a tick in progress always finishes for every twin.

use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use twinfeed_clock::Clock;
use twinfeed_core::{SignalConfig, SignalModel, ThingId, Timestamp};
use twinfeed_transport::{TransportError, TransportFactory};

use crate::config::GeneratorConfig;
use crate::error::{ConfigError, RunError};
use crate::publisher::TwinPublisher;
use crate::shutdown::Shutdown;
use crate::twin::{TickOutcome, Twin, TwinReport};

/// Lifecycle of a generator run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    #[default]
    Idle,
    Connecting,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::Connecting => "connecting",
            OrchestratorState::Running => "running",
            OrchestratorState::Draining => "draining",
            OrchestratorState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Ticks started and completed
    pub ticks: u64,
    /// Successful publishes across all twins
    pub published: u64,
    /// Failed publishes across all twins
    pub failed: u64,
    /// Counters per twin, in configuration order
    pub twins: Vec<TwinReport>,
}

/// Drives every twin on a fixed interval until shutdown
pub struct Orchestrator {
    twins: Vec<Twin>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    connect_timeout: Duration,
    ticks: u64,
    state: watch::Sender<OrchestratorState>,
}

impl Orchestrator {
    /// Validate `config` and create one twin per configured identity
    ///
    /// Nothing connects yet. With a seed in the signal settings, twin `k`
    /// is seeded with `seed + k`.
    pub fn new(
        config: &GeneratorConfig,
        factory: &mut TransportFactory,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let thing_ids = config.validate()?;
        let interval = config.interval()?;

        let mut twins = Vec::with_capacity(thing_ids.len());
        for (index, thing_id) in thing_ids.into_iter().enumerate() {
            let signal = SignalConfig {
                cycle_period: config.signal.cycle_period,
                seed: config.signal.seed.map(|seed| seed.wrapping_add(index as u64)),
            };
            let transport = factory
                .create(&thing_id.to_string())
                .map_err(ConfigError::Transport)?;
            let publisher = TwinPublisher::new(thing_id, transport, config.publish_timeout());
            twins.push(Twin::new(SignalModel::new(&signal), publisher));
        }

        Ok(Self::with_twins(
            twins,
            interval,
            config.connect_timeout(),
            clock,
        ))
    }

    /// Assemble an orchestrator from ready-made twins
    pub fn with_twins(
        twins: Vec<Twin>,
        interval: Duration,
        connect_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(OrchestratorState::Idle);
        Self {
            twins,
            clock,
            interval,
            connect_timeout,
            ticks: 0,
            state,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle transitions
    pub fn watch_state(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    pub fn thing_ids(&self) -> impl Iterator<Item = &ThingId> {
        self.twins.iter().map(Twin::thing_id)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current counters
    pub fn report(&self) -> RunReport {
        let twins: Vec<TwinReport> = self.twins.iter().map(Twin::report).collect();
        RunReport {
            ticks: self.ticks,
            published: twins.iter().map(|t| t.published).sum(),
            failed: twins.iter().map(|t| t.failed).sum(),
            twins,
        }
    }

    /// Connect, publish until `shutdown`, then disconnect every twin
    ///
    /// Only the first call runs; later calls return the existing report.
    pub async fn run(&mut self, shutdown: &Shutdown) -> Result<RunReport, RunError> {
        if self.state() != OrchestratorState::Idle {
            log::warn!("Generator already ran ({}), not starting again", self.state());
            return Ok(self.report());
        }

        self.set_state(OrchestratorState::Connecting);
        match self.connect_all(shutdown).await {
            Ok(true) => {
                self.set_state(OrchestratorState::Running);
                self.tick_loop(shutdown).await;
            }
            Ok(false) => {
                log::info!("Shutdown requested while connecting");
            }
            Err(e) => {
                self.drain().await;
                return Err(e);
            }
        }

        self.drain().await;
        let report = self.report();
        log::info!(
            "Published {} messages in {} ticks ({} failed)",
            report.published,
            report.ticks,
            report.failed
        );
        Ok(report)
    }

    /// Connect twins in order; `Ok(false)` if shutdown interrupted
    async fn connect_all(&mut self, shutdown: &Shutdown) -> Result<bool, RunError> {
        let timeout = self.connect_timeout;
        log::info!(
            "Connecting {} twins (clock: {})",
            self.twins.len(),
            self.clock.name()
        );

        for twin in self.twins.iter_mut() {
            if shutdown.is_triggered() {
                return Ok(false);
            }

            match twin.publisher_mut().connect(timeout, shutdown).await {
                Ok(()) => {
                    log::info!(
                        "[{}] connected as {}",
                        twin.thing_id(),
                        twin.publisher().client_id()
                    );
                }
                Err(TransportError::Cancelled) => return Ok(false),
                Err(e) => {
                    log::error!("[{}] connection failed: {}", twin.thing_id(), e);
                    return Err(RunError::Connection {
                        thing_id: twin.thing_id().clone(),
                        source: e,
                    });
                }
            }
        }
        Ok(true)
    }

    async fn tick_loop(&mut self, shutdown: &Shutdown) {
        log::info!(
            "Publishing {} twins every {:?} (Ctrl-C to stop)",
            self.twins.len(),
            self.interval
        );
        log::info!(
            "{:<8}  {:<28} {:>8} {:>7} {:>8} {:>6}",
            "time",
            "twin",
            "V",
            "A",
            "kW",
            "cos φ"
        );

        while !shutdown.is_triggered() {
            self.tick().await;

            if !shutdown.sleep(self.interval).await {
                break;
            }
        }
    }

    /// One tick: every twin publishes once with a shared timestamp
    async fn tick(&mut self) {
        let timestamp = self.clock.now();

        for twin in self.twins.iter_mut() {
            let outcome = twin.tick(timestamp).await;
            log_outcome(twin.thing_id(), &timestamp, &outcome);
        }
        self.ticks += 1;
    }

    /// Disconnect every twin once, logging rather than propagating failures
    async fn drain(&mut self) {
        self.set_state(OrchestratorState::Draining);

        for twin in self.twins.iter_mut() {
            if let Err(e) = twin.publisher_mut().disconnect().await {
                log::warn!("[{}] disconnect failed: {}", twin.thing_id(), e);
            }
        }

        self.set_state(OrchestratorState::Stopped);
    }

    fn set_state(&self, next: OrchestratorState) {
        let previous = self.state.send_replace(next);
        log::debug!("Generator {} -> {}", previous, next);
    }
}

fn log_outcome(thing_id: &ThingId, timestamp: &Timestamp, outcome: &TickOutcome) {
    match &outcome.result {
        Ok(()) => {
            let r = &outcome.readings;
            log::info!(
                "{:<8}  {:<28} {:>8.2} {:>7.2} {:>8.3} {:>6.3}",
                timestamp.with_timezone(&Local).format("%H:%M:%S"),
                thing_id.to_string(),
                r.voltage_v,
                r.current_a,
                r.active_power_kw,
                r.power_factor
            );
        }
        Err(e) => log::warn!("[{}] publish failed: {}", thing_id, e),
    }
}
