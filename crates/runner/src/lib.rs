//! twinfeed Runner - Twin Telemetry Generator
//!
//! Publishes synthetic electrical telemetry for a fleet of digital twins:
//!
//! - **Config**: JSON file plus command line overrides, validated up front
//! - **Publisher**: one broker session per twin
//! - **Orchestrator**: connects every twin, ticks on a fixed interval,
//!   drains on shutdown
//! - **Shutdown**: cooperative token tripped by SIGINT / SIGTERM
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────────────┐
//!                     │     Orchestrator     │
//!                     │  (tick every N sec)  │
//!                     └──────────┬───────────┘
//!                                │ for each twin, in order
//!              ┌─────────────────┼─────────────────┐
//!              ▼                 ▼                 ▼
//!      ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//!      │ SignalModel  │─►│   Envelope   │─►│ TwinPublisher│
//!      │ (V, A, cosφ) │  │   (Ditto)    │  │  (transport) │
//!      └──────────────┘  └──────────────┘  └──────┬───────┘
//!                                                 │ telemetry/{ns}:{name}
//!                                                 ▼
//!                                       ┌───────────────────┐
//!                                       │    MQTT broker    │
//!                                       └───────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod publisher;
pub mod shutdown;
pub mod twin;

// Re-export main types
pub use config::{DEFAULT_INTERVAL_SECS, DEFAULT_THING_IDS, GeneratorConfig, Overrides};
pub use error::{ConfigError, RunError};
pub use orchestrator::{Orchestrator, OrchestratorState, RunReport};
pub use publisher::TwinPublisher;
pub use shutdown::{Shutdown, spawn_signal_listener};
pub use twin::{TickOutcome, Twin, TwinReport};
