//! twinfeed - twin telemetry generator
//!
//! ```bash
//! # Two ovens against the local broker
//! twinfeed
//!
//! # Custom broker and twins, one reading per second
//! twinfeed --mqtt-host 192.168.1.100 --thing-ids plant:press-1 plant:press-2 --interval 1
//!
//! # Settings from a file, port overridden on the command line
//! twinfeed --config twinfeed.json --mqtt-port 1883
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use twinfeed_clock::SystemClock;
use twinfeed_runner::{
    ConfigError, GeneratorConfig, Orchestrator, Overrides, RunError, Shutdown,
    spawn_signal_listener,
};
use twinfeed_transport::TransportFactory;

/// Publish simulated oven telemetry to Eclipse Ditto twins over MQTT
#[derive(Parser, Debug)]
#[command(name = "twinfeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MQTT broker host [default: localhost]
    #[arg(long)]
    mqtt_host: Option<String>,

    /// MQTT broker port [default: 30511]
    #[arg(long)]
    mqtt_port: Option<u16>,

    /// Twin identities as namespace:name [default: org.openegiz:oven-01 org.openegiz:oven-02]
    #[arg(long, num_args = 1..)]
    thing_ids: Option<Vec<String>>,

    /// Seconds between ticks [default: 5]
    #[arg(long, allow_negative_numbers = true)]
    interval: Option<f64>,

    /// Steps per heating cycle [default: 60]
    #[arg(long)]
    cycle_period: Option<u64>,

    /// Base seed for reproducible noise
    #[arg(long)]
    seed: Option<u64>,

    /// Load settings from a JSON file; flags given here take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            mqtt_host: self.mqtt_host.clone(),
            mqtt_port: self.mqtt_port,
            thing_ids: self.thing_ids.clone(),
            interval_secs: self.interval,
            cycle_period: self.cycle_period,
            seed: self.seed,
        }
    }

    fn load_config(&self) -> Result<GeneratorConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                GeneratorConfig::from_file(path)?
            }
            None => GeneratorConfig::default(),
        };
        Ok(base.with_overrides(self.overrides()))
    }
}

async fn run(cli: Cli) -> Result<(), RunError> {
    let config = cli.load_config()?;
    config.require_broker()?;
    let mut factory =
        TransportFactory::new(config.transport.clone()).map_err(ConfigError::Transport)?;
    let mut orchestrator = Orchestrator::new(&config, &mut factory, Arc::new(SystemClock::new()))?;

    log::info!(
        "Broker {}:{}, twins: {}",
        config.transport.mqtt.host,
        config.transport.mqtt.port,
        config.thing_ids.join(", ")
    );

    let shutdown = Shutdown::new();
    let listener = spawn_signal_listener(shutdown.clone());

    let result = orchestrator.run(&shutdown).await;

    shutdown.trigger();
    let _ = listener.await;

    let report = result?;
    log::info!("Total messages published: {}", report.published);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
