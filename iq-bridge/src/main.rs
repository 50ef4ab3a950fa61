//! iq-bridge - bridges I/Q samples from goesrecv to any RTL_TCP client
//!
//! ```text
//! goesrecv (nanomsg PUB :5000) ──▶ iq-bridge ──▶ RTL_TCP client (:1234)
//! ```
//!
//! Runs until SIGINT/SIGTERM; the current session is torn down before exit.

use clap::Parser;
use iq_bridge::Supervisor;
use iq_bridge::config::{BridgeConfig, RetryStrategy};
use iq_bridge::error::Result;
use iq_bridge::signal::setup_shutdown_handler;
use std::path::PathBuf;

const EXAMPLES: &str = "\
Example usage:
  Defaults:               iq-bridge
  Same as Defaults:       iq-bridge -H 127.0.0.1 -i 5000 -o 1234
  Custom goesrecv host:   iq-bridge -H 10.0.0.53
  Default with Debugging: iq-bridge -d
  From a config file:     iq-bridge -c /etc/iq-bridge.toml";

/// Bridges IQ samples from goesrecv to any RTL_TCP client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, after_help = EXAMPLES)]
struct Args {
    /// Print debugging statements on error
    #[arg(short, long)]
    debug: bool,

    /// goesrecv IPv4 address [default: 127.0.0.1]
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// goesrecv sample publisher port [default: 5000]
    #[arg(short, long)]
    inport: Option<u16>,

    /// RTL_TCP port for clients [default: 1234]
    #[arg(short, long)]
    outport: Option<u16>,

    /// TOML configuration file (command-line options take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Back off between failed sessions instead of retrying immediately
    #[arg(long)]
    retry_backoff: bool,
}

impl Args {
    /// Load the config file (if any) and layer command-line overrides on top
    fn into_config(self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::default(),
        };

        if let Some(host) = self.host {
            config.upstream.host = host;
        }
        if let Some(port) = self.inport {
            config.upstream.port = port;
        }
        if let Some(port) = self.outport {
            config.downstream.port = port;
        }
        if self.debug {
            config.logging.debug = true;
        }
        if self.retry_backoff {
            config.retry.strategy = RetryStrategy::Backoff;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let config = Args::parse().into_config()?;

    let env = env_logger::Env::default().default_filter_or(config.log_level());
    env_logger::Builder::from_env(env).init();

    log::info!("iq-bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!(
        "goesrecv publisher: {}, RTL_TCP port: {}",
        config.upstream.address(),
        config.downstream.port
    );
    log::debug!("Configuration: {:?}", config);

    let running = setup_shutdown_handler()?;
    Supervisor::new(config, running).run();

    log::info!("iq-bridge stopped");
    Ok(())
}
