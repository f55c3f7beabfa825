//! Engine binary for the Scorefeed event mirror.
//!
//! Wires the upstream feed client, the decode pipeline, the poll loop, and
//! the Observer API together, then polls until a stop condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `scorefeed-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Create poll control from the interval and cycle bound
//! 4. Start the Observer API server
//! 5. Build the HTTP feed client
//! 6. Create the pipeline state (store cleared, refresh requested)
//! 7. Run the poll loop until stopped
//! 8. Log the result

mod error;
mod http_feed;
mod observer_callback;

use std::path::Path;
use std::sync::Arc;

use scorefeed_core::config::{LoggingConfig, ScorefeedConfig};
use scorefeed_core::control::PollControl;
use scorefeed_core::pipeline::FeedState;
use scorefeed_core::runner;
use scorefeed_observer::server::ServerConfig;
use scorefeed_observer::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::http_feed::HttpFeed;
use crate::observer_callback::ObserverCallback;

/// Name of the configuration file, relative to the working directory.
const CONFIG_FILE: &str = "scorefeed-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the feed client, or the Observer
/// server cannot be set up. Failures inside poll cycles never end the
/// process.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);

    info!("scorefeed-engine starting");
    if !from_file {
        info!(path = CONFIG_FILE, "Config file not found, using defaults");
    }
    info!(
        feed_base_url = config.feed.base_url,
        poll_interval_ms = config.feed.poll_interval_ms,
        request_timeout_ms = config.feed.request_timeout_ms,
        observer_port = config.observer.port,
        max_cycles = config.run.max_cycles,
        "Configuration loaded"
    );

    // 3. Create poll control.
    let control = Arc::new(PollControl::new(
        config.feed.poll_interval_ms,
        config.run.max_cycles,
    ));
    spawn_ctrl_c_handler(Arc::clone(&control));

    // 4. Start Observer API server.
    let app_state = Arc::new(AppState::with_control(Arc::clone(&control)));
    let observer = scorefeed_observer::spawn_observer(
        &ServerConfig::from(&config.observer),
        Arc::clone(&app_state),
    )
    .await
    .map_err(EngineError::from)?;
    info!(addr = %observer.addr, "Observer API server started");

    // 5. Build the feed client.
    let mut feed = HttpFeed::new(&config.feed).map_err(EngineError::from)?;
    info!(
        mappings_url = config.feed.mappings_url(),
        state_url = config.feed.state_url(),
        "Feed client ready"
    );

    // 6. Pipeline state: empty store, first cycle loads the mapping.
    let mut state = FeedState::new();
    let mut callback = ObserverCallback::new(app_state);

    // 7. Poll.
    let result = runner::run_poller(&mut state, &mut feed, &control, &mut callback).await;

    // 8. Log results.
    runner::log_poll_end(&result);
    observer.task.abort();

    info!(
        end_reason = ?result.end_reason,
        total_cycles = result.total_cycles,
        "scorefeed-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from [`CONFIG_FILE`].
///
/// Returns the config and whether it came from the file. Environment
/// overrides are applied either way.
fn load_config() -> Result<(ScorefeedConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok((ScorefeedConfig::from_file(config_path)?, true))
    } else {
        let mut config = ScorefeedConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the `fmt` subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)),
        )
        .with_target(true)
        .init();
}

/// Turn Ctrl-C into a clean poll stop.
fn spawn_ctrl_c_handler(control: Arc<PollControl>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping after the current cycle");
                control.request_stop();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
}
