use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;

use fitpair::{
    collaborators::{LogNavigator, Screen, StaticAuth},
    configuration::Conf,
    flow::{FlowEvent, FlowHandle, Phase, Selection, StepSequencer},
    log,
    notification::Toast,
};

/// Runs the device connection flow headlessly.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Configuration file to use instead of the default location.
    #[arg(long)]
    config: Option<String>,

    /// Device to pick once scanning finishes. Defaults to the first catalog entry.
    #[arg(long)]
    device: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    log::init_tracing(args.log_level.unwrap_or_else(log::default_level));
    debug!("Tracing initialized");

    let conf = Conf::load(args.config.as_deref());
    debug!("Configuration: {:?}", conf);

    if Screen::for_auth(&StaticAuth::default()) == Screen::Loading {
        info!("Waiting for authentication before showing the flow.");
        return Ok(());
    }

    let catalog = Arc::new(conf.catalog().context("Invalid device catalog")?);
    let device_id = match args.device {
        Some(id) => id,
        None => catalog
            .first()
            .map(|d| d.id.clone())
            .context("Device catalog is empty")?,
    };

    let sequencer = StepSequencer::new(
        catalog.clone(),
        conf.timings,
        conf.selection_policy,
        conf.dashboard_route.clone(),
    );
    let flow = FlowHandle::spawn(sequencer, Arc::new(LogNavigator));
    let mut events = flow.subscribe();

    flow.start().await?;

    loop {
        let event = tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; tearing down the connection flow.");
                flow.shutdown().await;
                return Ok(());
            }
            event = events.recv() => event,
            _ = flow.finished() => {
                if !flow.snapshot().finished {
                    warn!("Connection flow ended without reaching the dashboard.");
                }
                return Ok(());
            }
        };

        match event {
            Ok(FlowEvent::PhaseChanged(Phase::Found)) => {
                for device in catalog.iter() {
                    info!("Found {}", device);
                }
                if let Selection::Ignored(reason) = flow.select(device_id.as_str()).await? {
                    warn!(?reason, "Device pick was not accepted.");
                    flow.shutdown().await;
                    return Ok(());
                }
            }
            Ok(FlowEvent::PhaseChanged(Phase::Connected)) => {
                if conf.notifications_enabled
                    && let Some(device) = catalog.get(&device_id)
                {
                    Toast::device_connected(device)
                        .show()
                        .await
                        .inspect_err(|e| error!("Failed to show notification: {}", e))
                        .ok();
                }
            }
            Ok(FlowEvent::PhaseChanged(phase)) => info!(%phase, "Flow advanced."),
            Ok(FlowEvent::Progress(progress)) => debug!(progress, "Progress."),
            Ok(FlowEvent::Navigate(route)) => {
                info!(%route, "Connection flow finished.");
                break;
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed flow events."),
            Err(RecvError::Closed) => break,
        }
    }

    flow.finished().await;
    Ok(())
}
