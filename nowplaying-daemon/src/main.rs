use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nowplaying::{build_input_handler, build_track_handler, Args, Config, NowPlayingDaemon, SaemuBox};
use nowplaying_core::logging::{init_logging_from_env, LoggingMode};
use tracing::{error, info};
use webhook_server::WebhookServer;

fn main() -> ExitCode {
    let args = Args::parse();

    let mode = if args.debug {
        LoggingMode::Debug
    } else {
        LoggingMode::Production
    };
    if let Err(e) = init_logging_from_env(mode) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error in main: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    info!("Starting up now-playing daemon");

    let config = Config::from_args(args).context("Invalid configuration")?;
    config.log_summary();

    let tracks = build_track_handler(&config)?;
    let inputs = build_input_handler(&config, tracks)?;

    let saemubox = SaemuBox::bind(config.selector.clone()).context("Failed to bind Sämubox socket")?;
    // give the Sämubox a chance to send before the first poll
    thread::sleep(Duration::from_millis(200));

    let (event_tx, event_rx) = mpsc::channel();
    let server = WebhookServer::start(config.webhook.clone(), event_tx)
        .context("Failed to start webhook server")?;
    info!("Webhook API listening on {}", server.webhook_url());

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        info!("Signal caught, terminating");
        handler_flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to install signal handler")?;

    let mut daemon = NowPlayingDaemon::new(saemubox, inputs, event_rx);
    daemon.run(config.sleep, &running);

    info!("Stopping API server");
    server.shutdown();

    Ok(())
}
