use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use tokio::sync::watch;

use paramsync::bootstrap;
use paramsync::cli::{self, Args};
use paramsync::config::{keys, ConfigStore};
use paramsync::logging::LogControl;
use paramsync::maintainer::{Maintainer, MaintainerConfig};
use paramsync::tuning::Verbosity;
use paramsync::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log = Arc::new(LogControl::init(Verbosity::Warning));
    let namespace = ConfigStore::new();

    bootstrap::load(Path::new(&args.env_file), &namespace)?;

    // Initial threshold from the bootstrapped namespace; every later change
    // comes from the maintainer's re-tune step.
    if let Some(raw) = namespace.get(keys::LOG_LEVEL) {
        match Verbosity::from_value(&raw) {
            Ok(verbosity) => log.apply(verbosity),
            Err(e) => tracing::error!(error = %e, "keeping default log threshold"),
        }
    }
    eprintln!(
        "{}",
        format!("  Logging level set to {}", log.current()).bright_green()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let maintainer = Maintainer::new(
        MaintainerConfig::default(),
        namespace.clone(),
        Arc::clone(&log),
    );
    let status = maintainer.status_handle();
    let maintainer_task = tokio::spawn(maintainer.run(shutdown_rx.clone()));

    if args.no_web {
        tokio::signal::ctrl_c().await?;
    } else {
        eprintln!(
            "{}",
            format!("  Front door at http://{}", cli::bind_addr(&args)).bright_green()
        );
        eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());

        tokio::select! {
            served = web::serve(
                &args.host,
                args.port,
                namespace.clone(),
                Arc::clone(&status),
                shutdown_rx.clone(),
            ) => { served?; }
            _ = tokio::signal::ctrl_c() => {}
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = maintainer_task.await;
    Ok(())
}
