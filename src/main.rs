//! # linevisor
//!
//! Binary entry point: parse arguments, load and validate configuration,
//! install logging, run the orchestrator, print the final downtime report and
//! exit with the run's status code.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use linevisor::{Config, ConfigError, ExitCode, OrchestratorBuilder, SimClient};

/// Production-line downtime tracker.
#[derive(Parser, Debug)]
#[command(name = "linevisor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Endpoint url, overrides the configuration
    #[arg(long, short = 'e')]
    endpoint: Option<String>,

    /// Accept untrusted server certificates
    #[arg(long)]
    accept_untrusted: bool,

    /// Stop after this many seconds
    #[arg(long)]
    run_time: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// Use the in-process simulated telemetry source
    #[arg(long)]
    simulate: bool,
}

fn load_config(args: &Args) -> Result<Config, ConfigError> {
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(endpoint) = &args.endpoint {
        cfg.endpoint = endpoint.clone();
    }
    if args.accept_untrusted {
        cfg.accept_untrusted = true;
    }
    if let Some(secs) = args.run_time {
        cfg.run_time_secs = secs;
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, label = e.as_label(), "configuration rejected");
            std::process::exit(ExitCode::InvalidConfig.code());
        }
    };

    if !args.simulate {
        error!("no protocol client is built into this binary; run with --simulate");
        std::process::exit(ExitCode::InvalidConfig.code());
    }

    info!(
        endpoint = %cfg.endpoint,
        tags = cfg.tags.len(),
        run_time_secs = cfg.run_time_secs,
        "starting"
    );

    let format = cfg.report_format;
    let client = Arc::new(SimClient::from_config(&cfg));
    let summary = OrchestratorBuilder::new(cfg, client).build().run().await;

    match summary.report().render(format) {
        Ok(out) if out.ends_with('\n') || out.is_empty() => print!("{out}"),
        Ok(out) => println!("{out}"),
        Err(e) => error!(error = %e, "cannot render downtime report"),
    }

    info!(exit = %summary.exit, "finished");
    std::process::exit(summary.exit.code());
}
