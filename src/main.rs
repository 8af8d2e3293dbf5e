//! `license-sweeper` — remove complimentary package licenses that no paid license depends on.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and load config ([`config::load_config`]).
//! 2. Connect to the gateway and start polling the license list ([`gateway`]).
//! 3. Diff every license list against its predecessor ([`snapshot`], [`session`]).
//! 4. On the first list only, run the pipeline ([`pipeline`]):
//!    fetch package info in chunks ([`catalog`]), classify each package
//!    ([`license`]), resolve protected apps ([`resolver`]), ask for confirmation,
//!    then revoke the remaining apps with an audit log ([`executor`], [`audit`]).
//! 5. Render the outcome ([`report`]) and exit `0`, or `1` when anything failed.

mod account;
mod audit;
mod catalog;
mod cli;
mod config;
mod error;
mod events;
mod executor;
mod gateway;
mod license;
mod models;
mod pipeline;
mod report;
mod resolver;
mod session;
mod snapshot;
#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use account::AccountService;
use cli::{Cli, ReportFormat};
use config::load_config;
use events::EventSink;
use gateway::HttpGateway;
use pipeline::{Engine, EngineSettings, PipelineOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let working_dir = std::env::current_dir()?;
    let mut config = load_config(&working_dir, cli.config.as_deref())?;

    config.apply_cli(&cli);
    config.validate()?;

    let sink: Arc<dyn EventSink> = match cli.report {
        ReportFormat::Terminal => Arc::new(report::terminal::TerminalSink::new(cli.quiet)),
        ReportFormat::Json => Arc::new(report::json::JsonSink),
    };
    let terminal = matches!(cli.report, ReportFormat::Terminal);

    if terminal && !cli.quiet {
        println!(
            "\n {} v{}",
            "license-sweeper".bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "{}",
            " Complimentary package licenses will be removed. Apps covered by paid licenses are kept.\n"
                .blue()
        );
        println!("Connecting to {}...", config.gateway.base_url);
    }

    let gateway = HttpGateway::connect(&config.gateway).await?;
    tracing::info!(account = gateway.account_id(), "logged on");
    if terminal && !cli.quiet {
        println!("Logged on, waiting for licenses...");
    }

    let (tx, rx) = mpsc::channel(4);
    let poller = tokio::spawn(gateway::poll_licenses(
        gateway.clone(),
        Duration::from_secs(config.gateway.poll_interval_secs),
        tx,
    ));

    let gateway = Arc::new(gateway);
    let engine = Engine {
        catalog: gateway.clone(),
        account: gateway,
        gate: Arc::new(report::prompt::ConsoleGate),
        sink: sink.clone(),
        settings: EngineSettings {
            chunk_size: config.removal.chunk_size,
            audit_dir: config.removal.audit_dir.clone(),
        },
    };

    let result = session::run_session(rx, engine, sink).await;
    poller.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("\n{}", format!("{:?}", anyhow::Error::from(e)).red());
            std::process::exit(1);
        }
    };

    match cli.report {
        ReportFormat::Terminal => report::terminal::render_outcome(&outcome, cli.quiet),
        ReportFormat::Json => println!("{}", report::json::outcome_json(&outcome)),
    }

    if let PipelineOutcome::Completed(summary) = &outcome {
        if summary.failed > 0 {
            std::process::exit(1);
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "license_sweeper=debug"
    } else if cli.quiet {
        "license_sweeper=error"
    } else {
        "license_sweeper=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
