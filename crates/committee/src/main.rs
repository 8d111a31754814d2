use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use committee::agents::{DebateFailure, DebateObserver, DebateOrchestrator, NoopObserver};
use committee::models::DebateSession;
use committee::render::{self, TerminalObserver};
use committee::Credentials;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "committee",
    about = "Investment Committee: a Bull and a Bear debate a stock, a Portfolio Manager decides"
)]
struct Cli {
    /// Tickers to debate in order. Without any, prompts interactively.
    tickers: Vec<String>,

    /// Path to configuration file [default: config/committee.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print each completed debate as JSON instead of the terminal report
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    // Respects RUST_LOG
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Renders each outcome the moment it is known.
fn print_result(result: &Result<DebateSession, DebateFailure>, json: bool) {
    match (result, json) {
        (Ok(session), true) => match serde_json::to_string_pretty(session) {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("Failed to serialize session: {e}"),
        },
        (Ok(session), false) => println!("{}", render::session(session)),
        (Err(failure), true) => println!("{:#}", render::failure_json(failure)),
        (Err(failure), false) => println!("{}", render::failure(failure)),
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves,
/// so debates simply run uninterruptible.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Outcomes of an interactive session. An interrupted ticker has no outcome
/// but still counts as failed.
struct Session {
    results: Vec<Result<DebateSession, DebateFailure>>,
    interrupted: usize,
}

async fn interactive(
    orchestrator: &DebateOrchestrator,
    observer: &dyn DebateObserver,
    json: bool,
) -> Result<Session> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = Session {
        results: Vec::new(),
        interrupted: 0,
    };

    loop {
        print!("\nEnter a stock ticker (or 'quit' to exit): ");
        std::io::stdout().flush().context("Failed to write prompt")?;

        // Ctrl-C at the prompt ends the session like 'quit'
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let ticker = line.trim();
        if ticker.is_empty() {
            continue;
        }
        if matches!(ticker.to_ascii_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        match committee::run_interruptible(orchestrator, ticker, observer, ctrl_c()).await {
            Some(result) => {
                print_result(&result, json);
                session.results.push(result);
            }
            None => {
                println!("\nAnalysis of {ticker} interrupted.");
                session.interrupted += 1;
            }
        }
    }
    Ok(session)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    // Load config
    let (config_path, explicit) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(committee::DEFAULT_CONFIG_PATH), false),
    };
    let mut config = committee::load_config(&config_path, explicit)?;
    committee::apply_env_overrides(&mut config, |k| std::env::var(k).ok())
        .context("Invalid provider override")?;
    let credentials = Credentials::from_env(|k| std::env::var(k).ok());

    let orchestrator = committee::build_orchestrator(&config, &credentials)
        .context("Failed to build orchestrator")?;

    let observer: &dyn DebateObserver = if cli.json {
        &NoopObserver
    } else {
        println!("{}", render::header());
        println!("{}", render::providers(&committee::role_bindings(&config.agents)));
        &TerminalObserver
    };

    let status = if cli.tickers.is_empty() {
        let session = interactive(&orchestrator, observer, cli.json).await?;
        if session.interrupted > 0 {
            1
        } else {
            committee::exit_status(&session.results)
        }
    } else {
        let results = committee::run_batch(&orchestrator, &cli.tickers, observer, |result| {
            print_result(result, cli.json)
        })
        .await;
        committee::exit_status(&results)
    };

    Ok(ExitCode::from(status))
}
