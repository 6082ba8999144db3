use std::sync::Mutex;

use clap::Parser;
use taskmagic::cli::commands::Cli;
use taskmagic::cli::handlers;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter, e.g. `TM_LOG=taskmagic=debug`
const LOG_ENV: &str = "TM_LOG";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// CLI commands log to stderr
fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(log_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// The dashboard owns the terminal, so it only logs to a file when asked
fn init_dashboard_logging(log_file: Option<&str>) -> Result<(), std::io::Error> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::registry()
        .with(log_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn run_dashboard(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    init_dashboard_logging(cli.log_file.as_deref())
        .map_err(|e| format!("cannot open log file: {}", e))?;
    let start = handlers::resolve_start(cli.project_dir.as_deref())?;
    let (graph, config) = handlers::load_graph(&start)?;
    taskmagic::tui::run(graph, config, !cli.no_watch)
}

fn main() {
    let mut cli = Cli::parse();

    let result = match cli.command.take() {
        // No subcommand → launch the dashboard
        None => run_dashboard(&cli),
        Some(command) => {
            init_cli_logging();
            handlers::dispatch(command, &cli)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
