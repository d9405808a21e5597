use card_gate::config::{
    self,
    Command,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::Path;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod client;
mod ui;

const LOG_FILE_PREFIX: &str = "card-gate.log";

fn print_usage() {
    println!(
        "Usage: card-gate [--store-dir <path> | --ephemeral] [--destination <url>] \
         [--distraction <url>] [--log-dir <path>] [--status]"
    );
    println!("  --store-dir <path>    persistent store directory (default ~/.card-gate/store)");
    println!("  --ephemeral           keep the game record in memory only");
    println!("  --destination <url>   where a winning choice leads");
    println!("  --distraction <url>   media opened after a losing choice");
    println!("  --log-dir <path>      log file directory (default ~/.card-gate/logs)");
    println!("  --status              print the stored record as JSON and exit");
}

fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    let appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| eyre!("failed to initialise tracing: {err}"))?;
    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    match config::parse_args(std::env::args().skip(1))? {
        Command::Help => {
            print_usage();
            Ok(())
        }
        Command::Status(config) => client::print_status(config),
        Command::Play(config) => {
            config.ensure_structure()?;
            let _guard = init_tracing(&config.log_dir)?;
            client::run_app(config).await
        }
    }
}
