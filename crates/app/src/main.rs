//! Moyeora - group meetup coordination from the terminal
//!
//! Rooms with candidate dates, date voting, a midpoint of everyone's
//! location, and a roulette that picks the treasurer.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;
mod device;
mod error;
mod feed;
mod geocode;
mod render;
mod state;

use cli::Command;
use config::Config;
use error::Result;
use state::AppState;

fn main() -> ExitCode {
    // Logs go to stderr so room views on stdout stay clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match cli::parse(&args) {
        Ok(Command::Help) => {
            cli::print_usage();
            return ExitCode::SUCCESS;
        }
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n", e);
            cli::print_usage();
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_room_not_found() => {
            eprint!("{}", render::not_found());
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let config = Config::load()?;

    if let Command::FeedServer { addr } = command {
        return commands::run_feed_server(addr.unwrap_or(config.feed.addr)).await;
    }

    tracing::debug!(?command, "Running command");
    let state = AppState::open(config)?;
    let mut stdout = std::io::stdout();
    commands::execute(&state, command, &mut stdout).await
}
