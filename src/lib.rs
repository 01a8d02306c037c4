pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod feedback;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod store;
pub mod trend;
pub mod youtube;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use cli::Cli;
use config::AppConfig;
use db::AppState;

/// Entry point for the `lift-review` binary.
pub fn run() -> std::process::ExitCode {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();

  let config = match AppConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      return std::process::ExitCode::FAILURE;
    }
  };
  logging::init_tracing(&config.log_filter);

  let runtime = match tokio::runtime::Runtime::new() {
    Ok(runtime) => runtime,
    Err(e) => {
      tracing::error!(error = %e, "failed to start async runtime");
      return std::process::ExitCode::FAILURE;
    }
  };

  runtime.block_on(async move {
    let state = match AppState::from_config(config).await {
      Ok(state) => state,
      Err(e) => {
        eprintln!("Failed to initialize record store: {}", e);
        return std::process::ExitCode::FAILURE;
      }
    };

    match cli::execute(&state, cli).await {
      Ok(()) => std::process::ExitCode::SUCCESS,
      Err(e) => {
        eprintln!("{}", e);
        std::process::ExitCode::FAILURE
      }
    }
  })
}
