use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: compact lines on stderr, filtered by
/// `RUST_LOG` when set, otherwise by `default_filter`. HTTP client noise is
/// capped at `warn` either way.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_filter: &str) {
  let filter = std::env::var("RUST_LOG")
    .map_or_else(|_| EnvFilter::new(default_filter), EnvFilter::new)
    .add_directive(
      "hyper=warn"
        .parse()
        .unwrap_or_else(|_| tracing::Level::WARN.into()),
    )
    .add_directive(
      "reqwest=warn"
        .parse()
        .unwrap_or_else(|_| tracing::Level::WARN.into()),
    )
    .add_directive(
      "sqlx::query=warn"
        .parse()
        .unwrap_or_else(|_| tracing::Level::WARN.into()),
    );

  let result = tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .try_init();

  if result.is_err() {
    tracing::debug!("tracing subscriber already installed");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_is_idempotent() {
    init_tracing("debug");
    init_tracing("info");
    tracing::info!("still logging");
  }
}
