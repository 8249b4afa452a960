use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{BoardError, BoardResult, SyncConfig};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Output goes to stderr so it
/// never mixes with anything the host writes to stdout.
pub fn init_logging(config: &SyncConfig) -> BoardResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.effective_log_filter()))
        .map_err(|e| BoardError::Config(format!("invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| BoardError::Config(format!("logging already initialized: {}", e)))
}
