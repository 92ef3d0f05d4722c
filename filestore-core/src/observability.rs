/*!
Tracing setup for hosts that want the library's structured logging on a
sensible default subscriber. Embedding applications with their own
subscriber can skip this entirely.
*/

use crate::{Result, StoreError};
use tracing::subscriber::set_global_default;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a global env-filtered fmt subscriber.
///
/// The filter falls back to `RUST_LOG`, then to the provided default
/// directive (`info` when `None`). Fails if a global subscriber is already
/// set.
pub fn init_logging(default_directive: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive.unwrap_or("info")))
        .map_err(|e| StoreError::config(format!("invalid log filter: {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| StoreError::config(format!("failed to install tracing subscriber: {e}")))
}

/// Same as [`init_logging`] but with JSON-formatted output, for log
/// pipelines that ingest structured events.
pub fn init_json_logging(default_directive: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive.unwrap_or("info")))
        .map_err(|e| StoreError::config(format!("invalid log filter: {e}")))?;

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json());
    set_global_default(subscriber)
        .map_err(|e| StoreError::config(format!("failed to install tracing subscriber: {e}")))
}
