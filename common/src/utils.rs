// common/src/utils.rs
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Setup tracing for the relay. Level comes from `RELAY_LOG_LEVEL`, default INFO.
pub fn setup_tracing() {
    let level = std::env::var("RELAY_LOG_LEVEL")
        .ok()
        .and_then(|v| Level::from_str(&v).ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
