//! Log output for the `qtiroute` binary and for drivers embedding the engine.
//!
//! Route events go to stderr so command output on stdout stays parseable.
//! Repeated calls are ignored; the global subscriber is set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read before `RUST_LOG` for the log filter.
pub const LOG_ENV: &str = "QTIROUTE_LOG";

/// Install the global subscriber.
///
/// The filter comes from `QTIROUTE_LOG`, then `RUST_LOG`, then `level`. With
/// `json` set, events are written as newline-delimited JSON.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().with_target(false).json().with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
        tracing::debug!("after init");
    }
}
