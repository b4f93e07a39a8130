use crate::error::{FocusError, Result};
use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber for the `focusdeck` target.
///
/// `RUST_LOG` wins over `level` when set. Returns whether this call installed
/// the subscriber; when the host already set one up, that one is kept. A
/// level that does not parse is an error either way.
pub fn init(level: &str) -> Result<bool> {
    let configured = crate_filter(level)?;
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) => {
            EnvFilter::try_new(directive).map_err(|e| FocusError::Logging(e.to_string()))?
        }
        Err(_) => configured,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("tracing subscriber already installed, keeping it");
    }
    Ok(installed)
}

fn crate_filter(level: &str) -> Result<EnvFilter> {
    let target = env!("CARGO_PKG_NAME").replace('-', "_");
    EnvFilter::try_new(format!("{target}={level}")).map_err(|e| FocusError::Logging(e.to_string()))
}

/// Force this in a test to see library logs in the test output.
pub static TEST_LOGGING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_filter_rejects_unknown_level() {
        assert!(crate_filter("debug").is_ok());
        let err = crate_filter("loud").unwrap_err();
        assert!(matches!(err, FocusError::Logging(_)));
    }

    #[test]
    fn init_keeps_an_existing_subscriber() {
        Lazy::force(&TEST_LOGGING);
        assert!(!init("info").unwrap());
        assert!(matches!(init("loud"), Err(FocusError::Logging(_))));
    }

    #[test]
    fn test_logging_can_be_forced_repeatedly() {
        Lazy::force(&TEST_LOGGING);
        Lazy::force(&TEST_LOGGING);
        tracing::debug!("test logging active");
    }
}
