//! Run configuration from file, environment and command-line flags.

use anyhow::{Context, Result};
use deconflict_core::{DeconflictConfig, FailurePolicy};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Values given on the command line; `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub sample_count: Option<usize>,
    pub safety_distance: Option<f64>,
    pub max_degree: Option<usize>,
    pub temporal_tolerance: Option<f64>,
    pub fail_fast: bool,
}

/// Resolve the effective configuration.
///
/// The base layer is the JSON config file when one is given, otherwise the
/// `DECONFLICT_*` environment over the defaults. Command-line overrides are
/// applied last and the result is validated.
pub fn resolve_config(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<DeconflictConfig> {
    let mut config = match file {
        Some(path) => DeconflictConfig::from_json_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => DeconflictConfig::from_env(),
    };

    if let Some(v) = overrides.sample_count {
        config.sample_count = v;
    }
    if let Some(v) = overrides.safety_distance {
        config.safety_distance = v;
    }
    if let Some(v) = overrides.max_degree {
        config.max_degree = v;
    }
    if let Some(v) = overrides.temporal_tolerance {
        config.temporal_tolerance = v;
    }
    if overrides.fail_fast {
        config.failure_policy = FailurePolicy::Abort;
    }

    config.validate().context("invalid run configuration")?;
    Ok(config)
}

/// Initialize tracing to stderr, filtered by `RUST_LOG`.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deconflict_core=info".parse()?)
                .add_directive("deconflict_cli=info".parse()?),
        )
        .init();
    Ok(())
}
