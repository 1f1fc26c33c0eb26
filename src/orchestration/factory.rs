//! Engine factory
//!
//! Resolves the configured engine binary, probing the known engines when
//! set to `auto`.

use crate::config::schema::EngineConfig;
use crate::error::{SdbError, SdbResult};
use crate::orchestration::cli_engine::CliEngine;
use crate::orchestration::runtime::ContainerEngine;
use tracing::debug;

/// Engines tried in order for `auto`
pub const AUTO_CANDIDATES: [&str; 2] = ["docker", "podman"];

/// Find a working engine binary for `config`
pub async fn resolve_binary(config: &EngineConfig) -> SdbResult<String> {
    let candidates: Vec<&str> = if config.binary == EngineConfig::AUTO {
        AUTO_CANDIDATES.to_vec()
    } else {
        vec![config.binary.as_str()]
    };

    for candidate in &candidates {
        if CliEngine::probe(candidate).await {
            debug!("Using container engine: {}", candidate);
            return Ok(candidate.to_string());
        }
        debug!("Container engine not usable: {}", candidate);
    }

    Err(SdbError::EngineNotFound {
        tried: candidates.join(", "),
    })
}

/// Create the container engine selected by `config`
pub async fn create_engine(config: &EngineConfig) -> SdbResult<Box<dyn ContainerEngine>> {
    let binary = resolve_binary(config).await?;
    Ok(Box::new(CliEngine::new(binary)))
}
