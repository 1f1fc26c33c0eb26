//! Per-image build configuration
//!
//! Lives next to the build file as `<image>.sdb.yaml`:
//!
//! ```yaml
//! prefix: registry.example.com/team
//! facts:
//!   - name: app-version
//!     args: ["app", "--version", "|", "cut", "-d", " ", "-f", "2"]
//! tags:
//!   - "@app-version|-alpine|@os-version"
//! push: true
//! ```

use crate::error::{SdbError, SdbResult};
use crate::facts::FactDef;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Suffix appended to the image name to find its config file
pub const IMAGE_CONFIG_SUFFIX: &str = ".sdb.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Repository prefix, falls back to `build.prefix` from the global config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Facts gathered from the built image
    pub facts: Vec<FactDef>,

    /// Tag masks expanded against the gathered facts
    pub tags: Vec<String>,

    /// Overrides `build.push` from the global config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,
}

impl ImageConfig {
    /// Config file path for `image` built from `build_file`
    pub fn path_for(build_file: &Path, image: &str) -> PathBuf {
        build_file
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(format!("{}{}", image, IMAGE_CONFIG_SUFFIX))
    }

    /// Load the config at `path`.
    ///
    /// A missing file yields the empty config; an unparsable one is an error.
    pub async fn load(path: &Path) -> SdbResult<Self> {
        if !path.exists() {
            warn!("No image config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        debug!("Loading image config from {}", path.display());
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SdbError::io(format!("reading image config {}", path.display()), e))?;

        Self::parse(&content).map_err(|e| SdbError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Prefix to use, given the global default
    pub fn prefix_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.prefix.as_deref().unwrap_or(default)
    }

    /// Push setting, given the global default
    pub fn push_or(&self, default: bool) -> bool {
        self.push.unwrap_or(default)
    }
}
