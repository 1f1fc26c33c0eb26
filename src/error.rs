//! Error types for sdb
//!
//! All modules use `SdbResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sdb operations
pub type SdbResult<T> = Result<T, SdbError>;

/// All errors that can occur in sdb
#[derive(Error, Debug)]
pub enum SdbError {
    // Environment errors
    #[error("No container engine found (tried: {tried})")]
    EngineNotFound { tried: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Build file errors
    #[error("Unrecognized build file name: {0}")]
    UnrecognizedBuildFile(PathBuf),

    #[error("Build file not found: {0}")]
    BuildFileNotFound(PathBuf),

    // Pipeline errors
    #[error("Pipeline stage {index} is empty")]
    EmptyStage { index: usize },

    #[error("Command failed: {command}, exit code: {}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    StageFailed { command: String, code: Option<i32> },

    #[error("Fact '{name}' timed out after {secs}s")]
    FactTimeout { name: String, secs: u64 },

    // Image errors
    #[error("Image build failed: {image}\n{output}")]
    ImageBuild { image: String, output: String },

    #[error("Image tag failed: {target}: {reason}")]
    ImageTag { target: String, reason: String },

    #[error("Image push failed: {image}: {reason}")]
    ImagePush { image: String, reason: String },

    #[error("{failed} of {total} tag masks failed")]
    TagsFailed { failed: usize, total: usize },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl SdbError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EngineNotFound { .. } => {
                Some("Install docker or podman, or set engine.binary in the config")
            }
            Self::UnrecognizedBuildFile(_) => {
                Some("Name the build file Dockerfile, Dockerfile.<image> or <image>.Dockerfile")
            }
            Self::FactTimeout { .. } => Some("Raise facts.timeout_secs or set it to 0"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SdbError::UnrecognizedBuildFile(PathBuf::from("foo.txt"));
        assert!(err.to_string().contains("foo.txt"));
    }

    #[test]
    fn stage_failed_display() {
        let err = SdbError::StageFailed {
            command: "false".to_string(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "Command failed: false, exit code: 1");

        let err = SdbError::StageFailed {
            command: "sleep".to_string(),
            code: None,
        };
        assert!(err.to_string().ends_with("exit code: none"));
    }

    #[test]
    fn error_hint() {
        let err = SdbError::UnrecognizedBuildFile(PathBuf::from("x"));
        assert!(err.hint().unwrap().contains("Dockerfile"));
        assert!(SdbError::User("x".to_string()).hint().is_none());
    }
}
