//! Container engine driven through its command line
//!
//! Works with any binary that speaks the docker CLI dialect, which covers
//! both docker and podman.

use crate::error::{SdbError, SdbResult};
use crate::image::find_image;
use crate::orchestration::runtime::ContainerEngine;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Registry podman reports for images built under an unqualified name
const PODMAN_LOCAL_REGISTRY: &str = "localhost";

/// Whether `listing` has `name:tag`, either as given or qualified with
/// podman's local registry.
fn listing_has_image(listing: &str, name: &str, tag: &str) -> bool {
    if find_image(listing, name, tag) {
        return true;
    }
    let qualified = format!("{}/{}", PODMAN_LOCAL_REGISTRY, name);
    !name.starts_with(&format!("{}/", PODMAN_LOCAL_REGISTRY))
        && find_image(listing, &qualified, tag)
}

/// Container engine invoked as a subprocess
#[derive(Debug, Clone)]
pub struct CliEngine {
    binary: String,
}

impl CliEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check whether `binary --version` runs successfully
    pub async fn probe(binary: &str) -> bool {
        Command::new(binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Execute an engine command and return the output
    async fn exec(&self, args: &[&str]) -> SdbResult<std::process::Output> {
        debug!("Executing: {}", self.describe(args));

        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SdbError::command_failed(self.describe(args), e))
    }

    /// Spawn an engine command in `dir` with both output streams piped
    fn spawn_piped(&self, dir: &Path, args: &[&str]) -> SdbResult<Child> {
        debug!("Spawning in {}: {}", dir.display(), self.describe(args));

        Command::new(&self.binary)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SdbError::command_failed(self.describe(args), e))
    }
}

#[async_trait]
impl ContainerEngine for CliEngine {
    fn binary(&self) -> &str {
        &self.binary
    }

    async fn image_exists(&self, name: &str, tag: &str) -> SdbResult<bool> {
        let args = ["image", "ls"];
        let output = self.exec(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SdbError::command_exec(self.describe(&args), stderr.trim()));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(listing_has_image(&listing, name, tag))
    }

    async fn build_image(
        &self,
        context_dir: &Path,
        build_file: &str,
        image: &str,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> SdbResult<()> {
        let dir = if context_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            context_dir
        };

        info!("Building {} from {}", image, dir.join(build_file).display());
        let mut child = self.spawn_piped(dir, &["build", "-t", image, "-f", build_file, "."])?;

        let all_output = super::stream_child_output(&mut child, on_output).await;

        let status = child
            .wait()
            .await
            .map_err(|e| SdbError::command_failed(format!("{} build", self.binary), e))?;

        if !status.success() {
            let combined = all_output.join("\n");
            return Err(SdbError::ImageBuild {
                image: image.to_string(),
                output: super::build_error_output(&combined, ""),
            });
        }

        Ok(())
    }

    async fn tag_image(&self, source: &str, target: &str) -> SdbResult<()> {
        debug!("Tagging {} as {}", source, target);

        let output = self.exec(&["image", "tag", source, target]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SdbError::ImageTag {
                target: target.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }

    async fn push_image(&self, image: &str) -> SdbResult<()> {
        info!("Pushing {}", image);

        let output = self.exec(&["push", image]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SdbError::ImagePush {
                image: image.to_string(),
                reason: super::build_error_output(&stdout, &stderr),
            })
        }
    }
}
