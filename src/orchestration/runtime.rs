//! Container engine abstraction
//!
//! Provides a trait for the image operations sdb needs, implemented by
//! any docker-compatible command line (docker, podman).

use crate::error::SdbResult;
use async_trait::async_trait;
use std::path::Path;

/// Abstract container engine interface
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Binary used for engine commands, also the first stage of fact pipelines
    fn binary(&self) -> &str;

    /// Check whether `name:tag` is present in the local image store
    async fn image_exists(&self, name: &str, tag: &str) -> SdbResult<bool>;

    /// Build `image` from `build_file` with `context_dir` as the build context,
    /// calling `on_output` for every line the engine prints
    async fn build_image(
        &self,
        context_dir: &Path,
        build_file: &str,
        image: &str,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> SdbResult<()>;

    /// Add the tag `target` to the image `source`
    async fn tag_image(&self, source: &str, target: &str) -> SdbResult<()>;

    /// Push `image` to its registry
    async fn push_image(&self, image: &str) -> SdbResult<()>;
}
