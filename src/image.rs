//! Image naming and lookup
//!
//! | Build file | Image |
//! |------------|-------|
//! | `web/Dockerfile` | `web` |
//! | `Dockerfile.web` | `web` |
//! | `web.Dockerfile` | `web` |

use crate::error::{SdbError, SdbResult};
use std::path::{Path, PathBuf};

const BUILD_FILE: &str = "Dockerfile";
const BUILD_FILE_PREFIX: &str = "Dockerfile.";
const BUILD_FILE_SUFFIX: &str = ".Dockerfile";

/// Derive the image name from the build file's name
pub fn image_name(build_file: &Path) -> SdbResult<String> {
    let unrecognized = || SdbError::UnrecognizedBuildFile(build_file.to_path_buf());

    let base = build_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(unrecognized)?;

    let name = if base == BUILD_FILE {
        directory_name(build_file).ok_or_else(unrecognized)?
    } else if let Some(name) = base.strip_prefix(BUILD_FILE_PREFIX) {
        name.to_string()
    } else if let Some(name) = base.strip_suffix(BUILD_FILE_SUFFIX) {
        name.to_string()
    } else {
        return Err(unrecognized());
    };

    if name.is_empty() {
        return Err(unrecognized());
    }
    Ok(name)
}

/// Name of the directory holding `build_file`, resolving `.` and `..`
fn directory_name(build_file: &Path) -> Option<String> {
    let parent = build_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let named = |p: &Path| p.file_name().and_then(|n| n.to_str()).map(str::to_string);
    named(parent).or_else(|| {
        let resolved: PathBuf = parent.canonicalize().ok()?;
        named(&resolved)
    })
}

/// A build file split into its context directory and file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFile {
    /// Directory holding the build file, used as the build context
    pub dir: PathBuf,

    /// File name relative to `dir`
    pub name: String,
}

impl BuildFile {
    /// Locate an existing build file
    pub fn locate(path: &Path) -> SdbResult<Self> {
        if !path.is_file() {
            return Err(SdbError::BuildFileNotFound(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SdbError::UnrecognizedBuildFile(path.to_path_buf()))?
            .to_string();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Ok(Self { dir, name })
    }

    /// Full path of the build file
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// Repository for `image` under `prefix`
pub fn repository(prefix: &str, image: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        image.to_string()
    } else {
        format!("{}/{}", prefix, image)
    }
}

/// Full `repository:tag` reference
pub fn reference(repository: &str, tag: &str) -> String {
    format!("{}:{}", repository, tag)
}

/// Whether an `image ls` listing has a row for `name` and `tag`.
///
/// Tabs become spaces and runs of spaces collapse to one; a row matches when
/// it then starts with `"<name> <tag> "`. Rows are not trimmed.
pub fn find_image(listing: &str, name: &str, tag: &str) -> bool {
    let wanted = format!("{} {} ", name, tag);
    listing
        .lines()
        .any(|row| collapse_spaces(row).starts_with(&wanted))
}

fn collapse_spaces(row: &str) -> String {
    let mut collapsed = String::with_capacity(row.len());
    for c in row.chars().map(|c| if c == '\t' { ' ' } else { c }) {
        if c == ' ' && collapsed.ends_with(' ') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}
