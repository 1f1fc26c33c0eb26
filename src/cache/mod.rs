//! Content-addressed build cache keys
//!
//! A build is keyed by a fingerprint of everything that can change the
//! resulting image: the build file plus every context file its `COPY`
//! instructions reference. Same fingerprint = same image, so an existing
//! image with that tag means the build can be skipped.
//!
//! # Pipeline
//!
//! | Step | Module | Output |
//! |------|--------|--------|
//! | Extract | `buildfile` | patterns + base images |
//! | Resolve | `files` | ordered relative paths |
//! | Digest | `fingerprint` | 8 hex characters |

pub mod buildfile;
pub mod files;
pub mod fingerprint;

pub use buildfile::{BuildFileDeps, Dependency, DependencyKind};
pub use files::resolve_files;
pub use fingerprint::{
    context_files, digest_lines, fingerprint, fingerprint_lines, read_build_file, FINGERPRINT_LEN,
};
