//! Content fingerprinting of a build context
//!
//! The fingerprint is the first 8 hex characters of a SHA-1 digest over
//! one `"<path> <sha1-of-content>\n"` line per context file. It becomes the
//! image tag, so identical trees must produce identical fingerprints on
//! every machine.

use crate::cache::buildfile::{self, BuildFileDeps};
use crate::cache::files::resolve_files;
use sha1::{Digest, Sha1};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

/// Number of hex characters kept from the final digest
pub const FINGERPRINT_LEN: usize = 8;

/// Hex-encoded SHA-1 of a byte buffer
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hex-encoded SHA-1 of a file's content.
///
/// An unreadable file hashes as empty content. The fingerprint stays
/// computable, at the cost of not reflecting that file.
pub fn hash_file(path: &Path) -> String {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(
                "Failed to read {} for hashing: {} (treated as empty)",
                path.display(),
                e
            );
            Vec::new()
        }
    };
    hash_bytes(&content)
}

/// One `"<path> <digest>"` line per file, in the given order
pub fn digest_lines(root: &Path, files: &[String]) -> Vec<String> {
    files
        .iter()
        .map(|file| format!("{} {}", file, hash_file(&root.join(file))))
        .collect()
}

/// Fingerprint of already computed digest lines
pub fn fingerprint_lines(lines: &[String]) -> String {
    let mut buffer = String::new();
    for line in lines {
        buffer.push_str(line);
        buffer.push('\n');
    }
    let digest = hash_bytes(buffer.as_bytes());
    digest[..FINGERPRINT_LEN].to_string()
}

/// Fingerprint an ordered list of context files
pub fn fingerprint_files(root: &Path, files: &[String]) -> String {
    fingerprint_lines(&digest_lines(root, files))
}

/// Read and parse a build file.
///
/// A build file that cannot be opened contributes no patterns.
pub fn read_build_file(path: &Path) -> BuildFileDeps {
    match File::open(path) {
        Ok(file) => buildfile::parse(BufReader::new(file)),
        Err(e) => {
            warn!("Failed to open build file {}: {}", path.display(), e);
            BuildFileDeps::default()
        }
    }
}

/// Files that make up the cache key of `build_file` (relative to `root`):
/// the build file itself plus everything its `COPY` sources match.
pub fn context_files(root: &Path, build_file: &str) -> Vec<String> {
    let deps = read_build_file(&root.join(build_file));

    let mut patterns = Vec::with_capacity(deps.patterns.len() + 1);
    patterns.push(glob::Pattern::escape(build_file));
    patterns.extend(deps.patterns);

    resolve_files(root, &patterns)
}

/// Compute the cache fingerprint of `build_file` inside `root`
pub fn fingerprint(root: &Path, build_file: &str) -> String {
    let files = context_files(root, build_file);
    let fingerprint = fingerprint_files(root, &files);
    debug!(
        "Fingerprint of {} over {} files: {}",
        build_file,
        files.len(),
        fingerprint
    );
    fingerprint
}
