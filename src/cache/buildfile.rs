//! Build file dependency extraction
//!
//! Scans build file text for base images (`FROM`) and build context
//! sources (`COPY`). Only the instructions that influence the cache key
//! are recognised; everything else is skipped silently.

use std::io::BufRead;
use tracing::warn;

/// Recursive wildcard covering a whole directory
pub const RECURSIVE_WILDCARD: &str = "**/*";

/// Kind of an extracted dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Base image referenced by a `FROM` instruction
    ContainerImage,
}

/// A dependency found in a build file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub kind: DependencyKind,
    pub reference: String,
}

impl Dependency {
    fn image(reference: &str) -> Self {
        Self {
            kind: DependencyKind::ContainerImage,
            reference: reference.to_string(),
        }
    }
}

/// Everything the cache key depends on, in source line order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFileDeps {
    /// Glob patterns for build context files (duplicates retained)
    pub patterns: Vec<String>,

    /// Base images
    pub dependencies: Vec<Dependency>,
}

/// Parse build file text line by line.
///
/// Lines are read through the buffered reader, so an instruction is never
/// split by the size of a read. A read error stops parsing and returns
/// whatever was collected up to that point.
pub fn parse<R: BufRead>(reader: R) -> BuildFileDeps {
    let mut deps = BuildFileDeps::default();

    for line in reader.split(b'\n') {
        let line = match line {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed reading build file: {}", e);
                break;
            }
        };
        let line = String::from_utf8_lossy(&line);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if let Some(dependency) = parse_from(line) {
            deps.dependencies.push(dependency);
        }
        if let Some(pattern) = parse_copy(line) {
            deps.patterns.push(pattern);
        }
    }

    deps
}

/// Case-insensitive check that `line` starts with `keyword` (which is ASCII)
fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.len() >= keyword.len()
        && line.as_bytes()[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
}

fn parse_from(line: &str) -> Option<Dependency> {
    if !starts_with_keyword(line, "from ") {
        return None;
    }
    line.split_whitespace().nth(1).map(Dependency::image)
}

fn parse_copy(line: &str) -> Option<String> {
    if !starts_with_keyword(line, "copy ") || line.to_ascii_lowercase().contains("--from=") {
        return None;
    }
    let source = line.split_whitespace().nth(1)?;
    Some(source_pattern(source))
}

/// Turn a `COPY` source path into a glob pattern relative to the context root
fn source_pattern(source: &str) -> String {
    let mut pattern = if source == "./" {
        RECURSIVE_WILDCARD.to_string()
    } else {
        source.strip_prefix("./").unwrap_or(source).to_string()
    };

    if pattern.ends_with('/') {
        pattern.push_str(RECURSIVE_WILDCARD);
    }

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    fn parse_str(text: &str) -> BuildFileDeps {
        parse(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn from_yields_dependency() {
        assert_eq!(parse_from("from a"), Some(Dependency::image("a")));
        assert_eq!(
            parse_from("FROM alpine:3.20 AS base"),
            Some(Dependency::image("alpine:3.20"))
        );
        assert_eq!(parse_from("copy a b"), None);
    }

    #[test]
    fn from_without_reference_is_skipped() {
        assert_eq!(parse_from("FROM "), None);
        assert_eq!(parse_from("FROM    "), None);
    }

    #[test]
    fn copy_plain_source() {
        assert_eq!(parse_copy("copy a b"), Some("a".to_string()));
    }

    #[test]
    fn copy_multi_stage_is_skipped() {
        assert_eq!(parse_copy("copy --from=x a b"), None);
        assert_eq!(parse_copy("COPY --FROM=builder /x /y"), None);
    }

    #[test]
    fn copy_context_root_becomes_recursive() {
        assert_eq!(parse_copy("copy ./ /opt"), Some("**/*".to_string()));
    }

    #[test]
    fn copy_directory_gets_wildcard() {
        assert_eq!(parse_copy("copy /opt/ /opt"), Some("/opt/**/*".to_string()));
        assert_eq!(parse_copy("COPY ./src/ /app"), Some("src/**/*".to_string()));
    }

    #[test]
    fn copy_strips_leading_dot_slash() {
        assert_eq!(parse_copy("COPY ./app.sh /opt"), Some("app.sh".to_string()));
    }

    #[test]
    fn copy_without_source_is_skipped() {
        assert_eq!(parse_copy("COPY "), None);
    }

    #[test]
    fn other_instructions_are_ignored() {
        let deps = parse_str("RUN apk add curl\nWORKDIR /app\n# COPY a b\nADD x y\n");
        assert!(deps.patterns.is_empty());
        assert!(deps.dependencies.is_empty());
    }

    #[test]
    fn keeps_source_order_and_duplicates() {
        let deps = parse_str(
            "FROM golang:1.22 AS build\n\
             COPY go.mod /src/\n\
             COPY ./ /src\n\
             COPY go.mod /src/\n\
             FROM alpine:3.20\n\
             COPY --from=build /out/app /app\n",
        );
        assert_eq!(deps.patterns, vec!["go.mod", "**/*", "go.mod"]);
        let refs: Vec<&str> = deps
            .dependencies
            .iter()
            .map(|d| d.reference.as_str())
            .collect();
        assert_eq!(refs, vec!["golang:1.22", "alpine:3.20"]);
        assert!(deps
            .dependencies
            .iter()
            .all(|d| d.kind == DependencyKind::ContainerImage));
    }

    #[test]
    fn handles_crlf_line_endings() {
        let deps = parse_str("FROM alpine:latest\r\nCOPY app/ /opt\r\n");
        assert_eq!(deps.dependencies, vec![Dependency::image("alpine:latest")]);
        assert_eq!(deps.patterns, vec!["app/**/*"]);
    }

    #[test]
    fn lines_are_not_split_at_buffer_boundaries() {
        // A 4-byte buffer forces every instruction across several reads
        let text = "FROM alpine:latest\nCOPY some/long/dir/ /opt\n";
        let reader = BufReader::with_capacity(4, Cursor::new(text.as_bytes()));
        let deps = parse(reader);
        assert_eq!(deps.dependencies, vec![Dependency::image("alpine:latest")]);
        assert_eq!(deps.patterns, vec!["some/long/dir/**/*"]);
    }

    struct FailAfter {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(std::io::Error::other("disk gone"));
            }
            Ok(n)
        }
    }

    #[test]
    fn read_error_returns_collected_lines() {
        let reader = BufReader::new(FailAfter {
            data: Cursor::new(b"FROM alpine\nCOPY a /a\n".to_vec()),
        });
        let deps = parse(reader);
        assert_eq!(deps.dependencies.len(), 1);
        assert_eq!(deps.patterns, vec!["a"]);
    }
}
