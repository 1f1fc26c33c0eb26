//! Fingerprint command - print the cache key of a build file

use crate::cache;
use crate::cli::args::{FingerprintArgs, OutputFormat};
use crate::error::SdbResult;
use crate::image::BuildFile;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FileDigest {
    path: String,
    sha1: String,
}

#[derive(Debug, Serialize)]
struct FingerprintReport {
    build_file: String,
    fingerprint: String,
    base_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<FileDigest>>,
}

/// Execute the fingerprint command
pub async fn execute(args: FingerprintArgs) -> SdbResult<()> {
    let report = fingerprint_report(&args)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            for file in report.files.iter().flatten() {
                println!("{} {}", file.path, file.sha1);
            }
            println!("{}", report.fingerprint);
        }
    }

    Ok(())
}

fn fingerprint_report(args: &FingerprintArgs) -> SdbResult<FingerprintReport> {
    let build_file = BuildFile::locate(&args.build_file)?;
    let deps = cache::read_build_file(&build_file.path());

    let files = cache::context_files(&build_file.dir, &build_file.name);
    let lines = cache::digest_lines(&build_file.dir, &files);
    let fingerprint = cache::fingerprint_lines(&lines);

    let files = args.files.then(|| {
        lines
            .iter()
            .filter_map(|line| line.rsplit_once(' '))
            .map(|(path, sha1)| FileDigest {
                path: path.to_string(),
                sha1: sha1.to_string(),
            })
            .collect()
    });

    Ok(FingerprintReport {
        build_file: build_file.path().display().to_string(),
        fingerprint,
        base_images: deps.dependencies.into_iter().map(|d| d.reference).collect(),
        files,
    })
}
