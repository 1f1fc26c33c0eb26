//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sdb - smart container image builds
///
/// Rebuilds an image only when its build context changed, then tags it
/// with versions observed inside the image.
#[derive(Parser, Debug)]
#[command(name = "sdb")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SDB_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an image if its fingerprint changed, then tag it
    Build(BuildArgs),

    /// Print the build context fingerprint
    Fingerprint(FingerprintArgs),

    /// Expand a tag mask against given facts (dry run)
    Tags(TagsArgs),

    /// Gather facts from an existing image
    Facts(FactsArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Build file (Dockerfile, Dockerfile.<image> or <image>.Dockerfile)
    pub build_file: PathBuf,

    /// Build even if an image with this fingerprint exists
    #[arg(short, long)]
    pub force: bool,

    /// Push the fingerprint tag and all generated tags
    #[arg(long)]
    pub push: bool,

    /// Skip the built-in facts (os-id, os-version, arch)
    #[arg(long)]
    pub no_builtin_facts: bool,
}

/// Arguments for the fingerprint command
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    /// Build file whose context is fingerprinted
    pub build_file: PathBuf,

    /// Also list the files and their digests
    #[arg(long)]
    pub files: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the tags command
#[derive(Parser, Debug)]
pub struct TagsArgs {
    /// Tag mask, e.g. `@app-version|-alpine|@os-version`
    pub mask: String,

    /// Fact value (NAME=VALUE), may be repeated
    #[arg(short, long = "fact", value_parser = parse_fact)]
    pub facts: Vec<(String, String)>,
}

/// Arguments for the facts command
#[derive(Parser, Debug)]
pub struct FactsArgs {
    /// Image reference to run the fact pipelines against
    pub image: String,

    /// Image config whose facts are gathered (`<image>.sdb.yaml`)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Skip the built-in facts
    #[arg(long)]
    pub no_builtin: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., engine.binary)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for machine-readable commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Parse a fact in NAME=VALUE format
fn parse_fact(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid NAME=VALUE format: no '=' found in '{s}'"))?;
    if name.is_empty() {
        return Err(format!("invalid NAME=VALUE format: empty name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
