//! Facts command - gather facts from an existing image

use crate::cli::args::FactsArgs;
use crate::config::{Config, ImageConfig};
use crate::error::{SdbError, SdbResult};
use crate::facts::{fact_defs, gather_facts, ContainerFacts};
use crate::orchestration::resolve_binary;
use console::style;

/// Execute the facts command
pub async fn execute(args: FactsArgs, config: &Config) -> SdbResult<()> {
    let image_config = match args.file {
        Some(ref path) => ImageConfig::load(path).await?,
        None => ImageConfig::default(),
    };

    let defs = fact_defs(&image_config.facts, config.facts.builtin && !args.no_builtin)?;
    if defs.is_empty() {
        return Err(SdbError::User(
            "No facts to gather: pass --file or enable the built-in facts".to_string(),
        ));
    }

    let binary = resolve_binary(&config.engine).await?;
    let source = ContainerFacts::new(binary, &args.image).with_timeout(config.facts.timeout());
    let gathered = gather_facts(&defs, &source).await;

    for (name, value) in gathered.facts.iter() {
        println!("{} = {}", name, value);
    }
    for (name, error) in &gathered.failures {
        eprintln!("{} {}: {}", style("Failed:").red(), name, error);
    }

    Ok(())
}
