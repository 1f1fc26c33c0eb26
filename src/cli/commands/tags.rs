//! Tags command - dry-run expansion of a tag mask

use crate::cli::args::TagsArgs;
use crate::error::{SdbError, SdbResult};
use crate::facts::FactTable;
use crate::tags::expand_tags;
use std::io::Write;

/// Execute the tags command
pub async fn execute(args: TagsArgs) -> SdbResult<()> {
    let facts: FactTable = args.facts.into_iter().collect();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_tags(&args.mask, &facts, &mut out)
}

/// Write one tag per line; a write failure stops the expansion
fn write_tags<W: Write>(mask: &str, facts: &FactTable, out: &mut W) -> SdbResult<()> {
    expand_tags(mask, facts, |tag| writeln!(out, "{}", tag))
        .map_err(|e| SdbError::io("writing tags", e))
}
