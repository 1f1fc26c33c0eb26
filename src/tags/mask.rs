//! Tag mask expansion
//!
//! A mask is a `|`-separated template such as `@app-version|-alpine|@os-version`.
//! Each segment becomes a token with one or more candidate strings, and the
//! mask expands to every combination of candidates.
//!
//! | Segment | Candidates |
//! |---------|------------|
//! | `text` | `["text"]` |
//! | `$name` | `[facts[name]]` (empty if unknown) |
//! | `@name` | version prefixes, `"3.20.1"` → `["3", "3.20", "3.20.1"]` |

use crate::facts::FactTable;

/// Segment separator inside a mask
pub const SEGMENT_SEPARATOR: char = '|';

/// Dot-separated version prefixes, shortest first.
///
/// An empty value yields a single empty prefix.
pub fn version_prefixes(value: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for part in value.split('.') {
        if !current.is_empty() {
            current.push('.');
        }
        current.push_str(part);
        prefixes.push(current.clone());
    }
    prefixes
}

/// One mask segment: its candidates and the one currently selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    candidates: Vec<String>,
    cursor: usize,
}

impl Token {
    fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            cursor: 0,
        }
    }

    fn parse(segment: &str, facts: &FactTable) -> Self {
        if let Some(name) = segment.strip_prefix('@') {
            Self::new(version_prefixes(facts.get(name).unwrap_or_default()))
        } else if let Some(name) = segment.strip_prefix('$') {
            Self::new(vec![facts.get(name).unwrap_or_default().to_string()])
        } else {
            Self::new(vec![segment.to_string()])
        }
    }

    /// Candidate strings, in expansion order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn current(&self) -> &str {
        &self.candidates[self.cursor]
    }

    fn can_advance(&self) -> bool {
        self.cursor + 1 < self.candidates.len()
    }
}

/// A parsed mask, positioned at one combination of candidates.
///
/// Expansion is a mixed-radix counter over the tokens. Advancing always
/// bumps the left-most token that still has candidates left, so the first
/// token cycles fastest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMask {
    tokens: Vec<Token>,
}

impl TagMask {
    /// Parse `mask`, resolving fact references against `facts`
    pub fn parse(mask: &str, facts: &FactTable) -> Self {
        let tokens = mask
            .split(SEGMENT_SEPARATOR)
            .map(|segment| Token::parse(segment, facts))
            .collect();
        Self { tokens }
    }

    /// Tokens in segment order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tags the mask expands to
    pub fn combinations(&self) -> usize {
        self.tokens.iter().map(|t| t.candidates.len()).product()
    }

    /// Tag for the current combination
    pub fn current(&self) -> String {
        self.tokens.iter().map(Token::current).collect()
    }

    /// Step to the next combination.
    ///
    /// Increments the first token that still has candidates left and resets
    /// every token before it. Returns false once all combinations are done.
    pub fn advance(&mut self) -> bool {
        let Some(index) = self.tokens.iter().position(Token::can_advance) else {
            return false;
        };
        for token in &mut self.tokens[..index] {
            token.cursor = 0;
        }
        self.tokens[index].cursor += 1;
        true
    }

    /// Feed every tag to `sink`, stopping at the first error
    pub fn expand<E, F>(mut self, mut sink: F) -> Result<(), E>
    where
        F: FnMut(&str) -> Result<(), E>,
    {
        loop {
            sink(&self.current())?;
            if !self.advance() {
                return Ok(());
            }
        }
    }

    /// Iterate over every tag
    pub fn into_tags(self) -> Tags {
        Tags {
            mask: self,
            done: false,
        }
    }
}

/// Iterator over the tags of a [`TagMask`]
#[derive(Debug)]
pub struct Tags {
    mask: TagMask,
    done: bool,
}

impl Iterator for Tags {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let tag = self.mask.current();
        self.done = !self.mask.advance();
        Some(tag)
    }
}

/// Expand `mask` against `facts`, delivering each tag to `sink`.
///
/// A sink error aborts expansion and is returned as is.
pub fn expand_tags<E, F>(mask: &str, facts: &FactTable, sink: F) -> Result<(), E>
where
    F: FnMut(&str) -> Result<(), E>,
{
    TagMask::parse(mask, facts).expand(sink)
}
