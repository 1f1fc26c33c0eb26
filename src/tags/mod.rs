//! Tag matrix generation from fact-driven masks

pub mod mask;

pub use mask::{expand_tags, version_prefixes, TagMask, Tags, Token};
