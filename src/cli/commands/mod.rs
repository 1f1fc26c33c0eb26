//! CLI command implementations

pub mod build;
pub mod config;
pub mod facts;
pub mod fingerprint;
pub mod tags;

pub use build::execute as build;
pub use config::execute as config;
pub use facts::execute as facts;
pub use fingerprint::execute as fingerprint;
pub use tags::execute as tags;
