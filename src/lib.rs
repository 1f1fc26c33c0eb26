//! sdb - smart container image builds
//!
//! Skips rebuilding an image whose build context did not change, by tagging
//! every build with a fingerprint of its context, and derives further tags
//! from facts observed inside the built image.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod facts;
pub mod image;
pub mod orchestration;
pub mod tags;
pub mod ui;

pub use error::{SdbError, SdbResult};
