//! Strata - content-addressed role layer builds
//!
//! Fingerprints configuration roles together with their dependency
//! closure and keeps one image layer per fingerprint, found again through
//! an image label.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod orchestration;
pub mod role;
pub mod ui;

pub use error::{StrataError, StrataResult};
