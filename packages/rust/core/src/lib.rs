//! Core pipeline orchestration and domain logic for llmsforge.
//!
//! This crate ties together source discovery, snippet and placeholder
//! resolution, classification, and artifact publishing into one build
//! (`run_build`).

pub mod categories;
pub mod pipeline;
pub mod slug;
pub mod source;
pub mod writer;

pub use categories::{CategoryIndex, classify};
pub use pipeline::{
    BuildOptions, BuildReport, CheckReport, ProgressReporter, SilentProgress, build_from_pages,
    check, default_jobs, run_build,
};
pub use source::{DiscoveredPages, discover_pages};
pub use writer::{PublishResult, publish};
