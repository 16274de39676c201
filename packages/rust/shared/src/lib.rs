//! Shared types, error model, and configuration for llmsforge.
//!
//! This crate is the foundation depended on by all other llmsforge crates.
//! It provides:
//! - [`LlmsForgeError`] — the unified error type
//! - Domain types ([`SourcePage`], [`Page`], [`Category`], [`Artifact`], [`WriteRecord`])
//! - Configuration ([`BuildConfig`], config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    BuildConfig, CONFIG_NAMESPACES, CURRENT_SCHEMA_VERSION, CategoryInfo, ConfigLookup,
    ContentConfig, DEFAULT_CONFIG_FILE, ExclusionsConfig, OutputFiles, OutputsConfig,
    ProjectConfig, RawCopyConfig, RemoteFailure, RepositoryConfig, SnippetsConfig,
    load_config_from, parse_config,
};
pub use error::{LlmsForgeError, Result, render_chain};
pub use types::{
    Artifact, ArtifactKind, Category, CategoryField, FrontMatter, Page, SourcePage, WriteRecord,
    category_slug,
};
