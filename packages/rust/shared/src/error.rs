//! Error types for llmsforge.
//!
//! Library crates use [`LlmsForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for every stage of an artifact build.
///
/// Everything except [`LlmsForgeError::RemoteFetch`] under a degrading
/// severity aborts the build.
#[derive(Debug, thiserror::Error)]
pub enum LlmsForgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Front matter, variables file, or JSON parse error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A local snippet include could not be found in any base path.
    #[error("missing snippet '{identifier}' (included via {})", render_chain(.chain))]
    MissingSnippet {
        identifier: String,
        chain: Vec<String>,
    },

    /// A snippet include re-entered an identifier already on the active chain.
    #[error("cyclic snippet inclusion of '{identifier}': {}", render_chain(.chain))]
    CyclicSnippet {
        identifier: String,
        chain: Vec<String>,
    },

    /// A `{{ variable }}` token that the lookup schema cannot answer.
    #[error("unresolved variable '{{{{ {name} }}}}': {reason}")]
    UnresolvedVariable { name: String, reason: String },

    /// Remote snippet fetch failed (after the retry) or is disabled.
    #[error("remote fetch failed for {url}: {message}")]
    RemoteFetch { url: String, message: String },

    /// A page declares a category that is not in `categories_order`.
    #[error("unknown category '{category}' in {source_path} (not listed in categories_order)")]
    UnknownCategory {
        category: String,
        source_path: String,
    },

    /// A page has no category and no default category is configured.
    #[error("page {source_path} has no category and no default_category is configured")]
    Uncategorized { source_path: String },

    /// Two source pages map to the same slug.
    #[error("slug collision: '{slug}' is produced by both {first} and {second}")]
    SlugCollision {
        slug: String,
        first: String,
        second: String,
    },

    /// Data validation error (invalid front matter shape, bad output names, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A resolution failure attributed to the page that triggered it.
    #[error("{source_path}: {source}")]
    Page {
        source_path: String,
        #[source]
        source: Box<LlmsForgeError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LlmsForgeError>;

impl LlmsForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attribute this error to the page being resolved.
    ///
    /// Already-attributed errors are returned unchanged.
    pub fn in_page(self, source_path: impl Into<String>) -> Self {
        match self {
            Self::Page { .. } => self,
            other => Self::Page {
                source_path: source_path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through page attribution.
    pub fn root(&self) -> &LlmsForgeError {
        match self {
            Self::Page { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Render an inclusion chain as `page.md -> a.md -> b.md`.
pub fn render_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LlmsForgeError::config("project.name is required");
        assert_eq!(err.to_string(), "config error: project.name is required");

        let err = LlmsForgeError::validation("schema_version 99 not supported");
        assert!(err.to_string().contains("schema_version 99"));
    }

    #[test]
    fn cyclic_error_renders_full_chain() {
        let err = LlmsForgeError::CyclicSnippet {
            identifier: "a.md".into(),
            chain: vec!["guide.md".into(), "a.md".into(), "b.md".into(), "a.md".into()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic snippet inclusion of 'a.md': guide.md -> a.md -> b.md -> a.md"
        );
    }

    #[test]
    fn unresolved_variable_shows_token() {
        let err = LlmsForgeError::UnresolvedVariable {
            name: "project.nme".into(),
            reason: "unknown field".into(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved variable '{{ project.nme }}': unknown field"
        );
    }

    #[test]
    fn page_attribution_is_not_nested_twice() {
        let err = LlmsForgeError::parse("bad yaml")
            .in_page("guide/intro.md")
            .in_page("other.md");
        assert_eq!(err.to_string(), "guide/intro.md: parse error: bad yaml");
        assert!(matches!(err.root(), LlmsForgeError::Parse { .. }));
    }
}
