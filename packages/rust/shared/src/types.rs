//! Core domain types for an artifact build.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// `categories` may be a single (optionally comma-separated) string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryField {
    One(String),
    Many(Vec<String>),
}

/// The front matter fields the pipeline reads. Other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Legacy alias for `description`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryField>,
}

impl FrontMatter {
    /// `description`, falling back to `summary`.
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.summary.as_deref())
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Distinct declared category names, in declaration order.
    pub fn category_names(&self) -> Vec<String> {
        let raw: Vec<&str> = match &self.categories {
            None => Vec::new(),
            Some(CategoryField::One(s)) => s.split(',').collect(),
            Some(CategoryField::Many(list)) => list.iter().map(String::as_str).collect(),
        };

        let mut names: Vec<String> = Vec::new();
        for name in raw.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// A page as supplied by the host, before resolution.
#[derive(Debug, Clone)]
pub struct SourcePage {
    /// Path relative to `docs_dir`, always `/`-separated.
    pub source_path: String,
    /// Markdown body with the front matter block removed.
    pub raw_content: String,
    pub front_matter: FrontMatter,
}

/// A classified, fully resolved page. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub source_path: String,
    pub slug: String,
    pub category: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Public URL of the rendered HTML page.
    pub url: String,
    #[serde(skip)]
    pub raw_content: String,
    #[serde(skip)]
    pub front_matter: FrontMatter,
    pub resolved_content: String,
    /// Words in the resolved body, code blocks excluded.
    pub word_count: usize,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A configured category and the slugs of its member pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    /// Position in `categories_order`.
    pub order_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Member slugs, ordered by source path.
    pub members: Vec<String>,
}

impl Category {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// What an artifact file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Page,
    CategoryBundle,
    FullCorpus,
    Manifest,
    SiteIndex,
}

/// One output file, held in memory until the writer publishes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Path relative to the artifacts directory, `/`-separated.
    pub path: String,
    pub content: String,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            content: content.into(),
        }
    }
}

/// What the writer actually put on disk for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteRecord {
    pub kind: ArtifactKind,
    /// Path relative to the artifacts directory, `/`-separated.
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

// ---------------------------------------------------------------------------
// Category slug
// ---------------------------------------------------------------------------

/// File-name slug for a category: `"Smart Contracts"` → `smart-contracts`.
pub fn category_slug(name: &str) -> String {
    static NON_WORD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
    static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

    let lowered = name.trim().to_lowercase();
    let s = NON_WORD_RE.replace_all(&lowered, "");
    let s = SPACE_RE.replace_all(&s, "-");
    let s = DASHES_RE.replace_all(&s, "-");
    let s = s.trim_matches('-');
    if s.is_empty() {
        "category".to_string()
    } else {
        s.to_string()
    }
}
