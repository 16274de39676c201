//! Build configuration for llmsforge.
//!
//! The project config lives in `llms_config.json` at the project root.
//! It is parsed once per build, validated, and then only read.
//! Relative paths inside it resolve against the directory holding the file.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LlmsForgeError, Result};
use crate::types::category_slug;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "llms_config.json";

/// Config schema version understood by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Config structs (matching llms_config.json schema)
// ---------------------------------------------------------------------------

/// Top-level build config, deserialized from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Schema version for forward compatibility.
    pub schema_version: u32,

    /// `project` section.
    #[serde(default)]
    pub project: ProjectConfig,

    /// `repository` section.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// `content` section.
    #[serde(default)]
    pub content: ContentConfig,

    /// `outputs` section.
    #[serde(default)]
    pub outputs: OutputsConfig,

    /// `snippets` section.
    #[serde(default)]
    pub snippets: SnippetsConfig,

    /// Directory containing the config file. Set by the loader.
    #[serde(skip)]
    pub project_root: PathBuf,
}

/// `project` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Short machine identifier (required).
    #[serde(default)]
    pub id: String,
    /// Human-readable project name (required).
    #[serde(default)]
    pub name: String,
    /// Project homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    /// Base URL of the published documentation site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_base_url: Option<String>,
}

/// `repository` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_path: Option<String>,
    /// Artifacts subtree under the site directory.
    #[serde(default = "default_ai_artifacts_path")]
    pub ai_artifacts_path: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            host: None,
            org: None,
            repo: None,
            default_branch: None,
            docs_path: None,
            ai_artifacts_path: default_ai_artifacts_path(),
        }
    }
}

fn default_ai_artifacts_path() -> String {
    "ai".into()
}

/// `content` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Documentation source directory, relative to the project root.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Optional YAML variables file inside `docs_dir`.
    #[serde(default = "default_variables_file")]
    pub variables_file: String,

    /// Categories merged into the base context bundle.
    #[serde(default)]
    pub base_context_categories: Vec<String>,

    /// Canonical category order; also the closed set of valid categories.
    #[serde(default)]
    pub categories_order: Vec<String>,

    /// Per-category metadata keyed by category name.
    #[serde(default)]
    pub categories_info: BTreeMap<String, CategoryInfo>,

    /// Category for pages whose front matter names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_category: Option<String>,

    /// Pages excluded from every artifact.
    #[serde(default)]
    pub exclusions: ExclusionsConfig,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            variables_file: default_variables_file(),
            base_context_categories: Vec::new(),
            categories_order: Vec::new(),
            categories_info: BTreeMap::new(),
            default_category: None,
            exclusions: ExclusionsConfig::default(),
        }
    }
}

fn default_docs_dir() -> String {
    "docs".into()
}
fn default_variables_file() -> String {
    "variables.yml".into()
}

/// `categories_info.<name>` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `content.exclusions` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionsConfig {
    /// File names (e.g. `README.md`) skipped wherever they appear.
    #[serde(default)]
    pub skip_basenames: Vec<String>,
    /// Source-path prefixes (relative to `docs_dir`) skipped wholesale.
    #[serde(default)]
    pub skip_paths: Vec<String>,
}

/// `outputs` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    /// URL prefix under which the artifacts subtree is served.
    #[serde(default = "default_public_root")]
    pub public_root: String,

    /// Artifact file names.
    #[serde(default)]
    pub files: OutputFiles,

    /// Optional copy of raw markdown sources into the site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_copy: Option<RawCopyConfig>,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            public_root: default_public_root(),
            files: OutputFiles::default(),
            raw_copy: None,
        }
    }
}

fn default_public_root() -> String {
    "/ai/".into()
}

/// `outputs.files` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFiles {
    #[serde(default = "default_llms_full")]
    pub llms_full: String,
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,
    #[serde(default = "default_site_index")]
    pub site_index: String,
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default = "default_categories_dir")]
    pub categories_dir: String,
    #[serde(default = "default_base_bundle")]
    pub base_bundle: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            llms_full: default_llms_full(),
            pages_dir: default_pages_dir(),
            site_index: default_site_index(),
            manifest: default_manifest(),
            categories_dir: default_categories_dir(),
            base_bundle: default_base_bundle(),
        }
    }
}

fn default_llms_full() -> String {
    "llms-full.jsonl".into()
}
fn default_pages_dir() -> String {
    "pages".into()
}
fn default_site_index() -> String {
    "site-index.json".into()
}
fn default_manifest() -> String {
    "llms.txt".into()
}
fn default_categories_dir() -> String {
    "categories".into()
}
fn default_base_bundle() -> String {
    "base-context.md".into()
}

/// `outputs.raw_copy` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCopyConfig {
    /// Source directory, relative to the project root.
    pub source_dir: String,
    /// Target directory, relative to the site directory.
    pub target_dir: String,
}

/// `snippets` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetsConfig {
    /// Whether `http(s)://` snippet identifiers may be fetched.
    #[serde(default)]
    pub allow_remote: bool,

    /// Directories searched, in order, for local snippet identifiers.
    /// Empty means `[docs_dir]`.
    #[serde(default)]
    pub base_paths: Vec<String>,

    /// Per-request timeout for remote snippets.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// What a failed remote fetch does to the build.
    #[serde(default)]
    pub remote_failure: RemoteFailure,
}

impl Default for SnippetsConfig {
    fn default() -> Self {
        Self {
            allow_remote: false,
            base_paths: Vec::new(),
            timeout_secs: default_timeout_secs(),
            remote_failure: RemoteFailure::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Severity of a remote snippet fetch failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteFailure {
    /// Abort the build.
    #[default]
    Error,
    /// Log a warning and splice a visible "unavailable" line instead.
    Placeholder,
}

// ---------------------------------------------------------------------------
// Typed variable lookup
// ---------------------------------------------------------------------------

/// Namespaces answered by [`BuildConfig::lookup`].
pub const CONFIG_NAMESPACES: &[&str] = &["project", "repository", "content", "outputs"];

/// Outcome of a typed config lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLookup {
    /// The field exists and has a value.
    Value(String),
    /// The field exists but is unset in this config.
    Unset,
    /// The namespace is known but the field is not part of the schema.
    UnknownField,
    /// The first segment is not a config namespace.
    NotConfig,
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl BuildConfig {
    /// Absolute documentation source directory.
    pub fn docs_dir(&self) -> PathBuf {
        self.project_root.join(&self.content.docs_dir)
    }

    /// Path of the optional variables file.
    pub fn variables_path(&self) -> PathBuf {
        self.docs_dir().join(&self.content.variables_file)
    }

    /// Directories searched for local snippets, in order.
    pub fn snippet_base_paths(&self) -> Vec<PathBuf> {
        if self.snippets.base_paths.is_empty() {
            return vec![self.docs_dir()];
        }
        self.snippets
            .base_paths
            .iter()
            .map(|p| self.project_root.join(p))
            .collect()
    }

    /// The artifacts subtree for a given site directory.
    pub fn artifacts_dir(&self, site_dir: &Path) -> PathBuf {
        site_dir.join(&self.repository.ai_artifacts_path)
    }

    /// Position of a category in `categories_order`.
    pub fn category_position(&self, name: &str) -> Option<usize> {
        self.content.categories_order.iter().position(|c| c == name)
    }

    /// Configured description for a category, if any.
    pub fn category_description(&self, name: &str) -> Option<&str> {
        self.content
            .categories_info
            .get(name)
            .and_then(|info| info.description.as_deref())
    }

    /// `https://<host>/<org>/<repo>` when all three are configured.
    pub fn repository_url(&self) -> Option<String> {
        let repo = &self.repository;
        match (&repo.host, &repo.org, &repo.repo) {
            (Some(host), Some(org), Some(name)) => Some(format!(
                "https://{}/{org}/{name}",
                host.trim_end_matches('/')
            )),
            _ => None,
        }
    }

    /// Public URL of an artifact given its path relative to the artifacts dir.
    pub fn artifact_url(&self, relative: &str) -> String {
        let root = self.outputs.public_root.trim_matches('/');
        let path = if root.is_empty() {
            format!("/{relative}")
        } else {
            format!("/{root}/{relative}")
        };
        self.site_url(&path)
    }

    /// Public URL of a rendered documentation page given its route.
    pub fn page_url(&self, route: &str) -> String {
        let route = route.trim_matches('/');
        if route.is_empty() {
            self.site_url("/")
        } else {
            self.site_url(&format!("/{route}/"))
        }
    }

    /// Prefix a root-relative path with `docs_base_url` when configured.
    fn site_url(&self, path: &str) -> String {
        match self.project.docs_base_url.as_deref() {
            Some(base) => format!("{}{path}", base.trim_end_matches('/')),
            None => path.to_string(),
        }
    }

    /// Look up a dotted config path such as `project.name`.
    ///
    /// The schema is closed: only the fields listed here are addressable.
    pub fn lookup(&self, path: &str) -> ConfigLookup {
        let mut parts = path.splitn(2, '.');
        let namespace = parts.next().unwrap_or_default();
        let field = parts.next().unwrap_or_default();
        if !CONFIG_NAMESPACES.contains(&namespace) {
            return ConfigLookup::NotConfig;
        }

        let value: Option<Option<String>> = match namespace {
            "project" => match field {
                "id" => Some(Some(self.project.id.clone())),
                "name" => Some(Some(self.project.name.clone())),
                "project_url" => Some(self.project.project_url.clone()),
                "docs_base_url" => Some(self.project.docs_base_url.clone()),
                _ => None,
            },
            "repository" => match field {
                "host" => Some(self.repository.host.clone()),
                "org" => Some(self.repository.org.clone()),
                "repo" => Some(self.repository.repo.clone()),
                "default_branch" => Some(self.repository.default_branch.clone()),
                "docs_path" => Some(self.repository.docs_path.clone()),
                "ai_artifacts_path" => Some(Some(self.repository.ai_artifacts_path.clone())),
                "url" => Some(self.repository_url()),
                _ => None,
            },
            "content" => match field {
                "docs_dir" => Some(Some(self.content.docs_dir.clone())),
                _ => None,
            },
            "outputs" => match field {
                "public_root" => Some(Some(self.outputs.public_root.clone())),
                "files.llms_full" => Some(Some(self.outputs.files.llms_full.clone())),
                "files.pages_dir" => Some(Some(self.outputs.files.pages_dir.clone())),
                "files.manifest" => Some(Some(self.outputs.files.manifest.clone())),
                "files.site_index" => Some(Some(self.outputs.files.site_index.clone())),
                _ => None,
            },
            _ => None,
        };

        match value {
            Some(Some(v)) => ConfigLookup::Value(v),
            Some(None) => ConfigLookup::Unset,
            None => ConfigLookup::UnknownField,
        }
    }

    /// Check every invariant the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != CURRENT_SCHEMA_VERSION {
            return Err(LlmsForgeError::config(format!(
                "unsupported schema_version: {} (expected {CURRENT_SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        if self.project.id.trim().is_empty() {
            return Err(LlmsForgeError::config("project.id is required"));
        }
        if self.project.name.trim().is_empty() {
            return Err(LlmsForgeError::config("project.name is required"));
        }
        for (field, value) in [
            ("project.project_url", &self.project.project_url),
            ("project.docs_base_url", &self.project.docs_base_url),
        ] {
            if let Some(raw) = value {
                Url::parse(raw).map_err(|e| {
                    LlmsForgeError::config(format!("{field} is not a valid URL ({raw}): {e}"))
                })?;
            }
        }

        let docs_dir = self.docs_dir();
        if !docs_dir.is_dir() {
            return Err(LlmsForgeError::config(format!(
                "content.docs_dir does not exist: {}",
                docs_dir.display()
            )));
        }
        for base in self.snippet_base_paths() {
            if !base.is_dir() {
                return Err(LlmsForgeError::config(format!(
                    "snippets.base_paths entry does not exist: {}",
                    base.display()
                )));
            }
        }

        self.validate_categories()?;
        self.validate_outputs()
    }

    fn validate_categories(&self) -> Result<()> {
        let content = &self.content;
        let mut seen = HashSet::new();
        let mut bundle_names = HashSet::new();
        let base_bundle = self.outputs.files.base_bundle.as_str();

        for name in &content.categories_order {
            if name.trim().is_empty() {
                return Err(LlmsForgeError::config("categories_order contains an empty name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(LlmsForgeError::config(format!(
                    "category '{name}' is listed twice in categories_order"
                )));
            }
            let file = format!("{}.md", category_slug(name));
            if file == base_bundle {
                return Err(LlmsForgeError::config(format!(
                    "category '{name}' would overwrite the base bundle {base_bundle}"
                )));
            }
            if !bundle_names.insert(file.clone()) {
                return Err(LlmsForgeError::config(format!(
                    "category '{name}' shares bundle file {file} with another category"
                )));
            }
        }

        let referenced = content
            .base_context_categories
            .iter()
            .map(|c| ("base_context_categories", c))
            .chain(content.categories_info.keys().map(|c| ("categories_info", c)))
            .chain(content.default_category.iter().map(|c| ("default_category", c)));
        for (field, name) in referenced {
            if !seen.contains(name.as_str()) {
                return Err(LlmsForgeError::config(format!(
                    "{field} references '{name}', which is not in categories_order"
                )));
            }
        }
        Ok(())
    }

    fn validate_outputs(&self) -> Result<()> {
        let files = &self.outputs.files;
        for (field, value) in [
            ("repository.ai_artifacts_path", &self.repository.ai_artifacts_path),
            ("outputs.files.llms_full", &files.llms_full),
            ("outputs.files.pages_dir", &files.pages_dir),
            ("outputs.files.site_index", &files.site_index),
            ("outputs.files.manifest", &files.manifest),
            ("outputs.files.categories_dir", &files.categories_dir),
            ("outputs.files.base_bundle", &files.base_bundle),
        ] {
            if !is_plain_relative(value) {
                return Err(LlmsForgeError::config(format!(
                    "{field} must be a non-empty relative path without '..' ({value:?})"
                )));
            }
        }

        let top_level = [
            &files.llms_full,
            &files.pages_dir,
            &files.site_index,
            &files.manifest,
            &files.categories_dir,
        ];
        let unique: HashSet<_> = top_level.iter().map(|p| normal_components(p)).collect();
        if unique.len() != top_level.len() {
            return Err(LlmsForgeError::config(
                "outputs.files entries must all name different paths",
            ));
        }

        if let Some(raw) = &self.outputs.raw_copy {
            if !is_plain_relative(&raw.target_dir) {
                return Err(LlmsForgeError::config(format!(
                    "outputs.raw_copy.target_dir must be a relative path ({:?})",
                    raw.target_dir
                )));
            }
            let target = normal_components(&raw.target_dir);
            let artifacts = normal_components(&self.repository.ai_artifacts_path);
            if target.starts_with(&artifacts) || artifacts.starts_with(&target) {
                return Err(LlmsForgeError::config(
                    "outputs.raw_copy.target_dir must not overlap the artifacts directory",
                ));
            }
        }
        Ok(())
    }
}

/// True for a relative path made only of normal components, at least one.
///
/// `.`, `./ai`, and `ai/../ai` are rejected.
fn is_plain_relative(value: &str) -> bool {
    let mut components = Path::new(value).components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Path components as strings; `ai`, `ai/`, and `ai//` compare equal.
fn normal_components(value: &str) -> Vec<String> {
    Path::new(value)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Parse a config document without touching the filesystem.
pub fn parse_config(json: &str, project_root: &Path) -> Result<BuildConfig> {
    let mut config: BuildConfig = serde_json::from_str(json)
        .map_err(|e| LlmsForgeError::config(format!("invalid config JSON: {e}")))?;
    config.project_root = project_root.to_path_buf();
    Ok(config)
}

/// Load and validate the build config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<BuildConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LlmsForgeError::config(format!("cannot read config {}: {e}", path.display()))
    })?;

    let root = path
        .parent()
        .map(Path::to_path_buf)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = parse_config(&content, &root).map_err(|e| match e {
        LlmsForgeError::Config { message } => {
            LlmsForgeError::config(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;
    config.validate()?;

    tracing::debug!(
        path = %path.display(),
        project = %config.project.name,
        categories = config.content.categories_order.len(),
        "loaded build config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "content": { "categories_order": ["Basics", "Reference"] }
        }"#
    }

    fn project_with_docs() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("docs")).expect("docs dir");
        dir
    }

    #[test]
    fn defaults_are_explicit() {
        let config = parse_config(minimal_json(), Path::new("/tmp/project")).expect("parse");
        assert_eq!(config.repository.ai_artifacts_path, "ai");
        assert_eq!(config.outputs.public_root, "/ai/");
        assert_eq!(config.outputs.files.llms_full, "llms-full.jsonl");
        assert_eq!(config.outputs.files.pages_dir, "pages");
        assert_eq!(config.outputs.files.manifest, "llms.txt");
        assert_eq!(config.outputs.files.site_index, "site-index.json");
        assert_eq!(config.content.docs_dir, "docs");
        assert!(!config.snippets.allow_remote);
        assert_eq!(config.snippets.remote_failure, RemoteFailure::Error);
        assert_eq!(
            config.snippet_base_paths(),
            vec![PathBuf::from("/tmp/project/docs")]
        );
    }

    #[test]
    fn validate_accepts_minimal_project() {
        let dir = project_with_docs();
        let config = parse_config(minimal_json(), dir.path()).expect("parse");
        config.validate().expect("valid");
    }

    #[test]
    fn missing_project_name_is_fatal() {
        let dir = project_with_docs();
        let json = r#"{ "schema_version": 1, "project": { "id": "acme" } }"#;
        let config = parse_config(json, dir.path()).expect("parse");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("project.name is required"));
    }

    #[test]
    fn missing_docs_dir_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = parse_config(minimal_json(), dir.path()).expect("parse");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LlmsForgeError::Config { .. }));
        assert!(err.to_string().contains("docs_dir does not exist"));
    }

    #[test]
    fn unsupported_schema_version_is_fatal() {
        let dir = project_with_docs();
        let json = r#"{ "schema_version": 7, "project": { "id": "a", "name": "A" } }"#;
        let config = parse_config(json, dir.path()).expect("parse");
        assert!(config.validate().unwrap_err().to_string().contains("schema_version"));
    }

    #[test]
    fn base_category_must_be_ordered() {
        let dir = project_with_docs();
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "content": {
                "categories_order": ["Basics"],
                "base_context_categories": ["Tooling"]
            }
        }"#;
        let config = parse_config(json, dir.path()).expect("parse");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_context_categories references 'Tooling'"));
    }

    #[test]
    fn raw_copy_may_not_overlap_artifacts() {
        let dir = project_with_docs();
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "outputs": { "raw_copy": { "source_dir": "docs", "target_dir": "ai/raw" } }
        }"#;
        let config = parse_config(json, dir.path()).expect("parse");
        assert!(config.validate().unwrap_err().to_string().contains("overlap"));
    }

    #[test]
    fn output_names_must_stay_inside_tree() {
        let dir = project_with_docs();
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "outputs": { "files": { "llms_full": "../escape.jsonl" } }
        }"#;
        let config = parse_config(json, dir.path()).expect("parse");
        assert!(config.validate().unwrap_err().to_string().contains("llms_full"));
    }

    fn validate_json(json: &str) -> Result<()> {
        let dir = project_with_docs();
        parse_config(json, dir.path()).expect("parse").validate()
    }

    fn config_message(result: Result<()>) -> String {
        match result {
            Err(LlmsForgeError::Config { message }) => message,
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    fn with_raw_copy_target(target: &str) -> String {
        format!(
            r#"{{
                "schema_version": 1,
                "project": {{ "id": "acme", "name": "Acme" }},
                "outputs": {{ "raw_copy": {{ "source_dir": "docs", "target_dir": "{target}" }} }}
            }}"#
        )
    }

    #[test]
    fn raw_copy_target_rejects_dot_forms_of_artifacts_dir() {
        for target in ["./ai", ".", "ai/../ai"] {
            let message = config_message(validate_json(&with_raw_copy_target(target)));
            assert!(message.contains("raw_copy.target_dir"), "{target}: {message}");
        }
        let message = config_message(validate_json(&with_raw_copy_target("ai/")));
        assert!(message.contains("overlap"), "{message}");

        validate_json(&with_raw_copy_target("raw")).expect("separate target is fine");
    }

    #[test]
    fn artifacts_path_must_name_a_subdirectory() {
        for path in [".", "./", "ai/.."] {
            let json = format!(
                r#"{{
                    "schema_version": 1,
                    "project": {{ "id": "acme", "name": "Acme" }},
                    "repository": {{ "ai_artifacts_path": "{path}" }}
                }}"#
            );
            let message = config_message(validate_json(&json));
            assert!(message.contains("ai_artifacts_path"), "{path}: {message}");
        }
    }

    #[test]
    fn duplicate_category_is_fatal() {
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "content": { "categories_order": ["Basics", "Reference", "Basics"] }
        }"#;
        let message = config_message(validate_json(json));
        assert!(message.contains("'Basics' is listed twice"), "{message}");
    }

    #[test]
    fn categories_sharing_a_bundle_file_are_fatal() {
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "content": { "categories_order": ["Tools & SDKs", "Tools SDKs"] }
        }"#;
        let message = config_message(validate_json(json));
        assert!(message.contains("shares bundle file tools-sdks.md"), "{message}");
    }

    #[test]
    fn category_may_not_shadow_base_bundle() {
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "content": { "categories_order": ["Base Context"] }
        }"#;
        let message = config_message(validate_json(json));
        assert!(message.contains("would overwrite the base bundle base-context.md"), "{message}");
    }

    #[test]
    fn invalid_urls_are_fatal() {
        for field in ["project_url", "docs_base_url"] {
            let json = format!(
                r#"{{
                    "schema_version": 1,
                    "project": {{ "id": "acme", "name": "Acme", "{field}": "not a url" }}
                }}"#
            );
            let message = config_message(validate_json(&json));
            assert!(message.contains(&format!("project.{field} is not a valid URL")), "{message}");
        }
    }

    #[test]
    fn missing_snippet_base_path_is_fatal() {
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "snippets": { "base_paths": ["docs", "shared/snippets"] }
        }"#;
        let message = config_message(validate_json(json));
        assert!(message.contains("snippets.base_paths entry does not exist"), "{message}");
    }

    #[test]
    fn output_files_must_differ() {
        let json = r#"{
            "schema_version": 1,
            "project": { "id": "acme", "name": "Acme" },
            "outputs": { "files": { "llms_full": "llms.txt", "manifest": "llms.txt/" } }
        }"#;
        let message = config_message(validate_json(json));
        assert!(message.contains("must all name different paths"), "{message}");
    }

    #[test]
    fn every_namespace_is_closed() {
        let config = parse_config(minimal_json(), Path::new(".")).expect("parse");
        for namespace in CONFIG_NAMESPACES {
            assert_eq!(
                config.lookup(&format!("{namespace}.no_such_field")),
                ConfigLookup::UnknownField
            );
        }
        assert_eq!(config.lookup("snippets.allow_remote"), ConfigLookup::NotConfig);
    }

    #[test]
    fn lookup_is_closed() {
        let mut config = parse_config(minimal_json(), Path::new(".")).expect("parse");
        assert_eq!(config.lookup("project.name"), ConfigLookup::Value("Acme".into()));
        assert_eq!(config.lookup("project.docs_base_url"), ConfigLookup::Unset);
        assert_eq!(config.lookup("project.nickname"), ConfigLookup::UnknownField);
        assert_eq!(config.lookup("dependencies.sdk"), ConfigLookup::NotConfig);

        config.repository.host = Some("github.com".into());
        config.repository.org = Some("acme".into());
        config.repository.repo = Some("docs".into());
        assert_eq!(
            config.lookup("repository.url"),
            ConfigLookup::Value("https://github.com/acme/docs".into())
        );
    }

    #[test]
    fn urls_join_base_and_public_root() {
        let mut config = parse_config(minimal_json(), Path::new(".")).expect("parse");
        assert_eq!(config.artifact_url("llms.txt"), "/ai/llms.txt");
        assert_eq!(config.page_url("guide/intro"), "/guide/intro/");

        config.project.docs_base_url = Some("https://docs.acme.dev/".into());
        assert_eq!(
            config.artifact_url("pages/guide-intro.md"),
            "https://docs.acme.dev/ai/pages/guide-intro.md"
        );
        assert_eq!(config.page_url(""), "https://docs.acme.dev/");
    }

    #[test]
    fn load_from_file_sets_project_root() {
        let dir = project_with_docs();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, minimal_json()).expect("write config");
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.project_root, dir.path());
        assert_eq!(config.docs_dir(), dir.path().join("docs"));
    }
}
