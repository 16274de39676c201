//! Artifact Builder for llmsforge.
//!
//! Turns resolved pages plus the category index into the in-memory artifact
//! set: one file per page, one bundle per non-empty category, the base
//! context bundle, the JSONL full corpus, and the `llms.txt` manifest. The
//! site index is rendered separately from the writer's realized records.

pub mod bundle;
pub mod corpus;
pub mod manifest;
pub mod page;
pub mod site_index;

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use llmsforge_shared::{
    Artifact, ArtifactKind, BuildConfig, Category, LlmsForgeError, Page, Result, category_slug,
};

pub use site_index::render_site_index;

/// Separator line placed between pages in a bundle.
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Relative artifact paths for one config.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactPaths<'a> {
    config: &'a BuildConfig,
}

impl<'a> ArtifactPaths<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    pub fn page(&self, slug: &str) -> String {
        format!("{}/{slug}.md", self.config.outputs.files.pages_dir)
    }

    pub fn bundle(&self, category: &str) -> String {
        format!(
            "{}/{}.md",
            self.config.outputs.files.categories_dir,
            category_slug(category)
        )
    }

    pub fn base_bundle(&self) -> String {
        format!(
            "{}/{}",
            self.config.outputs.files.categories_dir, self.config.outputs.files.base_bundle
        )
    }

    pub fn corpus(&self) -> String {
        self.config.outputs.files.llms_full.clone()
    }

    pub fn manifest(&self) -> String {
        self.config.outputs.files.manifest.clone()
    }

    pub fn site_index(&self) -> String {
        self.config.outputs.files.site_index.clone()
    }

    /// Public URL for a relative artifact path.
    pub fn url(&self, relative: &str) -> String {
        self.config.artifact_url(relative)
    }
}

/// Pages grouped by category, in configured order.
///
/// Empty categories are kept so callers can still report them.
#[derive(Debug)]
pub struct Grouped<'a> {
    pub groups: Vec<(&'a Category, Vec<&'a Page>)>,
}

impl<'a> Grouped<'a> {
    /// Join category member slugs to their pages.
    pub fn new(pages: &'a [Page], categories: &'a [Category]) -> Result<Self> {
        let by_slug: HashMap<&str, &Page> = pages.iter().map(|p| (p.slug.as_str(), p)).collect();

        let mut ordered: Vec<&Category> = categories.iter().collect();
        ordered.sort_by_key(|c| c.order_index);

        let mut groups = Vec::with_capacity(ordered.len());
        for category in ordered {
            let members = category
                .members
                .iter()
                .map(|slug| {
                    by_slug.get(slug.as_str()).copied().ok_or_else(|| {
                        LlmsForgeError::validation(format!(
                            "category '{}' lists unknown page slug '{slug}'",
                            category.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            groups.push((category, members));
        }
        Ok(Self { groups })
    }

    /// Non-empty categories only.
    pub fn non_empty(&self) -> impl Iterator<Item = &(&'a Category, Vec<&'a Page>)> {
        self.groups.iter().filter(|(_, pages)| !pages.is_empty())
    }

    /// Every page in corpus order: category order, then member order.
    pub fn corpus_order(&self) -> impl Iterator<Item = (&'a Category, &'a Page)> + '_ {
        self.groups
            .iter()
            .flat_map(|(category, pages)| pages.iter().map(move |page| (*category, *page)))
    }

    /// Pages of the base context categories, in configured order.
    pub fn base_context(&self, config: &BuildConfig) -> Vec<&'a Page> {
        self.groups
            .iter()
            .filter(|(category, _)| {
                config
                    .content
                    .base_context_categories
                    .iter()
                    .any(|name| name == &category.name)
            })
            .flat_map(|(_, pages)| pages.iter().copied())
            .collect()
    }
}

/// Build every artifact except the site index.
#[instrument(skip_all, fields(pages = pages.len(), categories = categories.len()))]
pub fn build_artifacts(
    config: &BuildConfig,
    pages: &[Page],
    categories: &[Category],
) -> Result<Vec<Artifact>> {
    let grouped = Grouped::new(pages, categories)?;
    let paths = ArtifactPaths::new(config);
    let mut artifacts = Vec::with_capacity(pages.len() + categories.len() + 3);

    for (_, page) in grouped.corpus_order() {
        artifacts.push(page::render_page(&paths, page)?);
    }

    for (category, members) in grouped.non_empty() {
        let content = bundle::render_bundle(
            &paths,
            &category.name,
            category.description.as_deref(),
            members,
        );
        artifacts.push(Artifact::new(
            ArtifactKind::CategoryBundle,
            paths.bundle(&category.name),
            content,
        ));
    }

    let base = grouped.base_context(config);
    if !base.is_empty() {
        let description = format!(
            "Foundational pages to load as default context ({}).",
            config.content.base_context_categories.join(", ")
        );
        let content = bundle::render_bundle(&paths, "Base Context", Some(&description), &base);
        artifacts.push(Artifact::new(
            ArtifactKind::CategoryBundle,
            paths.base_bundle(),
            content,
        ));
    }

    artifacts.push(Artifact::new(
        ArtifactKind::FullCorpus,
        paths.corpus(),
        corpus::render_corpus(&paths, &grouped)?,
    ));

    artifacts.push(Artifact::new(
        ArtifactKind::Manifest,
        paths.manifest(),
        manifest::render_manifest(config, &paths, &grouped, !base.is_empty()),
    ));

    debug!(count = artifacts.len(), "artifact set computed");
    info!(
        artifacts = artifacts.len(),
        bundles = grouped.non_empty().count(),
        "built artifacts"
    );
    Ok(artifacts)
}

/// Lowercase hex SHA-256 of a string.
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use llmsforge_shared::{BuildConfig, Category, FrontMatter, Page, parse_config};

    pub fn config() -> BuildConfig {
        let json = r#"{
            "schema_version": 1,
            "project": {
                "id": "acme",
                "name": "Acme",
                "docs_base_url": "https://docs.acme.dev"
            },
            "repository": { "host": "github.com", "org": "acme", "repo": "docs" },
            "content": {
                "categories_order": ["Basics", "Reference", "Tooling"],
                "base_context_categories": ["Basics"],
                "categories_info": {
                    "Basics": { "description": "Core concepts." }
                }
            }
        }"#;
        parse_config(json, Path::new("/project")).expect("config")
    }

    pub fn page(source_path: &str, slug: &str, category: &str, body: &str) -> Page {
        Page {
            source_path: source_path.into(),
            slug: slug.into(),
            category: category.into(),
            title: format!("Title {slug}"),
            description: Some(format!("About {slug}")),
            url: format!("https://docs.acme.dev/{slug}/"),
            raw_content: body.into(),
            front_matter: FrontMatter::default(),
            resolved_content: body.into(),
            word_count: body.split_whitespace().count(),
        }
    }

    pub fn category(name: &str, order_index: usize, members: &[&str]) -> Category {
        Category {
            name: name.into(),
            order_index,
            description: None,
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Two Basics pages, one Reference page, no Tooling pages.
    pub fn fixture() -> (BuildConfig, Vec<Page>, Vec<Category>) {
        let pages = vec![
            page("basics/accounts.md", "basics-accounts", "Basics", "Accounts body.\n"),
            page("basics/blocks.md", "basics-blocks", "Basics", "Blocks body.\n"),
            page("reference/api.md", "reference-api", "Reference", "API body.\n"),
        ];
        let mut basics = category("Basics", 0, &["basics-accounts", "basics-blocks"]);
        basics.description = Some("Core concepts.".into());
        let categories = vec![
            category("Tooling", 2, &[]),
            basics,
            category("Reference", 1, &["reference-api"]),
        ];
        (config(), pages, categories)
    }
}
