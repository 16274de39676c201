//! Category Index: exclusion, classification, and member ordering.

use std::path::Path;

use tracing::{debug, info, instrument};

use llmsforge_shared::{
    BuildConfig, Category, ExclusionsConfig, LlmsForgeError, Page, Result, SourcePage,
};

/// Classified pages for one build.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    /// Every configured category in `categories_order`, empty ones included.
    pub categories: Vec<Category>,
    /// Source paths removed by exclusion rules, sorted.
    pub excluded: Vec<String>,
}

impl CategoryIndex {
    /// Look up a category by name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Categories that have at least one member.
    pub fn non_empty(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| !c.is_empty())
    }
}

/// True when a source path matches a basename or path-prefix exclusion.
///
/// Prefixes match whole path components: `drafts` excludes `drafts/a.md`
/// but not `drafts-old/a.md`.
pub fn is_excluded(source_path: &str, exclusions: &ExclusionsConfig) -> bool {
    let path = Path::new(source_path);

    let basename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    exclusions.skip_basenames.iter().any(|b| b == basename)
        || has_skipped_prefix(source_path, exclusions)
}

/// True when a path lies under one of the `skip_paths` prefixes.
pub fn has_skipped_prefix(path: &str, exclusions: &ExclusionsConfig) -> bool {
    let path = Path::new(path);
    exclusions
        .skip_paths
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .any(|prefix| path.starts_with(prefix))
}

/// Split host pages into those that proceed and the excluded source paths.
pub fn partition_excluded(
    pages: Vec<SourcePage>,
    config: &BuildConfig,
) -> (Vec<SourcePage>, Vec<String>) {
    let (excluded, kept): (Vec<SourcePage>, Vec<SourcePage>) = pages
        .into_iter()
        .partition(|p| is_excluded(&p.source_path, &config.content.exclusions));

    let mut excluded: Vec<String> = excluded.into_iter().map(|p| p.source_path).collect();
    excluded.sort();
    for path in &excluded {
        debug!(page = %path, "excluded");
    }
    (kept, excluded)
}

/// The single category a page belongs to.
///
/// Falls back to `default_category`; a name outside `categories_order` is
/// configuration drift and fails the build.
pub fn category_for(page: &SourcePage, config: &BuildConfig) -> Result<String> {
    let names = page.front_matter.category_names();
    let name = match names.as_slice() {
        [] => config
            .content
            .default_category
            .clone()
            .ok_or_else(|| LlmsForgeError::Uncategorized {
                source_path: page.source_path.clone(),
            })?,
        [one] => one.clone(),
        many => {
            return Err(LlmsForgeError::validation(format!(
                "page {} declares {} categories ({}); exactly one is allowed",
                page.source_path,
                many.len(),
                many.join(", ")
            )));
        }
    };

    if config.category_position(&name).is_none() {
        return Err(LlmsForgeError::UnknownCategory {
            category: name,
            source_path: page.source_path.clone(),
        });
    }
    Ok(name)
}

/// Group resolved pages into the configured categories.
///
/// Members are ordered by source path; categories keep configured order.
#[instrument(skip_all, fields(pages = pages.len()))]
pub fn classify(pages: &[Page], excluded: Vec<String>, config: &BuildConfig) -> Result<CategoryIndex> {
    let mut categories: Vec<Category> = config
        .content
        .categories_order
        .iter()
        .enumerate()
        .map(|(order_index, name)| Category {
            name: name.clone(),
            order_index,
            description: config.category_description(name).map(str::to_string),
            members: Vec::new(),
        })
        .collect();

    let mut sorted: Vec<&Page> = pages.iter().collect();
    sorted.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    for page in sorted {
        let position = config.category_position(&page.category).ok_or_else(|| {
            LlmsForgeError::UnknownCategory {
                category: page.category.clone(),
                source_path: page.source_path.clone(),
            }
        })?;
        categories[position].members.push(page.slug.clone());
    }

    let index = CategoryIndex {
        categories,
        excluded,
    };
    info!(
        categories = index.non_empty().count(),
        excluded = index.excluded.len(),
        "classified pages"
    );
    Ok(index)
}
