//! Category bundles: every member page of a category in one file.

use llmsforge_shared::Page;

use crate::{ArtifactPaths, PAGE_SEPARATOR};

/// Render a bundle with a heading, optional description, page count, and
/// each page as a `## Page:` block separated by [`PAGE_SEPARATOR`].
pub fn render_bundle(
    paths: &ArtifactPaths<'_>,
    title: &str,
    description: Option<&str>,
    pages: &[&Page],
) -> String {
    let description = description
        .map(|d| format!("{}\n\n", d.trim()))
        .unwrap_or_default();
    let blocks: Vec<String> = pages.iter().map(|page| page_block(paths, page)).collect();

    format!(
        "# {title}\n\n{description}Pages: {}{PAGE_SEPARATOR}{}\n",
        pages.len(),
        blocks.join(PAGE_SEPARATOR)
    )
}

fn page_block(paths: &ArtifactPaths<'_>, page: &Page) -> String {
    format!(
        "## Page: {}\n\nSource: {}\nMarkdown: {}\n\n{}",
        page.title,
        page.url,
        paths.url(&paths.page(&page.slug)),
        page.resolved_content.trim_end()
    )
}
