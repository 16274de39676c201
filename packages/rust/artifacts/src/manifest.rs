//! The `llms.txt` manifest (llmstxt.org layout).
//!
//! ```text
//! # <project>
//!
//! > summary
//!
//! ## Metadata
//! ## Docs
//! ### <category>      (one per non-empty category)
//! ## Full Content
//! ```

use std::fmt::Write as _;

use llmsforge_shared::BuildConfig;

use crate::{ArtifactPaths, Grouped};

/// Render the manifest. `has_base_bundle` says whether the base context
/// bundle is part of this build.
pub fn render_manifest(
    config: &BuildConfig,
    paths: &ArtifactPaths<'_>,
    grouped: &Grouped<'_>,
    has_base_bundle: bool,
) -> String {
    let project = &config.project;
    let page_count = grouped.corpus_order().count();
    let category_count = grouped.non_empty().count();

    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", project.name);
    let _ = writeln!(
        out,
        "> Documentation for {} as plain Markdown for LLMs: per-page files, category bundles, and a full-corpus JSONL file.\n",
        project.name
    );

    out.push_str("## Metadata\n\n");
    let _ = writeln!(out, "- Documentation pages: {page_count}");
    let _ = writeln!(out, "- Categories: {category_count}");
    if let Some(url) = &project.project_url {
        let _ = writeln!(out, "- Project: {url}");
    }
    if let Some(url) = config.repository_url() {
        let _ = writeln!(out, "- Repository: {url}");
    }
    out.push('\n');

    out.push_str("## Docs\n");
    for (category, pages) in grouped.non_empty() {
        let _ = writeln!(out, "\n### {}\n", category.name);
        if let Some(description) = &category.description {
            let _ = writeln!(out, "{}\n", description.trim());
        }
        let _ = writeln!(
            out,
            "- [{} bundle]({}): all {} pages of this category in one file",
            link_text(&category.name),
            paths.url(&paths.bundle(&category.name)),
            pages.len()
        );
        for page in pages {
            let url = paths.url(&paths.page(&page.slug));
            let title = link_text(&page.title);
            match page.description.as_deref().map(one_line).filter(|d| !d.is_empty()) {
                Some(description) => {
                    let _ = writeln!(out, "- [{title}]({url}): {description}");
                }
                None => {
                    let _ = writeln!(out, "- [{title}]({url})");
                }
            }
        }
    }

    out.push_str("\n## Full Content\n\n");
    if has_base_bundle {
        let _ = writeln!(
            out,
            "- [Base context]({}): foundational pages to load first",
            paths.url(&paths.base_bundle())
        );
    }
    let _ = writeln!(
        out,
        "- [Full corpus]({}): every page with metadata, one JSON record per line",
        paths.url(&paths.corpus())
    );
    let _ = writeln!(
        out,
        "- [Site index]({}): every artifact written by this build",
        paths.url(&paths.site_index())
    );
    out
}

/// Collapse every whitespace run, newlines included, to one space.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Single-line link text with `\`, `[`, and `]` escaped.
fn link_text(text: &str) -> String {
    let mut out = String::new();
    for c in one_line(text).chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
