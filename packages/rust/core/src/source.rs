//! Filesystem host: discovers source pages under `docs_dir`.

use std::path::Path;

use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};

use llmsforge_markdown::split_front_matter;
use llmsforge_shared::{BuildConfig, LlmsForgeError, Result, SourcePage};

use crate::categories::{has_skipped_prefix, is_excluded};

/// Pages found on disk plus the source paths excluded on the way.
#[derive(Debug, Default)]
pub struct DiscoveredPages {
    /// Pages sorted by source path.
    pub pages: Vec<SourcePage>,
    /// Excluded files, and pruned directories with a trailing `/`.
    pub excluded: Vec<String>,
}

/// `/`-separated path of `path` relative to `root`.
fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("mdx")
    )
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Walk `docs_dir`, apply exclusions, and load every remaining page.
///
/// Directories under a `skip_paths` prefix are pruned without descending.
/// Hidden entries (snippet folders such as `.snippets/`) are never pages.
#[instrument(skip_all, fields(docs_dir = %config.docs_dir().display()))]
pub fn discover_pages(config: &BuildConfig) -> Result<DiscoveredPages> {
    let root = config.docs_dir();
    let exclusions = &config.content.exclusions;

    let mut pruned: Vec<String> = Vec::new();
    let mut excluded: Vec<String> = Vec::new();
    let mut files = Vec::new();

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if is_hidden(entry) {
                return false;
            }
            if entry.depth() > 0 && entry.file_type().is_dir() {
                let rel = relative_path(&root, entry.path());
                if has_skipped_prefix(&rel, exclusions) {
                    pruned.push(format!("{rel}/"));
                    return false;
                }
            }
            true
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            LlmsForgeError::Io {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let rel = relative_path(&root, entry.path());
        if is_excluded(&rel, exclusions) {
            debug!(page = %rel, "excluded");
            excluded.push(rel);
            continue;
        }
        files.push((rel, entry.into_path()));
    }

    excluded.extend(pruned);
    excluded.sort();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut pages = Vec::with_capacity(files.len());
    for (rel, path) in files {
        let text = std::fs::read_to_string(&path).map_err(|e| LlmsForgeError::io(&path, e))?;
        let (front_matter, body) =
            split_front_matter(&text).map_err(|e| e.in_page(rel.as_str()))?;
        debug!(page = %rel, "discovered page");
        pages.push(SourcePage {
            source_path: rel,
            raw_content: body.to_string(),
            front_matter,
        });
    }

    info!(pages = pages.len(), excluded = excluded.len(), "discovered source pages");
    Ok(DiscoveredPages { pages, excluded })
}
