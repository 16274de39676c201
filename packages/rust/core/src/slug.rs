//! Slugs, routes, and fallback titles derived from source paths.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use llmsforge_shared::{LlmsForgeError, Result};

/// Path segments without the extension and without a trailing `index`.
fn route_segments(source_path: &str) -> Vec<&str> {
    let trimmed = source_path.trim_matches('/');
    let mut segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(last) = segments.pop() {
        let stem = match last.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => last,
        };
        if stem != "index" {
            segments.push(stem);
        }
    }
    segments
}

/// Deterministic, URL-safe slug for a source path.
///
/// `guides/intro/index.md` → `guides-intro`, `index.md` → `index`.
pub fn slugify_path(source_path: &str) -> String {
    static UNSAFE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));
    static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

    let joined = route_segments(source_path).join("-");
    let safe = UNSAFE_RE.replace_all(&joined, "-");
    let collapsed = DASHES_RE.replace_all(&safe, "-");
    let slug = collapsed.trim_matches('-');

    if slug.is_empty() {
        "index".to_string()
    } else {
        slug.to_string()
    }
}

/// Route of the rendered HTML page: `guides/intro/index.md` → `guides/intro`.
pub fn page_route(source_path: &str) -> String {
    route_segments(source_path).join("/")
}

/// Human-readable title from a source path, used when neither front matter
/// nor an H1 provides one.
pub fn title_from_path(source_path: &str) -> String {
    let segments = route_segments(source_path);
    let Some(segment) = segments.last() else {
        return "Overview".to_string();
    };

    segment
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.collect::<String>())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Slug every source path, failing on the first collision.
///
/// Returns `(source_path, slug)` pairs in input order.
pub fn assign_slugs<'a>(source_paths: impl IntoIterator<Item = &'a str>) -> Result<Vec<(&'a str, String)>> {
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    let mut assigned = Vec::new();

    for path in source_paths {
        let slug = slugify_path(path);
        if let Some(existing) = owners.get(&slug) {
            let (first, second) = if *existing <= path {
                (*existing, path)
            } else {
                (path, *existing)
            };
            return Err(LlmsForgeError::SlugCollision {
                slug,
                first: first.to_string(),
                second: second.to_string(),
            });
        }
        owners.insert(slug.clone(), path);
        assigned.push((path, slug));
    }
    Ok(assigned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
