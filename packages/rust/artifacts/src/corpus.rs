//! The `llms-full.jsonl` full-corpus file: one JSON record per page.

use serde::Serialize;

use llmsforge_shared::{LlmsForgeError, Result};

use crate::{ArtifactPaths, Grouped, sha256_hex};

/// One line of the full corpus.
#[derive(Debug, Serialize)]
pub struct CorpusRecord<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    /// Public URL of the page artifact.
    pub url: String,
    /// Public URL of the rendered HTML page.
    pub page_url: &'a str,
    pub source_path: &'a str,
    pub word_count: usize,
    /// SHA-256 of `content`.
    pub sha256: String,
    pub content: &'a str,
}

/// Render all pages in corpus order, one record per line.
pub fn render_corpus(paths: &ArtifactPaths<'_>, grouped: &Grouped<'_>) -> Result<String> {
    let mut out = String::new();
    for (category, page) in grouped.corpus_order() {
        let record = CorpusRecord {
            slug: &page.slug,
            title: &page.title,
            description: page.description.as_deref(),
            category: &category.name,
            url: paths.url(&paths.page(&page.slug)),
            page_url: &page.url,
            source_path: &page.source_path,
            word_count: page.word_count,
            sha256: sha256_hex(&page.resolved_content),
            content: &page.resolved_content,
        };
        let line = serde_json::to_string(&record).map_err(|e| {
            LlmsForgeError::validation(format!("JSON serialization failed: {e}"))
        })?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture;

    #[test]
    fn records_follow_category_order() {
        let (config, pages, categories) = fixture();
        let grouped = Grouped::new(&pages, &categories).unwrap();
        let paths = ArtifactPaths::new(&config);

        let out = render_corpus(&paths, &grouped).unwrap();
        let records: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        let slugs: Vec<&str> = records.iter().map(|r| r["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["basics-accounts", "basics-blocks", "reference-api"]);

        let first = &records[0];
        assert_eq!(first["category"], "Basics");
        assert_eq!(first["url"], "https://docs.acme.dev/ai/pages/basics-accounts.md");
        assert_eq!(first["page_url"], "https://docs.acme.dev/basics-accounts/");
        assert_eq!(first["content"], "Accounts body.\n");
        assert_eq!(first["sha256"], sha256_hex("Accounts body.\n"));
        assert!(out.ends_with('\n'));
    }
}
