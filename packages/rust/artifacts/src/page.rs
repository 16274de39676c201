//! Per-page artifacts: a YAML header followed by the resolved body.

use serde::Serialize;

use llmsforge_shared::{Artifact, ArtifactKind, LlmsForgeError, Page, Result};

use crate::ArtifactPaths;

#[derive(Serialize)]
struct PageHeader<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    categories: [&'a str; 1],
    url: &'a str,
    word_count: usize,
}

/// Render `pages/<slug>.md` for one page.
pub fn render_page(paths: &ArtifactPaths<'_>, page: &Page) -> Result<Artifact> {
    let header = PageHeader {
        title: &page.title,
        description: page.description.as_deref(),
        categories: [page.category.as_str()],
        url: &page.url,
        word_count: page.word_count,
    };
    let yaml = serde_yaml::to_string(&header).map_err(|e| {
        LlmsForgeError::validation(format!("cannot render header for {}: {e}", page.source_path))
    })?;

    let content = format!("---\n{yaml}---\n\n{}", page.resolved_content);
    Ok(Artifact::new(ArtifactKind::Page, paths.page(&page.slug), content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config, page};

    #[test]
    fn page_artifact_has_header_and_body() {
        let config = config();
        let paths = ArtifactPaths::new(&config);
        let page = page("basics/accounts.md", "basics-accounts", "Basics", "# Accounts\n\nBody text.\n");

        let artifact = render_page(&paths, &page).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Page);
        assert_eq!(artifact.path, "pages/basics-accounts.md");
        let content = &artifact.content;
        assert!(content.starts_with("---\ntitle: Title basics-accounts\n"));
        assert!(content.contains("\ndescription: About basics-accounts\n"));
        assert!(content.contains("\ncategories:\n- Basics\n"));
        assert!(content.contains("\nword_count: 4\n"));
        assert!(content.ends_with("\n---\n\n# Accounts\n\nBody text.\n"));
    }

    #[test]
    fn description_is_omitted_when_absent() {
        let config = config();
        let paths = ArtifactPaths::new(&config);
        let mut page = page("a.md", "a", "Basics", "Body\n");
        page.description = None;

        let artifact = render_page(&paths, &page).unwrap();
        assert!(!artifact.content.contains("description:"));
    }
}
