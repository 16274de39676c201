//! Front matter extraction and parsing.

use std::sync::LazyLock;

use regex::Regex;

use llmsforge_shared::{FrontMatter, LlmsForgeError, Result};

/// Split a source document into its front matter and body.
///
/// A document without a leading `---` block has empty front matter and the
/// whole text as body.
pub fn split_front_matter(source: &str) -> Result<(FrontMatter, &str)> {
    static FM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)").expect("valid regex"));

    let Some(caps) = FM_RE.captures(source) else {
        return Ok((FrontMatter::default(), source));
    };

    let yaml = caps.get(1).map_or("", |m| m.as_str());
    let body = &source[caps.get(0).map_or(0, |m| m.end())..];

    if yaml.trim().is_empty() {
        return Ok((FrontMatter::default(), body));
    }

    let front_matter: FrontMatter = serde_yaml::from_str(yaml)
        .map_err(|e| LlmsForgeError::parse(format!("invalid YAML front matter: {e}")))?;

    Ok((front_matter, body))
}
