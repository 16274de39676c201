//! `site-index.json`: the list of artifacts actually written this build.

use serde::Serialize;

use llmsforge_shared::{ArtifactKind, BuildConfig, CURRENT_SCHEMA_VERSION, LlmsForgeError, Result, WriteRecord};

use crate::ArtifactPaths;

#[derive(Debug, Serialize)]
struct SiteIndex<'a> {
    schema_version: u32,
    project: &'a str,
    artifacts: Vec<IndexEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct IndexEntry<'a> {
    kind: ArtifactKind,
    path: &'a str,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<&'a str>,
}

/// Render the site index from realized write records.
///
/// Entries are sorted by path; the index lists itself last without size or
/// hash.
pub fn render_site_index(config: &BuildConfig, written: &[WriteRecord]) -> Result<String> {
    let paths = ArtifactPaths::new(config);
    let own_path = paths.site_index();

    let mut records: Vec<&WriteRecord> = written.iter().collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));

    let mut artifacts: Vec<IndexEntry<'_>> = records
        .into_iter()
        .map(|record| IndexEntry {
            kind: record.kind,
            path: &record.path,
            url: paths.url(&record.path),
            bytes: Some(record.bytes),
            sha256: Some(&record.sha256),
        })
        .collect();
    artifacts.push(IndexEntry {
        kind: ArtifactKind::SiteIndex,
        path: &own_path,
        url: paths.url(&own_path),
        bytes: None,
        sha256: None,
    });

    let index = SiteIndex {
        schema_version: CURRENT_SCHEMA_VERSION,
        project: &config.project.id,
        artifacts,
    };
    let mut json = serde_json::to_string_pretty(&index)
        .map_err(|e| LlmsForgeError::validation(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    Ok(json)
}
