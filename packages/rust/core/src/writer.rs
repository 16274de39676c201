//! Output Writer: replaces the artifacts subtree wholesale.
//!
//! The artifact set is fully computed before anything here runs. A failure
//! part-way through leaves the subtree incomplete; it is reported, not
//! rolled back.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use llmsforge_artifacts::{render_site_index, sha256_hex};
use llmsforge_shared::{Artifact, ArtifactKind, BuildConfig, LlmsForgeError, Result, WriteRecord};

/// What one publish put on disk.
#[derive(Debug, Clone)]
pub struct PublishResult {
    /// `<site_dir>/<ai_artifacts_path>`.
    pub artifacts_dir: PathBuf,
    /// Every file written, in write order; the site index is last.
    pub records: Vec<WriteRecord>,
    /// Target of the raw markdown copy, when it ran.
    pub raw_copy: Option<PathBuf>,
}

/// Replace `<site_dir>/<ai_artifacts_path>` with `artifacts`, then write the
/// site index from what was actually written.
#[instrument(skip_all, fields(site_dir = %site_dir.display(), artifacts = artifacts.len()))]
pub fn publish(config: &BuildConfig, site_dir: &Path, artifacts: &[Artifact]) -> Result<PublishResult> {
    let artifacts_dir = config.artifacts_dir(site_dir);

    if artifacts_dir.exists() {
        std::fs::remove_dir_all(&artifacts_dir)
            .map_err(|e| LlmsForgeError::io(&artifacts_dir, e))?;
        debug!(path = %artifacts_dir.display(), "removed previous artifacts");
    }
    std::fs::create_dir_all(&artifacts_dir).map_err(|e| LlmsForgeError::io(&artifacts_dir, e))?;

    let mut records = Vec::with_capacity(artifacts.len() + 1);
    for artifact in artifacts {
        records.push(write_artifact(&artifacts_dir, artifact.kind, &artifact.path, &artifact.content)?);
    }

    let index = render_site_index(config, &records)?;
    records.push(write_artifact(
        &artifacts_dir,
        ArtifactKind::SiteIndex,
        &config.outputs.files.site_index,
        &index,
    )?);

    let raw_copy = copy_raw_markdown(config, site_dir)?;

    info!(
        count = records.len(),
        path = %artifacts_dir.display(),
        "artifacts published"
    );

    Ok(PublishResult {
        artifacts_dir,
        records,
        raw_copy,
    })
}

/// Write one file via a temp file and rename, returning its record.
fn write_artifact(dir: &Path, kind: ArtifactKind, relative: &str, content: &str) -> Result<WriteRecord> {
    let target = dir.join(relative);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LlmsForgeError::io(parent, e))?;
    }

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| LlmsForgeError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| LlmsForgeError::io(&target, e))?;

    debug!(file = %relative, size = content.len(), "wrote artifact");

    Ok(WriteRecord {
        kind,
        path: relative.to_string(),
        bytes: content.len() as u64,
        sha256: sha256_hex(content),
    })
}

/// Copy `raw_copy.source_dir` to `<site_dir>/<raw_copy.target_dir>`.
///
/// A missing source directory skips only this step.
fn copy_raw_markdown(config: &BuildConfig, site_dir: &Path) -> Result<Option<PathBuf>> {
    let Some(raw) = &config.outputs.raw_copy else {
        return Ok(None);
    };

    let source = config.project_root.join(&raw.source_dir);
    let target = site_dir.join(&raw.target_dir);

    if !source.is_dir() {
        warn!(
            source = %source.display(),
            "raw copy source directory not found, skipping copy"
        );
        return Ok(None);
    }

    if target.exists() {
        std::fs::remove_dir_all(&target).map_err(|e| LlmsForgeError::io(&target, e))?;
    }

    let mut copied = 0usize;
    for entry in WalkDir::new(&source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source.clone());
            LlmsForgeError::Io {
                path,
                source: e.into(),
            }
        })?;
        let rel = entry.path().strip_prefix(&source).unwrap_or(entry.path());
        let dest = target.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| LlmsForgeError::io(&dest, e))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &dest).map_err(|e| LlmsForgeError::io(&dest, e))?;
            copied += 1;
        }
    }

    info!(
        source = %source.display(),
        target = %target.display(),
        files = copied,
        "copied raw markdown"
    );
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use llmsforge_shared::parse_config;

    use super::*;

    fn config(root: &Path, raw_copy: bool) -> BuildConfig {
        let raw = if raw_copy {
            r#", "outputs": { "raw_copy": { "source_dir": "docs", "target_dir": "raw" } }"#
        } else {
            ""
        };
        let json = format!(
            r#"{{ "schema_version": 1, "project": {{ "id": "acme", "name": "Acme" }}{raw} }}"#
        );
        parse_config(&json, root).unwrap()
    }

    #[test]
    fn publish_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        let config = config(dir.path(), false);

        let stale = site.join("ai/pages/old.md");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "stale").unwrap();
        std::fs::write(site.join("index.html"), "<html>").unwrap();

        let artifacts = vec![
            Artifact::new(ArtifactKind::Page, "pages/new.md", "new\n"),
            Artifact::new(ArtifactKind::Manifest, "llms.txt", "# Acme\n"),
        ];
        let result = publish(&config, &site, &artifacts).unwrap();

        assert!(!stale.exists());
        assert!(site.join("index.html").exists());
        assert_eq!(std::fs::read_to_string(site.join("ai/pages/new.md")).unwrap(), "new\n");

        let paths: Vec<&str> = result.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["pages/new.md", "llms.txt", "site-index.json"]);
        assert_eq!(result.records[0].bytes, 4);
        assert_eq!(result.records[0].sha256, sha256_hex("new\n"));
        assert!(site.join("ai/site-index.json").exists());
        assert!(!site.join("ai/pages/.new.md.tmp").exists());
    }

    #[test]
    fn missing_raw_copy_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        let config = config(dir.path(), true);

        let result = publish(&config, &site, &[]).unwrap();
        assert!(result.raw_copy.is_none());
        assert!(site.join("ai/site-index.json").exists());
    }

    #[test]
    fn raw_copy_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(docs.join("guide")).unwrap();
        std::fs::write(docs.join("guide/a.md"), "A").unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir_all(site.join("raw")).unwrap();
        std::fs::write(site.join("raw/stale.md"), "old").unwrap();

        let config = config(dir.path(), true);
        let result = publish(&config, &site, &[]).unwrap();

        assert_eq!(result.raw_copy, Some(site.join("raw")));
        assert_eq!(std::fs::read_to_string(site.join("raw/guide/a.md")).unwrap(), "A");
        assert!(!site.join("raw/stale.md").exists());
    }
}
