//! End-to-end build: discover → exclude → resolve → classify → build → publish.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument};

use llmsforge_markdown::{Resolver, count_words, extract_title};
use llmsforge_shared::{BuildConfig, Category, LlmsForgeError, Page, Result, SourcePage, WriteRecord};

use crate::categories::{self, CategoryIndex};
use crate::slug;
use crate::source;
use crate::writer;

/// Options for one build, on top of the config file.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Site output root; artifacts go to `<site_dir>/<ai_artifacts_path>`.
    pub site_dir: PathBuf,
    /// Maximum pages resolved at once.
    pub jobs: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            site_dir: PathBuf::from("site"),
            jobs: default_jobs(),
        }
    }
}

/// Available parallelism, or 1 when it cannot be determined.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildReport {
    /// Artifacts directory that was replaced.
    pub output_dir: PathBuf,
    /// Resolved pages in corpus order.
    pub pages: Vec<Page>,
    /// Category name → member slugs, in configured order.
    pub categories: Vec<(String, Vec<String>)>,
    /// Excluded source paths.
    pub excluded: Vec<String>,
    /// Files written, site index last.
    pub artifacts: Vec<WriteRecord>,
    /// Raw markdown copy target, when the copy ran.
    pub raw_copy: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Result of a dry run.
#[derive(Debug)]
pub struct CheckReport {
    pub pages: Vec<Page>,
    pub categories: Vec<(String, Vec<String>)>,
    pub excluded: Vec<String>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each page finishes resolving.
    fn page_resolved(&self, path: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_resolved(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &BuildReport) {}
}

/// Pages resolved and classified, ready for artifact building.
struct Prepared {
    pages: Vec<Page>,
    index: CategoryIndex,
}

/// Run the full build against the filesystem host.
#[instrument(skip_all, fields(project = %config.project.id, site_dir = %options.site_dir.display()))]
pub async fn run_build(
    config: BuildConfig,
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    progress.phase("Discovering pages");
    let discovered = source::discover_pages(&config)?;
    build_from_pages(config, discovered.pages, discovered.excluded, options, progress).await
}

/// Run the build for host-supplied pages.
///
/// `excluded` lists paths the host already dropped; exclusion rules are
/// applied again to `pages`.
#[instrument(skip_all, fields(project = %config.project.id, pages = pages.len()))]
pub async fn build_from_pages(
    config: BuildConfig,
    pages: Vec<SourcePage>,
    excluded: Vec<String>,
    options: &BuildOptions,
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    let start = Instant::now();
    let config = Arc::new(config);

    info!(pages = pages.len(), jobs = options.jobs, "starting build");

    let prepared = prepare(&config, pages, excluded, options.jobs, progress).await?;
    let ordered = corpus_order(prepared.pages, &prepared.index);

    progress.phase("Building artifacts");
    let artifacts =
        llmsforge_artifacts::build_artifacts(&config, &ordered, &prepared.index.categories)?;

    progress.phase("Writing artifacts");
    let published = writer::publish(&config, &options.site_dir, &artifacts)?;

    let report = BuildReport {
        output_dir: published.artifacts_dir,
        categories: membership(&prepared.index),
        excluded: prepared.index.excluded,
        pages: ordered,
        artifacts: published.records,
        raw_copy: published.raw_copy,
        elapsed: start.elapsed(),
    };
    progress.done(&report);

    info!(
        pages = report.pages.len(),
        artifacts = report.artifacts.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "build complete"
    );
    Ok(report)
}

/// Discover, resolve, and classify without writing anything.
#[instrument(skip_all, fields(project = %config.project.id))]
pub async fn check(config: BuildConfig, jobs: usize, progress: &dyn ProgressReporter) -> Result<CheckReport> {
    let start = Instant::now();
    progress.phase("Discovering pages");
    let discovered = source::discover_pages(&config)?;

    let config = Arc::new(config);
    let prepared = prepare(&config, discovered.pages, discovered.excluded, jobs, progress).await?;
    let categories = membership(&prepared.index);

    Ok(CheckReport {
        pages: corpus_order(prepared.pages, &prepared.index),
        categories,
        excluded: prepared.index.excluded,
        elapsed: start.elapsed(),
    })
}

/// Exclude, categorize, slug, resolve in parallel, then classify.
async fn prepare(
    config: &Arc<BuildConfig>,
    pages: Vec<SourcePage>,
    mut excluded: Vec<String>,
    jobs: usize,
    progress: &dyn ProgressReporter,
) -> Result<Prepared> {
    let (mut pages, newly_excluded) = categories::partition_excluded(pages, config);
    excluded.extend(newly_excluded);
    excluded.sort();
    excluded.dedup();
    pages.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    let categories_by_page = pages
        .iter()
        .map(|p| categories::category_for(p, config))
        .collect::<Result<Vec<_>>>()?;
    let slugs: Vec<String> = slug::assign_slugs(pages.iter().map(|p| p.source_path.as_str()))?
        .into_iter()
        .map(|(_, slug)| slug)
        .collect();

    progress.phase("Resolving pages");
    let resolved = resolve_all(config, &pages, jobs, progress).await?;

    let pages: Vec<Page> = pages
        .into_iter()
        .zip(categories_by_page)
        .zip(slugs)
        .zip(resolved)
        .map(|(((source, category), slug), resolved_content)| {
            finish_page(config, source, category, slug, resolved_content)
        })
        .collect();

    progress.phase("Classifying pages");
    let index = categories::classify(&pages, excluded, config)?;
    Ok(Prepared { pages, index })
}

/// Resolve every page on a bounded set of tasks. Output order matches input.
async fn resolve_all(
    config: &Arc<BuildConfig>,
    pages: &[SourcePage],
    jobs: usize,
    progress: &dyn ProgressReporter,
) -> Result<Vec<String>> {
    let resolver = Arc::new(Resolver::from_config(Arc::clone(config))?);
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let total = pages.len();

    let mut tasks = JoinSet::new();
    for (i, page) in pages.iter().enumerate() {
        let resolver = Arc::clone(&resolver);
        let sem = Arc::clone(&semaphore);
        let page = page.clone();

        tasks.spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| LlmsForgeError::validation(format!("resolution pool closed: {e}")))?;
            let resolved = resolver.resolve_page(&page).await?;
            Ok::<_, LlmsForgeError>((i, page.source_path, resolved))
        });
    }

    // Barrier: every page must resolve before classification begins.
    let mut results: Vec<Option<String>> = vec![None; total];
    let mut done = 0;
    while let Some(joined) = tasks.join_next().await {
        let (i, path, resolved) = joined
            .map_err(|e| LlmsForgeError::validation(format!("resolution task failed: {e}")))??;
        done += 1;
        progress.page_resolved(&path, done, total);
        results[i] = Some(resolved);
    }

    info!(
        pages = total,
        remote_fetches = resolver.store().remote_fetches(),
        "resolved pages"
    );
    results
        .into_iter()
        .map(|r| r.ok_or_else(|| LlmsForgeError::validation("page resolution incomplete")))
        .collect()
}

/// Assemble the immutable page record.
fn finish_page(
    config: &BuildConfig,
    source: SourcePage,
    category: String,
    slug: String,
    resolved_content: String,
) -> Page {
    let title = source
        .front_matter
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| extract_title(&resolved_content))
        .unwrap_or_else(|| slug::title_from_path(&source.source_path));

    Page {
        url: config.page_url(&slug::page_route(&source.source_path)),
        description: source.front_matter.description().map(str::to_string),
        word_count: count_words(&resolved_content),
        source_path: source.source_path,
        slug,
        category,
        title,
        raw_content: source.raw_content,
        front_matter: source.front_matter,
        resolved_content,
    }
}

/// Reorder pages to category order, then member order.
fn corpus_order(pages: Vec<Page>, index: &CategoryIndex) -> Vec<Page> {
    let mut by_slug: BTreeMap<String, Page> =
        pages.into_iter().map(|p| (p.slug.clone(), p)).collect();
    index
        .categories
        .iter()
        .flat_map(|c| c.members.iter())
        .filter_map(|slug| by_slug.remove(slug))
        .collect()
}

fn membership(index: &CategoryIndex) -> Vec<(String, Vec<String>)> {
    index
        .categories
        .iter()
        .map(|Category { name, members, .. }| (name.clone(), members.clone()))
        .collect()
}
