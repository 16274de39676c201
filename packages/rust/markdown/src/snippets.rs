//! Snippet identifiers, loading, and the build-scoped snippet store.
//!
//! The store is a keyed cache with single-writer-per-key semantics: the first
//! request for a key performs the load while concurrent requests for the same
//! key wait on it, and later requests read the cached outcome. Cycle detection
//! does not live here; it is carried by the resolution chain in
//! [`crate::resolver`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};
use url::Url;

use llmsforge_shared::{LlmsForgeError, Result};

/// User-Agent string for remote snippet requests.
const USER_AGENT: &str = concat!("llmsforge/", env!("CARGO_PKG_VERSION"));

/// Attempts per remote snippet: the first request plus one retry.
const REMOTE_ATTEMPTS: usize = 2;

/// Pause between the failed first attempt and the retry.
const RETRY_DELAY: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Where a snippet's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetSource {
    /// Path relative to one of the snippet base paths.
    Local(String),
    /// Remote `http(s)` URL.
    Remote(Url),
}

/// Inclusive 1-based line selection. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl LineRange {
    /// Apply the selection to a text, keeping line terminators intact.
    pub fn select(&self, text: &str) -> String {
        let start = self.start.unwrap_or(1).max(1);
        let end = self.end.unwrap_or(usize::MAX);
        text.split_inclusive('\n')
            .enumerate()
            .filter(|(i, _)| (start..=end).contains(&(i + 1)))
            .map(|(_, line)| line)
            .collect()
    }
}

/// A parsed include target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetId {
    /// Cache key: the identifier without its line selection.
    pub key: String,
    pub source: SnippetSource,
    pub range: Option<LineRange>,
}

impl SnippetId {
    /// Parse `path`, `path:start`, `path:start:end`, or an `http(s)` URL with
    /// the same optional suffixes.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (key, range) = split_line_range(raw);
        if key.is_empty() {
            return Err(LlmsForgeError::validation(format!(
                "empty snippet identifier in '{raw}'"
            )));
        }

        let source = if key.starts_with("http://") || key.starts_with("https://") {
            let url = Url::parse(key).map_err(|e| {
                LlmsForgeError::validation(format!("invalid snippet URL '{key}': {e}"))
            })?;
            SnippetSource::Remote(url)
        } else {
            SnippetSource::Local(key.to_string())
        };

        Ok(Self {
            key: key.to_string(),
            source,
            range,
        })
    }

    /// Memo key for the expanded text of this exact include.
    pub fn memo_key(&self) -> String {
        match self.range {
            None => self.key.clone(),
            Some(r) => format!(
                "{}:{}:{}",
                self.key,
                r.start.map(|n| n.to_string()).unwrap_or_default(),
                r.end.map(|n| n.to_string()).unwrap_or_default()
            ),
        }
    }
}

/// Peel up to two trailing `:<digits>` groups off an identifier.
///
/// For URLs only the path may carry a range, so `https://host:8443` keeps
/// its port.
fn split_line_range(raw: &str) -> (&str, Option<LineRange>) {
    let floor = match raw.split_once("://") {
        Some((scheme, rest)) => match rest.find('/') {
            Some(slash) => scheme.len() + 3 + slash,
            None => return (raw, None),
        },
        None => 0,
    };

    let mut base = raw;
    let mut bounds: Vec<Option<usize>> = Vec::new();

    for _ in 0..2 {
        let Some((head, tail)) = base.rsplit_once(':') else {
            break;
        };
        if head.len() <= floor || head.is_empty() || !tail.chars().all(|c| c.is_ascii_digit()) {
            break;
        }
        bounds.push(tail.parse().ok());
        base = head;
    }

    let range = match *bounds.as_slice() {
        [start] => Some(LineRange { start, end: None }),
        [end, start] => Some(LineRange { start, end }),
        _ => None,
    };
    (base, range)
}

// ---------------------------------------------------------------------------
// Load outcomes
// ---------------------------------------------------------------------------

/// Cached result of loading one key. Chain-specific errors are built by the
/// caller, so the outcome itself carries no inclusion chain.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Arc<str>),
    Missing,
    RemoteFailed(String),
}

/// Lifecycle of a snippet from the point of view of one resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetState {
    Unvisited,
    InProgress,
    Resolved,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Options for the snippet store.
#[derive(Debug, Clone)]
pub struct SnippetOptions {
    /// Directories searched, in order, for local identifiers.
    pub base_paths: Vec<PathBuf>,
    /// Whether remote identifiers may be fetched.
    pub allow_remote: bool,
    /// Per-request timeout for remote fetches.
    pub timeout: Duration,
}

/// Build-scoped snippet cache.
pub struct SnippetStore {
    options: SnippetOptions,
    client: Option<Client>,
    loads: Mutex<HashMap<String, Arc<OnceCell<LoadOutcome>>>>,
    expanded: RwLock<HashMap<String, Arc<str>>>,
    fetches: AtomicUsize,
}

impl std::fmt::Debug for SnippetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetStore")
            .field("options", &self.options)
            .field("remote_fetches", &self.remote_fetches())
            .finish_non_exhaustive()
    }
}

impl SnippetStore {
    /// Create an empty store. Builds the HTTP client only when remote is allowed.
    pub fn new(options: SnippetOptions) -> Result<Self> {
        let client = if options.allow_remote {
            Some(build_client(options.timeout)?)
        } else {
            None
        };

        Ok(Self {
            options,
            client,
            loads: Mutex::new(HashMap::new()),
            expanded: RwLock::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        })
    }

    /// Whether remote identifiers may be fetched at all.
    pub fn allows_remote(&self) -> bool {
        self.client.is_some()
    }

    /// Number of remote HTTP requests issued so far (retries included).
    pub fn remote_fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Load the raw text for an identifier, at most once per key.
    pub async fn load(&self, id: &SnippetId) -> LoadOutcome {
        let cell = {
            let mut loads = self.loads.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(loads.entry(id.key.clone()).or_default())
        };

        cell.get_or_init(|| self.load_uncached(id)).await.clone()
    }

    /// State of a key as seen from an inclusion chain.
    pub fn state(&self, id: &SnippetId, chain: &[String]) -> SnippetState {
        if chain.iter().any(|entry| entry == &id.key) {
            SnippetState::InProgress
        } else if self.expanded_text(&id.memo_key()).is_some() {
            SnippetState::Resolved
        } else {
            SnippetState::Unvisited
        }
    }

    /// Previously expanded text for an include, if any.
    pub fn expanded_text(&self, memo_key: &str) -> Option<Arc<str>> {
        self.expanded
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(memo_key)
            .cloned()
    }

    /// Record expanded text. The first writer wins; later values are identical.
    pub fn remember_expanded(&self, memo_key: String, text: Arc<str>) -> Arc<str> {
        let mut expanded = self.expanded.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(expanded.entry(memo_key).or_insert(text))
    }

    async fn load_uncached(&self, id: &SnippetId) -> LoadOutcome {
        match &id.source {
            SnippetSource::Local(rel) => self.load_local(rel).await,
            SnippetSource::Remote(url) => self.load_remote(url).await,
        }
    }

    async fn load_local(&self, rel: &str) -> LoadOutcome {
        for base in &self.options.base_paths {
            let candidate = base.join(rel);
            if !candidate.is_file() {
                continue;
            }
            return match tokio::fs::read_to_string(&candidate).await {
                Ok(text) => {
                    debug!(snippet = rel, path = %candidate.display(), "loaded local snippet");
                    LoadOutcome::Loaded(Arc::from(text))
                }
                Err(e) => {
                    warn!(path = %candidate.display(), error = %e, "snippet file unreadable");
                    LoadOutcome::Missing
                }
            };
        }
        LoadOutcome::Missing
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn load_remote(&self, url: &Url) -> LoadOutcome {
        let Some(client) = &self.client else {
            return LoadOutcome::RemoteFailed(
                "remote snippets are disabled (set snippets.allow_remote)".into(),
            );
        };

        let mut last_error = String::new();
        for attempt in 1..=REMOTE_ATTEMPTS {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            match fetch_text(client, url).await {
                Ok(text) => {
                    debug!(attempt, bytes = text.len(), "fetched remote snippet");
                    return LoadOutcome::Loaded(Arc::from(text));
                }
                Err(e) => {
                    warn!(attempt, error = %e, "remote snippet fetch failed");
                    last_error = e;
                    if attempt < REMOTE_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        LoadOutcome::RemoteFailed(last_error)
    }
}

/// Build a reqwest client with the configured timeout.
fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(3))
        .timeout(timeout)
        .build()
        .map_err(|e| LlmsForgeError::config(format!("failed to build HTTP client: {e}")))
}

/// GET a URL and return its body as text.
async fn fetch_text(client: &Client, url: &Url) -> std::result::Result<String, String> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }

    response
        .text()
        .await
        .map_err(|e| format!("failed to read body: {e}"))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn local_options(base_paths: &[&Path]) -> SnippetOptions {
        SnippetOptions {
            base_paths: base_paths.iter().map(|p| p.to_path_buf()).collect(),
            allow_remote: false,
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn parse_plain_and_ranged_identifiers() {
        let id = SnippetId::parse("code/example.rs").unwrap();
        assert_eq!(id.key, "code/example.rs");
        assert_eq!(id.range, None);
        assert_eq!(id.source, SnippetSource::Local("code/example.rs".into()));

        let id = SnippetId::parse("code/example.rs:3:5").unwrap();
        assert_eq!(id.key, "code/example.rs");
        assert_eq!(
            id.range,
            Some(LineRange {
                start: Some(3),
                end: Some(5)
            })
        );
        assert_eq!(id.memo_key(), "code/example.rs:3:5");

        let id = SnippetId::parse("notes.md::2").unwrap();
        assert_eq!(id.key, "notes.md");
        assert_eq!(
            id.range,
            Some(LineRange {
                start: None,
                end: Some(2)
            })
        );
    }

    #[test]
    fn parse_remote_identifier_with_port() {
        let id = SnippetId::parse("https://example.com:8443/snippets/a.md:1:2").unwrap();
        assert_eq!(id.key, "https://example.com:8443/snippets/a.md");
        assert!(matches!(id.source, SnippetSource::Remote(_)));
        assert!(id.range.is_some());

        let bare = SnippetId::parse("https://example.com:8443").unwrap();
        assert_eq!(bare.key, "https://example.com:8443");
        assert_eq!(bare.range, None);

        let root = SnippetId::parse("https://example.com:8443/").unwrap();
        assert_eq!(root.key, "https://example.com:8443/");
        assert_eq!(root.range, None);

        let ranged = SnippetId::parse("http://example.com/a.md:3").unwrap();
        assert_eq!(ranged.key, "http://example.com/a.md");
        assert_eq!(ranged.range, Some(LineRange { start: Some(3), end: None }));
    }

    #[test]
    fn line_range_selects_inclusive() {
        let text = "one\ntwo\nthree\nfour\n";
        let range = LineRange {
            start: Some(2),
            end: Some(3),
        };
        assert_eq!(range.select(text), "two\nthree\n");
        let open = LineRange {
            start: Some(3),
            end: None,
        };
        assert_eq!(open.select(text), "three\nfour\n");
    }

    #[tokio::test]
    async fn local_load_searches_base_paths_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("note.md"), "from second").unwrap();

        let store = SnippetStore::new(local_options(&[first.path(), second.path()])).unwrap();
        let id = SnippetId::parse("note.md").unwrap();
        match store.load(&id).await {
            LoadOutcome::Loaded(text) => assert_eq!(&*text, "from second"),
            other => panic!("expected Loaded, got {other:?}"),
        }

        let missing = SnippetId::parse("absent.md").unwrap();
        assert!(matches!(store.load(&missing).await, LoadOutcome::Missing));
    }

    #[tokio::test]
    async fn remote_disabled_without_fetching() {
        let store = SnippetStore::new(local_options(&[])).unwrap();
        let id = SnippetId::parse("https://example.com/a.md").unwrap();
        assert!(matches!(store.load(&id).await, LoadOutcome::RemoteFailed(_)));
        assert_eq!(store.remote_fetches(), 0);
    }

    #[tokio::test]
    async fn remote_fetch_is_cached_per_key() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/shared.md"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("shared text"))
            .expect(1)
            .mount(&server)
            .await;

        let mut options = local_options(&[]);
        options.allow_remote = true;
        let store = Arc::new(SnippetStore::new(options).unwrap());
        let id = SnippetId::parse(&format!("{}/shared.md", server.uri())).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move { store.load(&id).await }));
        }
        for handle in handles {
            match handle.await.unwrap() {
                LoadOutcome::Loaded(text) => assert_eq!(&*text, "shared text"),
                other => panic!("expected Loaded, got {other:?}"),
            }
        }
        assert_eq!(store.remote_fetches(), 1);
    }

    #[tokio::test]
    async fn remote_fetch_retries_once() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/flaky.md"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/flaky.md"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let mut options = local_options(&[]);
        options.allow_remote = true;
        let store = SnippetStore::new(options).unwrap();
        let id = SnippetId::parse(&format!("{}/flaky.md", server.uri())).unwrap();

        match store.load(&id).await {
            LoadOutcome::Loaded(text) => assert_eq!(&*text, "recovered"),
            other => panic!("expected Loaded, got {other:?}"),
        }
        assert_eq!(store.remote_fetches(), 2);
    }

    #[tokio::test]
    async fn remote_fetch_gives_up_after_retry() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let mut options = local_options(&[]);
        options.allow_remote = true;
        let store = SnippetStore::new(options).unwrap();
        let id = SnippetId::parse(&format!("{}/gone.md", server.uri())).unwrap();

        match store.load(&id).await {
            LoadOutcome::RemoteFailed(message) => assert!(message.contains("404")),
            other => panic!("expected RemoteFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_fetch_times_out() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let options = SnippetOptions {
            base_paths: Vec::new(),
            allow_remote: true,
            timeout: Duration::from_millis(200),
        };
        let store = SnippetStore::new(options).unwrap();
        let id = SnippetId::parse(&format!("{}/slow.md", server.uri())).unwrap();

        assert!(matches!(store.load(&id).await, LoadOutcome::RemoteFailed(_)));
        assert_eq!(store.remote_fetches(), 2);
    }
}
