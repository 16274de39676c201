//! Placeholder resolution: variable tokens and snippet directives.
//!
//! Text is processed line by line. A line that is a snippet directive is
//! replaced by the fully expanded snippet; every other line has its
//! `{{ variable }}` tokens substituted. Spliced snippet text has already been
//! expanded by the recursive call and is never scanned again.
//!
//! Cycle detection uses an explicit chain of snippet keys handed down each
//! recursive call, so it holds no matter how page tasks interleave.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, instrument, warn};

use llmsforge_shared::{BuildConfig, LlmsForgeError, RemoteFailure, Result, SourcePage};

use crate::cleanup;
use crate::snippets::{LoadOutcome, SnippetId, SnippetOptions, SnippetSource, SnippetState, SnippetStore};
use crate::variables::Variables;

type ExpandFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
type IncludeFuture<'a> = Pin<Box<dyn Future<Output = Result<Arc<str>>> + Send + 'a>>;

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[ \t]*([A-Za-z0-9_.-]+)[ \t]*\}\}").expect("valid regex")
});

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([ \t]*)-+8<-+[ \t]+(?:"([^"]+)"|'([^']+)')[ \t]*$"#).expect("valid regex")
});

/// A parsed `--8<-- "identifier"` line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    indent: String,
    identifier: String,
}

/// Recognize a snippet directive line (terminator excluded).
fn parse_directive(line: &str) -> Option<Directive> {
    let line = line.trim_end_matches(['\n', '\r']);
    let caps = DIRECTIVE_RE.captures(line)?;
    let identifier = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
    Some(Directive {
        indent: caps[1].to_string(),
        identifier,
    })
}

/// Resolves pages against one build's variables and snippet store.
#[derive(Debug)]
pub struct Resolver {
    variables: Variables,
    store: SnippetStore,
    remote_failure: RemoteFailure,
}

impl Resolver {
    pub fn new(variables: Variables, store: SnippetStore, remote_failure: RemoteFailure) -> Self {
        Self {
            variables,
            store,
            remote_failure,
        }
    }

    /// Build a fresh resolver (variables + empty snippet store) for a build.
    pub fn from_config(config: Arc<BuildConfig>) -> Result<Self> {
        let options = SnippetOptions {
            base_paths: config.snippet_base_paths(),
            allow_remote: config.snippets.allow_remote,
            timeout: Duration::from_secs(config.snippets.timeout_secs),
        };
        let store = SnippetStore::new(options)?;
        let remote_failure = config.snippets.remote_failure;
        let variables = Variables::load(config)?;
        Ok(Self::new(variables, store, remote_failure))
    }

    /// The snippet store shared by every page of this build.
    pub fn store(&self) -> &SnippetStore {
        &self.store
    }

    /// Resolve a page's raw body to its final text.
    ///
    /// Errors are attributed to the page.
    #[instrument(skip_all, fields(page = %page.source_path))]
    pub async fn resolve_page(&self, page: &SourcePage) -> Result<String> {
        let expanded = self
            .expand(&page.raw_content, &page.source_path, &[])
            .await
            .map_err(|e| e.in_page(&page.source_path))?;

        let resolved = cleanup::run_pipeline(&expanded);
        debug!(bytes = resolved.len(), "resolved page");
        Ok(resolved)
    }

    /// Resolve a single snippet identifier to its fully expanded text.
    pub async fn resolve_snippet(&self, identifier: &str) -> Result<Arc<str>> {
        self.include(identifier, "", &[]).await
    }

    /// Substitute variables and splice snippets into `text`.
    ///
    /// `origin` names the page being resolved (empty for a bare snippet) and
    /// `chain` holds the snippet keys currently being expanded.
    fn expand<'a>(&'a self, text: &'a str, origin: &'a str, chain: &'a [String]) -> ExpandFuture<'a> {
        Box::pin(async move {
            let mut out = String::with_capacity(text.len());
            for line in text.split_inclusive('\n') {
                let Some(directive) = parse_directive(line) else {
                    out.push_str(&self.substitute(line)?);
                    continue;
                };

                let body = self.include(&directive.identifier, origin, chain).await?;
                splice(&mut out, &directive.indent, &body, line.ends_with('\n'));
            }
            Ok(out)
        })
    }

    /// Resolve one include on the active chain.
    fn include<'a>(&'a self, raw: &'a str, origin: &'a str, chain: &'a [String]) -> IncludeFuture<'a> {
        Box::pin(async move {
            let id = SnippetId::parse(raw)?;

            match self.store.state(&id, chain) {
                SnippetState::InProgress => {
                    return Err(LlmsForgeError::CyclicSnippet {
                        identifier: id.key.clone(),
                        chain: full_chain(origin, chain, Some(&id.key)),
                    });
                }
                SnippetState::Resolved => {
                    if let Some(text) = self.store.expanded_text(&id.memo_key()) {
                        return Ok(text);
                    }
                }
                SnippetState::Unvisited => {}
            }

            if matches!(id.source, SnippetSource::Remote(_)) && !self.store.allows_remote() {
                return Err(LlmsForgeError::RemoteFetch {
                    url: id.key.clone(),
                    message: "remote snippets are disabled (set snippets.allow_remote)".into(),
                });
            }

            let raw_text = match self.store.load(&id).await {
                LoadOutcome::Loaded(text) => text,
                LoadOutcome::Missing => {
                    return Err(LlmsForgeError::MissingSnippet {
                        identifier: id.key.clone(),
                        chain: full_chain(origin, chain, None),
                    });
                }
                LoadOutcome::RemoteFailed(message) => return self.remote_failed(&id, message),
            };

            let selected = match id.range {
                Some(range) => range.select(&raw_text),
                None => raw_text.to_string(),
            };

            let mut nested = chain.to_vec();
            nested.push(id.key.clone());
            let expanded = self.expand(&selected, origin, &nested).await?;

            debug!(snippet = %id.key, depth = nested.len(), "expanded snippet");
            Ok(self.store.remember_expanded(id.memo_key(), Arc::from(expanded)))
        })
    }

    fn remote_failed(&self, id: &SnippetId, message: String) -> Result<Arc<str>> {
        match self.remote_failure {
            RemoteFailure::Error => Err(LlmsForgeError::RemoteFetch {
                url: id.key.clone(),
                message,
            }),
            RemoteFailure::Placeholder => {
                warn!(url = %id.key, error = %message, "remote snippet unavailable, inserting placeholder");
                Ok(Arc::from(format!("> [snippet unavailable: {}]\n", id.key)))
            }
        }
    }

    /// Replace every `{{ name }}` token in one line.
    fn substitute(&self, line: &str) -> Result<String> {
        if !line.contains("{{") {
            return Ok(line.to_string());
        }

        let mut out = String::with_capacity(line.len());
        let mut last = 0;
        for caps in VARIABLE_RE.captures_iter(line) {
            let Some(token) = caps.get(0) else { continue };
            out.push_str(&line[last..token.start()]);
            out.push_str(&self.variables.lookup(&caps[1])?);
            last = token.end();
        }
        out.push_str(&line[last..]);
        Ok(out)
    }
}

/// Append snippet text, re-indenting each non-blank line.
fn splice(out: &mut String, indent: &str, body: &str, keep_newline: bool) {
    for line in body.split_inclusive('\n') {
        if !indent.is_empty() && !line.trim().is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
    }
    if keep_newline && !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
}

/// `origin -> chain... [-> key]`, skipping an empty origin.
fn full_chain(origin: &str, chain: &[String], key: Option<&str>) -> Vec<String> {
    let mut full = Vec::with_capacity(chain.len() + 2);
    if !origin.is_empty() {
        full.push(origin.to_string());
    }
    full.extend(chain.iter().cloned());
    if let Some(key) = key {
        full.push(key.to_string());
    }
    full
}
