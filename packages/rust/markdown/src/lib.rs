//! Markdown-side resolution for llmsforge.
//!
//! Splits front matter off source pages, expands `--8<--` snippet
//! directives and `{{ variable }}` tokens, and runs the cleanup passes that
//! turn the expanded text into a page's final resolved content.

pub mod cleanup;
pub mod frontmatter;
pub mod resolver;
pub mod snippets;
pub mod variables;

pub use cleanup::{count_words, extract_title, run_pipeline, strip_html_comments};
pub use frontmatter::split_front_matter;
pub use resolver::Resolver;
pub use snippets::{LineRange, LoadOutcome, SnippetId, SnippetOptions, SnippetSource, SnippetState, SnippetStore};
pub use variables::Variables;
