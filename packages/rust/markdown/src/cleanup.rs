//! Post-resolution cleanup passes for Markdown output.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! Comment stripping runs first so that removed comments do not leave
//! ragged blank-line runs behind.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on resolved Markdown text.
pub fn run_pipeline(md: &str) -> String {
    let result = strip_html_comments(md);
    let result = tidy_lines(&result);
    ensure_trailing_newline(&result)
}

// ---------------------------------------------------------------------------
// Pass 1: Strip HTML comments
// ---------------------------------------------------------------------------

/// Remove `<!-- ... -->` spans, including multi-line ones.
pub fn strip_html_comments(md: &str) -> String {
    static COMMENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

    COMMENT_RE.replace_all(md, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Tidy lines outside fenced code
// ---------------------------------------------------------------------------

/// Trim trailing whitespace and cap blank-line runs at two.
///
/// Lines inside ``` or ~~~ fences are left untouched. A two-space hard
/// break at the end of a prose line is kept.
fn tidy_lines(md: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut fence: Option<&str> = None;
    let mut blank_run = 0;

    for line in md.lines() {
        let marker = fence_marker(line);

        if let Some(open) = fence {
            if marker == Some(open) {
                fence = None;
            }
            out.push(line);
            continue;
        }
        if marker.is_some() {
            fence = marker;
            blank_run = 0;
            out.push(line.trim_end());
            continue;
        }

        let trimmed = trim_line(line);
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(trimmed);
    }

    out.join("\n")
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    if line.starts_with("```") {
        Some("```")
    } else if line.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Trailing whitespace removed, except a hard break of two spaces.
fn trim_line(line: &str) -> &str {
    let trimmed = line.trim_end();
    if !trimmed.is_empty() && line[trimmed.len()..].starts_with("  ") {
        &line[..trimmed.len() + 2]
    } else {
        trimmed
    }
}

// ---------------------------------------------------------------------------
// Pass 3: Ensure trailing newline
// ---------------------------------------------------------------------------

/// Ensure the text starts with content and ends with exactly one newline.
fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_start_matches('\n').trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Inspection helpers
// ---------------------------------------------------------------------------

/// Extract the title from the first H1 in the Markdown text.
pub fn extract_title(md: &str) -> Option<String> {
    static H1_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid regex"));

    H1_RE
        .captures(md)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Count words in a Markdown body, excluding fenced code blocks.
pub fn count_words(md: &str) -> usize {
    static CODE_BLOCK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));

    let without_code = CODE_BLOCK_RE.replace_all(md, "");
    without_code
        .split_whitespace()
        .filter(|w| !w.starts_with('#') || w.len() > 2)
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_comments_handles_multiline() {
        let input = "Before\n<!-- a\nmulti-line\ncomment -->\nAfter <!-- inline --> end";
        let result = strip_html_comments(input);
        assert_eq!(result, "Before\n\nAfter  end");
    }

    #[test]
    fn strip_html_comments_is_non_greedy() {
        let input = "<!-- one -->keep<!-- two -->";
        assert_eq!(strip_html_comments(input), "keep");
    }

    #[test]
    fn blank_line_runs_capped_at_two() {
        assert_eq!(tidy_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
        assert_eq!(tidy_lines("a\n  \n\t\n\n\nb"), "a\n\n\nb");
        assert_eq!(tidy_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn trailing_whitespace_and_crlf_removed() {
        assert_eq!(tidy_lines("key: value \r\n- item\t\nend"), "key: value\n- item\nend");
    }

    #[test]
    fn hard_line_break_is_kept() {
        assert_eq!(tidy_lines("first line   \nsecond"), "first line  \nsecond");
    }

    #[test]
    fn fenced_code_is_left_alone() {
        let input = "Intro\n```python\nx = 1  \n\n\n\n\ny = 2\n```\n~~~diff\n-old \n~~~\n\n\n\n\nAfter";
        let expected = "Intro\n```python\nx = 1  \n\n\n\n\ny = 2\n```\n~~~diff\n-old \n~~~\n\n\nAfter\n";
        assert_eq!(run_pipeline(input), expected);
    }

    #[test]
    fn tilde_fence_is_not_closed_by_backticks() {
        let input = "~~~\n```\na  \n~~~\nb  \t";
        assert_eq!(tidy_lines(input), "~~~\n```\na  \n~~~\nb  ");
    }

    #[test]
    fn ensure_trailing_newline_normalizes_multiple() {
        assert_eq!(ensure_trailing_newline("Content"), "Content\n");
        assert_eq!(ensure_trailing_newline("\n\nContent\n\n\n"), "Content\n");
    }

    #[test]
    fn full_pipeline_removes_comment_residue() {
        let input = "# Title\n\n<!-- editor note -->\n\n\n\n\nBody \n";
        let result = run_pipeline(input);
        assert_eq!(result, "# Title\n\n\nBody\n");
    }

    #[test]
    fn extract_title_finds_first_h1() {
        assert_eq!(
            extract_title("intro\n\n# Getting Started\n\n# Second"),
            Some("Getting Started".into())
        );
        assert_eq!(extract_title("## Only H2"), None);
    }

    #[test]
    fn word_count_excludes_code_blocks() {
        let md = "# Title\n\nOne two three.\n\n```rust\nfn main() { let x = 1; }\n```\n";
        assert_eq!(count_words(md), 4);
    }
}
