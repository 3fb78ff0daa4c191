//! Plain-text excerpts derived from the free preview

use once_cell::sync::Lazy;
use regex::Regex;

use super::entity::ContentItem;
use super::splitter::{char_prefix, split};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#+\s+").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_]{1,2}([^*_]+)[*_]{1,2}").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static HTML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static MDX_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{/\*.*?\*/\}").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Default excerpt length for listings
pub const DEFAULT_EXCERPT_CHARS: usize = 120;

/// Rounded excerpts shorter than this fall back to a hard cut
const MIN_ROUNDED_CHARS: usize = 40;

/// Extra room allowed when rounding back to punctuation
const ROUNDING_SLACK: usize = 20;

/// Strip common Markdown/MDX syntax from a fragment
pub fn strip_markdown(markdown: &str) -> String {
    let text = HEADING.replace_all(markdown, "");
    let text = LINK.replace_all(&text, "$1");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HTML_COMMENT.replace_all(&text, "");
    let text = MDX_COMMENT.replace_all(&text, "");

    text.trim().to_string()
}

/// Plain text of the free preview only; restricted text never reaches it
pub fn preview_text(item: &ContentItem) -> String {
    strip_markdown(&split(item).preview)
}

/// Build an excerpt of at most roughly `max` chars, rounded to sentence punctuation
pub fn excerpt_from_preview(text: &str, max: usize) -> String {
    let plain = WHITESPACE.replace_all(text, " ").trim().to_string();

    if plain.chars().count() <= max {
        return plain;
    }

    let window = char_prefix(&plain, max + ROUNDING_SLACK);
    let rounded = round_to_punctuation(window).unwrap_or_else(|| char_prefix(&plain, max));

    if rounded.chars().count() < MIN_ROUNDED_CHARS {
        return format!("{}…", char_prefix(&plain, max));
    }

    if rounded.ends_with('…') {
        rounded.to_string()
    } else {
        format!("{}…", rounded)
    }
}

/// Longest prefix ending at punctuation, preferring full stops over other marks
fn round_to_punctuation(window: &str) -> Option<&str> {
    const PRIORITIES: [&[char]; 3] = [&['。', '．'], &['！', '？', '!', '?'], &['、', '，']];

    PRIORITIES.iter().find_map(|marks| {
        window
            .char_indices()
            .filter(|(_, c)| marks.contains(c))
            .last()
            .filter(|(idx, _)| *idx > 0)
            .map(|(idx, c)| &window[..idx + c.len_utf8()])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::PaywallConfig;

    #[test]
    fn test_strip_markdown() {
        let md = "## Title\nSee [docs](https://example.com) and **bold** `code`<!-- hidden -->{/* more */}";
        assert_eq!(strip_markdown(md), "Title\nSee docs and bold code");
    }

    #[test]
    fn test_short_text_is_returned_whole() {
        assert_eq!(excerpt_from_preview("  hello \n world  ", 120), "hello world");
    }

    #[test]
    fn test_excerpt_rounds_to_last_full_stop() {
        let sentence = "これは最初の文です。".repeat(6);
        let excerpt = excerpt_from_preview(&sentence, 45);

        assert!(excerpt.ends_with("。…"));
        assert!(excerpt.chars().count() <= 45 + ROUNDING_SLACK + 1);
    }

    #[test]
    fn test_excerpt_falls_back_to_hard_cut() {
        let text = "word ".repeat(50);
        let excerpt = excerpt_from_preview(&text, 60);

        assert!(excerpt.ends_with('…'));
        assert_eq!(excerpt.chars().count(), 61);
    }

    #[test]
    fn test_preview_text_excludes_restricted_part() {
        let item = ContentItem::new("s", "t", "## Free\nvisible{/* more */}secret", "dx")
            .with_paywall(PaywallConfig::marker());

        let text = preview_text(&item);
        assert_eq!(text, "Free\nvisible");
        assert!(!text.contains("secret"));
    }
}
