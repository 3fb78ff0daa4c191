//! Paywall splitting
//!
//! Partitions a content body into a free-to-read preview and a restricted
//! remainder. Pure and total: malformed paywall settings degrade to defaults
//! instead of failing. Lengths are counted in `char`s.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::entity::{ContentItem, FreePreviewMode, PaywallConfig};

/// Break token recognised in `marker` mode (MDX comment syntax)
pub const MORE_MARKER: &str = "{/* more */}";

/// Preview length used in `marker` mode when the body has no marker
pub const DEFAULT_MARKER_PREVIEW_CHARS: usize = 600;

/// Preview length used in `chars` mode when the configured count is unset or non-positive
pub const DEFAULT_FREE_CHARS: usize = 800;

/// Free block count used in `sections` mode when unset or non-positive
pub const DEFAULT_FREE_SECTIONS: usize = 2;

static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## ").unwrap());

/// Result of splitting a body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitContent {
    pub preview: String,
    pub restricted: String,
}

impl SplitContent {
    fn open(body: &str) -> Self {
        Self {
            preview: body.to_string(),
            restricted: String::new(),
        }
    }

    /// Drives the paywall prompt and the partial-access markup downstream
    pub fn has_restricted_content(&self) -> bool {
        !self.restricted.is_empty()
    }
}

/// Split a content item according to its paywall configuration
pub fn split(item: &ContentItem) -> SplitContent {
    split_body(item.body(), item.paywall())
}

/// Split a raw body according to a paywall configuration
pub fn split_body(body: &str, paywall: &PaywallConfig) -> SplitContent {
    if !paywall.enabled {
        return SplitContent::open(body);
    }

    match &paywall.free_mode {
        FreePreviewMode::Marker => split_at_marker(body),
        FreePreviewMode::Chars => {
            split_at_chars(body, positive_or(paywall.free_chars, DEFAULT_FREE_CHARS))
        }
        FreePreviewMode::Sections => {
            split_at_sections(body, positive_or(paywall.free_sections, DEFAULT_FREE_SECTIONS))
        }
        FreePreviewMode::Other(_) => SplitContent::open(body),
    }
}

fn positive_or(value: Option<i64>, default: usize) -> usize {
    match value {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => default,
    }
}

fn split_at_marker(body: &str) -> SplitContent {
    match body.split_once(MORE_MARKER) {
        Some((preview, restricted)) => SplitContent {
            preview: preview.to_string(),
            restricted: restricted.to_string(),
        },
        None => SplitContent {
            preview: char_prefix(body, DEFAULT_MARKER_PREVIEW_CHARS).to_string(),
            restricted: String::new(),
        },
    }
}

fn split_at_chars(body: &str, count: usize) -> SplitContent {
    let cut = char_boundary(body, count);
    let (preview, restricted) = body.split_at(cut);

    SplitContent {
        preview: preview.to_string(),
        restricted: restricted.to_string(),
    }
}

fn split_at_sections(body: &str, free_sections: usize) -> SplitContent {
    // A block starts at every heading; text before the first heading is its own block.
    let mut starts: Vec<usize> = SECTION_HEADING
        .find_iter(body)
        .map(|m| m.start())
        .filter(|&start| start > 0)
        .collect();
    starts.insert(0, 0);

    let cut = starts.get(free_sections).copied().unwrap_or(body.len());
    let (preview, restricted) = body.split_at(cut);

    SplitContent {
        preview: preview.to_string(),
        restricted: restricted.to_string(),
    }
}

/// Byte offset of the `count`-th char, clamped to the body length
fn char_boundary(text: &str, count: usize) -> usize {
    text.char_indices()
        .nth(count)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

pub(crate) fn char_prefix(text: &str, count: usize) -> &str {
    &text[..char_boundary(text, count)]
}
