//! Title sorting with leading-article stripping
//!
//! Sort keys are derived strings used only for ordering; the displayed
//! title is never modified. A leading grammatical article in any supported
//! language ("The Matrix", "Das Boot", "Le Fabuleux Destin ...") is dropped
//! so titles alphabetize by their significant word.

use crate::model::MediaItem;
use serde::{Deserialize, Serialize};

/// Leading articles ignored for sorting, per language tag.
///
/// Static read-only data, constructed once at compile time.
pub const ARTICLES: &[(&str, &[&str])] = &[
    ("de", &["der", "die", "das", "ein", "eine"]),
    ("en", &["the", "a", "an"]),
    ("fr", &["le", "la", "les", "un", "une", "des"]),
    ("es", &["el", "la", "los", "las", "un", "una", "unos", "unas"]),
];

/// Check whether a lower-cased word is a known article in any language
fn is_article(word: &str) -> bool {
    ARTICLES
        .iter()
        .any(|(_, articles)| articles.contains(&word))
}

/// Derive the sort key for a title.
///
/// Lower-cases and trims the title, then drops the first word when it is a
/// recognized leading article (trailing punctuation on the candidate word is
/// ignored, so "Das! Boot" sorts as "boot"). A title consisting solely of an
/// article is returned lowercased unchanged so the key is never empty.
pub fn sort_key(title: &str) -> String {
    let lower = title.trim().to_lowercase();

    let mut parts = lower.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().map(str::trim).unwrap_or("");

    let candidate = first.trim_end_matches(|c: char| !c.is_alphanumeric());

    if !rest.is_empty() && is_article(candidate) {
        rest.to_string()
    } else {
        lower
    }
}

/// Display order for the rendered catalog
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Alphabetical by normalized title (default)
    #[default]
    Title,
    /// Ascending by year, items without a year first
    Year,
    /// Movies before TV shows, each group by normalized title
    Type,
}

impl SortMode {
    /// Readable name used on the catalog title page
    pub fn display_name(&self) -> &'static str {
        match self {
            SortMode::Title => "By title (A-Z)",
            SortMode::Year => "By year (oldest first)",
            SortMode::Type => "By type (Movies/TV Shows)",
        }
    }
}

/// Sort items in place for the requested mode.
///
/// Ties always break on the original title string, so the order is
/// deterministic for any input.
pub fn sort_items(items: &mut [MediaItem], mode: SortMode) {
    match mode {
        SortMode::Title => items.sort_by(|a, b| {
            (a.sort_key.as_str(), a.title.as_str()).cmp(&(b.sort_key.as_str(), b.title.as_str()))
        }),
        SortMode::Year => items.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| a.sort_key.cmp(&b.sort_key))
                .then_with(|| a.title.cmp(&b.title))
        }),
        SortMode::Type => items.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.sort_key.cmp(&b.sort_key))
                .then_with(|| a.title.cmp(&b.title))
        }),
    }
}
