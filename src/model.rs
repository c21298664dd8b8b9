//! Data model for scanned media items

use std::fmt;
use std::path::PathBuf;

/// Kind of a scanned media item
///
/// The derived ordering (movies before shows) is what the `type` sort
/// mode relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MediaKind {
    /// A movie directory under `Movies/`
    Movie,
    /// A TV show directory under `TV Shows/`
    Show,
}

impl MediaKind {
    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Show => "TV Show",
        }
    }
}

/// One audio stream extracted from an NFO `streamdetails` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    /// Readable language name (e.g. "English"), if present
    pub language: Option<String>,
    /// Codec name, upper-cased (e.g. "DTS")
    pub codec: Option<String>,
    /// Channel count
    pub channels: Option<u32>,
}

impl fmt::Display for AudioTrack {
    /// Formats as "English DTS 6ch", skipping absent parts
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(ref lang) = self.language {
            parts.push(lang.clone());
        }
        if let Some(ref codec) = self.codec {
            parts.push(codec.clone());
        }
        if let Some(channels) = self.channels {
            parts.push(format!("{}ch", channels));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Per-season record nested under a show item
///
/// Owned exclusively by its parent [`MediaItem`].
#[derive(Debug, Clone)]
pub struct SeasonItem {
    /// Season number parsed from the directory name
    pub number: u32,
    /// Count of per-episode description files in the season directory
    pub episode_count: usize,
    /// Resolved season poster, if any
    pub poster: Option<PathBuf>,
}

/// One movie or TV show assembled from a library directory
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub kind: MediaKind,
    /// Displayed title, never mutated after construction
    pub title: String,
    /// Ordering key derived from `title` via [`crate::sort::sort_key`]
    pub sort_key: String,
    pub year: Option<i32>,
    pub plot: String,
    /// Audio streams in document order
    pub audio_tracks: Vec<AudioTrack>,
    /// Deduplicated subtitle languages in document order
    pub subtitle_languages: Vec<String>,
    pub poster: Option<PathBuf>,
    /// Seasons in ascending number order; always empty for movies
    pub seasons: Vec<SeasonItem>,
}

impl MediaItem {
    /// Total episode count across all seasons
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episode_count).sum()
    }
}

/// A non-fatal problem recorded while scanning one item
#[derive(Debug, Clone)]
pub struct ScanWarning {
    /// Directory or file the warning refers to
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
