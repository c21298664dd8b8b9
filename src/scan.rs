//! Library scanner
//!
//! Walks the `Movies/` and `TV Shows/` subtrees of a library root and
//! assembles media records. The scan is a result-collecting fold: every
//! per-item failure becomes a [`ScanWarning`] and the walk continues, so a
//! single bad description file never aborts the run. Only a missing or
//! unreadable root is fatal.

use crate::error::{Error, Result};
use crate::model::{AudioTrack, MediaItem, MediaKind, ScanWarning, SeasonItem};
use crate::nfo;
use crate::poster;
use crate::sort;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Matches season directory names like "Season 01" or "season 1"
static SEASON_DIR: OnceLock<Regex> = OnceLock::new();

fn season_dir_regex() -> &'static Regex {
    SEASON_DIR.get_or_init(|| Regex::new(r"(?i)^season\s*(\d+)$").unwrap())
}

/// Everything one scan pass produces
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Items in directory-traversal order; display order is imposed later
    pub items: Vec<MediaItem>,
    pub warnings: Vec<ScanWarning>,
}

/// Scan a library root for movies and TV shows.
///
/// `Movies` and `TV Shows` are matched case-insensitively directly under
/// the root. Absence of either is fine; absence of both yields an empty
/// catalog plus a warning. A missing root is the only fatal case.
pub fn scan(root: &Path) -> Result<ScanResult> {
    if !root.is_dir() {
        return Err(Error::Path {
            path: root.to_path_buf(),
        });
    }

    info!(root = %root.display(), "Scanning media library");

    let mut result = ScanResult::default();

    let movies_dir = find_subdir(root, "movies")?;
    let shows_dir = find_subdir(root, "tv shows")?;

    if movies_dir.is_none() && shows_dir.is_none() {
        warn!(root = %root.display(), "Neither Movies nor TV Shows found under root");
        result.warnings.push(ScanWarning {
            path: root.to_path_buf(),
            message: "no Movies or TV Shows directory found".to_string(),
        });
        return Ok(result);
    }

    if let Some(dir) = movies_dir {
        for child in child_dirs(&dir) {
            scan_movie(&child, &mut result);
        }
    }

    if let Some(dir) = shows_dir {
        for child in child_dirs(&dir) {
            scan_show(&child, &mut result);
        }
    }

    if result.items.is_empty() {
        warn!(root = %root.display(), "No media items found");
        result.warnings.push(ScanWarning {
            path: root.to_path_buf(),
            message: "no media items found".to_string(),
        });
    }

    info!(
        items = result.items.len(),
        warnings = result.warnings.len(),
        "Scan complete"
    );
    Ok(result)
}

/// Case-insensitive lookup of a subdirectory directly under `root`
fn find_subdir(root: &Path, name: &str) -> Result<Option<PathBuf>> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Immediate child directories in sorted traversal order
fn child_dirs(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

/// Scan one movie directory. Pushes a record or a warning, never fails.
fn scan_movie(dir: &Path, result: &mut ScanResult) {
    let Some(nfo_path) = find_movie_nfo(dir) else {
        debug!(dir = %dir.display(), "No movie description file, skipping directory");
        return;
    };

    match read_nfo(&nfo_path) {
        Ok(data) => {
            result.items.push(build_item(MediaKind::Movie, dir, data));
        }
        Err(issue) => handle_extraction_failure(MediaKind::Movie, dir, issue, result),
    }
}

/// Scan one show directory, including its seasons.
fn scan_show(dir: &Path, result: &mut ScanResult) {
    let Some(nfo_path) = find_named_nfo(dir, "tvshow.nfo") else {
        debug!(dir = %dir.display(), "No tvshow.nfo, skipping directory");
        return;
    };

    let seasons = collect_seasons(dir);

    match read_nfo(&nfo_path) {
        Ok(mut data) => {
            // Shows rarely carry stream details themselves; fall back to
            // the first episode of the first season.
            if data.audio_tracks.is_empty() && data.subtitle_languages.is_empty() {
                if let Some((audio, subs)) = episode_stream_details(dir, &seasons) {
                    data.audio_tracks = audio;
                    data.subtitle_languages = subs;
                }
            }
            let mut item = build_item(MediaKind::Show, dir, data);
            item.seasons = seasons;
            result.items.push(item);
        }
        Err(issue) => handle_extraction_failure(MediaKind::Show, dir, issue, result),
    }
}

/// A per-item failure with whatever the extractor salvaged
struct ScanIssue {
    warning: ScanWarning,
    recovered_title: Option<String>,
}

/// Apply the partial-inclusion policy for a failed extraction.
///
/// When the title was recoverable the item is kept title-only; otherwise
/// it is skipped. Either way exactly one warning is recorded.
fn handle_extraction_failure(
    kind: MediaKind,
    dir: &Path,
    issue: ScanIssue,
    result: &mut ScanResult,
) {
    if let Some(title) = issue.recovered_title {
        result.items.push(MediaItem {
            kind,
            sort_key: sort::sort_key(&title),
            title,
            year: None,
            plot: String::new(),
            audio_tracks: vec![],
            subtitle_languages: vec![],
            poster: poster::resolve_poster(dir),
            seasons: vec![],
        });
    }
    warn!(
        path = %issue.warning.path.display(),
        message = %issue.warning.message,
        "Malformed description file"
    );
    result.warnings.push(issue.warning);
}

/// Read and extract one NFO file, mapping failures to a scan issue
fn read_nfo(path: &Path) -> std::result::Result<nfo::NfoData, ScanIssue> {
    let contents = fs::read_to_string(path).map_err(|e| ScanIssue {
        warning: ScanWarning {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
        recovered_title: None,
    })?;

    nfo::extract(&contents).map_err(|e| ScanIssue {
        warning: ScanWarning {
            path: path.to_path_buf(),
            message: e.message.clone(),
        },
        recovered_title: e.recovered_title,
    })
}

fn build_item(kind: MediaKind, dir: &Path, data: nfo::NfoData) -> MediaItem {
    let title = data.title.unwrap_or_else(|| "Unknown".to_string());
    MediaItem {
        kind,
        sort_key: sort::sort_key(&title),
        title,
        year: data.year,
        plot: data.plot,
        audio_tracks: data.audio_tracks,
        subtitle_languages: data.subtitle_languages,
        poster: poster::resolve_poster(dir),
        seasons: vec![],
    }
}

/// Locate the movie description file in a directory.
///
/// `movie.nfo` wins; otherwise any `.nfo` whose root element sniffs as
/// `<movie>` is accepted.
fn find_movie_nfo(dir: &Path) -> Option<PathBuf> {
    if let Some(path) = find_named_nfo(dir, "movie.nfo") {
        return Some(path);
    }

    for path in nfo_files(dir) {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name == "tvshow.nfo" {
            continue;
        }
        if let Ok(contents) = fs::read_to_string(&path) {
            if nfo::sniff_root_tag(&contents).as_deref() == Some("movie") {
                return Some(path);
            }
        }
    }
    None
}

/// Case-insensitive lookup of an exactly-named NFO file
fn find_named_nfo(dir: &Path, name: &str) -> Option<PathBuf> {
    nfo_files(dir).into_iter().find(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    })
}

/// All `.nfo` files directly inside a directory, sorted by name
fn nfo_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("nfo"))
        })
        .collect();
    files.sort();
    files
}

/// Enumerate `Season NN` subdirectories of a show, ascending by number.
///
/// Episode count is the number of per-episode description files in the
/// season directory; season-level NFOs are excluded from the count.
fn collect_seasons(show_dir: &Path) -> Vec<SeasonItem> {
    let mut seasons: Vec<SeasonItem> = child_dirs(show_dir)
        .into_iter()
        .filter_map(|season_dir| {
            let name = season_dir.file_name()?.to_str()?.to_string();
            let caps = season_dir_regex().captures(&name)?;
            let number: u32 = caps.get(1)?.as_str().parse().ok()?;

            let episode_count = nfo_files(&season_dir)
                .iter()
                .filter(|path| {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|s| !s.to_lowercase().starts_with("season"))
                })
                .count();

            Some(SeasonItem {
                number,
                episode_count,
                poster: poster::resolve_season_poster(show_dir, &season_dir, number),
            })
        })
        .collect();

    seasons.sort_by_key(|s| s.number);
    seasons
}

/// Pull audio/subtitle details from the first episode NFO of the first
/// season, used when the show NFO has none of its own.
fn episode_stream_details(
    show_dir: &Path,
    seasons: &[SeasonItem],
) -> Option<(Vec<AudioTrack>, Vec<String>)> {
    let first = seasons.first()?;

    let season_dir = child_dirs(show_dir).into_iter().find(|dir| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .and_then(|name| season_dir_regex().captures(name))
            .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            == Some(first.number)
    })?;

    let episode_nfo = nfo_files(&season_dir).into_iter().find(|path| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| !s.to_lowercase().starts_with("season"))
    })?;

    let contents = fs::read_to_string(&episode_nfo).ok()?;
    let data = nfo::extract(&contents).ok()?;
    if data.audio_tracks.is_empty() && data.subtitle_languages.is_empty() {
        return None;
    }
    Some((data.audio_tracks, data.subtitle_languages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::{SortMode, sort_items};
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn movie_nfo(title: &str, year: &str, plot: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<movie>
    <title>{title}</title>
    <year>{year}</year>
    <plot>{plot}</plot>
    <fileinfo>
        <streamdetails>
            <audio>
                <codec>DTS</codec>
                <language>eng</language>
                <channels>6</channels>
            </audio>
            <subtitle>
                <language>ger</language>
            </subtitle>
        </streamdetails>
    </fileinfo>
</movie>"#
        )
    }

    fn tvshow_nfo(title: &str, year: &str, plot: &str) -> String {
        format!(
            "<tvshow><title>{title}</title><year>{year}</year><plot>{plot}</plot></tvshow>"
        )
    }

    fn episode_nfo(num: u32) -> String {
        format!(
            r#"<episodedetails>
    <title>Episode {num}</title>
    <fileinfo>
        <streamdetails>
            <audio><codec>AAC</codec><language>eng</language><channels>2</channels></audio>
            <subtitle><language>eng</language></subtitle>
        </streamdetails>
    </fileinfo>
</episodedetails>"#
        )
    }

    fn add_movie(root: &Path, dir_name: &str, title: &str, year: &str) {
        let dir = root.join("Movies").join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("movie.nfo"), movie_nfo(title, year, "A plot.")).unwrap();
    }

    fn add_show(root: &Path, name: &str, title: &str, year: &str, seasons: &[(u32, usize)]) {
        let dir = root.join("TV Shows").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("tvshow.nfo"), tvshow_nfo(title, year, "A plot.")).unwrap();
        for &(num, episodes) in seasons {
            let season_dir = dir.join(format!("Season {:02}", num));
            fs::create_dir_all(&season_dir).unwrap();
            for ep in 1..=episodes {
                fs::write(
                    season_dir.join(format!("S{:02}E{:02}.nfo", num, ep)),
                    episode_nfo(ep as u32),
                )
                .unwrap();
            }
        }
    }

    fn write_image(path: &Path) {
        RgbImage::from_pixel(4, 6, Rgb([10, 20, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let err = scan(Path::new("/nonexistent/library")).unwrap_err();
        assert!(matches!(err, Error::Path { .. }));
    }

    #[test]
    fn test_empty_root_yields_warning_not_error() {
        let root = TempDir::new().unwrap();
        let result = scan(root.path()).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_scans_movies_and_shows() {
        let root = TempDir::new().unwrap();
        add_movie(root.path(), "Inception (2010)", "Inception", "2010");
        add_show(root.path(), "Breaking Bad", "Breaking Bad", "2008", &[(1, 7), (2, 13)]);

        let result = scan(root.path()).unwrap();
        assert!(result.warnings.is_empty());
        assert_eq!(result.items.len(), 2);

        let movie = result
            .items
            .iter()
            .find(|i| i.kind == MediaKind::Movie)
            .unwrap();
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.year, Some(2010));
        assert_eq!(movie.audio_tracks.len(), 1);
        assert_eq!(movie.subtitle_languages, vec!["German"]);

        let show = result
            .items
            .iter()
            .find(|i| i.kind == MediaKind::Show)
            .unwrap();
        assert_eq!(show.title, "Breaking Bad");
        assert_eq!(show.seasons.len(), 2);
        assert_eq!(show.seasons[0].number, 1);
        assert_eq!(show.seasons[0].episode_count, 7);
        assert_eq!(show.seasons[1].episode_count, 13);
        // Stream details fell back to the first episode
        assert_eq!(show.audio_tracks.len(), 1);
        assert_eq!(show.audio_tracks[0].codec.as_deref(), Some("AAC"));
    }

    #[test]
    fn test_case_insensitive_subtree_names() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("movies").join("Pi (1998)");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("movie.nfo"), movie_nfo("Pi", "1998", "Math.")).unwrap();

        let result = scan(root.path()).unwrap();
        assert_eq!(result.items.len(), 1);
    }

    #[test]
    fn test_movie_nfo_sniffed_by_root_tag() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("Movies").join("Heat (1995)");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Heat.nfo"), movie_nfo("Heat", "1995", "Crime.")).unwrap();

        let result = scan(root.path()).unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].title, "Heat");
    }

    #[test]
    fn test_malformed_nfo_warns_and_scan_continues() {
        let root = TempDir::new().unwrap();
        add_movie(root.path(), "Inception (2010)", "Inception", "2010");

        let bad = root.path().join("Movies").join("Broken (2000)");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("movie.nfo"), "<movie><title>Broken</fileinfo>").unwrap();

        let result = scan(root.path()).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].path.starts_with(&bad));
        // The good item survived
        assert!(result.items.iter().any(|i| i.title == "Inception"));
    }

    #[test]
    fn test_missing_year_survives() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("Movies").join("Pi");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("movie.nfo"), "<movie><title>Pi</title></movie>").unwrap();
        add_movie(root.path(), "Inception (2010)", "Inception", "2010");

        let result = scan(root.path()).unwrap();
        assert_eq!(result.items.len(), 2);
        let pi = result.items.iter().find(|i| i.title == "Pi").unwrap();
        assert_eq!(pi.year, None);
    }

    #[test]
    fn test_episode_count_independent_of_poster() {
        let root = TempDir::new().unwrap();
        add_show(root.path(), "Show1", "Show1", "2020", &[(1, 3)]);

        let result = scan(root.path()).unwrap();
        let show = &result.items[0];
        assert_eq!(show.seasons[0].episode_count, 3);
        assert!(show.seasons[0].poster.is_none());

        // Adding a poster must not change the count
        let season_dir = root.path().join("TV Shows").join("Show1").join("Season 01");
        write_image(&season_dir.join("poster.jpg"));
        let result = scan(root.path()).unwrap();
        assert_eq!(result.items[0].seasons[0].episode_count, 3);
        assert!(result.items[0].seasons[0].poster.is_some());
    }

    #[test]
    fn test_end_to_end_sorting() {
        let root = TempDir::new().unwrap();
        add_movie(root.path(), "Inception (2010)", "Inception", "2010");
        add_movie(root.path(), "Das Boot (1981)", "Das Boot", "1981");

        let mut result = scan(root.path()).unwrap();

        sort_items(&mut result.items, SortMode::Title);
        let titles: Vec<&str> = result.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Das Boot", "Inception"]);

        sort_items(&mut result.items, SortMode::Year);
        let years: Vec<Option<i32>> = result.items.iter().map(|i| i.year).collect();
        assert_eq!(years, vec![Some(1981), Some(2010)]);
    }

    #[test]
    fn test_item_poster_resolution() {
        let root = TempDir::new().unwrap();
        add_movie(root.path(), "Inception (2010)", "Inception", "2010");
        let dir = root.path().join("Movies").join("Inception (2010)");
        write_image(&dir.join("folder.jpg"));

        let result = scan(root.path()).unwrap();
        let poster = result.items[0].poster.as_ref().unwrap();
        assert_eq!(poster.file_name().unwrap(), "folder.jpg");
    }
}
