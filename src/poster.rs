//! Poster resolution and image preparation
//!
//! Resolution follows the fixed Jellyfin filename priority and falls back
//! to the first image in a sorted directory listing. A missing poster is a
//! normal outcome modeled as `None`, never an error.
//!
//! Preparation decodes a poster, flattens any alpha channel onto white,
//! downscales to a 150 DPI target for the configured print width and
//! re-encodes as JPEG. The transform is pure per image, so callers may run
//! it in parallel without affecting output.

use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Item poster names in strict priority order
const POSTER_NAMES: &[&str] = &[
    "poster.jpg",
    "poster.png",
    "folder.jpg",
    "folder.png",
    "cover.jpg",
    "cover.png",
];

/// Image extensions accepted by the fallback directory listing
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// One PDF point in image-space terms
const POINTS_PER_INCH: f32 = 72.0;
/// Target resolution for embedded posters
const TARGET_DPI: f32 = 150.0;
/// Points per centimeter (A4 layout works in cm)
pub const CM: f32 = 28.346_457;

/// Find the best poster candidate in an item directory.
///
/// Returns `None` when the directory holds no image at all.
pub fn resolve_poster(dir: &Path) -> Option<PathBuf> {
    for name in POSTER_NAMES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    first_image_in(dir)
}

/// Find the poster for one season.
///
/// `seasonNN-poster` files in the show's main directory take priority
/// (the Jellyfin convention), then the regular item search runs scoped to
/// the season directory itself.
pub fn resolve_season_poster(show_dir: &Path, season_dir: &Path, number: u32) -> Option<PathBuf> {
    let names = [
        format!("season{:02}-poster.jpg", number),
        format!("season{:02}-poster.png", number),
        format!("season{}-poster.jpg", number),
        format!("season{}-poster.png", number),
    ];

    for dir in [show_dir, season_dir] {
        for name in &names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    resolve_poster(season_dir)
}

/// First image file in a directory, in sorted (stable) name order
fn first_image_in(dir: &Path) -> Option<PathBuf> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| {
                        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
                    })
        })
        .collect();
    images.sort();
    images.into_iter().next()
}

/// A poster re-encoded for embedding in the PDF
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// JPEG bytes ready for a DCTDecode image XObject
    pub jpeg: Vec<u8>,
    /// Pixel dimensions of the encoded JPEG
    pub width_px: u32,
    pub height_px: u32,
    /// Display size on the page, in points
    pub display_width: f32,
    pub display_height: f32,
}

/// Options controlling poster preparation
#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    /// JPEG quality, 1-100
    pub quality: u8,
    /// Maximum display width in points
    pub max_width_pt: f32,
}

/// Decode, scale and re-encode one poster image.
///
/// Display height is capped at min(1.5 x width, 9 cm) so tall posters still
/// fit the page; aspect ratio is always preserved. Images smaller than the
/// pixel target are embedded as-is rather than upscaled.
pub fn prepare_image(path: &Path, opts: &ImageOptions) -> Result<PreparedImage> {
    let img = image::open(path).map_err(|e| Error::Image {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let img = flatten_alpha(img);
    let (src_w, src_h) = img.dimensions();
    let aspect = src_h as f32 / src_w as f32;

    let mut display_width = opts.max_width_pt;
    let mut display_height = display_width * aspect;

    let max_height = (opts.max_width_pt * 1.5).min(9.0 * CM);
    if display_height > max_height {
        display_height = max_height;
        display_width = display_height / aspect;
    }

    let target_w = (display_width / POINTS_PER_INCH * TARGET_DPI) as u32;
    let target_h = (display_height / POINTS_PER_INCH * TARGET_DPI) as u32;

    let resized = if target_w < src_w && target_h < src_h {
        img.resize(target_w.max(1), target_h.max(1), FilterType::Lanczos3)
    } else {
        img
    };

    let (width_px, height_px) = resized.dimensions();
    let rgb = resized.to_rgb8();

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, opts.quality);
    encoder
        .encode(rgb.as_raw(), width_px, height_px, image::ColorType::Rgb8)
        .map_err(|e| Error::Image {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(PreparedImage {
        jpeg,
        width_px,
        height_px,
        display_width,
        display_height,
    })
}

/// Composite a transparent image onto a white background
fn flatten_alpha(img: DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return img;
    }

    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut flat = RgbImage::new(w, h);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        flat.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_image(path: &Path, w: u32, h: u32) {
        let img = RgbImage::from_pixel(w, h, Rgb([40, 60, 80]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_poster_priority_order() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("cover.png"), 4, 6);
        write_image(&dir.path().join("folder.jpg"), 4, 6);

        // folder.jpg outranks cover.png
        let found = resolve_poster(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "folder.jpg");

        write_image(&dir.path().join("poster.jpg"), 4, 6);
        let found = resolve_poster(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "poster.jpg");
    }

    #[test]
    fn test_poster_fallback_first_image_sorted() {
        let dir = TempDir::new().unwrap();
        write_image(&dir.path().join("zz-art.jpg"), 4, 6);
        write_image(&dir.path().join("aa-art.jpg"), 4, 6);

        let found = resolve_poster(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "aa-art.jpg");
    }

    #[test]
    fn test_no_poster_is_none_not_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("movie.nfo"), "<movie/>").unwrap();
        assert!(resolve_poster(dir.path()).is_none());
    }

    #[test]
    fn test_season_poster_in_show_dir_wins() {
        let show = TempDir::new().unwrap();
        let season = show.path().join("Season 02");
        std::fs::create_dir(&season).unwrap();
        write_image(&show.path().join("season02-poster.jpg"), 4, 6);
        write_image(&season.join("poster.jpg"), 4, 6);

        let found = resolve_season_poster(show.path(), &season, 2).unwrap();
        assert_eq!(found.file_name().unwrap(), "season02-poster.jpg");
        assert_eq!(found.parent().unwrap(), show.path());
    }

    #[test]
    fn test_season_poster_falls_back_to_season_dir() {
        let show = TempDir::new().unwrap();
        let season = show.path().join("Season 01");
        std::fs::create_dir(&season).unwrap();
        write_image(&season.join("folder.png"), 4, 6);

        let found = resolve_season_poster(show.path(), &season, 1).unwrap();
        assert_eq!(found.file_name().unwrap(), "folder.png");
    }

    #[test]
    fn test_prepare_image_produces_jpeg_within_bounds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("poster.png");
        write_image(&path, 600, 900);

        let opts = ImageOptions {
            quality: 75,
            max_width_pt: 4.0 * CM,
        };
        let prepared = prepare_image(&path, &opts).unwrap();

        assert!(!prepared.jpeg.is_empty());
        // JPEG SOI marker
        assert_eq!(&prepared.jpeg[..2], &[0xFF, 0xD8]);
        assert!(prepared.display_width <= 4.0 * CM + 0.01);
        assert!(prepared.display_height <= 6.0 * CM + 0.01);
        // 600x900 is larger than the 150 DPI target, so it was downscaled
        assert!(prepared.width_px < 600);
    }

    #[test]
    fn test_prepare_image_never_upscales() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.jpg");
        write_image(&path, 20, 30);

        let opts = ImageOptions {
            quality: 75,
            max_width_pt: 4.0 * CM,
        };
        let prepared = prepare_image(&path, &opts).unwrap();
        assert_eq!((prepared.width_px, prepared.height_px), (20, 30));
    }

    #[test]
    fn test_prepare_image_missing_file_is_error() {
        let opts = ImageOptions {
            quality: 75,
            max_width_pt: 4.0 * CM,
        };
        assert!(prepare_image(Path::new("/nonexistent/poster.jpg"), &opts).is_err());
    }
}
