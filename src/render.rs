//! PDF catalog rendering
//!
//! Builds the output document directly from lopdf content streams: A4
//! pages with 2 cm margins, the built-in Helvetica family and posters
//! embedded as DCTDecode image XObjects (they are already JPEG after
//! preparation, so the bytes go in verbatim).
//!
//! Poster preparation runs in a rayon pool since each image is an
//! independent pure transform; the rendered document is identical whether
//! that step runs sequentially or in parallel.

use crate::error::Result;
use crate::model::{MediaItem, MediaKind};
use crate::poster::{self, CM, ImageOptions, PreparedImage};
use crate::sort::SortMode;
use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 2.0 * CM;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Approximate advance width of Helvetica as a fraction of the font size,
/// used for wrapping and centering without embedding font metrics.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// Longest plot excerpt shown per item
const PLOT_LIMIT: usize = 500;

/// Rendering parameters taken from the validated configuration
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub quality: u8,
    pub poster_width_cm: f32,
    pub season_width_cm: f32,
    pub sort: SortMode,
}

/// Render the sorted item list into a PDF file at `output`.
///
/// An empty item list still produces a valid (empty-catalog) document.
pub fn render(items: &[MediaItem], opts: &RenderOptions, output: &Path) -> Result<()> {
    info!(items = items.len(), output = %output.display(), "Rendering catalog");

    let posters = prepare_posters(items, opts);
    let mut writer = PageWriter::new(&posters);

    writer.title_page(items.len(), opts.sort)?;
    writer.statistics_page(items)?;
    writer.media_items(items)?;

    writer.save(output)?;
    info!(output = %output.display(), "Catalog written");
    Ok(())
}

/// Key distinguishing the two display sizes a poster file can be used at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PosterKey {
    path: PathBuf,
    season: bool,
}

/// Re-encode every referenced poster in parallel.
///
/// Decode or encode failures are logged and the poster is simply dropped;
/// the item still renders without an image.
fn prepare_posters(
    items: &[MediaItem],
    opts: &RenderOptions,
) -> HashMap<PosterKey, PreparedImage> {
    let item_opts = ImageOptions {
        quality: opts.quality,
        max_width_pt: opts.poster_width_cm * CM,
    };
    let season_opts = ImageOptions {
        quality: opts.quality,
        max_width_pt: opts.season_width_cm * CM,
    };

    let mut jobs: Vec<(PosterKey, ImageOptions)> = Vec::new();
    for item in items {
        if let Some(ref path) = item.poster {
            jobs.push((
                PosterKey {
                    path: path.clone(),
                    season: false,
                },
                item_opts,
            ));
        }
        for season in &item.seasons {
            if let Some(ref path) = season.poster {
                jobs.push((
                    PosterKey {
                        path: path.clone(),
                        season: true,
                    },
                    season_opts,
                ));
            }
        }
    }
    jobs.sort_by(|a, b| (&a.0.path, a.0.season).cmp(&(&b.0.path, b.0.season)));
    jobs.dedup_by(|a, b| a.0 == b.0);

    jobs.into_par_iter()
        .filter_map(|(key, opts)| match poster::prepare_image(&key.path, &opts) {
            Ok(prepared) => Some((key, prepared)),
            Err(e) => {
                warn!(path = %key.path.display(), error = %e, "Failed to prepare poster, rendering without it");
                None
            }
        })
        .collect()
}

/// Incremental page builder over a lopdf document
struct PageWriter {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    images: HashMap<PosterKey, (String, PreparedImage)>,
    ops: Vec<Operation>,
    /// Current baseline, measured from the page bottom
    y: f32,
}

impl PageWriter {
    fn new(posters: &HashMap<PosterKey, PreparedImage>) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();

        // Embed all posters up front; every page shares one resource dict
        let mut images = HashMap::new();
        let mut xobjects = Dictionary::new();
        let mut keys: Vec<&PosterKey> = posters.keys().collect();
        keys.sort_by(|a, b| (&a.path, a.season).cmp(&(&b.path, b.season)));
        for (index, key) in keys.into_iter().enumerate() {
            let prepared = &posters[key];
            let name = format!("Im{}", index);
            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => prepared.width_px as i64,
                    "Height" => prepared.height_px as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                prepared.jpeg.clone(),
            );
            let id = doc.add_object(stream);
            xobjects.set(name.clone(), Object::Reference(id));
            images.insert(key.clone(), (name, prepared.clone()));
        }

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let oblique = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Oblique",
            "Encoding" => "WinAnsiEncoding",
        });

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
                "F3" => oblique,
            },
            "XObject" => xobjects,
        };
        doc.objects
            .insert(resources_id, Object::Dictionary(resources));

        Self {
            doc,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            images,
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Close the current page and start a fresh one
    fn flush_page(&mut self) -> Result<()> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => self.resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });
        self.page_ids.push(page_id);
        self.y = PAGE_HEIGHT - MARGIN;
        Ok(())
    }

    /// Break the page when fewer than `needed` points remain
    fn ensure_space(&mut self, needed: f32) -> Result<()> {
        let usable = PAGE_HEIGHT - 2.0 * MARGIN;
        if self.y - needed.min(usable) < MARGIN {
            self.flush_page()?;
        }
        Ok(())
    }

    fn text_at(&mut self, x: f32, y: f32, font: &str, size: f32, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_text(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Draw one line at the cursor and advance it
    fn line(&mut self, font: &str, size: f32, leading: f32, text: &str) {
        self.y -= size;
        self.text_at(MARGIN, self.y, font, size, text);
        self.y -= leading - size;
    }

    fn centered_line(&mut self, font: &str, size: f32, leading: f32, text: &str) {
        let width = text.chars().count() as f32 * size * AVG_CHAR_WIDTH;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        self.y -= size;
        self.text_at(x, self.y, font, size, text);
        self.y -= leading - size;
    }

    fn image_at(&mut self, name: &str, x: f32, y: f32, width: f32, height: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                width.into(),
                0.into(),
                0.into(),
                height.into(),
                x.into(),
                y.into(),
            ],
        ));
        self.ops.push(Operation::new("Do", vec![name.into()]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Light horizontal rule across the content width
    fn separator(&mut self) {
        self.y -= 10.0;
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("G", vec![0.8_f32.into()]));
        self.ops.push(Operation::new("w", vec![0.5_f32.into()]));
        self.ops
            .push(Operation::new("m", vec![MARGIN.into(), self.y.into()]));
        self.ops.push(Operation::new(
            "l",
            vec![(PAGE_WIDTH - MARGIN).into(), self.y.into()],
        ));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
        self.y -= 12.0;
    }

    fn title_page(&mut self, item_count: usize, sort: SortMode) -> Result<()> {
        self.y -= 3.0 * CM;
        self.centered_line("F2", 24.0, 40.0, "Media Catalog");
        self.y -= 1.0 * CM;
        self.centered_line("F1", 12.0, 18.0, &format!("Number of media: {}", item_count));
        self.centered_line("F1", 12.0, 18.0, &format!("Sorting: {}", sort.display_name()));
        self.centered_line(
            "F1",
            12.0,
            18.0,
            &format!("Created on: {}", Local::now().format("%Y-%m-%d")),
        );
        self.flush_page()
    }

    fn statistics_page(&mut self, items: &[MediaItem]) -> Result<()> {
        let movies = items.iter().filter(|i| i.kind == MediaKind::Movie).count();
        let shows = items.iter().filter(|i| i.kind == MediaKind::Show).count();

        self.line("F2", 18.0, 30.0, "Statistics");
        self.line("F1", 11.0, 18.0, &format!("Movies: {}", movies));
        self.line("F1", 11.0, 18.0, &format!("TV Shows: {}", shows));
        self.line("F1", 11.0, 18.0, &format!("Total: {}", items.len()));
        self.flush_page()
    }

    fn media_items(&mut self, items: &[MediaItem]) -> Result<()> {
        self.line("F2", 18.0, 30.0, "Media Catalog");

        for item in items {
            debug!(title = %item.title, "Rendering item");
            self.media_item(item)?;
        }
        Ok(())
    }

    fn media_item(&mut self, item: &MediaItem) -> Result<()> {
        let poster = item.poster.as_ref().and_then(|path| {
            self.images
                .get(&PosterKey {
                    path: path.clone(),
                    season: false,
                })
                .cloned()
        });

        let plot = plot_excerpt(&item.plot);
        let text_x = match poster {
            Some((_, ref img)) => MARGIN + img.display_width + 14.0,
            None => MARGIN,
        };
        let text_width = PAGE_WIDTH - MARGIN - text_x;
        let plot_lines = wrap_text(&plot, 10.0, text_width);

        let body_height = match poster {
            Some((_, ref img)) => img.display_height.max(plot_lines.len() as f32 * 13.0),
            None => plot_lines.len() as f32 * 13.0,
        };
        let estimate = 60.0 + body_height;
        self.ensure_space(estimate)?;

        // Title and info lines
        self.line("F2", 16.0, 22.0, &item.title);
        self.line("F3", 10.0, 14.0, &info_line(item));

        let tech = tech_line(item);
        if !tech.is_empty() {
            self.line("F1", 9.0, 13.0, &tech);
        }

        // Poster beside the wrapped plot
        let top = self.y;
        if let Some((name, img)) = poster {
            self.image_at(
                &name,
                MARGIN,
                top - img.display_height,
                img.display_width,
                img.display_height,
            );
        }
        let mut text_y = top;
        for line in &plot_lines {
            text_y -= 10.0;
            self.text_at(text_x, text_y, "F1", 10.0, line);
            text_y -= 3.0;
        }
        self.y = top - body_height - 8.0;

        if !item.seasons.is_empty() {
            self.season_grid(item)?;
        }

        self.separator();
        Ok(())
    }

    /// Season overview, three cells per row
    fn season_grid(&mut self, item: &MediaItem) -> Result<()> {
        self.ensure_space(24.0)?;
        self.line("F2", 10.0, 16.0, "Seasons:");

        let cell_width = CONTENT_WIDTH / 3.0;
        for row in item.seasons.chunks(3) {
            let posters: Vec<Option<(String, PreparedImage)>> = row
                .iter()
                .map(|season| {
                    season.poster.as_ref().and_then(|path| {
                        self.images
                            .get(&PosterKey {
                                path: path.clone(),
                                season: true,
                            })
                            .cloned()
                    })
                })
                .collect();

            let poster_height = posters
                .iter()
                .flatten()
                .map(|(_, img)| img.display_height)
                .fold(0.0_f32, f32::max);
            let row_height = poster_height + 30.0;
            self.ensure_space(row_height + 6.0)?;

            let top = self.y;
            for (col, (season, poster)) in row.iter().zip(posters).enumerate() {
                let x = MARGIN + col as f32 * cell_width;
                let mut label_y = top - poster_height;
                if let Some((name, img)) = poster {
                    self.image_at(&name, x, top - img.display_height, img.display_width, img.display_height);
                }
                label_y -= 11.0;
                self.text_at(x, label_y, "F2", 10.0, &format!("Season {}", season.number));
                label_y -= 12.0;
                self.text_at(
                    x,
                    label_y,
                    "F3",
                    9.0,
                    &format!("{} episodes", season.episode_count),
                );
            }
            self.y = top - row_height - 6.0;
        }
        Ok(())
    }

    /// Assemble the page tree and write the file
    fn save(mut self, output: &Path) -> Result<()> {
        if !self.ops.is_empty() || self.page_ids.is_empty() {
            self.flush_page()?;
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = self.page_ids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        self.doc.save(output)?;
        Ok(())
    }
}

/// "Movie • 2010" or "TV Show • 2008 • 5 seasons • 62 episodes"
fn info_line(item: &MediaItem) -> String {
    let year = item
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Year unknown".to_string());
    let mut line = format!("{} \u{2022} {}", item.kind.display_name(), year);
    if item.kind == MediaKind::Show && !item.seasons.is_empty() {
        line.push_str(&format!(
            " \u{2022} {} seasons \u{2022} {} episodes",
            item.seasons.len(),
            item.episode_count()
        ));
    }
    line
}

/// "Audio: English DTS 6ch, ... | Subtitles: English, German"
fn tech_line(item: &MediaItem) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !item.audio_tracks.is_empty() {
        let audio: Vec<String> = item.audio_tracks.iter().map(|t| t.to_string()).collect();
        parts.push(format!("Audio: {}", audio.join(", ")));
    }
    if !item.subtitle_languages.is_empty() {
        parts.push(format!("Subtitles: {}", item.subtitle_languages.join(", ")));
    }
    parts.join(" | ")
}

fn plot_excerpt(plot: &str) -> String {
    if plot.is_empty() {
        return "No description available".to_string();
    }
    let mut excerpt: String = plot.chars().take(PLOT_LIMIT).collect();
    if plot.chars().count() > PLOT_LIMIT {
        excerpt.push_str("...");
    }
    excerpt
}

/// Greedy word wrap against the approximate Helvetica advance width
fn wrap_text(text: &str, size: f32, width: f32) -> Vec<String> {
    let max_chars = ((width / (size * AVG_CHAR_WIDTH)) as usize).max(8);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Map text to WinAnsi (Latin-1 compatible) bytes for the Type1 fonts.
///
/// Characters outside that range degrade to '?'; the bullet gets its
/// WinAnsi code point.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95,
            c if (c as u32) < 0x100 => c as u8,
            _ => b'?',
        })
        .collect()
}
