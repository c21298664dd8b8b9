//! Jellyfin Catalog - printable PDF catalogs from a media library
//!
//! This library provides functionality for turning a Jellyfin-style media
//! library into a PDF catalog:
//! - Recursive scanning of Movies/ and TV Shows/ subtrees
//! - NFO sidecar metadata extraction (title, year, plot, streams)
//! - Poster resolution by filename priority, with resize + re-encode
//! - Locale-aware title sorting that ignores leading articles
//! - PDF rendering with per-item poster and season overview

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod nfo;
pub mod poster;
pub mod render;
pub mod scan;
pub mod sort;

pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use error::{Error, ExtractionError, Result};
pub use model::{AudioTrack, MediaItem, MediaKind, ScanWarning, SeasonItem};
pub use render::{RenderOptions, render};
pub use scan::{ScanResult, scan};
pub use sort::{SortMode, sort_items, sort_key};
