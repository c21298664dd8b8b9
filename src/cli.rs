//! CLI argument parsing with clap

use crate::config::{Config, DEFAULT_OUTPUT};
use crate::sort::SortMode;
use clap::Parser;
use std::path::PathBuf;

/// Jellyfin Catalog - printable PDF catalog from a media library
///
/// Scans a Jellyfin-style library (Movies/ and "TV Shows"/ subtrees),
/// reads sidecar NFO files and poster images, and renders a PDF catalog
/// sorted by title, year or type.
#[derive(Parser, Debug)]
#[command(name = "jellyfin-catalog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the media library root
    pub root: Option<PathBuf>,

    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Sorting: title, year or type
    #[arg(short, long, value_enum)]
    pub sort: Option<SortMode>,

    /// Output PDF path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JPEG quality for poster images, 1-100 (higher = better quality but larger file)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Maximum poster width in cm
    #[arg(short = 'w', long = "poster-width")]
    pub poster_width: Option<f32>,

    /// Maximum season poster width in cm
    #[arg(long = "season-width")]
    pub season_width: Option<f32>,

    /// Number of threads for poster re-encoding (0 = auto)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub print_sample_config: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref root) = self.root {
            config.root = root.clone();
        }
        if let Some(sort) = self.sort {
            config.sort = sort;
        }
        if let Some(ref output) = self.output {
            config.output = output.clone();
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(width) = self.poster_width {
            config.poster_width_cm = width;
        }
        if let Some(width) = self.season_width {
            config.season_width_cm = width;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
