//! Jellyfin Catalog - printable PDF catalogs from a media library
//!
//! A CLI tool that scans a Jellyfin-style library, extracts metadata from
//! NFO sidecar files and poster images, and renders a PDF catalog.

use anyhow::Result;
use clap::Parser;
use jellyfin_catalog::{Cli, Config, RenderOptions, render, scan, sort_items};
use std::time::Instant;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Unified colors and formatting for command-line output.

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    /// Print a separator line
    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    /// Print a success message
    pub fn print_success(msg: &str) {
        let _ = stdout().execute(Print(style("✓ ").with(CliTheme::SUCCESS).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a warning message
    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print an error message
    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a key-value pair
    pub fn print_key_value(key: &str, value: &str, value_color: Option<Color>) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = match value_color {
            Some(color) => style(value).with(color),
            None => style(value).bold(),
        };
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print a statistics item
    pub fn print_stat(key: &str, value: &str, color: Color) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = style(value).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print an empty line
    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_sample_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    setup_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Jellyfin Catalog starting"
    );

    let config = load_config(&cli)?;

    if cli.verbose {
        info!(?config, "Configuration loaded");
    }

    // Validate option values before any I/O
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        cli_output::print_error(&e.to_string());
        std::process::exit(2);
    }

    match run(&config) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(error = %e, "Catalog generation failed");
            cli_output::print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}

/// Run the scan-sort-render pipeline for a validated configuration
fn run(config: &Config) -> jellyfin_catalog::Result<()> {
    use cli_output::*;

    let start = Instant::now();

    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .ok(); // Ignore if already initialized
    }

    let mut result = scan(&config.root)?;

    let movies = result
        .items
        .iter()
        .filter(|i| i.kind == jellyfin_catalog::MediaKind::Movie)
        .count();
    let shows = result.items.len() - movies;

    sort_items(&mut result.items, config.sort);

    let opts = RenderOptions {
        quality: config.quality,
        poster_width_cm: config.poster_width_cm,
        season_width_cm: config.season_width_cm,
        sort: config.sort,
    };
    render(&result.items, &opts, &config.output)?;

    // Summary
    print_separator();
    print_blank();
    print_stat("Movies", &movies.to_string(), CliTheme::ACCENT);
    print_stat("TV Shows", &shows.to_string(), CliTheme::ACCENT);
    print_stat(
        "Warnings",
        &result.warnings.len().to_string(),
        if result.warnings.is_empty() {
            CliTheme::SUCCESS
        } else {
            CliTheme::WARNING
        },
    );
    print_blank();

    if !result.warnings.is_empty() {
        print_separator();
        print_warning(&format!(
            "{} item(s) skipped or partially read:",
            result.warnings.len()
        ));
        print_blank();
        for warning in &result.warnings {
            print_key_value(
                &warning.path.display().to_string(),
                &warning.message,
                Some(CliTheme::WARNING),
            );
        }
        print_blank();
    }

    if result.items.is_empty() {
        print_warning("No media found - wrote an empty catalog");
    }

    print_separator();
    print_success(&format!(
        "Catalog successfully created: {}",
        config.output.display()
    ));
    print_key_value(
        "Settings",
        &format!(
            "quality {}%, poster width {}cm, season width {}cm",
            config.quality, config.poster_width_cm, config.season_width_cm
        ),
        None,
    );
    print_key_value(
        "Processing time",
        &format_elapsed(start.elapsed().as_secs_f64()),
        None,
    );

    info!(
        output = %config.output.display(),
        items = result.items.len(),
        warnings = result.warnings.len(),
        "Catalog complete"
    );

    Ok(())
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging to stderr
fn setup_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

/// Format elapsed seconds as "12.3 seconds" or "2m 3.4s"
fn format_elapsed(elapsed: f64) -> String {
    if elapsed < 60.0 {
        format!("{:.1} seconds", elapsed)
    } else {
        let minutes = (elapsed / 60.0) as u64;
        let seconds = elapsed % 60.0;
        format!("{}m {:.1}s", minutes, seconds)
    }
}
