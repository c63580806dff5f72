//! # Cadence
//!
//! Command-line front end: loads the song catalog (from the catalog database
//! or straight from a CSV), then prints statistics or recommendations.
//!
//! ## Usage
//!
//! ```bash
//! # Import the dataset once
//! cadence import data.csv
//!
//! # Explore it
//! cadence overview
//! cadence histogram tempo
//! cadence trends
//!
//! # Recommendations
//! cadence similar "Clair de Lune" -k 5
//! cadence similar "Clair de Lune" --band energy=0.05 --band danceability=0.05
//! cadence playlist "Song 1, Song 2, Song 3"
//! ```

use anyhow::{bail, Context, Result};
use cadence::catalog::Catalog;
use cadence::cli::{self, OutputFormat, SimilarityOptions};
use cadence::config::{self, RuntimeConfig};
use cadence::dataset::{self, LoadOptions};
use cadence::recommend::{self, Query, Tolerance};
use cadence::regression::{LinearModel, POPULARITY};
use cadence::{completion, db, display, stats};
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Prints `value` as JSON, or the text produced by `table`.
fn emit<T: Serialize>(format: OutputFormat, value: &T, table: impl FnOnce() -> String) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
        OutputFormat::Table => table(),
    };
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    Ok(())
}

/// Loads the catalog from `--csv` when given, otherwise from the database.
fn load_catalog(csv: Option<&Path>, db_path: &Path) -> Result<Catalog> {
    if let Some(path) = csv {
        let (catalog, report) = dataset::load_csv(path, &LoadOptions::default())?;
        debug!("Loaded {} songs directly from CSV ({report:?})", catalog.len());
        return Ok(catalog);
    }

    if !db_path.exists() {
        bail!(
            "No catalog database at {}. Run `cadence import <csv>` first, or pass --csv.",
            db_path.display()
        );
    }
    let conn = db::open(db_path)?;
    db::load_catalog(&conn)
}

fn run_similarity(
    catalog: &Catalog,
    query: &Query,
    options: &SimilarityOptions,
    settings: &RuntimeConfig,
    format: OutputFormat,
) -> Result<()> {
    let features = if options.features.is_empty() {
        settings.features.clone()
    } else {
        options.features.clone()
    };
    let k = options.k.unwrap_or(settings.default_k);
    let tolerance: Tolerance = options
        .bands
        .iter()
        .map(|(feature, band)| (feature.clone(), band.unwrap_or(settings.default_band)))
        .collect();

    let recommendations = recommend::recommend(catalog, query, k, &features, Some(&tolerance))
        .context("Recommendation failed")?;
    info!("Found {} recommendations", recommendations.len());

    let shown: Vec<String> = if tolerance.is_empty() {
        features
    } else {
        tolerance.bands().iter().map(|(name, _)| name.clone()).collect()
    };
    let rows = display::recommendation_rows(catalog, &recommendations, &shown);
    emit(format, &rows, || {
        display::render_recommendations(catalog, &recommendations, &shown)
    })
}

/// Main entry point for the Cadence application.
///
/// Initializes logging (controlled via `RUST_LOG`), parses command-line
/// arguments, loads persisted settings and routes commands.
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    let config_path: Option<PathBuf> = match config::get_config_path() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Settings will not be persisted: {e:#}");
            None
        }
    };
    let mut settings = match &config_path {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    let db_path = args.db.clone().unwrap_or_else(|| settings.db_path.clone());
    let csv = args.csv.as_deref();
    let format = args.format;

    match args.command {
        cli::Command::Import { path, force, features } => {
            info!("Importing dataset from: {}", path.display());
            let options = LoadOptions {
                features: (!features.is_empty()).then_some(features),
                ..LoadOptions::default()
            };
            let (catalog, report) = dataset::load_csv(&path, &options)?;

            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let mut conn = if force {
                db::init_database(&db_path, true)?
            } else {
                db::open(&db_path)?
            };
            db::save_catalog(&mut conn, &catalog)?;

            settings.set_dataset(&path)?;
            if let Some(config_path) = &config_path {
                settings.save(config_path)?;
            }

            emit(format, &report, || display::render_load_report(&report, catalog.len()))?;
        }
        cli::Command::List { limit } => {
            let catalog = load_catalog(csv, &db_path)?;
            let songs = catalog.head(limit.unwrap_or(catalog.len()));
            emit(format, &songs, || display::render_songs(&catalog, songs, &[]))?;
        }
        cli::Command::Overview { rows, table: Some(path) } => {
            let table = dataset::load_table(&path)?;
            let summaries = stats::describe_table(&table);

            #[derive(Serialize)]
            struct TableOverview<'a> {
                rows: usize,
                headers: &'a [String],
                head: &'a [Vec<String>],
                summary: &'a [stats::ColumnSummary],
            }
            let overview = TableOverview {
                rows: table.rows.len(),
                headers: &table.headers,
                head: table.head(rows),
                summary: &summaries,
            };
            emit(format, &overview, || {
                format!(
                    "{} rows\n\n{}\n{}",
                    table.rows.len(),
                    display::render_table(&table, rows),
                    display::render_summary(&summaries)
                )
            })?;
        }
        cli::Command::Overview { rows, table: None } => {
            let catalog = load_catalog(csv, &db_path)?;
            let head = catalog.head(rows);
            let summaries = stats::describe(&catalog);

            #[derive(Serialize)]
            struct Overview<'a> {
                songs: usize,
                head: &'a [cadence::song::Song],
                summary: &'a [stats::ColumnSummary],
            }
            let overview = Overview {
                songs: catalog.len(),
                head,
                summary: &summaries,
            };
            emit(format, &overview, || {
                format!(
                    "{} songs\n\n{}\n{}",
                    catalog.len(),
                    display::render_songs(&catalog, head, catalog.schema().names()),
                    display::render_summary(&summaries)
                )
            })?;
        }
        cli::Command::Histogram { feature, bins } => {
            let catalog = load_catalog(csv, &db_path)?;
            let values = catalog.column(&feature)?;
            let histogram = stats::histogram(&values, bins);
            emit(format, &histogram, || display::render_histogram(&feature, &histogram))?;
        }
        cli::Command::Correlation => {
            let catalog = load_catalog(csv, &db_path)?;
            let matrix = stats::correlation_matrix(&catalog);
            emit(format, &matrix, || display::render_correlation(&matrix))?;
        }
        cli::Command::Trends => {
            let catalog = load_catalog(csv, &db_path)?;
            let trend = stats::tempo_trend(&catalog)?;
            let decades = stats::songs_per_decade(&catalog)?;
            let json = serde_json::json!({
                "tempo_by_year": trend,
                "songs_per_decade": decades,
            });
            emit(format, &json, || display::render_trends(&trend, &decades))?;
        }
        cli::Command::Similar { song, options } => {
            let catalog = load_catalog(csv, &db_path)?;
            let id = match catalog.resolve(&song) {
                Some(found) => found.id.clone(),
                None => {
                    warn!("No song matches '{song}'");
                    song
                }
            };
            run_similarity(&catalog, &Query::song(id), &options, &settings, format)?;
        }
        cli::Command::Playlist { songs, options } => {
            let entries = cli::split_playlist(&songs);
            if entries.is_empty() {
                bail!("Playlist is empty. Pass comma-separated song names or ids.");
            }
            let catalog = load_catalog(csv, &db_path)?;
            let ids: Vec<String> = entries
                .into_iter()
                .map(|entry| catalog.resolve(&entry).map_or(entry, |s| s.id.clone()))
                .collect();
            run_similarity(&catalog, &Query::playlist(ids), &options, &settings, format)?;
        }
        cli::Command::Popularity { features } => {
            let catalog = load_catalog(csv, &db_path)?;
            let features = if features.is_empty() {
                settings.features.clone()
            } else {
                features
            };
            let model = LinearModel::fit(&catalog, &features, POPULARITY)?;
            emit(format, &model, || display::render_model(&model))?;
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
        cli::Command::CompleteSongs => {
            let names = completion::get_song_completions(&db_path)?;
            completion::write_song_completions(&mut std::io::stdout().lock(), &names)?;
        }
    }

    Ok(())
}
