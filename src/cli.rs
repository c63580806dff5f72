//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Cadence using Clap
//! derive macros.
//!
//! ## Commands
//!
//! - `import`: Load a CSV dataset into the catalog database
//! - `list`, `overview`: Browse the catalog and its summary statistics
//! - `histogram`, `correlation`, `trends`: Explore feature distributions
//! - `similar`, `playlist`: Feature-similarity recommendations
//! - `popularity`: Linear popularity model over audio features
//!
//! ## Examples
//!
//! ```bash
//! cadence import ~/datasets/spotify/data.csv
//! cadence similar "Superstition" -k 5
//! cadence similar "Superstition" --band energy=0.05 --band danceability
//! cadence playlist "Teardrop, Windowlicker, Atmosphere"
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// How results are printed.
#[derive(Copy, Clone, Default, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    /// Aligned text tables
    #[default]
    Table,
    /// JSON documents
    Json,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Cadence: song catalog statistics and feature-similarity recommendations")]
#[command(version)]
pub struct Args {
    /// Catalog database path (defaults to the platform data directory)
    #[arg(long, global = true, env = "CADENCE_DB")]
    pub db: Option<PathBuf>,

    /// Read songs straight from a CSV file instead of the catalog database
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub csv: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by the two recommendation commands.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SimilarityOptions {
    /// Number of recommendations
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Comma-separated features used for distance (rank mode)
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Tolerance band `feature[=width]`; switches to range mode
    ///
    /// Repeatable. A bare feature name uses the configured default width.
    #[arg(long = "band", value_parser = parse_band)]
    pub bands: Vec<(String, Option<f64>)>,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a CSV dataset, replacing the stored catalog
    ///
    /// Rows with missing required values are dropped; repeated song ids keep
    /// their first row.
    Import {
        /// Path to the dataset (Spotify `data.csv` layout)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,

        /// Recreate the database even if it already exists
        #[arg(long)]
        force: bool,

        /// Comma-separated feature columns (inferred when omitted)
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,
    },

    /// List songs in catalog order
    List {
        /// Maximum number of songs to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the first rows and summary statistics of every feature
    ///
    /// With `--table`, summarizes any CSV instead of the song catalog, e.g.
    /// the per-genre or per-year aggregates.
    Overview {
        /// Number of leading rows to show
        #[arg(long, default_value = "5")]
        rows: usize,

        /// Summarize this CSV's numeric columns instead of the catalog
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        table: Option<PathBuf>,
    },

    /// Show the distribution of one feature
    Histogram {
        /// Feature to bucket, e.g. tempo, energy, danceability
        feature: String,

        /// Number of equal-width bins
        #[arg(long, default_value = "30")]
        bins: usize,
    },

    /// Show the Pearson correlation matrix of all features
    Correlation,

    /// Show song counts per year by tempo range and per decade
    Trends,

    /// Recommend songs similar to one song
    ///
    /// Ranks by Euclidean distance over the selected features, or filters by
    /// tolerance bands when `--band` is given.
    Similar {
        /// Song id or name
        #[arg(value_hint = clap::ValueHint::Other)]
        song: String,

        #[command(flatten)]
        options: SimilarityOptions,
    },

    /// Recommend songs matching the average of a playlist
    Playlist {
        /// Comma-separated song ids or names
        songs: String,

        #[command(flatten)]
        options: SimilarityOptions,
    },

    /// Fit a linear model predicting popularity from audio features
    Popularity {
        /// Comma-separated predictor features
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,
    },

    /// Generate shell completions
    ///
    /// Usage: cadence completion bash > ~/.local/share/bash-completion/completions/cadence
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List song names for completion scripts (hidden command)
    #[command(hide = true)]
    CompleteSongs,
}

/// Parses `feature=width` or a bare `feature`.
pub fn parse_band(raw: &str) -> Result<(String, Option<f64>), String> {
    let (feature, width) = match raw.split_once('=') {
        Some((feature, width)) => {
            let width: f64 = width
                .trim()
                .parse()
                .map_err(|_| format!("invalid band width '{width}'"))?;
            (feature, Some(width))
        }
        None => (raw, None),
    };

    let feature = feature.trim();
    if feature.is_empty() {
        return Err("band needs a feature name".to_string());
    }
    Ok((feature.to_string(), width))
}

/// Splits a comma-separated playlist into trimmed, non-empty entries.
#[must_use]
pub fn split_playlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_band() {
        assert_eq!(parse_band("energy=0.05"), Ok(("energy".to_string(), Some(0.05))));
        assert_eq!(parse_band(" tempo "), Ok(("tempo".to_string(), None)));
        assert!(parse_band("energy=loud").is_err());
        assert!(parse_band("=0.1").is_err());
    }

    #[test]
    fn test_split_playlist() {
        assert_eq!(
            split_playlist("Song 1, Song 2,, Song 3 "),
            vec!["Song 1", "Song 2", "Song 3"]
        );
        assert!(split_playlist(" , ").is_empty());
    }

    #[test]
    fn test_similar_parses_bands_and_features() {
        let args = Args::try_parse_from([
            "cadence",
            "similar",
            "Superstition",
            "-k",
            "3",
            "--features",
            "energy,valence",
            "--band",
            "energy=0.05",
            "--band",
            "danceability",
        ])
        .unwrap();

        match args.command {
            Command::Similar { song, options } => {
                assert_eq!(song, "Superstition");
                assert_eq!(options.k, Some(3));
                assert_eq!(options.features, vec!["energy", "valence"]);
                assert_eq!(
                    options.bands,
                    vec![
                        ("energy".to_string(), Some(0.05)),
                        ("danceability".to_string(), None)
                    ]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_overview_accepts_table() {
        let args = Args::try_parse_from(["cadence", "overview", "--table", "data_by_year.csv"]).unwrap();
        match args.command {
            Command::Overview { rows, table } => {
                assert_eq!(rows, 5);
                assert_eq!(table, Some(PathBuf::from("data_by_year.csv")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
