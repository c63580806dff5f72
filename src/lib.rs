//! Song catalog statistics and feature-similarity recommendations.
//!
//! Core modules:
//! - [`catalog`] - In-memory song catalog and its shared, reloadable handle
//! - [`recommend`] - Rank mode (Euclidean) and range mode (tolerance bands)
//! - [`stats`] - Describe, histograms, correlation and tempo trends
//! - [`regression`] - Linear popularity model
//! - [`dataset`] - CSV loading and cleaning
//!
//! ### Supporting Modules
//!
//! - [`song`] - Song records and the feature schema
//! - [`db`] - SQLite catalog persistence
//! - [`config`] - Configuration and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//! - [`display`] - Text tables for command output
//! - [`error`] - Typed errors of the core operations
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use cadence::dataset::{load_csv, LoadOptions};
//! use cadence::recommend::{recommend, Query, Tolerance};
//! use std::path::Path;
//!
//! let (catalog, report) = load_csv(Path::new("data.csv"), &LoadOptions::default())?;
//! println!("{} songs, {} rows dropped", catalog.len(), report.rows_dropped);
//!
//! // Ten nearest songs over danceability, energy and valence
//! let features = ["danceability", "energy", "valence"];
//! let picks = recommend(&catalog, &Query::song("7GhIk7Il098yCjg4BQjzvb"), 10, &features, None)?;
//! for pick in &picks {
//!     println!("{} ({:?})", pick.song.name, pick.distance);
//! }
//!
//! // Everything within ±0.05 energy of a playlist's average
//! let tolerance = Tolerance::new().with_band("energy", 0.05);
//! let query = Query::playlist(["id-1", "id-2", "id-3"]);
//! let picks = recommend(&catalog, &query, 10, &features, Some(&tolerance))?;
//! println!("{} songs in range", picks.len());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Recommendation Policies
//!
//! ### Rank Mode
//! - Builds a reference vector from the query song or the playlist mean
//! - Orders every other song by Euclidean distance to it
//! - Ties keep catalog order
//!
//! ### Range Mode
//! - Keeps songs whose every banded feature lies in `[ref - band, ref + band]`
//! - Returns matches in catalog order, at most `k` of them
//!
//! Neither mode ever returns a song that is part of the query.
//!
//! ## Error Handling
//!
//! Core operations return [`error::Result`] with a typed [`error::Error`]
//! (schema mismatches, invalid tolerances, duplicate ids). The storage,
//! dataset and configuration layers return `anyhow::Result` with context.

pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod dataset;
pub mod db;
pub mod display;
pub mod error;
pub mod recommend;
pub mod regression;
pub mod song;
pub mod stats;
