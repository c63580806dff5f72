//! Feature-similarity recommendations.
//!
//! Two explicit policies answer "songs like this one":
//!
//! - **Rank mode**: nearest neighbours by Euclidean distance to a reference
//!   vector ([`rank`]).
//! - **Range mode**: every song whose selected features sit inside a
//!   tolerance band around the reference ([`within_range`]).
//!
//! The reference is the query song's vector, or for a playlist the
//! per-feature mean of all its songs. Query songs never appear in their own
//! results. Nothing here mutates the catalog.
//!
//! ```
//! use cadence::catalog::Catalog;
//! use cadence::recommend::{rank, Query};
//! use cadence::song::{FeatureSchema, Song};
//!
//! let song = |id: &str, energy: f64| Song {
//!     id: id.to_string(),
//!     name: id.to_uppercase(),
//!     artists: "Various".to_string(),
//!     features: vec![energy],
//! };
//! let catalog = Catalog::new(
//!     FeatureSchema::new(["energy"]),
//!     vec![song("a", 0.1), song("b", 0.5), song("c", 0.45)],
//! )?;
//!
//! let picks = rank(&catalog, &Query::song("b"), 1, &["energy"])?;
//! assert_eq!(picks[0].song.id, "c");
//! # Ok::<(), cadence::error::Error>(())
//! ```

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::song::Song;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// What the user asked for recommendations about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Song(String),
    Playlist(Vec<String>),
}

impl Query {
    pub fn song(id: impl Into<String>) -> Self {
        Self::Song(id.into())
    }

    pub fn playlist<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Playlist(ids.into_iter().map(Into::into).collect())
    }

    fn ids(&self) -> &[String] {
        match self {
            Self::Song(id) => std::slice::from_ref(id),
            Self::Playlist(ids) => ids,
        }
    }
}

/// Per-feature half-widths for range mode, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tolerance {
    bands: Vec<(String, f64)>,
}

impl Tolerance {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a band, replacing any earlier band for the same feature.
    #[must_use]
    pub fn with_band(mut self, feature: impl Into<String>, band: f64) -> Self {
        let feature = feature.into();
        match self.bands.iter_mut().find(|(name, _)| *name == feature) {
            Some(existing) => existing.1 = band,
            None => self.bands.push((feature, band)),
        }
        self
    }

    #[must_use]
    pub fn bands(&self) -> &[(String, f64)] {
        &self.bands
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    fn validate(&self) -> Result<()> {
        match self
            .bands
            .iter()
            .find(|(_, band)| !band.is_finite() || *band < 0.0)
        {
            Some((feature, band)) => Err(Error::InvalidTolerance {
                feature: feature.clone(),
                band: *band,
            }),
            None => Ok(()),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Tolerance {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |tolerance, (feature, band)| tolerance.with_band(feature, band))
    }
}

/// One recommended song.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation<'a> {
    pub song: &'a Song,
    /// Distance to the reference vector. Range mode does not rank, so it
    /// leaves this empty.
    pub distance: Option<f64>,
}

/// Query songs found in the catalog, deduplicated, in query order.
struct ResolvedQuery<'a> {
    songs: Vec<&'a Song>,
    positions: HashSet<usize>,
}

fn resolve_query<'a>(catalog: &'a Catalog, query: &Query) -> Option<ResolvedQuery<'a>> {
    let mut songs = Vec::new();
    let mut positions = HashSet::new();

    for id in query.ids() {
        match catalog.position(id) {
            Some(pos) => {
                if positions.insert(pos) {
                    songs.push(&catalog.songs()[pos]);
                }
            }
            None => warn!("Song '{id}' is not in the catalog; ignoring it"),
        }
    }

    if songs.is_empty() {
        None
    } else {
        Some(ResolvedQuery { songs, positions })
    }
}

/// Per-feature arithmetic mean of `songs` over `indices`.
///
/// `songs` must not be empty.
#[must_use]
pub fn reference_vector(songs: &[&Song], indices: &[usize]) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let count = songs.len() as f64;
    indices
        .iter()
        .map(|&idx| songs.iter().map(|song| song.features[idx]).sum::<f64>() / count)
        .collect()
}

#[must_use]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[inline]
fn distance_to(song: &Song, indices: &[usize], reference: &[f64]) -> f64 {
    indices
        .iter()
        .zip(reference)
        .map(|(&idx, r)| (song.features[idx] - r).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Rank mode: the `k` songs nearest to the query's reference vector.
///
/// Results are sorted by ascending distance; equal distances keep catalog
/// order. An unknown query, an empty catalog or `k == 0` yields an empty
/// list.
///
/// # Errors
///
/// - [`Error::SchemaMismatch`] if a name in `features` is not in the schema
/// - [`Error::InsufficientData`] if `features` is empty
pub fn rank<'a, S: AsRef<str>>(
    catalog: &'a Catalog,
    query: &Query,
    k: usize,
    features: &[S],
) -> Result<Vec<Recommendation<'a>>> {
    if k == 0 || catalog.is_empty() {
        return Ok(Vec::new());
    }
    if features.is_empty() {
        return Err(Error::InsufficientData(
            "no features selected for distance".to_string(),
        ));
    }

    let indices = catalog.schema().resolve(features)?;
    let Some(resolved) = resolve_query(catalog, query) else {
        return Ok(Vec::new());
    };
    let reference = reference_vector(&resolved.songs, &indices);
    debug!("Ranking against reference {reference:?}");

    // collect() keeps catalog order, so the stable sort breaks ties by position
    let mut scored: Vec<(f64, &Song)> = catalog
        .songs()
        .par_iter()
        .enumerate()
        .filter(|(pos, _)| !resolved.positions.contains(pos))
        .map(|(_, song)| (distance_to(song, &indices, &reference), song))
        .collect();
    scored.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .map(|(distance, song)| Recommendation {
            song,
            distance: Some(distance),
        })
        .collect())
}

/// Range mode: songs whose every banded feature lies within
/// `[reference - band, reference + band]`, in catalog order, at most `k`.
///
/// An empty tolerance places no constraint, so every non-query song passes.
///
/// # Errors
///
/// - [`Error::InvalidTolerance`] for a negative or non-finite band
/// - [`Error::SchemaMismatch`] if a banded feature is not in the schema
pub fn within_range<'a>(
    catalog: &'a Catalog,
    query: &Query,
    k: usize,
    tolerance: &Tolerance,
) -> Result<Vec<Recommendation<'a>>> {
    tolerance.validate()?;
    if k == 0 || catalog.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<&str> = tolerance.bands().iter().map(|(name, _)| name.as_str()).collect();
    let indices = catalog.schema().resolve(&names)?;
    let Some(resolved) = resolve_query(catalog, query) else {
        return Ok(Vec::new());
    };
    let reference = reference_vector(&resolved.songs, &indices);

    let bounds: Vec<(usize, f64, f64)> = indices
        .iter()
        .zip(tolerance.bands())
        .zip(&reference)
        .map(|((&idx, (_, band)), r)| (idx, r - band, r + band))
        .collect();
    debug!("Filtering with bounds {bounds:?}");

    Ok(catalog
        .songs()
        .iter()
        .enumerate()
        .filter(|(pos, _)| !resolved.positions.contains(pos))
        .filter(|(_, song)| {
            bounds
                .iter()
                .all(|&(idx, lo, hi)| (lo..=hi).contains(&song.features[idx]))
        })
        .take(k)
        .map(|(_, song)| Recommendation {
            song,
            distance: None,
        })
        .collect())
}

/// Dispatches to [`within_range`] when a non-empty tolerance is given,
/// otherwise to [`rank`].
///
/// # Errors
///
/// See [`rank`] and [`within_range`].
pub fn recommend<'a, S: AsRef<str>>(
    catalog: &'a Catalog,
    query: &Query,
    k: usize,
    features: &[S],
    tolerance: Option<&Tolerance>,
) -> Result<Vec<Recommendation<'a>>> {
    match tolerance {
        Some(tolerance) if !tolerance.is_empty() => within_range(catalog, query, k, tolerance),
        _ => rank(catalog, query, k, features),
    }
}
