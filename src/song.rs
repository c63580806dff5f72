//! Songs and the feature schema they are projected over.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Features used for similarity when the user does not pick any.
///
/// All of them are Spotify audio features normalized to `[0, 1]`, so no
/// single dimension dominates the Euclidean distance.
pub const DEFAULT_FEATURES: &[&str] = &[
    "danceability",
    "energy",
    "valence",
    "acousticness",
    "instrumentalness",
    "speechiness",
    "liveness",
];

/// How a song is held in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Catalog-unique identifier (the Spotify track id).
    pub id: String,
    pub name: String,
    /// Display form of the artist list, e.g. `"Nina Simone, Duke Ellington"`.
    pub artists: String,
    /// Values aligned with the catalog's [`FeatureSchema`].
    pub features: Vec<f64>,
}

impl Song {
    /// Value of `name`, or `None` if the schema has no such feature.
    #[must_use]
    pub fn feature(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema
            .index_of(name)
            .and_then(|idx| self.features.get(idx).copied())
    }

    /// Projects the song onto pre-resolved feature indices.
    #[must_use]
    pub fn project(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&idx| self.features[idx]).collect()
    }
}

/// Ordered list of numeric feature names shared by every song in a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Builds a schema from `names`. A repeated name keeps its first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names.into_iter().map(Into::into) {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Resolves `selection` to column indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] naming every feature absent from the
    /// schema. Missing features are never zero-filled.
    pub fn resolve<S: AsRef<str>>(&self, selection: &[S]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(selection.len());
        let mut missing = Vec::new();

        for name in selection {
            match self.index_of(name.as_ref()) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.as_ref().to_string()),
            }
        }

        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(Error::schema_mismatch(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["energy", "tempo", "year"])
    }

    #[test]
    fn test_repeated_names_collapse() {
        let schema = FeatureSchema::new(["energy", "tempo", "energy"]);
        assert_eq!(schema.names(), &["energy", "tempo"]);
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_resolve_preserves_selection_order() {
        let indices = schema().resolve(&["year", "energy"]).unwrap();
        assert_eq!(indices, vec![2, 0]);
    }

    #[test]
    fn test_resolve_reports_all_missing_features() {
        let err = schema().resolve(&["energy", "loudness", "mode"]).unwrap_err();
        assert_eq!(
            err,
            Error::SchemaMismatch {
                missing: vec!["loudness".to_string(), "mode".to_string()]
            }
        );
    }

    #[test]
    fn test_feature_lookup_by_name() {
        let song = Song {
            id: "a".to_string(),
            name: "A".to_string(),
            artists: "Someone".to_string(),
            features: vec![0.7, 120.0, 1999.0],
        };

        assert_eq!(song.feature(&schema(), "tempo"), Some(120.0));
        assert_eq!(song.feature(&schema(), "loudness"), None);
        assert_eq!(song.project(&[2, 0]), vec![1999.0, 0.7]);
    }
}
