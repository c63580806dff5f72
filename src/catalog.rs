//! The song catalog: ordered, unique by id, one shared feature schema.

use crate::error::{Error, Result};
use crate::song::{FeatureSchema, Song};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Immutable, ordered collection of songs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schema: FeatureSchema,
    songs: Vec<Song>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, checking id uniqueness and vector dimensionality.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateId`] if two songs share an identifier
    /// - [`Error::DimensionMismatch`] if a song's feature count differs from the schema
    pub fn new(schema: FeatureSchema, songs: Vec<Song>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(songs.len());

        for (position, song) in songs.iter().enumerate() {
            if song.features.len() != schema.len() {
                return Err(Error::DimensionMismatch {
                    id: song.id.clone(),
                    expected: schema.len(),
                    actual: song.features.len(),
                });
            }
            if by_id.insert(song.id.clone(), position).is_some() {
                return Err(Error::DuplicateId(song.id.clone()));
            }
        }

        debug!(
            "Built catalog with {} songs over {} features",
            songs.len(),
            schema.len()
        );
        Ok(Self {
            schema,
            songs,
            by_id,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Song> {
        self.position(id).map(|idx| &self.songs[idx])
    }

    /// Insertion position of `id`.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Finds a song from free text: exact identifier first, then a
    /// case-insensitive name match (first in catalog order).
    #[must_use]
    pub fn resolve(&self, query: &str) -> Option<&Song> {
        let query = query.trim();
        self.get(query).or_else(|| {
            self.songs
                .iter()
                .find(|song| song.name.eq_ignore_ascii_case(query))
        })
    }

    /// The first `n` songs.
    #[must_use]
    pub fn head(&self, n: usize) -> &[Song] {
        &self.songs[..n.min(self.songs.len())]
    }

    /// All values of one feature, in catalog order.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if the feature is not in the schema.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| Error::schema_mismatch([name]))?;
        Ok(self.songs.iter().map(|song| song.features[idx]).collect())
    }
}

/// A catalog reference that can be swapped wholesale on reload.
///
/// Readers take a snapshot and keep a consistent view for as long as they
/// hold it; [`SharedCatalog::replace`] never exposes partial state.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    current: RwLock<Arc<Catalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swaps in `catalog`, returning the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let next = Arc::new(catalog);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        debug!("Replacing catalog ({} -> {} songs)", guard.len(), next.len());
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, name: &str, energy: f64) -> Song {
        Song {
            id: id.to_string(),
            name: name.to_string(),
            artists: "Artist".to_string(),
            features: vec![energy],
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            FeatureSchema::new(["energy"]),
            vec![
                song("1", "Blue in Green", 0.1),
                song("2", "So What", 0.5),
                song("3", "so what", 0.9),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Catalog::new(
            FeatureSchema::new(["energy"]),
            vec![song("1", "A", 0.1), song("1", "B", 0.2)],
        );
        assert_eq!(result.unwrap_err(), Error::DuplicateId("1".to_string()));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let result = Catalog::new(FeatureSchema::new(["energy", "tempo"]), vec![song("1", "A", 0.1)]);
        assert!(matches!(result, Err(Error::DimensionMismatch { expected: 2, actual: 1, .. })));
    }

    #[test]
    fn test_resolve_prefers_id_then_first_name_match() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("3").unwrap().id, "3");
        assert_eq!(catalog.resolve("  SO WHAT ").unwrap().id, "2");
        assert!(catalog.resolve("Naima").is_none());
    }

    #[test]
    fn test_head_and_column() {
        let catalog = catalog();
        assert_eq!(catalog.head(2).len(), 2);
        assert_eq!(catalog.head(10).len(), 3);
        assert_eq!(catalog.column("energy").unwrap(), vec![0.1, 0.5, 0.9]);
        assert!(catalog.column("tempo").is_err());
    }

    #[test]
    fn test_shared_catalog_replace_keeps_old_snapshots() {
        let shared = SharedCatalog::new(catalog());
        let before = shared.snapshot();

        let previous = shared.replace(Catalog::default());

        assert_eq!(before.len(), 3);
        assert_eq!(previous.len(), 3);
        assert!(shared.snapshot().is_empty());
    }
}
