//! Typed errors for the catalog and recommendation core.
//!
//! Application-level code (loading, storage, CLI) wraps these in
//! `anyhow::Error` with context.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Catalog schema is missing features: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Duplicate song identifier: {0}")]
    DuplicateId(String),

    #[error("Song {id} has {actual} features, schema expects {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid tolerance band {band} for feature '{feature}'")]
    InvalidTolerance { feature: String, band: f64 },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

impl Error {
    /// Builds a `SchemaMismatch` from any iterator of missing names.
    pub fn schema_mismatch<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SchemaMismatch {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }
}
