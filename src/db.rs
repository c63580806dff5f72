//! SQLite catalog store.
//!
//! The database holds exactly one catalog. Saving replaces it wholesale in a
//! single transaction, so a reader never observes a half-imported dataset.

use crate::catalog::Catalog;
use crate::song::{FeatureSchema, Song};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

const SCHEMA_KEY: &str = "feature_schema";

/// Open the database at `path`, creating the file if needed.
pub fn connect(path: &Path) -> Result<Connection> {
    Connection::open(path)
        .with_context(|| format!("Failed to open catalog database at {}", path.display()))
}

/// Creates the catalog tables.
///
/// Refuses to touch an existing database file unless `force` is set, in
/// which case the file is deleted and recreated.
///
/// # Errors
///
/// Returns an error if the database exists without `force`, or on any
/// filesystem or SQL failure.
pub fn init_database(path: &Path, force: bool) -> Result<Connection> {
    if path.exists() {
        if !force {
            bail!(
                "Catalog database already exists at {}. Use --force to overwrite it.",
                path.display()
            );
        }
        info!("Removing existing catalog database at {}", path.display());
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    let conn = connect(path)?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Opens an existing catalog database, creating tables if they are missing.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = connect(path)?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS catalog_meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS songs (
            position INTEGER PRIMARY KEY,
            id       TEXT NOT NULL UNIQUE,
            name     TEXT NOT NULL,
            artists  TEXT NOT NULL,
            features TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_songs_name ON songs(name);",
    )
    .context("Failed to create catalog tables")
}

/// Replaces the stored catalog with `catalog`.
pub fn save_catalog(conn: &mut Connection, catalog: &Catalog) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM songs", [])
        .context("Failed to clear previous catalog")?;
    let schema_json = serde_json::to_string(catalog.schema())?;
    tx.execute(
        "INSERT INTO catalog_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (SCHEMA_KEY, &schema_json),
    )
    .context("Failed to store feature schema")?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO songs (position, id, name, artists, features) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for (position, song) in catalog.songs().iter().enumerate() {
            let features = serde_json::to_string(&song.features)?;
            stmt.execute((position as i64, &song.id, &song.name, &song.artists, &features))
                .with_context(|| format!("Failed to insert song {}", song.id))?;
        }
    }

    tx.commit().context("Committing catalog transaction failed")?;
    info!("Stored {} songs", catalog.len());
    Ok(())
}

/// Loads the stored catalog in its original order.
///
/// A database that was never populated yields an empty catalog.
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let schema: FeatureSchema = match conn
        .query_row(
            "SELECT value FROM catalog_meta WHERE key = ?1",
            [SCHEMA_KEY],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .context("Failed to read feature schema")?
    {
        Some(json) => serde_json::from_str(&json).context("Stored feature schema is corrupt")?,
        None => FeatureSchema::default(),
    };

    let mut stmt = conn.prepare("SELECT id, name, artists, features FROM songs ORDER BY position")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .context("Cannot query songs")?;

    let mut songs = Vec::new();
    for row in rows {
        let (id, name, artists, features) = row.context("Failed to read song row")?;
        let features: Vec<f64> = serde_json::from_str(&features)
            .with_context(|| format!("Stored features for {id} are corrupt"))?;
        songs.push(Song {
            id,
            name,
            artists,
            features,
        });
    }

    debug!("Read {} songs from catalog database", songs.len());
    Ok(Catalog::new(schema, songs)?)
}

/// Song names in catalog order, for shell completion.
pub fn song_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM songs ORDER BY position")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}
