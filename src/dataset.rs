//! # Dataset Loading Module
//!
//! Reads a delimited song dataset (the Spotify `data.csv` layout) into a
//! [`Catalog`], cleaning it on the way in:
//!
//! - rows with an empty required field are dropped
//! - rows with an unparsable feature value are dropped
//! - repeated identifiers keep their first row
//!
//! Feature columns are either given explicitly or inferred from the whole
//! file: every non-text, non-ignored column whose filled cells all parse as
//! numbers. Blank cells in a feature column drop their row.
//!
//! [`load_table`] reads any other table (per-genre or per-year aggregates)
//! as plain text for the overview.

use crate::catalog::Catalog;
use crate::song::{FeatureSchema, Song};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Column names and feature selection for a load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub id_column: String,
    pub name_column: String,
    pub artist_column: String,
    /// Explicit feature columns. `None` infers them from the data.
    pub features: Option<Vec<String>>,
    /// Columns never inferred as features. `release_date` is a date even
    /// when a file only holds bare years.
    pub ignore: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            name_column: "name".to_string(),
            artist_column: "artists".to_string(),
            features: None,
            ignore: vec!["release_date".to_string()],
        }
    }
}

/// What the cleaning pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub duplicates: usize,
}

/// Loads and cleans the dataset at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a required column is
/// missing from the header, or a record is malformed CSV.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<(Catalog, LoadReport)> {
    info!("Loading dataset from {}", path.display());
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;
    read_catalog(reader, options)
        .with_context(|| format!("Failed to load dataset {}", path.display()))
}

/// Loads and cleans a dataset from any reader.
///
/// # Errors
///
/// See [`load_csv`].
pub fn load_reader<R: Read>(input: R, options: &LoadOptions) -> Result<(Catalog, LoadReport)> {
    read_catalog(csv::Reader::from_reader(input), options)
}

fn read_records<R: Read>(
    reader: &mut csv::Reader<R>,
) -> Result<(csv::StringRecord, Vec<csv::StringRecord>)> {
    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let records = reader
        .records()
        .enumerate()
        .map(|(line, record)| {
            record.with_context(|| format!("Malformed record at line {}", line + 2))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((headers, records))
}

/// Columns (other than those `skip` rejects) where every non-empty cell is a
/// number and at least one cell is filled. Blank cells do not disqualify a
/// column; the rows holding them are dropped later.
fn numeric_columns(
    headers: &csv::StringRecord,
    records: &[csv::StringRecord],
    skip: impl Fn(usize, &str) -> bool,
) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| !skip(*idx, name.trim()))
        .filter(|(idx, _)| {
            let mut filled = records
                .iter()
                .filter_map(|record| record.get(*idx).map(str::trim))
                .filter(|cell| !cell.is_empty())
                .peekable();
            filled.peek().is_some() && filled.all(|cell| parse_number(cell).is_some())
        })
        .map(|(idx, _)| idx)
        .collect()
}

fn read_catalog<R: Read>(
    mut reader: csv::Reader<R>,
    options: &LoadOptions,
) -> Result<(Catalog, LoadReport)> {
    let (headers, records) = read_records(&mut reader)?;
    let column = |name: &str| {
        headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
            anyhow!(
                "Column '{name}' not found. Available columns: {:?}",
                headers.iter().collect::<Vec<_>>()
            )
        })
    };

    let id_col = column(options.id_column.as_str())?;
    let name_col = column(options.name_column.as_str())?;
    let artist_col = column(options.artist_column.as_str())?;

    let feature_names: Vec<String> = match &options.features {
        Some(features) => FeatureSchema::new(features.iter().map(|f| f.trim())).names().to_vec(),
        None => {
            let text = [id_col, name_col, artist_col];
            numeric_columns(&headers, &records, |idx, name| {
                text.contains(&idx) || options.ignore.iter().any(|i| i == name)
            })
            .into_iter()
            .filter_map(|idx| headers.get(idx).map(|h| h.trim().to_string()))
            .collect()
        }
    };
    if feature_names.is_empty() {
        bail!("No numeric feature columns found");
    }
    let feature_cols = feature_names
        .iter()
        .map(|name| column(name.as_str()))
        .collect::<Result<Vec<_>>>()?;
    debug!("Feature columns: {feature_names:?}");

    let mut report = LoadReport::default();
    let mut seen = HashSet::new();
    let mut songs = Vec::new();

    for (line, record) in records.iter().enumerate() {
        report.rows_read += 1;

        let Some(song) = parse_row(record, id_col, name_col, artist_col, &feature_cols) else {
            debug!("Dropping incomplete row at line {}", line + 2);
            report.rows_dropped += 1;
            continue;
        };

        if !seen.insert(song.id.clone()) {
            report.duplicates += 1;
            continue;
        }
        songs.push(song);
    }

    if report.duplicates > 0 {
        warn!("Skipped {} rows with repeated identifiers", report.duplicates);
    }
    info!(
        "Loaded {} songs ({} rows read, {} dropped)",
        songs.len(),
        report.rows_read,
        report.rows_dropped
    );

    let catalog = Catalog::new(FeatureSchema::new(feature_names), songs)?;
    Ok((catalog, report))
}

/// Any delimited table, kept as text, for datasets that are not song lists
/// (per-genre or per-year aggregates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// The first `n` rows.
    #[must_use]
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Names of the columns whose filled cells are all numeric.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<&str> {
        let headers = csv::StringRecord::from(self.headers.clone());
        let records: Vec<csv::StringRecord> =
            self.rows.iter().map(|row| csv::StringRecord::from(row.clone())).collect();
        numeric_columns(&headers, &records, |_, _| false)
            .into_iter()
            .map(|idx| self.headers[idx].as_str())
            .collect()
    }

    /// Parsed values of `name`, blank or unparsable cells skipped.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(idx).and_then(|cell| parse_number(cell)))
                .collect(),
        )
    }
}

/// Reads the table at `path` without assuming any column layout.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or holds malformed CSV.
pub fn load_table(path: &Path) -> Result<Table> {
    info!("Loading table from {}", path.display());
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open table {}", path.display()))?;
    read_table(reader).with_context(|| format!("Failed to load table {}", path.display()))
}

/// Reads a table from any reader. See [`load_table`].
pub fn load_table_reader<R: Read>(input: R) -> Result<Table> {
    read_table(csv::Reader::from_reader(input))
}

fn read_table<R: Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let (headers, records) = read_records(&mut reader)?;
    Ok(Table {
        headers: headers.iter().map(|h| h.trim().to_string()).collect(),
        rows: records
            .iter()
            .map(|record| record.iter().map(|cell| cell.trim().to_string()).collect())
            .collect(),
    })
}

fn parse_row(
    record: &csv::StringRecord,
    id_col: usize,
    name_col: usize,
    artist_col: usize,
    feature_cols: &[usize],
) -> Option<Song> {
    let text = |idx: usize| {
        record
            .get(idx)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let features = feature_cols
        .iter()
        .map(|&idx| record.get(idx).and_then(parse_number))
        .collect::<Option<Vec<f64>>>()?;

    Some(Song {
        id: text(id_col)?.to_string(),
        name: text(name_col)?.to_string(),
        artists: format_artists(text(artist_col)?),
        features,
    })
}

/// Parses a finite number; `True`/`False` count as 1/0.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        return Some(1.0);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Turns a list literal such as `['Ella Fitzgerald', "Louis Armstrong"]`
/// into `Ella Fitzgerald, Louis Armstrong`. Plain strings pass through.
#[must_use]
pub fn format_artists(raw: &str) -> String {
    let raw = raw.trim();
    let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) else {
        return raw.to_string();
    };

    let mut names = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match (quote, c) {
            (None, '\'' | '"') => {
                current.clear();
                quote = Some(c);
            }
            (Some(q), c) if c == q => {
                names.push(std::mem::take(&mut current));
                quote = None;
            }
            (Some(_), c) => current.push(c),
            (None, ',') => {
                let unquoted = current.trim();
                if !unquoted.is_empty() {
                    names.push(unquoted.to_string());
                }
                current.clear();
            }
            (None, c) => current.push(c),
        }
    }
    let trailing = current.trim();
    if !trailing.is_empty() {
        names.push(trailing.to_string());
    }

    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
valence,year,artists,danceability,energy,explicit,id,name,release_date,tempo
0.5,1965,\"['Nina Simone']\",0.6,0.4,False,a1,Feeling Good,1965-01-01,110.5
0.7,1972,\"['Stevie Wonder', \"\"Jeff Beck\"\"]\",0.8,0.7,0,b2,Superstition,1972,100.0
0.1,1980,['Joy Division'],,0.9,0,c3,Atmosphere,1980,80.0
0.3,1999,['Moby'],0.5,0.5,0,,Porcelain,1999,90.0
0.3,1999,['Moby'],0.5,0.5,0,b2,Porcelain,1999,90.0
0.9,2001,\"['Daft Punk']\",0.9,0.8,True,d4,One More Time,2001,122.7
";

    #[test]
    fn test_infers_numeric_columns() {
        let (catalog, _) = load_reader(SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(
            catalog.schema().names(),
            &["valence", "year", "danceability", "energy", "explicit", "tempo"]
        );
    }

    #[test]
    fn test_drops_incomplete_rows_and_duplicates() {
        let (catalog, report) = load_reader(SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(
            report,
            LoadReport {
                rows_read: 6,
                rows_dropped: 2,
                duplicates: 1,
            }
        );
        let ids: Vec<&str> = catalog.songs().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2", "d4"]);
        assert_eq!(catalog.get("b2").unwrap().name, "Superstition");
    }

    #[test]
    fn test_explicit_features_and_booleans() {
        let options = LoadOptions {
            features: Some(vec!["energy".to_string(), "explicit".to_string()]),
            ..LoadOptions::default()
        };
        let (catalog, _) = load_reader(SAMPLE.as_bytes(), &options).unwrap();
        let song = catalog.get("d4").unwrap();
        assert_eq!(song.features, vec![0.8, 1.0]);
        assert_eq!(catalog.get("a1").unwrap().features, vec![0.4, 0.0]);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let options = LoadOptions {
            features: Some(vec!["loudness".to_string()]),
            ..LoadOptions::default()
        };
        let err = load_reader(SAMPLE.as_bytes(), &options).unwrap_err();
        assert!(err.to_string().contains("loudness"));

        let err = load_reader("title,energy\nx,0.1\n".as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_artists_are_formatted() {
        let (catalog, _) = load_reader(SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(catalog.get("a1").unwrap().artists, "Nina Simone");
        assert_eq!(catalog.get("b2").unwrap().artists, "Stevie Wonder, Jeff Beck");
    }

    #[test]
    fn test_format_artists_variants() {
        assert_eq!(format_artists("['A', 'B']"), "A, B");
        assert_eq!(format_artists("[\"Guns N' Roses\"]"), "Guns N' Roses");
        assert_eq!(format_artists("Plain Name"), "Plain Name");
        assert_eq!(format_artists("[]"), "");
    }

    #[test]
    fn test_ignored_columns_are_not_inferred() {
        let data = "id,name,artists,release_date,energy\na,A,X,1928,0.1\nb,B,Y,1931,0.2\n";

        let (catalog, _) = load_reader(data.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(catalog.schema().names(), &["energy"]);

        let options = LoadOptions {
            ignore: Vec::new(),
            ..LoadOptions::default()
        };
        let (catalog, _) = load_reader(data.as_bytes(), &options).unwrap();
        assert_eq!(catalog.schema().names(), &["release_date", "energy"]);
    }

    #[test]
    fn test_mixed_text_column_is_not_a_feature() {
        let data = "id,name,artists,key_name,energy\na,A,X,7,0.1\nb,B,Y,C#,0.2\n";
        let options = LoadOptions {
            ignore: Vec::new(),
            ..LoadOptions::default()
        };

        let (catalog, report) = load_reader(data.as_bytes(), &options).unwrap();
        assert_eq!(catalog.schema().names(), &["energy"]);
        assert_eq!(report.rows_dropped, 0);
    }

    #[test]
    fn test_blank_in_first_row_keeps_column_and_drops_row() {
        let data = "\
id,name,artists,energy,tempo
a,Roads,Portishead,,80.0
b,Glory Box,Portishead,0.4,120.0
c,Sour Times,Portishead,0.5,90.0
";
        let (catalog, report) = load_reader(data.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(catalog.schema().names(), &["energy", "tempo"]);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_dropped, 1);
        let ids: Vec<&str> = catalog.songs().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_repeated_explicit_features_collapse() {
        let options = LoadOptions {
            features: Some(vec!["energy".to_string(), " energy".to_string(), "tempo".to_string()]),
            ..LoadOptions::default()
        };
        let (catalog, _) = load_reader(SAMPLE.as_bytes(), &options).unwrap();

        assert_eq!(catalog.schema().names(), &["energy", "tempo"]);
        assert_eq!(catalog.get("a1").unwrap().features, vec![0.4, 110.5]);
    }

    #[test]
    fn test_table_without_song_columns() {
        let data = "\
year,genres,energy,tempo
1921,classical,0.2,100.0
1922,jazz,,110.0
1923,blues,0.4,90.0
";
        let table = load_table_reader(data.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["year", "genres", "energy", "tempo"]);
        assert_eq!(table.numeric_columns(), vec!["year", "energy", "tempo"]);
        assert_eq!(table.head(1), &[vec!["1921", "classical", "0.2", "100.0"]]);
        assert_eq!(table.column("energy"), Some(vec![0.2, 0.4]));
        assert_eq!(table.column("loudness"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 0.25 "), Some(0.25));
        assert_eq!(parse_number("TRUE"), Some(1.0));
        assert_eq!(parse_number("1965-01-01"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_header_only_file_needs_explicit_features() {
        let header = "id,name,artists,energy\n";
        assert!(load_reader(header.as_bytes(), &LoadOptions::default()).is_err());

        let options = LoadOptions {
            features: Some(vec!["energy".to_string()]),
            ..LoadOptions::default()
        };
        let (catalog, report) = load_reader(header.as_bytes(), &options).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(report.rows_read, 0);
    }
}
