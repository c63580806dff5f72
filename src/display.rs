//! Text rendering for command output.
//!
//! Every renderer returns a `String` so `main` decides where it goes and
//! tests can inspect it.

use crate::catalog::Catalog;
use crate::dataset::{LoadReport, Table};
use crate::recommend::Recommendation;
use crate::regression::LinearModel;
use crate::song::Song;
use crate::stats::{ColumnSummary, CorrelationMatrix, Histogram, TempoBin};
use serde::Serialize;
use std::collections::BTreeMap;

pub const NO_RECOMMENDATIONS: &str = "No recommendations found for this item.";

const NAME_WIDTH: usize = 32;
const ARTIST_WIDTH: usize = 24;
const CELL_WIDTH: usize = 12;
const BAR_WIDTH: usize = 40;

/// Shortens `text` to `width` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[must_use]
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e9 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", truncate(text, width))
}

/// Right-aligned header cells for feature columns.
fn feature_headers(features: &[String]) -> String {
    features
        .iter()
        .map(|f| format!(" {:>CELL_WIDTH$}", truncate(f, CELL_WIDTH)))
        .collect()
}

fn bar(count: usize, peak: usize) -> String {
    let len = if peak == 0 { 0 } else { count * BAR_WIDTH / peak };
    "#".repeat(len)
}

/// Table of songs with the chosen feature columns.
#[must_use]
pub fn render_songs(catalog: &Catalog, songs: &[Song], features: &[String]) -> String {
    let indices: Vec<Option<usize>> = features
        .iter()
        .map(|f| catalog.schema().index_of(f))
        .collect();

    let mut out = format!(
        "{} {}{}\n",
        pad("Name", NAME_WIDTH),
        pad("Artists", ARTIST_WIDTH),
        feature_headers(features)
    );
    for song in songs {
        let cells: String = indices
            .iter()
            .map(|idx| {
                let value = idx.map_or(f64::NAN, |i| song.features[i]);
                format!(" {:>CELL_WIDTH$}", format_value(value))
            })
            .collect();
        out.push_str(&format!(
            "{} {}{cells}\n",
            pad(&song.name, NAME_WIDTH),
            pad(&song.artists, ARTIST_WIDTH)
        ));
    }
    out
}

/// Leading rows of a free-form table, every column as text.
#[must_use]
pub fn render_table(table: &Table, rows: usize) -> String {
    let line = |cells: &[String]| -> String {
        let joined: Vec<String> = cells
            .iter()
            .map(|cell| format!("{:>CELL_WIDTH$}", truncate(cell, CELL_WIDTH)))
            .collect();
        joined.join(" ") + "\n"
    };

    let mut out = line(&table.headers);
    for row in table.head(rows) {
        out.push_str(&line(row));
    }
    out
}

#[must_use]
pub fn render_summary(summaries: &[ColumnSummary]) -> String {
    let mut out = format!(
        "{:<18} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
        "feature", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in summaries {
        out.push_str(&format!(
            "{:<18} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            truncate(&s.name, 18),
            s.count,
            format_value(s.mean),
            format_value(s.std),
            format_value(s.min),
            format_value(s.q25),
            format_value(s.median),
            format_value(s.q75),
            format_value(s.max),
        ));
    }
    out
}

/// Horizontal bar chart, bars scaled to the fullest bin.
#[must_use]
pub fn render_histogram(feature: &str, histogram: &Histogram) -> String {
    let mut out = format!("Distribution of {feature}\n");
    let peak = histogram.counts.iter().copied().max().unwrap_or(0);

    for (i, &count) in histogram.counts.iter().enumerate() {
        out.push_str(&format!(
            "{:>10} - {:<10} {:>7} {}\n",
            format_value(histogram.edges[i]),
            format_value(histogram.edges[i + 1]),
            count,
            bar(count, peak)
        ));
    }
    out
}

#[must_use]
pub fn render_correlation(matrix: &CorrelationMatrix) -> String {
    let header: String = matrix
        .names
        .iter()
        .map(|name| format!(" {:>8}", truncate(name, 8)))
        .collect();
    let mut out = format!("{:<18}{header}\n", "");

    for (name, row) in matrix.names.iter().zip(&matrix.values) {
        let cells: String = row
            .iter()
            .map(|value| {
                if value.is_nan() {
                    format!(" {:>8}", "nan")
                } else {
                    format!(" {value:>8.2}")
                }
            })
            .collect();
        out.push_str(&format!("{:<18}{cells}\n", truncate(name, 18)));
    }
    out
}

#[must_use]
pub fn render_trends(trend: &BTreeMap<i32, [usize; 4]>, decades: &BTreeMap<i32, usize>) -> String {
    let bins: String = TempoBin::ALL
        .iter()
        .map(|bin| format!(" {:>8}", bin.label()))
        .collect();
    let mut out = format!("Songs by tempo range per year\n{:<6}{bins}\n", "year");
    for (year, counts) in trend {
        let cells: String = counts.iter().map(|count| format!(" {count:>8}")).collect();
        out.push_str(&format!("{year:<6}{cells}\n"));
    }

    out.push_str("\nSongs by decade\n");
    let peak = decades.values().copied().max().unwrap_or(0);
    for (&decade, &count) in decades {
        out.push_str(&format!(
            "{:<6} {:>7} {}\n",
            crate::stats::decade_label(decade),
            count,
            bar(count, peak)
        ));
    }
    out
}

/// One recommendation flattened for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRow {
    pub id: String,
    pub name: String,
    pub artists: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub features: BTreeMap<String, f64>,
}

#[must_use]
pub fn recommendation_rows(
    catalog: &Catalog,
    recommendations: &[Recommendation<'_>],
    features: &[String],
) -> Vec<RecommendationRow> {
    recommendations
        .iter()
        .map(|rec| RecommendationRow {
            id: rec.song.id.clone(),
            name: rec.song.name.clone(),
            artists: rec.song.artists.clone(),
            distance: rec.distance,
            features: features
                .iter()
                .filter_map(|f| rec.song.feature(catalog.schema(), f).map(|v| (f.clone(), v)))
                .collect(),
        })
        .collect()
}

/// Recommendation table, or the "no results" message when empty.
#[must_use]
pub fn render_recommendations(
    catalog: &Catalog,
    recommendations: &[Recommendation<'_>],
    features: &[String],
) -> String {
    if recommendations.is_empty() {
        return format!("{NO_RECOMMENDATIONS}\n");
    }

    let show_distance = recommendations.iter().any(|r| r.distance.is_some());
    let distance_header = if show_distance {
        format!(" {:>9}", "distance")
    } else {
        String::new()
    };
    let mut out = format!(
        "{:>3}  {} {}{distance_header}{}\n",
        "#",
        pad("Name", NAME_WIDTH),
        pad("Artists", ARTIST_WIDTH),
        feature_headers(features)
    );

    for (rank, rec) in recommendations.iter().enumerate() {
        let distance = if show_distance {
            format!(" {:>9.4}", rec.distance.unwrap_or(f64::NAN))
        } else {
            String::new()
        };
        let cells: String = features
            .iter()
            .map(|feature| {
                let value = rec.song.feature(catalog.schema(), feature).unwrap_or(f64::NAN);
                format!(" {:>CELL_WIDTH$}", format_value(value))
            })
            .collect();
        out.push_str(&format!(
            "{:>3}  {} {}{distance}{cells}\n",
            rank + 1,
            pad(&rec.song.name, NAME_WIDTH),
            pad(&rec.song.artists, ARTIST_WIDTH)
        ));
    }
    out
}

#[must_use]
pub fn render_model(model: &LinearModel) -> String {
    let mut out = format!(
        "Linear model for {}\n{:<18} {:>12.4}\n",
        model.target, "intercept", model.intercept
    );
    for (feature, coefficient) in model.features.iter().zip(&model.coefficients) {
        out.push_str(&format!("{:<18} {coefficient:>12.4}\n", truncate(feature, 18)));
    }
    out.push_str(&format!("R² = {}\n", format_value(model.r_squared)));
    out
}

#[must_use]
pub fn render_load_report(report: &LoadReport, songs: usize) -> String {
    format!(
        "Imported {songs} songs ({} rows read, {} dropped as incomplete, {} duplicate ids)\n",
        report.rows_read, report.rows_dropped, report.duplicates
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::{rank, Query};
    use crate::song::FeatureSchema;

    fn catalog() -> Catalog {
        let song = |id: &str, name: &str, energy: f64| Song {
            id: id.to_string(),
            name: name.to_string(),
            artists: "Portishead".to_string(),
            features: vec![energy, 90.0],
        };
        Catalog::new(
            FeatureSchema::new(["energy", "tempo"]),
            vec![song("a", "Roads", 0.2), song("b", "Glory Box", 0.4), song("c", "Sour Times", 0.5)],
        )
        .unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 6), "a muc…");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1965.0), "1965");
        assert_eq!(format_value(0.12345), "0.123");
        assert_eq!(format_value(f64::NAN), "nan");
    }

    #[test]
    fn test_empty_recommendations_show_message() {
        let catalog = catalog();
        let rendered = render_recommendations(&catalog, &[], &[]);
        assert_eq!(rendered.trim(), NO_RECOMMENDATIONS);
    }

    #[test]
    fn test_recommendation_table_lists_in_order() {
        let catalog = catalog();
        let features = vec!["energy".to_string()];
        let recs = rank(&catalog, &Query::song("a"), 2, &features).unwrap();

        let rendered = render_recommendations(&catalog, &recs, &features);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("distance"));
        assert!(lines[1].contains("Glory Box"));
        assert!(lines[2].contains("Sour Times"));
    }

    #[test]
    fn test_recommendation_rows_carry_features() {
        let catalog = catalog();
        let features = vec!["energy".to_string(), "tempo".to_string()];
        let recs = rank(&catalog, &Query::song("a"), 1, &features[..1]).unwrap();

        let rows = recommendation_rows(&catalog, &recs, &features);
        assert_eq!(rows[0].id, "b");
        assert_eq!(rows[0].features["tempo"], 90.0);
        assert!((rows[0].distance.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_bars_scale_to_peak() {
        let hist = Histogram {
            edges: vec![0.0, 0.5, 1.0],
            counts: vec![2, 4],
        };
        let rendered = render_histogram("energy", &hist);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[1].ends_with(&"#".repeat(20)));
        assert!(lines[2].ends_with(&"#".repeat(40)));
    }

    #[test]
    fn test_table_head_shows_text_columns() {
        let table = Table {
            headers: vec!["year".to_string(), "genres".to_string()],
            rows: vec![
                vec!["1921".to_string(), "classical".to_string()],
                vec!["1922".to_string(), "jazz".to_string()],
            ],
        };
        let rendered = render_table(&table, 1);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("genres"));
        assert!(lines[1].contains("classical"));
    }

    #[test]
    fn test_trends_render_decade_labels() {
        let trend = BTreeMap::from([(1965, [1, 0, 2, 0])]);
        let decades = BTreeMap::from([(1960, 3)]);
        let rendered = render_trends(&trend, &decades);
        assert!(rendered.contains("121-180"));
        assert!(rendered.contains("1960s"));
    }
}
