//! Descriptive statistics over a catalog.
//!
//! Everything here is a pure function of the catalog: summaries, histograms,
//! correlations and the year/tempo/decade breakdowns the overview and
//! exploration commands print.

use crate::catalog::Catalog;
use crate::dataset::Table;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Summary of one numeric feature, in the layout of a `describe()` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1). NaN for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarizes every feature in the schema, in schema order.
///
/// An empty catalog yields summaries with `count == 0` and NaN statistics.
#[must_use]
pub fn describe(catalog: &Catalog) -> Vec<ColumnSummary> {
    catalog
        .schema()
        .names()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<f64> = catalog.songs().iter().map(|s| s.features[idx]).collect();
            summarize(name, &values)
        })
        .collect()
}

/// Summarizes every numeric column of a free-form table. Blank cells are
/// left out of that column's statistics.
#[must_use]
pub fn describe_table(table: &Table) -> Vec<ColumnSummary> {
    table
        .numeric_columns()
        .into_iter()
        .map(|name| summarize(name, &table.column(name).unwrap_or_default()))
        .collect()
}

#[must_use]
pub fn summarize(name: &str, values: &[f64]) -> ColumnSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    ColumnSummary {
        name: name.to_string(),
        count: values.len(),
        mean: mean(values),
        std: sample_std(values),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Linear-interpolation quantile of already sorted values.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Buckets `values` into `bins` equal-width bins spanning `[min, max]`.
///
/// Bins are half-open except the last, which also takes `max`. When every
/// value is equal the range is widened by 0.5 on both sides.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    if values.is_empty() || bins == 0 {
        return Histogram {
            edges: Vec::new(),
            counts: Vec::new(),
        };
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &v in values {
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    Histogram { edges, counts }
}

/// Pearson correlation of every feature pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    /// Row-major, `names.len()` squared entries.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }
}

/// Correlation matrix over the full schema. Constant columns correlate as NaN.
#[must_use]
pub fn correlation_matrix(catalog: &Catalog) -> CorrelationMatrix {
    let names = catalog.schema().names().to_vec();
    let columns: Vec<Vec<f64>> = (0..names.len())
        .map(|idx| catalog.songs().iter().map(|s| s.features[idx]).collect())
        .collect();

    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix { names, values }
}

/// Pearson's r. NaN if either side has zero variance or fewer than two points.
#[must_use]
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));

    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - ma, y - mb);
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }

    if va == 0.0 || vb == 0.0 {
        return f64::NAN;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// Tempo ranges used for the "tempo over the years" breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TempoBin {
    Slow,
    Moderate,
    Fast,
    VeryFast,
}

impl TempoBin {
    pub const ALL: [TempoBin; 4] = [Self::Slow, Self::Moderate, Self::Fast, Self::VeryFast];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Slow => "0-60",
            Self::Moderate => "61-120",
            Self::Fast => "121-180",
            Self::VeryFast => "181-240",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TempoBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Right-closed bins `(0, 60]`, `(60, 120]`, `(120, 180]`, `(180, 240]`.
/// Tempos outside `(0, 240]` have no bin.
#[must_use]
pub fn tempo_bin(tempo: f64) -> Option<TempoBin> {
    match tempo {
        t if t > 0.0 && t <= 60.0 => Some(TempoBin::Slow),
        t if t > 60.0 && t <= 120.0 => Some(TempoBin::Moderate),
        t if t > 120.0 && t <= 180.0 => Some(TempoBin::Fast),
        t if t > 180.0 && t <= 240.0 => Some(TempoBin::VeryFast),
        _ => None,
    }
}

/// First year of the decade containing `year`.
#[must_use]
pub const fn decade(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// `1987` -> `"1980s"`.
#[must_use]
pub fn decade_label(year: i32) -> String {
    format!("{}s", decade(year))
}

#[allow(clippy::cast_possible_truncation)]
fn years(catalog: &Catalog) -> Result<Vec<i32>> {
    Ok(catalog
        .column("year")?
        .into_iter()
        .map(|y| y.floor() as i32)
        .collect())
}

/// Per year, the number of songs falling in each [`TempoBin`]
/// (indexed by `TempoBin::ALL` order). Songs without a bin are skipped.
///
/// # Errors
///
/// [`Error::SchemaMismatch`] if the catalog lacks `year` or `tempo`.
pub fn tempo_trend(catalog: &Catalog) -> Result<BTreeMap<i32, [usize; 4]>> {
    let missing: Vec<&str> = ["year", "tempo"]
        .into_iter()
        .filter(|name| catalog.schema().index_of(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(Error::schema_mismatch(missing));
    }

    let mut trend: BTreeMap<i32, [usize; 4]> = BTreeMap::new();
    for (year, tempo) in years(catalog)?.into_iter().zip(catalog.column("tempo")?) {
        if let Some(bin) = tempo_bin(tempo) {
            trend.entry(year).or_default()[bin.index()] += 1;
        }
    }
    Ok(trend)
}

/// Song count per decade, keyed by the decade's first year.
///
/// # Errors
///
/// [`Error::SchemaMismatch`] if the catalog lacks `year`.
pub fn songs_per_decade(catalog: &Catalog) -> Result<BTreeMap<i32, usize>> {
    let mut counts = BTreeMap::new();
    for year in years(catalog)? {
        *counts.entry(decade(year)).or_insert(0) += 1;
    }
    Ok(counts)
}
