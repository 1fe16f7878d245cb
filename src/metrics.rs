//! Passband detection and per-design metric extraction.
//!
//! For one geometry's sweep the passband is the contiguous run of samples
//! around the S21 peak that stay within `drop_db` of it. Edges snap to
//! samples; nothing is interpolated.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::config::ColumnConfig;
use crate::data::model::{DesignMetrics, GeometryKey, PassbandMetrics, SweepSample, Table};

/// Default number of samples below which a sweep is not characterised.
pub const MIN_SAMPLES: usize = 5;

/// Default distance below the peak that bounds the passband, in dB.
pub const DROP_DB: f64 = 3.0;

/// Parameters of the extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractParams {
    pub min_samples: usize,
    pub drop_db: f64,
}

impl Default for ExtractParams {
    fn default() -> Self {
        ExtractParams {
            min_samples: MIN_SAMPLES,
            drop_db: DROP_DB,
        }
    }
}

// ---------------------------------------------------------------------------
// Passband detection
// ---------------------------------------------------------------------------

/// Sample indices bounding the passband, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passband {
    pub peak: usize,
    pub left: usize,
    pub right: usize,
}

/// Index of the largest finite value, first one on ties.
pub fn argmax_finite(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Locate the contiguous run around the S21 peak where
/// `s21 >= peak - drop_db`. `None` if no sample is finite or, should the
/// peak itself fail the threshold, if nothing qualifies.
pub fn detect_passband(s21: &[f64], drop_db: f64) -> Option<Passband> {
    let peak = argmax_finite(s21)?;
    let threshold = s21[peak] - drop_db;
    let passes = |i: usize| s21[i] >= threshold;

    if !passes(peak) {
        return None;
    }

    let mut left = peak;
    while left > 0 && passes(left - 1) {
        left -= 1;
    }
    let mut right = peak;
    while right + 1 < s21.len() && passes(right + 1) {
        right += 1;
    }
    Some(Passband { peak, left, right })
}

/// Minimum over `values`, skipping NaN. `None` if nothing is left.
fn nan_min(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
}

/// Derive the passband metrics of one sweep. `points` need not be sorted.
pub fn extract_metrics(points: &[SweepSample], params: &ExtractParams) -> PassbandMetrics {
    if points.len() < params.min_samples {
        return PassbandMetrics::missing();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.freq.total_cmp(&b.freq));
    let freq: Vec<f64> = sorted.iter().map(|p| p.freq).collect();
    let s11: Vec<f64> = sorted.iter().map(|p| p.s11).collect();
    let s21: Vec<f64> = sorted.iter().map(|p| p.s21).collect();

    let Some(peak) = argmax_finite(&s21) else {
        return PassbandMetrics::missing();
    };
    let s21_peak = s21[peak];

    let Some(band) = detect_passband(&s21, params.drop_db) else {
        return PassbandMetrics::peak_only(s21_peak);
    };

    let f_low = freq[band.left];
    let f_high = freq[band.right];
    if !f_low.is_finite() || !f_high.is_finite() || f_high < f_low {
        return PassbandMetrics {
            f_low: Some(f_low).filter(|f| f.is_finite()),
            f_high: Some(f_high).filter(|f| f.is_finite()),
            ..PassbandMetrics::peak_only(s21_peak)
        };
    }

    PassbandMetrics {
        fc: Some(0.5 * (f_low + f_high)),
        bandwidth: Some(f_high - f_low),
        s11_min_inband: nan_min(&s11[band.left..=band.right]),
        s21_peak: Some(s21_peak),
        f_low: Some(f_low),
        f_high: Some(f_high),
    }
}

// ---------------------------------------------------------------------------
// Per-design extraction
// ---------------------------------------------------------------------------

/// Counts reported after an extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub designs: usize,
    pub with_bandwidth: usize,
    pub insufficient: usize,
}

/// Read sweep samples out of a merged table.
pub fn samples_from_table(table: &Table, columns: &ColumnConfig) -> Result<Vec<SweepSample>> {
    let mut names = columns.key_columns();
    names.push(&columns.s11);
    names.push(&columns.s21);
    let idx = table.require_columns(&names)?;

    Ok(table
        .rows
        .iter()
        .map(|row| SweepSample {
            geometry: GeometryKey::new([row[idx[0]], row[idx[1]], row[idx[2]], row[idx[3]]]),
            freq: row[idx[4]],
            s11: row[idx[5]],
            s21: row[idx[6]],
        })
        .collect())
}

/// Group samples by geometry and extract one metrics row per design, sorted
/// by geometry key.
pub fn extract_designs(
    samples: &[SweepSample],
    params: &ExtractParams,
) -> (Vec<DesignMetrics>, ExtractSummary) {
    let mut groups: BTreeMap<GeometryKey, Vec<SweepSample>> = BTreeMap::new();
    for s in samples {
        groups.entry(s.geometry).or_default().push(*s);
    }

    let mut summary = ExtractSummary::default();
    let designs: Vec<DesignMetrics> = groups
        .into_iter()
        .map(|(geometry, points)| {
            let metrics = extract_metrics(&points, params);
            summary.designs += 1;
            if points.len() < params.min_samples {
                summary.insufficient += 1;
                log::debug!("{geometry}: {} samples, too few for a passband", points.len());
            } else if metrics.bandwidth.is_some() {
                summary.with_bandwidth += 1;
            } else {
                log::debug!("{geometry}: no usable passband around the S21 peak");
            }
            DesignMetrics { geometry, metrics }
        })
        .collect();

    (designs, summary)
}
