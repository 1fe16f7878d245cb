use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Table – one loaded input file
// ---------------------------------------------------------------------------

/// A numeric table as read from disk. Every row has exactly `headers.len()`
/// cells; cells that could not be read as numbers hold NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names, trimmed.
    pub headers: Vec<String>,
    /// Row-major cells.
    pub rows: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with NaN or truncating to the header width.
    pub fn push_row(&mut self, mut row: Vec<f64>) {
        row.resize(self.headers.len(), f64::NAN);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Look up every named column, failing with the full list of what is
    /// missing and what was found.
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, SchemaError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| self.column_index(n).is_none())
            .map(|n| n.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns {
                missing,
                expected: names.iter().map(|n| n.to_string()).collect(),
                found: self.headers.clone(),
            });
        }
        Ok(names
            .iter()
            .filter_map(|n| self.column_index(n))
            .collect())
    }

    /// Index of the first accepted name present in the table.
    pub fn resolve_alias(&self, accepted: &[&str]) -> Result<usize, SchemaError> {
        accepted
            .iter()
            .find_map(|name| self.column_index(name))
            .ok_or_else(|| SchemaError::NoAlias {
                accepted: accepted.iter().map(|n| n.to_string()).collect(),
                found: self.headers.clone(),
            })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GeometryKey – the four design parameters identifying one device
// ---------------------------------------------------------------------------

/// Collapse values that compare equal under IEEE rules but differ in bits
/// (`-0.0`/`0.0`, NaN payloads) so bitwise equality and hashing agree.
pub fn canonical(v: f64) -> f64 {
    if v.is_nan() {
        f64::NAN
    } else if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Four numeric design parameters, in configured column order.
///
/// Equality and hashing work on canonicalised bit patterns and ordering uses
/// `f64::total_cmp`, so missing (NaN) geometry cells form their own group
/// that sorts after every finite key.
#[derive(Debug, Clone, Copy)]
pub struct GeometryKey(pub [f64; 4]);

impl GeometryKey {
    pub fn new(values: [f64; 4]) -> Self {
        GeometryKey(values.map(canonical))
    }
}

impl PartialEq for GeometryKey {
    fn eq(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for GeometryKey {}

impl PartialOrd for GeometryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GeometryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl Hash for GeometryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in &self.0 {
            v.to_bits().hash(state);
        }
    }
}

impl fmt::Display for GeometryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "({a}, {b}, {c}, {d})")
    }
}

// ---------------------------------------------------------------------------
// SweepSample – one row of the merged sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSample {
    pub geometry: GeometryKey,
    /// Frequency in GHz.
    pub freq: f64,
    /// S11 in dB.
    pub s11: f64,
    /// S21 in dB.
    pub s21: f64,
}

/// Geometry plus canonical frequency bits; used to pair rows across tables.
pub type JoinKey = (GeometryKey, u64);

pub fn join_key(geometry: GeometryKey, freq: f64) -> JoinKey {
    (geometry, canonical(freq).to_bits())
}

impl SweepSample {
    pub fn join_key(&self) -> JoinKey {
        join_key(self.geometry, self.freq)
    }

    /// Order by geometry, then frequency.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.geometry
            .cmp(&other.geometry)
            .then_with(|| self.freq.total_cmp(&other.freq))
    }
}

// ---------------------------------------------------------------------------
// Metrics – one output row per design
// ---------------------------------------------------------------------------

/// Passband figures for one geometry. `None` means "undefined for this sweep",
/// never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassbandMetrics {
    /// Center frequency [GHz].
    pub fc: Option<f64>,
    /// 3dB bandwidth [GHz].
    pub bandwidth: Option<f64>,
    /// Minimum S11 inside the passband [dB].
    pub s11_min_inband: Option<f64>,
    /// Peak S21 [dB].
    pub s21_peak: Option<f64>,
    /// Lower 3dB edge [GHz].
    pub f_low: Option<f64>,
    /// Upper 3dB edge [GHz].
    pub f_high: Option<f64>,
}

impl PassbandMetrics {
    pub fn missing() -> Self {
        Self::default()
    }

    /// Only the peak is known.
    pub fn peak_only(s21_peak: f64) -> Self {
        PassbandMetrics {
            s21_peak: Some(s21_peak),
            ..Self::default()
        }
    }

    /// Values in output column order.
    pub fn values(&self) -> [Option<f64>; 6] {
        [
            self.fc,
            self.bandwidth,
            self.s11_min_inband,
            self.s21_peak,
            self.f_low,
            self.f_high,
        ]
    }
}

/// Output column names for [`PassbandMetrics::values`].
pub const METRIC_COLUMNS: [&str; 6] = [
    "fc [GHz]",
    "BW_3dB [GHz]",
    "S11min_inband [dB]",
    "S21peak [dB]",
    "fL_3dB [GHz]",
    "fH_3dB [GHz]",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignMetrics {
    pub geometry: GeometryKey,
    pub metrics: PassbandMetrics,
}
