//! Inner join of the S11 and S21 sweep exports on geometry and frequency.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use anyhow::Result;

use crate::config::ColumnConfig;
use crate::data::model::{join_key, GeometryKey, JoinKey, SweepSample, Table};

/// One input reduced to join key → S-parameter value.
#[derive(Debug, Default)]
struct KeyedColumn {
    /// Keys in first-seen order.
    order: Vec<JoinKey>,
    values: HashMap<JoinKey, (GeometryKey, f64, f64)>,
    duplicates: usize,
}

/// Index one table by (geometry, frequency), keeping the first occurrence of
/// each key. `value_names` lists the canonical name followed by raw aliases.
fn key_table(table: &Table, columns: &ColumnConfig, value_names: &[&str]) -> Result<KeyedColumn> {
    let key_idx = table.require_columns(&columns.key_columns())?;
    let value_idx = table.resolve_alias(value_names)?;

    let mut keyed = KeyedColumn::default();
    for row in &table.rows {
        let geometry = GeometryKey::new([
            row[key_idx[0]],
            row[key_idx[1]],
            row[key_idx[2]],
            row[key_idx[3]],
        ]);
        let freq = row[key_idx[4]];
        let key = join_key(geometry, freq);
        match keyed.values.entry(key) {
            Entry::Occupied(_) => keyed.duplicates += 1,
            Entry::Vacant(slot) => {
                slot.insert((geometry, freq, row[value_idx]));
                keyed.order.push(key);
            }
        }
    }
    Ok(keyed)
}

/// Counts reported after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub s11_rows: usize,
    pub s21_rows: usize,
    pub merged_rows: usize,
    pub s11_duplicates: usize,
    pub s21_duplicates: usize,
}

/// Join the S11 and S21 tables, keeping keys present in both. The S-parameter
/// column of each is located under its canonical name or a raw export alias.
/// Output is sorted by geometry, then frequency.
pub fn merge_sweeps(
    s11: &Table,
    s21: &Table,
    columns: &ColumnConfig,
) -> Result<(Vec<SweepSample>, MergeSummary)> {
    let left = key_table(s11, columns, &columns.s11_names())?;
    let right = key_table(s21, columns, &columns.s21_names())?;

    let mut merged: Vec<SweepSample> = left
        .order
        .iter()
        .filter_map(|key| {
            let (geometry, freq, s11) = left.values[key];
            let (_, _, s21) = *right.values.get(key)?;
            Some(SweepSample {
                geometry,
                freq,
                s11,
                s21,
            })
        })
        .collect();
    merged.sort_by(SweepSample::cmp_key);

    let summary = MergeSummary {
        s11_rows: s11.len(),
        s21_rows: s21.len(),
        merged_rows: merged.len(),
        s11_duplicates: left.duplicates,
        s21_duplicates: right.duplicates,
    };

    if summary.s11_duplicates > 0 || summary.s21_duplicates > 0 {
        log::warn!(
            "Dropped duplicate (geometry, frequency) rows: {} in S11, {} in S21",
            summary.s11_duplicates,
            summary.s21_duplicates
        );
    }
    let unmatched_s11 = left.order.len() - merged.len();
    let unmatched_s21 = right.order.len() - merged.len();
    if unmatched_s11 > 0 || unmatched_s21 > 0 {
        log::warn!(
            "{unmatched_s11} S11 rows and {unmatched_s21} S21 rows have no partner and were dropped"
        );
    }

    Ok((merged, summary))
}
