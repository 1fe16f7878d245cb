//! The two stages as file-to-file operations driven by [`PipelineConfig`].

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::data::{loader, writer};
use crate::merge::{merge_sweeps, MergeSummary};
use crate::metrics::{extract_designs, samples_from_table, ExtractParams, ExtractSummary};

/// Read both sweep exports, join them and write the merged table.
pub fn run_merge(config: &PipelineConfig) -> Result<MergeSummary> {
    log::info!(
        "Merging {} and {}",
        config.s11_input.display(),
        config.s21_input.display()
    );
    let s11 = loader::load_table(&config.s11_input)?;
    let s21 = loader::load_table(&config.s21_input)?;

    let (merged, summary) = merge_sweeps(&s11, &s21, &config.columns)
        .context("merging S11 and S21 sweeps")?;
    writer::write_merged(&config.merged_output, &merged, &config.columns)?;

    log::info!(
        "merged saved to: {}  rows={}",
        config.merged_output.display(),
        summary.merged_rows
    );
    Ok(summary)
}

/// Read the merged table, extract passband metrics per design and write them.
pub fn run_extract(config: &PipelineConfig) -> Result<ExtractSummary> {
    log::info!("Extracting metrics from {}", config.merged_output.display());
    let table = loader::load_table(&config.merged_output)?;
    let samples = samples_from_table(&table, &config.columns)
        .with_context(|| format!("reading sweep from {}", config.merged_output.display()))?;

    let params = ExtractParams {
        min_samples: config.min_samples,
        drop_db: config.drop_db,
    };
    let (designs, summary) = extract_designs(&samples, &params);
    writer::write_metrics(&config.metrics_output, &designs, &config.columns)?;

    log::info!(
        "metrics saved to: {}  designs={} (with bandwidth: {}, too few samples: {})",
        config.metrics_output.display(),
        summary.designs,
        summary.with_bandwidth,
        summary.insufficient
    );
    Ok(summary)
}
