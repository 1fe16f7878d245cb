use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{DesignMetrics, SweepSample, METRIC_COLUMNS};
use crate::config::ColumnConfig;

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Format a cell; missing values are written as empty cells.
pub fn format_cell(v: Option<f64>) -> String {
    match v {
        Some(x) if !x.is_nan() => x.to_string(),
        _ => String::new(),
    }
}

/// Open `path` for CSV output, creating parent directories and writing the BOM.
fn create_csv(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM).context("writing BOM")?;
    Ok(csv::Writer::from_writer(out))
}

/// Write the merged sweep: geometry columns, frequency, S11, S21.
pub fn write_merged(path: &Path, samples: &[SweepSample], columns: &ColumnConfig) -> Result<()> {
    let mut writer = create_csv(path)?;
    writer
        .write_record(columns.merged_headers())
        .context("writing merged header")?;

    for s in samples {
        let cells = s
            .geometry
            .0
            .iter()
            .copied()
            .chain([s.freq, s.s11, s.s21])
            .map(|v| format_cell(Some(v)));
        writer.write_record(cells).context("writing merged row")?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Write the per-design metrics table: geometry columns then metric columns.
pub fn write_metrics(path: &Path, designs: &[DesignMetrics], columns: &ColumnConfig) -> Result<()> {
    let mut writer = create_csv(path)?;
    let header = columns
        .geometry
        .iter()
        .map(String::as_str)
        .chain(METRIC_COLUMNS);
    writer.write_record(header).context("writing metrics header")?;

    for d in designs {
        let cells = d
            .geometry
            .0
            .iter()
            .map(|v| Some(*v))
            .chain(d.metrics.values())
            .map(format_cell);
        writer.write_record(cells).context("writing metrics row")?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}
