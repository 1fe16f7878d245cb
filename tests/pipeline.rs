//! End-to-end runs of both stages on files in a scratch directory.

use std::path::Path;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use sparam_metrics::config::PipelineConfig;
use sparam_metrics::data::loader::load_table;
use sparam_metrics::error::SchemaError;
use sparam_metrics::pipeline::{run_extract, run_merge};

const GEOMETRY: &str = "dg1 [um],dg_feed [um],L1 [um],L2 [um],Freq [GHz]";

fn write(path: &Path, text: &str) {
    std::fs::write(path, text).unwrap();
}

/// Design A has a clean passband over 2.1–2.3 GHz; design B has only three
/// samples. The S21 export lacks A's 2.5 GHz point and has an extra design C.
fn write_exports(dir: &Path) {
    let mut s11 = format!("{GEOMETRY},\"dB(St(T1,T1)) []\"\n");
    let mut s21 = format!(" {GEOMETRY} ,\"dB(St(T2,T1)) []\"\n");
    let a = [
        (2.0, -2.0, -12.0),
        (2.1, -6.0, -2.5),
        (2.2, -25.0, -0.4),
        (2.3, -9.0, -3.0),
        (2.4, -3.0, -9.0),
        (2.5, -1.0, -20.0),
    ];
    for (f, db11, db21) in a {
        s11.push_str(&format!("10,5,9000,4000,{f},{db11}\n"));
        if f != 2.5 {
            s21.push_str(&format!("10,5,9000,4000,{f},{db21}\n"));
        }
    }
    for f in [2.0, 2.1, 2.2] {
        s11.push_str(&format!("10,5,8000,4000,{f},-10\n"));
        s21.push_str(&format!("10,5,8000,4000,{f},-1\n"));
    }
    s21.push_str("99,5,8000,4000,2.0,-1\n");

    write(&dir.join("S11.csv"), &s11);
    write(&dir.join("S21.csv"), &s21);
}

#[test]
fn merge_then_extract() {
    let dir = TempDir::new().unwrap();
    write_exports(dir.path());
    let config = PipelineConfig::load(dir.path()).unwrap();

    let merge = run_merge(&config).unwrap();
    assert_eq!(merge.s11_rows, 9);
    assert_eq!(merge.s21_rows, 9);
    assert_eq!(merge.merged_rows, 8);

    let merged = load_table(&config.merged_output).unwrap();
    assert_eq!(
        merged.headers,
        vec![
            "dg1 [um]",
            "dg_feed [um]",
            "L1 [um]",
            "L2 [um]",
            "Freq [GHz]",
            "S11_dB",
            "S21_dB"
        ]
    );
    // Design with L1 = 8000 sorts first.
    assert_eq!(merged.rows[0], vec![10.0, 5.0, 8000.0, 4000.0, 2.0, -10.0, -1.0]);
    assert_eq!(merged.rows[3][2], 9000.0);

    let extract = run_extract(&config).unwrap();
    assert_eq!(extract.designs, 2);
    assert_eq!(extract.with_bandwidth, 1);
    assert_eq!(extract.insufficient, 1);

    let bytes = std::fs::read(&config.metrics_output).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));

    let metrics = load_table(&config.metrics_output).unwrap();
    let col = |name: &str| metrics.column_index(name).unwrap();
    assert_eq!(metrics.len(), 2);

    let short = &metrics.rows[0];
    assert_eq!(short[col("L1 [um]")], 8000.0);
    assert!(short[col("S21peak [dB]")].is_nan());
    assert!(short[col("BW_3dB [GHz]")].is_nan());

    let full = &metrics.rows[1];
    assert_eq!(full[col("S21peak [dB]")], -0.4);
    assert_eq!(full[col("fL_3dB [GHz]")], 2.1);
    assert_eq!(full[col("fH_3dB [GHz]")], 2.3);
    assert_abs_diff_eq!(full[col("BW_3dB [GHz]")], 0.2, epsilon = 1e-9);
    assert_abs_diff_eq!(full[col("fc [GHz]")], 2.2, epsilon = 1e-9);
    assert_eq!(full[col("S11min_inband [dB]")], -25.0);
}

#[test]
fn missing_geometry_column_fails_the_merge() {
    let dir = TempDir::new().unwrap();
    write(
        &dir.path().join("S11.csv"),
        "dg1 [um],L1 [um],L2 [um],Freq [GHz],S11_dB\n1,2,3,2.0,-1\n",
    );
    write(
        &dir.path().join("S21.csv"),
        &format!("{GEOMETRY},S21_dB\n1,0,2,3,2.0,-1\n"),
    );
    let config = PipelineConfig::load(dir.path()).unwrap();

    let err = run_merge(&config).unwrap_err();
    match err.downcast_ref::<SchemaError>() {
        Some(SchemaError::MissingColumns { missing, found, .. }) => {
            assert_eq!(missing, &["dg_feed [um]"]);
            assert!(found.iter().any(|c| c == "S11_dB"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!config.merged_output.exists());
}

#[test]
fn extract_reports_missing_columns_in_merged_table() {
    let dir = TempDir::new().unwrap();
    write(
        &dir.path().join("S11_S21_merged.csv"),
        &format!("{GEOMETRY},S11_dB\n1,0,2,3,2.0,-1\n"),
    );
    let config = PipelineConfig::load(dir.path()).unwrap();
    let err = run_extract(&config).unwrap_err();
    assert!(format!("{err:#}").contains("S21_dB"));
}
