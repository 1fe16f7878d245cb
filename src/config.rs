use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::metrics::{DROP_DB, MIN_SAMPLES};

/// Name of the optional configuration file looked up in the project root.
pub const CONFIG_FILE: &str = "sparam_pipeline.json";

/// Environment variable overriding the project root.
pub const ROOT_ENV: &str = "SPARAM_PROJECT_ROOT";

// ---------------------------------------------------------------------------
// Column naming
// ---------------------------------------------------------------------------

/// Column names of the simulator exports and of the tables we write.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// The four design parameters forming the geometry key, in key order.
    pub geometry: [String; 4],
    pub frequency: String,
    /// Canonical S11 column name used in the merged table.
    pub s11: String,
    /// Canonical S21 column name used in the merged table.
    pub s21: String,
    /// Raw simulator export names accepted for S11.
    pub s11_aliases: Vec<String>,
    /// Raw simulator export names accepted for S21.
    pub s21_aliases: Vec<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        ColumnConfig {
            geometry: [
                "dg1 [um]".to_string(),
                "dg_feed [um]".to_string(),
                "L1 [um]".to_string(),
                "L2 [um]".to_string(),
            ],
            frequency: "Freq [GHz]".to_string(),
            s11: "S11_dB".to_string(),
            s21: "S21_dB".to_string(),
            s11_aliases: vec!["dB(St(T1,T1)) []".to_string()],
            s21_aliases: vec!["dB(St(T2,T1)) []".to_string()],
        }
    }
}

impl ColumnConfig {
    /// Geometry columns followed by the frequency column.
    pub fn key_columns(&self) -> Vec<&str> {
        self.geometry
            .iter()
            .map(String::as_str)
            .chain([self.frequency.as_str()])
            .collect()
    }

    /// Canonical S11 name first, then its aliases.
    pub fn s11_names(&self) -> Vec<&str> {
        std::iter::once(self.s11.as_str())
            .chain(self.s11_aliases.iter().map(String::as_str))
            .collect()
    }

    /// Canonical S21 name first, then its aliases.
    pub fn s21_names(&self) -> Vec<&str> {
        std::iter::once(self.s21.as_str())
            .chain(self.s21_aliases.iter().map(String::as_str))
            .collect()
    }

    /// Header of the merged sweep table.
    pub fn merged_headers(&self) -> Vec<&str> {
        let mut headers = self.key_columns();
        headers.push(&self.s11);
        headers.push(&self.s21);
        headers
    }
}

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// File locations and extraction parameters. Relative paths are resolved
/// against the project root by [`PipelineConfig::resolve`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub s11_input: PathBuf,
    pub s21_input: PathBuf,
    pub merged_output: PathBuf,
    pub metrics_output: PathBuf,
    pub columns: ColumnConfig,
    /// Groups with fewer samples than this get all-missing metrics.
    pub min_samples: usize,
    /// Passband edge is this many dB below the S21 peak.
    pub drop_db: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            s11_input: PathBuf::from("S11.csv"),
            s21_input: PathBuf::from("S21.csv"),
            merged_output: PathBuf::from("S11_S21_merged.csv"),
            metrics_output: PathBuf::from("design_metrics.csv"),
            columns: ColumnConfig::default(),
            min_samples: MIN_SAMPLES,
            drop_db: DROP_DB,
        }
    }
}

impl PipelineConfig {
    /// Read the configuration for the project root given by the environment,
    /// falling back to the current directory.
    pub fn from_env() -> Result<Self> {
        let root = match std::env::var_os(ROOT_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().context("determining current directory")?,
        };
        Self::load(&root)
    }

    /// Read `sparam_pipeline.json` from `root` if present, else use defaults,
    /// then resolve every path against `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let file = root.join(CONFIG_FILE);
        let config = if file.is_file() {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let config: PipelineConfig = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;
            config.validate(&file)?;
            log::info!("Using configuration from {}", file.display());
            config
        } else {
            log::debug!("No {CONFIG_FILE} in {}; using defaults", root.display());
            PipelineConfig::default()
        };
        Ok(config.resolve(root))
    }

    /// Reject extraction parameters under which no passband can be found.
    fn validate(&self, file: &Path) -> Result<()> {
        if !self.drop_db.is_finite() || self.drop_db < 0.0 {
            bail!(
                "{}: drop_db must be a finite, non-negative number of dB, got {}",
                file.display(),
                self.drop_db
            );
        }
        if self.min_samples < 1 {
            bail!("{}: min_samples must be at least 1", file.display());
        }
        Ok(())
    }

    /// Make every relative path absolute with respect to `root`.
    pub fn resolve(mut self, root: &Path) -> Self {
        for path in [
            &mut self.s11_input,
            &mut self.s21_input,
            &mut self.merged_output,
            &mut self.metrics_output,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults_resolve_against_root() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::load(dir.path()).unwrap();
        assert_eq!(config.s11_input, dir.path().join("S11.csv"));
        assert_eq!(config.metrics_output, dir.path().join("design_metrics.csv"));
        assert_eq!(config.min_samples, 5);
        assert_eq!(config.columns, ColumnConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
                "s21_input": "raw/S21_export.csv",
                "merged_output": "/abs/merged.csv",
                "columns": { "frequency": "Freq [MHz]" }
            }"#,
        )
        .unwrap();

        let config = PipelineConfig::load(dir.path()).unwrap();
        assert_eq!(config.s21_input, dir.path().join("raw/S21_export.csv"));
        assert_eq!(config.merged_output, PathBuf::from("/abs/merged.csv"));
        assert_eq!(config.columns.frequency, "Freq [MHz]");
        assert_eq!(config.columns.s11, "S11_dB");
        assert_eq!(config.drop_db, 3.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let err = PipelineConfig::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(CONFIG_FILE));
    }

    #[test]
    fn negative_drop_db_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "drop_db": -1.0 }"#).unwrap();
        let err = PipelineConfig::load(dir.path()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("drop_db"));
        assert!(msg.contains(CONFIG_FILE));
    }

    #[test]
    fn zero_min_samples_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "min_samples": 0 }"#).unwrap();
        let err = PipelineConfig::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("min_samples"));
    }

    #[test]
    fn non_finite_drop_db_is_rejected() {
        let config = PipelineConfig {
            drop_db: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(config.validate(Path::new(CONFIG_FILE)).is_err());
        assert!(PipelineConfig::default()
            .validate(Path::new(CONFIG_FILE))
            .is_ok());
    }

    #[test]
    fn column_name_lists() {
        let columns = ColumnConfig::default();
        assert_eq!(
            columns.merged_headers(),
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
        assert_eq!(columns.s21_names(), vec!["S21_dB", "dB(St(T2,T1)) []"]);
    }
}
