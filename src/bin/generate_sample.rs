//! Write a synthetic pair of simulator exports (`S11.csv`, `S21.csv`) into the
//! configured input locations, using the raw simulator column names.

use std::path::Path;

use anyhow::{Context, Result};

use sparam_metrics::config::{ColumnConfig, PipelineConfig};

/// Single-resonator bandpass response in dB: (S11, S21).
fn bandpass_db(f: f64, f0: f64, q: f64, insertion_loss: f64) -> (f64, f64) {
    let detune = q * (f / f0 - f0 / f);
    let s21_lin = 10f64.powf(-insertion_loss / 10.0) / (1.0 + detune * detune);
    let s11_lin = (1.0 - s21_lin).max(1e-6);
    (10.0 * s11_lin.log10(), 10.0 * s21_lin.log10())
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_export(path: &Path, header: &[&str], rows: &[[f64; 6]]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(|v| format!("{v:.6}")))?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    sparam_metrics::init_logging();
    let config = PipelineConfig::from_env()?;
    let ColumnConfig {
        geometry,
        frequency,
        s11_aliases,
        s21_aliases,
        ..
    } = &config.columns;
    let s11_name = s11_aliases.first().context("no raw S11 column name configured")?;
    let s21_name = s21_aliases.first().context("no raw S21 column name configured")?;

    let mut rng = SimpleRng::new(42);

    // Frequency: 1.5 → 3.5 GHz, step 10 MHz
    let freqs: Vec<f64> = (0..=200).map(|i| 1.5 + i as f64 * 0.01).collect();

    let dg1 = [10.0, 20.0];
    let dg_feed = [5.0, 8.0];
    let l1 = [9000.0, 10000.0, 11000.0];
    let l2 = [4000.0, 4500.0];

    let mut s11_rows = Vec::new();
    let mut s21_rows = Vec::new();
    for &g in &dg1 {
        for &feed in &dg_feed {
            for &a in &l1 {
                for &b in &l2 {
                    // Longer resonators tune lower; wider gaps load Q down.
                    let f0 = 2.5 * 10000.0 / a * (1.0 + (4500.0 - b) / 40000.0);
                    let q = 40.0 / (1.0 + g / 20.0) * (1.0 + feed / 40.0);
                    let il = 0.5 + g / 40.0;
                    for &f in &freqs {
                        let (s11, s21) = bandpass_db(f, f0, q, il);
                        s11_rows.push([g, feed, a, b, f, s11 + rng.gauss(0.0, 0.05)]);
                        s21_rows.push([g, feed, a, b, f, s21 + rng.gauss(0.0, 0.05)]);
                    }
                }
            }
        }
    }

    let mut s11_header: Vec<&str> = geometry.iter().map(String::as_str).collect();
    s11_header.push(frequency);
    let mut s21_header = s11_header.clone();
    s11_header.push(s11_name);
    s21_header.push(s21_name);

    write_export(&config.s11_input, &s11_header, &s11_rows)?;
    write_export(&config.s21_input, &s21_header, &s21_rows)?;

    log::info!(
        "Wrote {} designs ({} frequencies each) to {} and {}",
        s11_rows.len() / freqs.len(),
        freqs.len(),
        config.s11_input.display(),
        config.s21_input.display()
    );
    Ok(())
}
