//! Writes a sample data directory: one environment CSV per school and the
//! growth workbook with one sheet per school.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rust_xlsxwriter::Workbook;

#[derive(Parser, Debug)]
#[command(about = "Generate sample EC study data")]
struct Args {
    /// Output directory.
    #[arg(default_value = "data")]
    dir: PathBuf,
}

/// (school, target EC, mean fresh weight g, mean leaf count, mean shoot length mm, specimens)
const SCHOOLS: [(&str, f64, f64, f64, f64, usize); 4] = [
    ("송도고", 1.0, 4.2, 6.0, 82.0, 29),
    ("하늘고", 2.0, 6.8, 7.5, 101.0, 45),
    ("아라고", 4.0, 5.1, 6.8, 93.0, 106),
    ("동산고", 8.0, 3.3, 5.4, 70.0, 58),
];

const GROWTH_FILE: &str = "4개교_생육결과데이터.xlsx";
const GROWTH_HEADER: [&str; 4] = ["개체번호", "생중량(g)", "잎 수(장)", "지상부 길이(mm)"];
const ENV_SAMPLES: usize = 96;

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

fn round(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn write_environment(dir: &Path, school: &str, target_ec: f64, rng: &mut SimpleRng) -> Result<()> {
    let path = dir.join(format!("{school}_환경데이터.csv"));
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["time", "temperature", "humidity", "ph", "ec"])?;

    for i in 0..ENV_SAMPLES {
        let hour = i % 24;
        let daily = (hour as f64 / 24.0 * 2.0 * std::f64::consts::PI).sin();
        writer.write_record([
            format!("2025-05-{:02} {hour:02}:00", 1 + i / 24),
            round(rng.gauss(22.0 + 2.5 * daily, 0.6), 1).to_string(),
            round(rng.gauss(62.0 - 6.0 * daily, 2.0), 1).to_string(),
            round(rng.gauss(6.1, 0.15), 2).to_string(),
            round(rng.gauss(target_ec, target_ec * 0.05), 2).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_growth(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let mut workbook = Workbook::new();
    for (school, _, weight, leaves, length, specimens) in SCHOOLS {
        let sheet = workbook.add_worksheet();
        sheet.set_name(school)?;
        for (col, header) in GROWTH_HEADER.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for i in 0..specimens {
            let row = i as u32 + 1;
            sheet.write_number(row, 0, row as f64)?;
            sheet.write_number(row, 1, round(rng.gauss(weight, weight * 0.2).max(0.1), 2))?;
            sheet.write_number(row, 2, rng.gauss(leaves, 1.2).round().max(1.0))?;
            sheet.write_number(row, 3, round(rng.gauss(length, 12.0).max(5.0), 1))?;
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let dir = Args::parse().dir;
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);
    for (school, target_ec, ..) in SCHOOLS {
        write_environment(&dir, school, target_ec, &mut rng)?;
    }
    write_growth(&dir.join(GROWTH_FILE), &mut rng)?;

    let specimens: usize = SCHOOLS.iter().map(|s| s.5).sum();
    println!(
        "Wrote {} environment files ({ENV_SAMPLES} samples each) and {specimens} growth records to {}",
        SCHOOLS.len(),
        dir.display()
    );
    Ok(())
}
