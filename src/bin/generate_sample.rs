//! Writes synthetic instrument reports into `sample_reports/` for trying out
//! the tool without a metrology machine.

use std::fs;
use std::path::Path;

const HEADER_ROWS: usize = 11;
const COLUMNS: usize = 12;
const VALUE_COLUMN: usize = 10;

const DIMENSIONS: [&str; 6] = ["Top", "Bottom", "Left", "Right", "Width", "Height"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut state = [0u64; 4];
        let mut x = seed;
        for slot in &mut state {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state }
    }

    fn next_u64(&mut self) -> u64 {
        let s = &mut self.state;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;
        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);
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

fn data_row(name: &str, kind: &str, value: f64) -> Vec<String> {
    let mut row = vec![String::new(); COLUMNS];
    row[0] = name.to_string();
    row[1] = kind.to_string();
    row[2] = "mm".to_string();
    row[3] = "0.000".to_string();
    row[4] = "0.600".to_string();
    row[VALUE_COLUMN] = format!("{value:.4}");
    row[COLUMNS - 1] = if value <= 0.6 { "OK" } else { "OUT" }.to_string();
    row
}

fn write_report(path: &Path, tile: usize, rng: &mut SimpleRng) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;

    writer.write_record(["Report", "Wrapped Tile Inspection"])?;
    writer.write_record(["Tile", format!("T{tile:03}").as_str()])?;
    writer.write_record(["Operator", "lab"])?;
    for i in 3..HEADER_ROWS - 1 {
        writer.write_record([format!("Meta{i}"), String::new()])?;
    }
    let header: Vec<String> = (0..COLUMNS).map(|c| format!("C{c}")).collect();
    writer.write_record(&header)?;

    let offset = rng.gauss(0.35, 0.08);
    for dim in DIMENSIONS {
        let value = (offset + rng.gauss(0.0, 0.05)).max(0.0);
        writer.write_record(data_row(dim, "Mean", value))?;
    }
    for dim in DIMENSIONS {
        let sigma = rng.gauss(0.04, 0.01).abs();
        writer.write_record(data_row(dim, "StdDev", sigma))?;
    }
    writer.write_record(data_row("Points", "Count", 240.0))?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = Path::new("sample_reports");
    fs::create_dir_all(out_dir)?;

    let mut rng = SimpleRng::new(42);
    let tiles = 5;
    for tile in 1..=tiles {
        let path = out_dir.join(format!("tile_{tile:02}.csv"));
        write_report(&path, tile, &mut rng)?;
    }

    println!("Wrote {tiles} reports to {}", out_dir.display());
    Ok(())
}
