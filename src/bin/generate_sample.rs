use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// `None` with probability `p`, to leave gaps like real exports do.
    fn maybe(&mut self, p: f64, v: f64) -> Option<f64> {
        (self.next_f64() >= p).then_some(v)
    }
}

struct Row {
    operator: String,
    contractor: String,
    well_name: String,
    shaker: String,
    hole_size: f64,
    total_dil: Option<f64>,
    total_sce: Option<f64>,
    dsre: Option<f64>,
    dilution_ratio: Option<f64>,
    discard_ratio: Option<f64>,
    rop: Option<f64>,
}

fn round(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

fn generate(rng: &mut SimpleRng, n_wells: usize) -> Vec<Row> {
    let operators = ["Borealis Energy", "Cardinal Oil", "Permian Basin Co"];
    let contractors = ["Nabors", "Helmerich & Payne", "Patterson-UTI", "Precision Drilling"];
    let shakers = [
        "Derrick FLC 503",
        "Derrick Hyperpool",
        "Brandt King Cobra",
        "NOV VSM 300",
        "Mongoose PT",
    ];
    let hole_sizes = [6.125, 8.5, 8.75, 12.25, 17.5];

    (0..n_wells)
        .map(|i| {
            let shaker = rng.pick(&shakers);
            let derrick = shaker.to_lowercase().contains("derrick");
            // Derrick units get a modest efficiency edge in the synthetic data.
            let dsre = rng.uniform(if derrick { 0.80 } else { 0.70 }, 0.97);
            let hole_size = hole_sizes[(rng.next_u64() % hole_sizes.len() as u64) as usize];
            let operator = rng.pick(&operators).to_string();
            let contractor = rng.pick(&contractors).to_string();
            let total_dil = round(rng.uniform(500.0, 4000.0), 1);
            let total_sce = round(rng.uniform(1.0, 6.0), 2);
            let dilution_ratio = round(rng.uniform(0.5, 3.0), 2);
            let discard_ratio = round(rng.uniform(0.2, 1.5), 2);
            let rop = round(rng.uniform(20.0, 180.0), 1);
            Row {
                operator,
                contractor,
                well_name: format!("W-{:03}", i + 1),
                shaker: shaker.to_string(),
                hole_size,
                total_dil: rng.maybe(0.05, total_dil),
                total_sce: rng.maybe(0.05, total_sce),
                dsre: rng.maybe(0.05, round(dsre, 3)),
                dilution_ratio: rng.maybe(0.15, dilution_ratio),
                discard_ratio: rng.maybe(0.15, discard_ratio),
                rop: rng.maybe(0.1, rop),
            }
        })
        .collect()
}

const HEADERS: [&str; 11] = [
    "Operator",
    "Contractor",
    "Well_Name",
    "flowline_Shakers",
    "Hole_Size",
    "Total_Dil",
    "Total_SCE",
    "DSRE",
    "Dilution_Ratio",
    "Discard_Ratio",
    "ROP",
];

fn opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record(HEADERS)?;
    for r in rows {
        writer.write_record([
            r.operator.clone(),
            r.contractor.clone(),
            r.well_name.clone(),
            r.shaker.clone(),
            r.hole_size.to_string(),
            opt(r.total_dil),
            opt(r.total_sce),
            opt(r.dsre),
            opt(r.dilution_ratio),
            opt(r.discard_ratio),
            opt(r.rop),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let number = |f: fn(&Row) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        text(|r| r.operator.as_str()),
        text(|r| r.contractor.as_str()),
        text(|r| r.well_name.as_str()),
        text(|r| r.shaker.as_str()),
        number(|r| Some(r.hole_size)),
        number(|r| r.total_dil),
        number(|r| r.total_sce),
        number(|r| r.dsre),
        number(|r| r.dilution_ratio),
        number(|r| r.discard_ratio),
        number(|r| r.rop),
    ];
    let schema = Arc::new(Schema::new(
        HEADERS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i < 4 {
                    Field::new(*name, DataType::Utf8, false)
                } else {
                    Field::new(*name, DataType::Float64, true)
                }
            })
            .collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng, 120);

    let csv_path = "sample_rig_dashboard_data.csv";
    let parquet_path = "sample_rig_dashboard_data.parquet";
    write_csv(csv_path, &rows)?;
    write_parquet(parquet_path, &rows)?;

    log::info!("Wrote {} wells to {csv_path} and {parquet_path}", rows.len());
    Ok(())
}
