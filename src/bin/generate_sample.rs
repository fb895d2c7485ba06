//! Write a synthetic sample sheet for trying out `rnaseq-qc`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "generate_sample", about = "Write a synthetic RNA-seq sample sheet")]
struct Args {
    /// Destination CSV.
    #[arg(short, long, default_value = "data/samples.csv")]
    output: PathBuf,

    /// Comma-separated condition labels.
    #[arg(long, value_delimiter = ',', default_values_t = ["treated".to_string(), "control".to_string()])]
    conditions: Vec<String>,

    /// Replicates per condition.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    replicates: u32,

    /// Number of processing batches; 0 omits the batch column.
    #[arg(long, default_value_t = 2)]
    batches: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Serialize)]
struct Row {
    sample_id: String,
    condition: String,
    replicate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch: Option<String>,
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

    fn below(&mut self, n: u32) -> u32 {
        (self.next_u64() % n as u64) as u32
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let mut rows = Vec::new();
    for condition in &args.conditions {
        for replicate in 1..=args.replicates {
            let batch = (args.batches > 0).then(|| format!("B{}", rng.below(args.batches) + 1));
            rows.push(Row {
                sample_id: format!("{condition}_rep{replicate}"),
                condition: condition.clone(),
                replicate,
                batch,
            });
        }
    }

    log::debug!("generated {} rows with seed {}", rows.len(), args.seed);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row).context("writing sample row")?;
    }
    writer.flush().context("flushing sample sheet")?;

    println!(
        "Wrote {} samples ({} conditions) to {}",
        rows.len(),
        args.conditions.len(),
        args.output.display()
    );
    Ok(())
}
