use std::path::PathBuf;

use clap::Parser;

use crate::chart::ChartOptions;
use crate::color::BarColors;

/// Where to read samples from and where to put the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QcConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub chart: ChartOptions,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/samples.csv"),
            output_dir: PathBuf::from("results"),
            chart: ChartOptions::default(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "rnaseq-qc",
    version,
    about = "Quality-control overview of RNA-seq sample metadata",
    long_about = "Load a sample sheet (CSV, JSON or Parquet), check for the required\n\
                  sample_id, condition and replicate columns, count samples per\n\
                  condition and save a bar chart of the distribution."
)]
pub struct Cli {
    /// Sample sheet to analyse.
    #[arg(short, long, value_name = "PATH", default_value = "data/samples.csv")]
    pub input: PathBuf,

    /// Directory receiving sample_distribution.png (created if missing).
    #[arg(short, long, value_name = "DIR", default_value = "results")]
    pub output_dir: PathBuf,

    /// Chart resolution in dots per inch (the canvas is 10 x 6 inches).
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(10..=1200))]
    pub dpi: u32,

    /// Bar colour scheme.
    #[arg(long, value_enum, default_value_t = BarColors::Classic)]
    pub colors: BarColors,

    /// Additional font file for chart text.
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,
}

impl From<Cli> for QcConfig {
    fn from(cli: Cli) -> Self {
        QcConfig {
            input_path: cli.input,
            output_dir: cli.output_dir,
            chart: ChartOptions {
                dpi: cli.dpi,
                colors: cli.colors,
                font: cli.font,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["rnaseq-qc"]).unwrap();
        assert_eq!(QcConfig::from(cli), QcConfig::default());
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::try_parse_from([
            "rnaseq-qc",
            "--input",
            "sheet.json",
            "-o",
            "out",
            "--dpi",
            "72",
            "--colors",
            "hues",
        ])
        .unwrap();
        let config = QcConfig::from(cli);
        assert_eq!(config.input_path, PathBuf::from("sheet.json"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.chart.dpi, 72);
        assert_eq!(config.chart.colors, BarColors::Hues);
    }

    #[test]
    fn dpi_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["rnaseq-qc", "--dpi", "0"]).is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
