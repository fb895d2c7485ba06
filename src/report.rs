//! The QC run: load → validate → count → chart → summary.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::chart::render_distribution_chart;
use crate::config::QcConfig;
use crate::data::histogram::{ConditionCounts, build_condition_histogram};
use crate::data::loader::read_file;
use crate::data::model::{SampleTable, ValidationError};
use crate::data::summary::{QcSummary, summarize};

/// Process exit status when the sample sheet fails schema validation.
pub const EXIT_INVALID_SHEET: u8 = 2;

/// How a run ended when no fatal error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(QcSummary),
    /// The sheet failed schema validation; nothing was written.
    Rejected(ValidationError),
}

/// Process exit status for a finished run: 0 on success,
/// [`EXIT_INVALID_SHEET`] for a rejected sheet, 1 for any other error.
pub fn exit_status(result: &Result<RunOutcome>) -> u8 {
    match result {
        Ok(RunOutcome::Completed(_)) => 0,
        Ok(RunOutcome::Rejected(_)) => EXIT_INVALID_SHEET,
        Err(_) => 1,
    }
}

/// Runs the QC steps, writing human-readable status lines to `out`.
pub struct SampleQcReport<W: Write> {
    config: QcConfig,
    out: W,
}

impl<W: Write> SampleQcReport<W> {
    pub fn new(config: QcConfig, out: W) -> Self {
        Self { config, out }
    }

    pub fn config(&self) -> &QcConfig {
        &self.config
    }

    /// Consume the report and hand back the console sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Load and validate the sample sheet at `path`, reporting what was found.
    ///
    /// Schema failures come back as a [`ValidationError`] inside the
    /// `anyhow::Error`.
    pub fn load_samples(&mut self, path: &Path) -> Result<SampleTable> {
        let (columns, rows) = read_file(path)?;
        log::info!("loaded {} samples from {}", rows.len(), path.display());
        writeln!(self.out, "Loaded {} samples", rows.len())?;

        let table = match SampleTable::from_rows(columns, rows) {
            Ok(table) => table,
            Err(ValidationError::MissingColumns(missing)) => {
                writeln!(self.out, "Missing required columns: {}", missing.join(", "))?;
                return Err(ValidationError::MissingColumns(missing).into());
            }
        };
        writeln!(self.out, "Found conditions: {}", table.conditions().join(", "))?;
        Ok(table)
    }

    pub fn build_condition_histogram(&self, table: &SampleTable) -> ConditionCounts {
        build_condition_histogram(table)
    }

    /// Write the bar chart into `output_dir` and report its path.
    pub fn render_distribution_chart(
        &mut self,
        counts: &ConditionCounts,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let path = render_distribution_chart(counts, output_dir, &self.config.chart)?;
        writeln!(self.out, "Plot saved: {}", path.display())?;
        Ok(path)
    }

    pub fn summarize(&self, table: &SampleTable, counts: &ConditionCounts) -> QcSummary {
        summarize(table, counts)
    }

    /// The whole pass. Validation failures end the run early, before any
    /// directory or file is created.
    pub fn run(&mut self) -> Result<RunOutcome> {
        writeln!(self.out, "Starting RNA-seq Quality Control Analysis")?;

        let input = self.config.input_path.clone();
        let table = match self.load_samples(&input) {
            Ok(table) => table,
            Err(err) => {
                return match err.downcast::<ValidationError>() {
                    Ok(validation) => Ok(RunOutcome::Rejected(validation)),
                    Err(err) => Err(err),
                };
            }
        };

        let counts = self.build_condition_histogram(&table);
        let output_dir = self.config.output_dir.clone();
        self.render_distribution_chart(&counts, &output_dir)?;

        let summary = self.summarize(&table, &counts);
        writeln!(self.out)?;
        writeln!(self.out, "Analysis Summary:")?;
        writeln!(self.out, "   Total samples: {}", summary.total_samples)?;
        writeln!(self.out, "   Conditions: {}", summary.conditions)?;
        writeln!(self.out, "   Batches: {}", summary.batches)?;
        writeln!(self.out, "Quality control analysis completed!")?;
        Ok(RunOutcome::Completed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{CHART_FILE_NAME, ChartOptions};
    use crate::data::summary::BatchCount;

    fn report(dir: &Path, sheet: &str) -> SampleQcReport<Vec<u8>> {
        let input = dir.join("samples.csv");
        std::fs::write(&input, sheet).unwrap();
        let config = QcConfig {
            input_path: input,
            output_dir: dir.join("results"),
            chart: ChartOptions {
                dpi: 20,
                ..ChartOptions::default()
            },
        };
        SampleQcReport::new(config, Vec::new())
    }

    #[test]
    fn load_samples_reports_rows_and_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = report(
            dir.path(),
            "sample_id,condition,replicate\nS1,treated,1\nS2,control,1\nS3,treated,2\n",
        );
        let input = r.config().input_path.clone();
        let table = r.load_samples(&input).unwrap();
        assert_eq!(table.len(), 3);

        let text = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(text, "Loaded 3 samples\nFound conditions: treated, control\n");
    }

    #[test]
    fn run_prints_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = report(
            dir.path(),
            "sample_id,condition,replicate\nS1,treated,1\nS2,control,1\n",
        );
        let outcome = r.run().unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Completed(QcSummary {
                total_samples: 2,
                conditions: 2,
                batches: BatchCount::NotSpecified,
            })
        );

        let text = String::from_utf8(r.into_inner()).unwrap();
        assert!(text.starts_with("Starting RNA-seq Quality Control Analysis\n"));
        assert!(text.contains(&format!(
            "Plot saved: {}",
            dir.path().join("results").join(CHART_FILE_NAME).display()
        )));
        assert!(text.contains("   Batches: Not specified\n"));
        assert!(text.ends_with("Quality control analysis completed!\n"));
    }

    #[test]
    fn rejected_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = report(dir.path(), "sample_id,condition\nS1,treated\n");
        let outcome = r.run().unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Rejected(ValidationError::MissingColumns(vec!["replicate".into()]))
        );
        assert!(!dir.path().join("results").exists());

        let text = String::from_utf8(r.into_inner()).unwrap();
        assert!(text.contains("Loaded 1 samples\nMissing required columns: replicate\n"));
        assert!(!text.contains("Analysis Summary"));
    }

    #[test]
    fn unreadable_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = report(dir.path(), "");
        std::fs::remove_file(dir.path().join("samples.csv")).unwrap();
        let result = r.run();
        assert!(result.is_err());
        assert_eq!(exit_status(&result), 1);
    }

    #[test]
    fn exit_status_distinguishes_rejected_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let ok = report(dir.path(), "sample_id,condition,replicate\nS1,treated,1\n").run();
        assert_eq!(exit_status(&ok), 0);

        let rejected = report(dir.path(), "sample_id,condition\nS1,treated\n").run();
        assert_eq!(exit_status(&rejected), EXIT_INVALID_SHEET);
    }
}
