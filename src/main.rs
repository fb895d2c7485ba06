use std::io;
use std::process::ExitCode;

use clap::Parser;
use rnaseq_qc::config::Cli;
use rnaseq_qc::report::exit_status;
use rnaseq_qc::{QcConfig, RunOutcome, SampleQcReport};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = QcConfig::from(Cli::parse());
    let mut report = SampleQcReport::new(config, io::stdout().lock());

    let result = report.run();
    match &result {
        Ok(RunOutcome::Completed(_)) => {}
        Ok(RunOutcome::Rejected(err)) => log::error!("{err}"),
        Err(err) => eprintln!("error: {err:#}"),
    }
    ExitCode::from(exit_status(&result))
}
