use clap::Parser;
use dlorganize::cli::{Cli, run_cli};
use dlorganize::report::{ConsoleReporter, Reporter};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let reporter = ConsoleReporter::new(cli.verbose);

    match run_cli(&cli, &reporter) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            reporter.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
