//! modelcharts CLI: AI model scaling charts from a local catalog.
//!
//! Extracts chart documents from a libSQL model catalog and embeds them into
//! self-contained HTML pages.

mod commands;

use std::process::ExitCode;

use clap::Parser;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    let cli = Cli::parse();
    let verbose = cli.verbose;
    commands::init_tracing(&cli);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{}", commands::diagnostic(&report));
            if verbose > 0 {
                eprintln!("{report:?}");
            }
            ExitCode::FAILURE
        }
    }
}
