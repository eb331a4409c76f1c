use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_cluster_namer::app::{App, TracingSink};
use kira_cluster_namer::error::NamerError;
use kira_cluster_namer::output::JsonOutput;

#[derive(Parser)]
#[command(name = "kira-cn")]
#[command(about = "Name de-novo genome clusters from type genomes, NCBI labels and 16S hits")]
#[command(version, author)]
struct Cli {
    /// Directory holding the input tables and an optional curation.json
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Directory the output tables are written to
    #[arg(long, short = 'o')]
    output: PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<NamerError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &NamerError) -> u8 {
    match error {
        NamerError::MissingInput(_) | NamerError::ConfigRead(_) => 2,
        NamerError::Schema { .. }
        | NamerError::Csv { .. }
        | NamerError::InvalidGenomeId(_)
        | NamerError::InvalidClusterId(_)
        | NamerError::ConfigParse(_) => 3,
        NamerError::Filesystem(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let input = utf8(cli.input)?;
    let output = utf8(cli.output)?;

    let app = App::new(input, output);
    let result = app.run(&TracingSink)?;
    if !result.warnings.is_empty() {
        tracing::warn!(
            count = result.warnings.len(),
            "unresolved cases written for review"
        );
    }
    JsonOutput::print_run(&result).into_diagnostic()?;
    Ok(())
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf, NamerError> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| NamerError::Filesystem(format!("non UTF-8 path: {}", path.display())))
}
