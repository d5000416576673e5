use std::path::PathBuf;

use airdrop_tools::coverage::{self, CoverageCommand, CoverageParser};
use airdrop_tools::{Result, logging};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    match logging::init_tracing().and_then(|()| run(cli)) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let output = match &cli.from_file {
        Some(path) => coverage::read_saved_output(path)?,
        None => {
            let command = match cli.tool {
                Some(tool) => CoverageCommand::new(tool, coverage::FORGE_ARGS, &cli.root),
                None => CoverageCommand::forge(&cli.root),
            };
            command.run()?
        }
    };

    let report = CoverageParser::new(&cli.prefix)?.parse(&output);
    println!("{report}");
    Ok(report.verdict().exit_code())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Sums line coverage of the files under a source prefix and fails unless it is 100%."
)]
struct Cli {
    /// Project root the coverage tool runs in.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Only rows for files under this prefix are counted.
    #[arg(long, default_value = coverage::DEFAULT_PREFIX)]
    prefix: String,

    /// Coverage executable to run instead of `forge`; it receives the same arguments.
    #[arg(long)]
    tool: Option<String>,

    /// Parse a saved summary table instead of running the tool.
    #[arg(long, conflicts_with = "tool")]
    from_file: Option<PathBuf>,
}
