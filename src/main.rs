use anyhow::Result;
use clap::Parser;
use sheetsql::cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli_args = cli::Cli::parse();
    let payload = cli::run_command(cli_args.command, cli_args.state_file)?;
    cli::output::emit(&payload, cli_args.format, cli_args.quiet)
}
