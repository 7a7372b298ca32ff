//! Vitae CLI - Command-line interface for résumé extraction.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vitae_cli::commands;
use vitae_cli::{Cli, CliError, Command, Config, Formatter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Parse(args) => commands::execute_parse(args, &config, &formatter).await,
        Command::Text(args) => commands::execute_text(args, &config, &formatter).await,
        Command::Prompt(args) => commands::execute_prompt(args, &config, &formatter).await,
        Command::Decode(args) => commands::execute_decode(args, &formatter).await,
        Command::Init(args) => commands::execute_init(args, &formatter).await,
    }
}
