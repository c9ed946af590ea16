mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let result = match cli.command {
        cli::Commands::Schema(args) => commands::schema::run(args, &cli.global).await,
        cli::Commands::Validate(args) => commands::validate::run(args, &cli.global),
        cli::Commands::Translate(args) => commands::translate::run(args, &cli.global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code() as i32);
        }
    }
}
