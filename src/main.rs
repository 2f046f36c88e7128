use clap::Parser;

mod cli;
mod commands;
mod config;
mod driver;
mod error;
mod fixture;
mod mount;
mod oracle;
mod report;
mod scenarios;
mod testbed;

use cli::{Args, Commands};
use config::load_config;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => {
            std::process::exit(code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> error::Result<i32> {
    // Logs go to stderr so the JSON and porcelain reports own stdout.
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("MIRRORCHECK_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            fs_binary,
            scenario,
            seed,
            iterations,
            delay_probability,
            error_probability,
            read_iterations,
            file_size,
            json,
            porcelain,
        } => {
            let config = load_config()?;
            let report = commands::run_command(
                config,
                commands::RunArgs {
                    fs_binary,
                    scenario,
                    seed,
                    iterations,
                    delay_probability,
                    error_probability,
                    read_iterations,
                    file_size,
                    json,
                    porcelain,
                },
            )
            .await?;

            Ok(if report.all_passed() { 0 } else { 1 })
        }
        Commands::List { porcelain, json } => {
            commands::list_scenarios(porcelain, json)?;
            Ok(0)
        }
        Commands::Cleanup { stale } => {
            if stale {
                let config = load_config()?;
                commands::cleanup_stale(&config)?;
            } else {
                eprintln!("Nothing to do: pass --stale to sweep leftover mounts");
            }
            Ok(0)
        }
        Commands::Config { action } => {
            commands::handle_config_command(action)?;
            Ok(0)
        }
    }
}
