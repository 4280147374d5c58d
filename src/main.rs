//! shopsight - Main Entry Point
//!
//! Compare imbalanced-classification strategies for online shopper
//! purchase prediction, from the command line or over HTTP.

use clap::Parser;
use shopsight::cli::{cmd_compare, cmd_info, cmd_run, Cli, Commands};
use shopsight::server::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopsight=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { data, strategy } => {
            cmd_run(data, strategy)?;
        }
        Commands::Compare { data } => {
            cmd_compare(data)?;
        }
        Commands::Info { data } => {
            cmd_info(data)?;
        }
        Commands::Serve { port, host, data } => {
            let config = ServerConfig {
                host,
                port,
                data_path: data,
            };
            run_server(config).await?;
        }
    }

    Ok(())
}
