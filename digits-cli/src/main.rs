mod commands;
mod inspect;
mod preview;
mod print_numbers;

use clap::Parser;
use commands::{Cli, Commands};
use std::error::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { csv, task } => {
            inspect::inspect(&csv, task.into()).await?;
        }
        Commands::Print { csv, n } => {
            print_numbers::print_numbers(&csv, n).await?;
        }
        Commands::Preview {
            train,
            test,
            count,
            noise,
            intensity,
            seed,
            out,
            scale,
            config,
        } => {
            let options = preview::PreviewOptions {
                count,
                noise: noise.map(Into::into),
                intensity,
                seed,
                out,
                scale,
                config,
            };
            preview::preview(&train, &test, options).await?;
        }
        Commands::Config => {
            println!("{}", digit_pipeline::PipelineConfig::default().to_json()?);
        }
    }

    Ok(())
}
