//! Accord CLI binary

use accord::cli::{app, Cli, Commands, NegotiationApp};
use accord::{AppConfig, Offer};
use clap::Parser;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command() {
        Commands::Run(args) => {
            let app = NegotiationApp::from_path(cli.config.as_deref())?;

            let report = app
                .run_session(Duration::from_secs(args.timeout_secs))
                .await?;
            app::log_summary(&report);

            if !args.no_chart {
                app.write_chart(&report, &args.chart);
            }

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        Commands::Validate { message } => {
            let offer = Offer::from_json_str(&message)?;
            tracing::info!(
                "Valid offer: {:.2} x {} (final: {})",
                offer.offer_price(),
                offer.quantity(),
                offer.is_final_offer()
            );
            println!("{}", offer.to_json_str()?);
        }

        Commands::Config => {
            print!("{}", AppConfig::default_toml()?);
        }
    }

    Ok(())
}
