use clap::Parser;
use owners_aggregator::utils::{logger, validation::Validate};
use owners_aggregator::{AggregatorError, AggregatorServer, CliConfig, ConfigProvider, TomlConfig};

async fn start<C: ConfigProvider + Validate>(config: &C) -> Result<(), AggregatorError> {
    config.validate()?;
    AggregatorServer::from_config(config)?.run().await
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let outcome = match cli.config.clone() {
        Some(path) => match TomlConfig::from_file(&path) {
            Ok(file_config) => {
                logger::init_logger(
                    cli.verbose || file_config.verbose(),
                    cli.json_logs || file_config.json_logs(),
                );
                tracing::info!("Starting owners-aggregator with {}", path.display());
                start(&file_config).await
            }
            Err(e) => {
                logger::init_logger(cli.verbose, cli.json_logs);
                Err(e)
            }
        },
        None => {
            logger::init_logger(cli.verbose, cli.json_logs);
            tracing::info!("Starting owners-aggregator");
            if cli.verbose {
                tracing::debug!("CLI config: {:?}", cli);
            }
            start(&cli).await
        }
    };

    if let Err(e) = outcome {
        tracing::error!("❌ owners-aggregator failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = if e.is_config_error() { 2 } else { 1 };
        std::process::exit(exit_code);
    }
}
