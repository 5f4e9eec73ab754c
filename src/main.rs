use clap::Parser;
use sheet_tally::config::LogFormat;
use sheet_tally::utils::{logger, validation::Validate};
use sheet_tally::{ServerArgs, TallyServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // 載入配置
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match config.logging.format {
        LogFormat::Compact => logger::init_cli_logger(config.logging.verbose),
        LogFormat::Json => logger::init_json_logger(config.logging.verbose),
    }

    tracing::info!("Starting sheet-tally server");
    tracing::debug!("Config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    TallyServer::new(config)?.start().await
}
