use crate::config::toml_config::{AppConfig, LogFormat};
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sheet-tally")]
#[command(about = "Upload a spreadsheet and get recruiter, application and date counts back")]
pub struct ServerArgs {
    /// Path to TOML configuration file
    #[arg(short, long, env = "SHEET_TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long)]
    pub public_dir: Option<String>,

    #[arg(long)]
    pub upload_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,
}

impl ServerArgs {
    /// 載入設定檔（若有），再套用命令列覆蓋
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.public_dir {
            config.storage.public_dir = dir.clone();
        }
        if let Some(dir) = &self.upload_dir {
            config.storage.upload_dir = dir.clone();
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if self.json_logs {
            config.logging.format = LogFormat::Json;
        }
    }
}
