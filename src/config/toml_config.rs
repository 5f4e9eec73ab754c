use crate::core::ConfigProvider;
use crate::utils::error::{Result, TallyError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_mb: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Static files root; the report workbook is written here.
    pub public_dir: String,
    /// Where uploads are parked while they are processed.
    pub upload_dir: String,
    pub output_filename: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            upload_dir: "uploads".to_string(),
            output_filename: "counts.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub verbose: bool,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TallyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TallyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PORT})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TallyError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_positive_number("server.port", self.server.port as usize, 1)?;
        validation::validate_range("server.max_upload_mb", self.server.max_upload_mb, 1, 1024)?;

        validation::validate_path("storage.public_dir", &self.storage.public_dir)?;
        validation::validate_path("storage.upload_dir", &self.storage.upload_dir)?;

        let filename = &self.storage.output_filename;
        validation::validate_file_extension("storage.output_filename", filename, &["xlsx"])?;
        if filename.contains(|c| c == '/' || c == '\\') {
            return Err(TallyError::InvalidConfigValueError {
                field: "storage.output_filename".to_string(),
                value: filename.clone(),
                reason: "Must be a file name, not a path".to_string(),
            });
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn output_filename(&self) -> &str {
        &self.storage.output_filename
    }
}
