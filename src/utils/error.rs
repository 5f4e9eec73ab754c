use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Spreadsheet read failed: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Spreadsheet write failed: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Upload error: {message}")]
    UploadError { message: String },

    #[error("Unsupported spreadsheet format: {extension}")]
    UnsupportedFormatError { extension: String },

    #[error("Spreadsheet has no sheets: {path}")]
    EmptyWorkbookError { path: String },

    #[error("No report has been generated yet")]
    NoReportError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TallyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TallyError::UploadError { .. }
            | TallyError::UnsupportedFormatError { .. }
            | TallyError::SpreadsheetError(_)
            | TallyError::CsvError(_)
            | TallyError::EmptyWorkbookError { .. }
            | TallyError::NoReportError => ErrorCategory::Input,
            TallyError::ConfigError { .. }
            | TallyError::ConfigValidationError { .. }
            | TallyError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            TallyError::XlsxWriteError(_) | TallyError::SerializationError(_) => {
                ErrorCategory::Processing
            }
            TallyError::IoError(_) | TallyError::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => match self {
                TallyError::NoReportError => ErrorSeverity::Low,
                _ => ErrorSeverity::Medium,
            },
            ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            TallyError::SpreadsheetError(_) | TallyError::CsvError(_) => {
                "The uploaded file could not be read as a spreadsheet.".to_string()
            }
            TallyError::EmptyWorkbookError { .. } => {
                "The uploaded spreadsheet does not contain any sheets.".to_string()
            }
            TallyError::UnsupportedFormatError { extension } => {
                format!("Files of type '{}' are not supported.", extension)
            }
            TallyError::UploadError { message } => message.clone(),
            TallyError::NoReportError => "No report has been generated yet.".to_string(),
            TallyError::XlsxWriteError(_) | TallyError::SerializationError(_) => {
                "The report could not be generated.".to_string()
            }
            TallyError::IoError(_) => "A file system error occurred.".to_string(),
            TallyError::TaskError(_) => "The upload could not be processed.".to_string(),
            TallyError::ConfigError { .. }
            | TallyError::ConfigValidationError { .. }
            | TallyError::InvalidConfigValueError { .. } => {
                format!("Invalid configuration: {}", self)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TallyError::SpreadsheetError(_)
            | TallyError::CsvError(_)
            | TallyError::EmptyWorkbookError { .. } => {
                "Check that the file opens in a spreadsheet application and try again."
            }
            TallyError::UnsupportedFormatError { .. } => {
                "Upload an .xlsx, .xlsm, .xlsb, .xls, .ods or .csv file."
            }
            TallyError::UploadError { .. } => "Choose a file in the form before submitting.",
            TallyError::NoReportError => "Upload a spreadsheet first.",
            TallyError::XlsxWriteError(_) | TallyError::SerializationError(_) => {
                "Try again; if the problem persists check the server logs."
            }
            TallyError::IoError(_) => {
                "Check that the output and upload directories exist and are writable."
            }
            TallyError::TaskError(_) => "Try again; if the problem persists check the server logs.",
            TallyError::ConfigError { .. }
            | TallyError::ConfigValidationError { .. }
            | TallyError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags and restart."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;
