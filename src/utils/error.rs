use thiserror::Error;

#[derive(Error, Debug)]
pub enum FedoraError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::DeError),

    #[error("XML reading error: {0}")]
    XmlReadError(#[from] quick_xml::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Fedora request failed ({status}): {reason}")]
    RequestFailed { status: u16, reason: String },

    #[error("Permission denied: {url}")]
    PermissionDenied { url: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Checksum mismatch on {pid}/{dsid}")]
    ChecksumMismatch { pid: String, dsid: String },

    #[error("Invalid date '{value}'")]
    InvalidDate { value: String },

    #[error("RDF parsing error: {message}")]
    RdfError { message: String },

    #[cfg(feature = "indexdata")]
    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Repository,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl FedoraError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FedoraError::HttpError(_) => ErrorCategory::Network,
            FedoraError::RequestFailed { .. }
            | FedoraError::PermissionDenied { .. }
            | FedoraError::NotFound { .. }
            | FedoraError::ChecksumMismatch { .. } => ErrorCategory::Repository,
            FedoraError::ConfigError { .. }
            | FedoraError::MissingConfigError { .. }
            | FedoraError::InvalidConfigValueError { .. }
            | FedoraError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            FedoraError::CsvError(_)
            | FedoraError::XmlError(_)
            | FedoraError::XmlReadError(_)
            | FedoraError::SerializationError(_)
            | FedoraError::InvalidDate { .. }
            | FedoraError::RdfError { .. }
            | FedoraError::ProcessingError { .. } => ErrorCategory::Data,
            #[cfg(feature = "indexdata")]
            FedoraError::PdfError(_) => ErrorCategory::Data,
            FedoraError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FedoraError::HttpError(_)
            | FedoraError::RequestFailed { .. }
            | FedoraError::PermissionDenied { .. }
            | FedoraError::NotFound { .. }
            | FedoraError::ChecksumMismatch { .. } => ErrorSeverity::Medium,
            FedoraError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 依錯誤類型提供修復建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FedoraError::HttpError(_) => {
                "Check that the Fedora server is running and reachable at the configured root URL"
            }
            FedoraError::PermissionDenied { .. } => {
                "Check the Fedora username and password, or use an account with more privileges"
            }
            FedoraError::NotFound { .. } => "Check that the pid and datastream id exist",
            FedoraError::ChecksumMismatch { .. } => {
                "The content changed in transit; retry the upload or recompute the checksum"
            }
            FedoraError::RequestFailed { .. } => "Check the Fedora server logs for details",
            FedoraError::ConfigError { .. }
            | FedoraError::MissingConfigError { .. }
            | FedoraError::InvalidConfigValueError { .. }
            | FedoraError::ConfigValidationError { .. } => {
                "Review the command-line flags, FEDORA_* environment variables and config file"
            }
            FedoraError::IoError(_) => "Check file paths and permissions",
            _ => "Re-run with --verbose for more detail",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not talk to Fedora: {}", self),
            ErrorCategory::Repository => format!("Fedora rejected the request: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// 將嚴重程度對應到行程結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, FedoraError>;
