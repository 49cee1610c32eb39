//! CLI-specific error types
//!
//! Every CLI failure carries a stable code; load failures keep the code of
//! the underlying load error.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::schema::LoadError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Bad configuration flag
    ConfigError,
    /// Configuration file error, carrying the config error code
    Config(&'static str),
    /// I/O error (stdout)
    IoError,
    /// Requested type is not registered
    UnknownType,
    /// Schema load failed
    Load(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CLI_CONFIG_ERROR",
            Self::IoError => "CLI_IO_ERROR",
            Self::UnknownType => "CLI_UNKNOWN_TYPE",
            Self::Config(code) | Self::Load(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn unknown_type(name: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownType,
            format!("type {} is not registered", name),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::Config(e.code()), e.to_string())
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        Self::new(CliErrorCode::Load(e.code()), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_keeps_code() {
        let err: CliError = LoadError::name_collision("::Demo::Point").into();
        assert_eq!(err.code_str(), "SCHEMA_NAME_COLLISION");
        assert!(err.message().contains("::Demo::Point"));
    }

    #[test]
    fn test_config_error_keeps_code() {
        let err: CliError = ConfigError::UnknownLogLevel("LOUD".into()).into();
        assert_eq!(err.code(), &CliErrorCode::Config("CONFIG_UNKNOWN_LOG_LEVEL"));
        assert!(err.to_string().starts_with("CONFIG_UNKNOWN_LOG_LEVEL: "));
    }

    #[test]
    fn test_config_flag_error_code() {
        let err = CliError::config_error("unknown severity 'LOUD'");
        assert_eq!(err.code_str(), "CLI_CONFIG_ERROR");
    }
}
