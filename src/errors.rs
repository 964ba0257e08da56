// SPDX-License-Identifier: MPL-2.0

//! Error types for the overlay engine

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Detector (model) errors
    Detector(DetectorError),
    /// Configuration errors
    Config(ConfigError),
    /// Replay script errors
    Script(ScriptError),
    /// Terminal, runtime or filesystem I/O errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Access to the camera was refused
    PermissionDenied(String),
}

/// Detector errors
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// Model or asset failed to load (terminal for the session)
    ModelLoad(String),
    /// A single inference call failed (local to its tick)
    Inference(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to read the config file
    Read(String),
    /// Config file is not valid JSON for the schema
    Parse(String),
    /// A value is outside its allowed range
    InvalidValue { field: &'static str, message: String },
}

/// Replay script errors
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// Failed to read the script file
    Read(String),
    /// Script is not valid JSON for the schema
    Parse(String),
    /// Script parsed but describes an unusable feed
    Invalid(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Detector(e) => write!(f, "Detector error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Script(e) => write!(f, "Script error: {}", e),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
        }
    }
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::ModelLoad(msg) => write!(f, "Failed to load model: {}", msg),
            DetectorError::Inference(msg) => write!(f, "Inference failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid value for {}: {}", field, message)
            }
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Read(msg) => write!(f, "Failed to read script: {}", msg),
            ScriptError::Parse(msg) => write!(f, "Failed to parse script: {}", msg),
            ScriptError::Invalid(msg) => write!(f, "Invalid script: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for DetectorError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ScriptError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<DetectorError> for AppError {
    fn from(err: DetectorError) -> Self {
        AppError::Detector(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<ScriptError> for AppError {
    fn from(err: ScriptError) -> Self {
        AppError::Script(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}
