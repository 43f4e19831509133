//! Unified error handling for Hypersense
//!
//! This crate provides a single error type used across all Hypersense components.
//! It uses thiserror for ergonomic error definitions with proper Display and Error trait impls.
//!
//! Note that an unreadable sensor is not an error from a consumer's point of view:
//! the hardware layer reports `RegisterRead` to its controller, which turns it into
//! a deactivated sensor.

use std::io;
use std::path::PathBuf;

/// Result type alias using HypersenseError
pub type Result<T> = std::result::Result<T, HypersenseError>;

/// Unified error type for all Hypersense operations
#[derive(thiserror::Error, Debug)]
pub enum HypersenseError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Identifier Errors
    // ============================================================================
    #[error("Invalid identifier segment {segment:?}: must not contain '/'")]
    InvalidIdentifier {
        segment: String,
    },

    // ============================================================================
    // Configuration and Settings Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("Hardware not found: {0}")]
    HardwareNotFound(String),

    #[error("Failed to read register {offset:#04x} of PCI device {address:#010x}: {reason}")]
    RegisterRead {
        address: u32,
        offset: u32,
        reason: String,
    },

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl HypersenseError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid configuration value error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid identifier error for the offending segment
    pub fn invalid_identifier(segment: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            segment: segment.into(),
        }
    }

    /// Create a register read error
    pub fn register_read(address: u32, offset: u32, reason: impl Into<String>) -> Self {
        Self::RegisterRead {
            address,
            offset,
            reason: reason.into(),
        }
    }
}

// Allow converting from String to HypersenseError
impl From<String> for HypersenseError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to HypersenseError
impl From<&str> for HypersenseError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}
