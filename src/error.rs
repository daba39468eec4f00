//! Error types for client configuration.
//!
//! This module contains the error type returned when building configuration
//! values or validated newtypes.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use api_client::{ConfigError, ResourceKey};
//!
//! let result = ResourceKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyResourceKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Resource keys identify a remote object and cannot be empty.
    #[error("Resource key cannot be empty. Please provide the identifier of the remote resource.")]
    EmptyResourceKey,

    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Expected an absolute http or https URL (e.g., 'https://api.example.com').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Page size is out of range.
    #[error("Invalid page size {size}. Expected a value between 1 and {max}.")]
    InvalidPageSize {
        /// The rejected page size.
        size: u32,
        /// The largest accepted page size.
        max: u32,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
