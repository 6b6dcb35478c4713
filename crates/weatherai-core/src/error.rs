//! Centralized error types for WeatherAI.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
///
/// Cloneable so one failed request can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 400 and 404 mean the upstream could not resolve the requested location.
    pub fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(400) | Some(404))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) | NetworkError::Timeout => {
                "Network error. Please check your connection and try again."
            }
            e if e.is_not_found() => "Location not found. Please enter a valid city.",
            _ => "Failed to load weather data",
        }
    }
}

/// Settings that cannot be turned into a working weather service.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} is not a valid URL: {reason}")]
    InvalidUrl { field: String, reason: String },

    #[error("unknown display time zone: {0}")]
    UnknownTimeZone(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::InvalidUrl { .. } => {
                "A weather endpoint is misconfigured. Check your settings."
            }
            ConfigError::UnknownTimeZone(_) => {
                "The display time zone is not recognised. Check your settings."
            }
        }
    }
}

/// Weather service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Weather service misconfigured: {0}")]
    Misconfigured(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::Network(e) => e.user_message(),
            WeatherError::Misconfigured(_) => {
                "Weather service is misconfigured. Check your settings."
            }
            WeatherError::Cache(_) => "Weather data may be outdated.",
        }
    }

    /// Whether the upstream rejected the requested location.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::Network(e) if e.is_not_found())
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::HttpStatus {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
