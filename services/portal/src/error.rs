//! services/portal/src/error.rs
//!
//! Defines the primary error type for the portal client.

use crate::config::ConfigError;
use study_portal_core::navigation::NavigationError;
use study_portal_core::ports::PortError;
use study_portal_core::validation::ValidationError;

/// The primary error type for the `portal` binary and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error while building the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., reading the terminal).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a dashboard action was refused or failed.
///
/// Its `Display` is the text shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Forbidden: Admin access required")]
    Forbidden,

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The action does not apply to what is currently on screen.
    #[error("{0}")]
    NotAvailable(String),

    #[error("Nothing is waiting for confirmation.")]
    NothingToConfirm,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", .0.user_message())]
    Port(#[from] PortError),
}
