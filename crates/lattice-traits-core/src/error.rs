//! Error types for Lattice Traits core.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core systems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Markup could not be parsed into elements.
    #[error("Markup parse error at byte {position}: {message}")]
    Markup { message: String, position: u64 },

    /// A closing tag did not match the open element.
    #[error("Unexpected closing tag '</{found}>' at byte {position}")]
    UnbalancedMarkup { found: String, position: u64 },
}

impl Error {
    /// Create a markup parse error.
    pub fn markup(message: impl Into<String>, position: u64) -> Self {
        Self::Markup {
            message: message.into(),
            position,
        }
    }
}
