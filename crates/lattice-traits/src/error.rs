//! Error types for the trait subsystem.

/// Result type alias for trait operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or rendering traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A template or variant produced markup that could not be parsed.
    #[error("Invalid markup for trait '{name}': {source}")]
    Markup {
        name: String,
        #[source]
        source: lattice_traits_core::Error,
    },

    /// A configuration document could not be deserialized.
    #[error("Invalid trait configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A trait definition is missing its name.
    #[error("Trait definition has an empty name")]
    MissingName,

    /// Two traits with the same name were added to one collection.
    #[error("Trait '{0}' is already present")]
    DuplicateTrait(String),
}

impl Error {
    /// Create a markup error for a trait.
    pub fn markup(name: impl Into<String>, source: lattice_traits_core::Error) -> Self {
        Self::Markup {
            name: name.into(),
            source,
        }
    }
}
