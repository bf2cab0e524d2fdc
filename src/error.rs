use crate::properties::ConversionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IgnitionError>;

#[derive(Debug, Error)]
pub enum IgnitionError {
    #[error("{type_name} has more than one constructor marked for constructor binding ({count} found)")]
    AmbiguousBindConstructor { type_name: String, count: usize },

    #[error("{type_name} marks a no-argument constructor for constructor binding")]
    NoArgBindConstructor { type_name: String },

    #[error("No bind strategy for {type_name}: {reason}")]
    NoBindStrategy { type_name: String, reason: String },

    #[error("Failed to convert property '{key}' to {target}: {source}")]
    BindConversion {
        key: String,
        target: String,
        #[source]
        source: ConversionError,
    },

    #[error("Failed to invoke bind constructor of {type_name}: {message}")]
    ConstructorInvocation { type_name: String, message: String },

    #[error("Could not bind properties to '{type_name}' (prefix '{prefix}'): {source}")]
    ConfigurationBind {
        type_name: String,
        prefix: String,
        #[source]
        source: Box<IgnitionError>,
    },

    #[error("No configuration definition registered under '{name}'")]
    DefinitionNotFound { name: String },

    #[error("Cannot bind '{bean_name}' after construction: {reason}")]
    InvalidBindTarget { bean_name: String, reason: String },

    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },
}

impl IgnitionError {
    pub fn no_bind_strategy(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoBindStrategy {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a binding failure so it names the configuration type it came from.
    ///
    /// Errors that already carry this context are passed through unchanged.
    pub fn configuration_bind(
        type_name: impl Into<String>,
        prefix: impl Into<String>,
        source: IgnitionError,
    ) -> Self {
        match source {
            already @ Self::ConfigurationBind { .. } => already,
            source => Self::ConfigurationBind {
                type_name: type_name.into(),
                prefix: prefix.into(),
                source: Box::new(source),
            },
        }
    }

    /// The innermost error, unwrapping any `ConfigurationBind` layers.
    pub fn root_cause(&self) -> &IgnitionError {
        match self {
            Self::ConfigurationBind { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
