//! Error types for stratum-core

/// Result type for stratum-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding or resolving configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A slot was read before it received any value
    #[error("{key} is unresolved: no value has been assigned")]
    Unresolved { key: String },

    /// Evaluation re-entered a slot that was still being resolved
    #[error("circular reference while resolving {key}: {}", chain.join(" -> "))]
    CircularReference { key: String, chain: Vec<String> },

    /// A bound value failed one of the constraints of its trait
    #[error("{name}: {value:?} is not {constraint}")]
    ConstraintViolation {
        name: String,
        value: String,
        constraint: String,
    },

    /// A raw value could not be converted into the declared type
    #[error("{name}: could not cast {value:?} to {type_name}: {reason}")]
    Casting {
        name: String,
        value: String,
        type_name: String,
        reason: String,
    },

    /// A constraint was built from an invalid regular expression
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An expression tree could not be evaluated
    #[error("could not evaluate {expression}: {reason}")]
    Evaluation { expression: String, reason: String },

    /// Interpolation did not converge within the configured limits
    #[error("interpolation budget exhausted while resolving {key}: {reason}")]
    InterpolationBudget { key: String, reason: String },

    /// A key is not a dot-separated sequence of identifiers
    #[error("invalid key: {key:?}")]
    InvalidKey { key: String },

    /// A priority category name was not recognized
    #[error("unknown priority category: {name:?}")]
    UnknownCategory { name: String },

    /// A direct write targeted a key borrowed from a component inventory
    #[error("{key} is shared with a component inventory; configure it through the registry")]
    SharedKey { key: String },

    /// A trait name or alias is not declared by the component
    #[error("{component} has no trait named {name:?}")]
    UnknownTrait { component: String, name: String },

    /// A trait name or alias is declared twice by the same component
    #[error("{component} declares {name:?} more than once")]
    DuplicateTrait { component: String, name: String },

    /// The component name is not registered
    #[error("component not registered: {name}")]
    UnknownComponent { name: String },

    /// The component name (or family) is already registered
    #[error("component already registered: {name}")]
    DuplicateComponent { name: String },

    /// The instance handle or name does not refer to a live instance
    #[error("no such instance: {name}")]
    UnknownInstance { name: String },

    /// An instance with the same name already exists
    #[error("instance already exists: {name}")]
    DuplicateInstance { name: String },
}

impl Error {
    /// Create a casting error
    pub fn casting(
        name: impl Into<String>,
        value: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Casting {
            name: name.into(),
            value: value.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the value itself is unusable, as opposed to
    /// the value depending on something that is not available yet
    pub fn rejects_value(&self) -> bool {
        matches!(self, Self::Casting { .. } | Self::ConstraintViolation { .. })
    }
}
