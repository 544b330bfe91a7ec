use thiserror::Error;

/// Errors raised while constructing objects from user-supplied data.
///
/// Every variant names the offending object so that a malformed input document can be
/// fixed without guesswork. These errors are fatal: they are raised before any
/// optimization runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// An object name was not a string (e.g. a number in the input document).
    #[error("Object name must be a string, found {found}")]
    NonStringName { found: String },

    /// An object name was empty or whitespace only.
    #[error("Object name must not be empty")]
    EmptyName,

    /// Two objects share the same name.
    #[error("Duplicate object name '{0}'")]
    DuplicateName(String),

    /// No sphere positions were supplied.
    #[error("Positions have not been set for '{0}'")]
    MissingPositions(String),

    /// No sphere radii were supplied.
    #[error("Radii have not been set for '{0}'")]
    MissingRadii(String),

    /// The number of radii does not match the number of positions.
    #[error("There must be 1 radius for each position row for '{name}' ({positions} positions, {radii} radii)")]
    ShapeMismatch {
        name: String,
        positions: usize,
        radii: usize,
    },

    /// A radius was negative or not finite.
    #[error("Radius {value} at row {row} is invalid for '{name}'")]
    InvalidRadius { name: String, row: usize, value: f64 },

    /// A coordinate was not finite.
    #[error("Position at row {row} is not finite for '{name}'")]
    InvalidPosition { name: String, row: usize },

    /// The color token is not a recognized color name or hex code.
    #[error("Color '{color}' not recognized for '{name}'")]
    UnrecognizedColor { name: String, color: String },

    /// A degree-of-freedom token is not one of `x`, `y`, `z`, `rx`, `ry`, `rz`.
    #[error("Invalid degree of freedom '{token}' specified for '{name}'")]
    UnrecognizedDegreeOfFreedom { name: String, token: String },

    /// The movement class token is not supported.
    #[error("Unsupported movement class '{class}' for '{name}'")]
    UnsupportedMovementClass { name: String, class: String },

    /// A port or interconnect refers to an object that does not exist.
    #[error("'{name}' references unknown object '{reference}'")]
    UnknownReference { name: String, reference: String },

    /// An interconnect radius was not strictly positive.
    #[error("Interconnect radius must be positive for '{name}', got {radius}")]
    InvalidInterconnectRadius { name: String, radius: f64 },

    /// A movement class / degree-of-freedom combination that has no defined semantics.
    #[error("Movement semantics not implemented for '{name}': {detail}")]
    NotImplemented { name: String, detail: String },
}
