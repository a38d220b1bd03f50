//! Error types for fixture construction.

use std::fmt;

/// The primary error type for all fixture operations.
#[derive(Debug)]
pub enum Error {
    /// A type name (or named fixture) that the schema does not know
    UnknownType(UnknownTypeError),
    /// A trait name that is not declared for the type
    UnknownTrait(UnknownTraitError),
    /// The schema cannot tell which field holds the primary key
    MissingPrimaryKeyStrategy(MissingPrimaryKeyError),
    /// An override value incompatible with the declared relationship
    InvalidOverride(InvalidOverrideError),
    /// Configuration errors
    Config(ConfigError),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct UnknownTypeError {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct UnknownTraitError {
    pub type_name: String,
    pub trait_name: String,
}

#[derive(Debug, Clone)]
pub struct MissingPrimaryKeyError {
    pub type_name: String,
}

#[derive(Debug, Clone)]
pub struct InvalidOverrideError {
    pub kind: InvalidOverrideKind,
    pub type_name: String,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidOverrideKind {
    /// A list was given for a `one` relationship
    ListForSingle,
    /// A single record was given for a `many` relationship
    SingleForList,
    /// A record of an unrelated type was given
    TypeMismatch,
    /// An array mixing ids and records
    MixedArray,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Shorthand for an [`Error::UnknownType`].
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Error::UnknownType(UnknownTypeError { name: name.into() })
    }

    /// Shorthand for an [`Error::UnknownTrait`].
    pub fn unknown_trait(type_name: impl Into<String>, trait_name: impl Into<String>) -> Self {
        Error::UnknownTrait(UnknownTraitError {
            type_name: type_name.into(),
            trait_name: trait_name.into(),
        })
    }

    /// Shorthand for an [`Error::MissingPrimaryKeyStrategy`].
    pub fn missing_primary_key(type_name: impl Into<String>) -> Self {
        Error::MissingPrimaryKeyStrategy(MissingPrimaryKeyError {
            type_name: type_name.into(),
        })
    }

    /// Shorthand for an [`Error::InvalidOverride`].
    pub fn invalid_override(
        kind: InvalidOverrideKind,
        type_name: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::InvalidOverride(InvalidOverrideError {
            kind,
            type_name: type_name.into(),
            field: field.into(),
            message: message.into(),
        })
    }

    /// Does this error point at a fixture definition problem (as opposed to a
    /// bad override passed by the test)?
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownType(_) | Error::UnknownTrait(_) | Error::MissingPrimaryKeyStrategy(_)
        )
    }

    /// The type name the error refers to, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Error::UnknownType(e) => Some(&e.name),
            Error::UnknownTrait(e) => Some(&e.type_name),
            Error::MissingPrimaryKeyStrategy(e) => Some(&e.type_name),
            Error::InvalidOverride(e) => Some(&e.type_name),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownType(e) => write!(f, "Unknown type: {}", e),
            Error::UnknownTrait(e) => write!(f, "Unknown trait: {}", e),
            Error::MissingPrimaryKeyStrategy(e) => write!(f, "Missing primary key: {}", e),
            Error::InvalidOverride(e) => write!(f, "Invalid override: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for UnknownTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no fixture definition for '{}'", self.name)
    }
}

impl fmt::Display for UnknownTraitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' has no trait named '{}'",
            self.type_name, self.trait_name
        )
    }
}

impl fmt::Display for MissingPrimaryKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot determine the primary key field of '{}'",
            self.type_name
        )
    }
}

impl fmt::Display for InvalidOverrideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.type_name, self.field, self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<UnknownTypeError> for Error {
    fn from(err: UnknownTypeError) -> Self {
        Error::UnknownType(err)
    }
}

impl From<UnknownTraitError> for Error {
    fn from(err: UnknownTraitError) -> Self {
        Error::UnknownTrait(err)
    }
}

impl From<MissingPrimaryKeyError> for Error {
    fn from(err: MissingPrimaryKeyError) -> Self {
        Error::MissingPrimaryKeyStrategy(err)
    }
}

impl From<InvalidOverrideError> for Error {
    fn from(err: InvalidOverrideError) -> Self {
        Error::InvalidOverride(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for fixture operations.
pub type Result<T> = std::result::Result<T, Error>;
