//! Error types for block validation, form decoding and rendering

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Key of an entry in a [`ListValidationError`].
///
/// Items sort before the list-level entry so iteration follows the rendered
/// order of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKey {
    /// Errors produced by the item at this position
    Item(usize),
    /// Errors about the list as a whole (length bounds)
    ListLevel,
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKey::Item(index) => write!(f, "{}", index),
            ErrorKey::ListLevel => f.write_str("__all__"),
        }
    }
}

/// A user-facing validation failure returned by `Block::clean`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A single message produced by a field block
    #[error("{message}")]
    Invalid { message: String },

    /// Aggregated per-item and list-level failures of a list block
    #[error("Validation error in ListBlock")]
    List(ListValidationError),
}

impl ValidationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            message: message.into(),
        }
    }

    /// Flatten into the messages a template can display directly
    pub fn messages(&self) -> Vec<String> {
        match self {
            ValidationError::Invalid { message } => vec![message.clone()],
            ValidationError::List(list) => list
                .iter()
                .flat_map(|(_, errors)| errors.iter().flat_map(|e| e.messages()))
                .collect(),
        }
    }
}

impl From<ListValidationError> for ValidationError {
    fn from(err: ListValidationError) -> Self {
        ValidationError::List(err)
    }
}

/// Failures of a list, keyed by item position or [`ErrorKey::ListLevel`].
///
/// Whatever `ListBlock::clean` files under a key is handed back unchanged by
/// [`ListValidationError::get`], which is how rendering puts each message
/// next to the item that caused it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListValidationError {
    errors: BTreeMap<ErrorKey, Vec<ValidationError>>,
}

impl ListValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: ErrorKey, error: ValidationError) {
        self.errors.entry(key).or_default().push(error);
    }

    pub fn get(&self, key: ErrorKey) -> Option<&[ValidationError]> {
        self.errors.get(&key).map(Vec::as_slice)
    }

    pub fn item_errors(&self, index: usize) -> Option<&[ValidationError]> {
        self.get(ErrorKey::Item(index))
    }

    pub fn list_errors(&self) -> Option<&[ValidationError]> {
        self.get(ErrorKey::ListLevel)
    }

    pub fn keys(&self) -> impl Iterator<Item = ErrorKey> + '_ {
        self.errors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorKey, &Vec<ValidationError>)> {
        self.errors.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl Serialize for ListValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (key, errors) in &self.errors {
            let messages: Vec<String> = errors.iter().flat_map(|e| e.messages()).collect();
            map.serialize_entry(&key.to_string(), &messages)?;
        }
        map.end()
    }
}

/// A problem with how a block is configured, reported by `Block::check`
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ConfigIssue {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{field}: minimum {min} is greater than maximum {max}")]
    ContradictoryBounds { field: String, min: i64, max: i64 },
}

/// Malformed flat form data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Missing form field: {0}")]
    MissingField(String),

    #[error("Form field {field} is not an integer: {value:?}")]
    NotAnInteger { field: String, value: String },
}

/// Faults caused by callers or collaborators rather than by user input
#[derive(Debug, Error)]
pub enum BlockError {
    /// A caller broke an assumption of the block API
    #[error("Contract violation: {0}")]
    Contract(String),

    #[error(transparent)]
    Form(#[from] FormError),

    /// Raw data could not be converted into a native value
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<tera::Error> for BlockError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful part of the message in its source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = std::error::Error::source(inner);
        }
        BlockError::Render(message)
    }
}

/// Result type alias for block operations
pub type BlockResult<T> = Result<T, BlockError>;
