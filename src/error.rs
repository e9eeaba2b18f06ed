//! Error types for OData JSON writing.
//!
//! Every failure a caller can trigger with bad input surfaces as a variant of
//! [`Error`]. Misuse of the low-level [`JsonWriter`](crate::JsonWriter) scope
//! stack is a bug in the calling code and panics instead.
//!
//! ## Error Categories
//!
//! - **Validation errors**: duplicate or reserved annotation names, null values
//!   for non-nullable terms, incomplete operations and association links,
//!   inner-error chains deeper than the configured limit
//! - **Resolution errors**: relative URIs that must be absolute but no base URI
//!   is configured
//! - **I/O errors**: the output sink rejected a write
//!
//! Errors abort the write in progress. Output already handed to the sink is not
//! rolled back, so callers should discard it.
//!
//! ## Examples
//!
//! ```rust
//! use odata_json::Error;
//!
//! let err = Error::recursion_depth_limit_reached(2);
//! assert!(err.to_string().contains("2"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while writing an OData JSON payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error while writing to the sink
    #[error("IO error: {0}")]
    Io(String),

    /// A Rust value that has no OData JSON representation
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The same instance annotation name appears twice in one collection
    #[error("The instance annotation name '{0}' was found more than once in the instance annotation collection")]
    DuplicateAnnotationNameInCollection(String),

    /// A null annotation value for a term whose type is not nullable
    #[error("The value of the instance annotation '{name}' is null, but the declared type '{type_name}' is not nullable")]
    NullValueNotAllowed { name: String, type_name: String },

    /// Annotation names must be non-empty and namespace qualified
    #[error("The instance annotation name '{0}' is not valid")]
    InvalidAnnotationName(String),

    /// Annotation names in the reserved `odata.` namespace cannot be user supplied
    #[error("The instance annotation name '{0}' is reserved for the protocol")]
    ReservedAnnotationName(String),

    /// Stream values cannot be carried by an instance annotation
    #[error("The value of the instance annotation '{0}' is a stream; streams are not supported in annotations")]
    StreamValueInAnnotation(String),

    /// The runtime type of a value does not fit its declared type
    #[error("Incompatible type: expected '{expected}', found '{actual}'")]
    IncompatibleType { expected: String, actual: String },

    /// An action or function without a metadata URI
    #[error("The {kind} has no metadata URI; every {kind} must have one")]
    OperationMetadataMissing { kind: &'static str },

    /// An action or function without a target URI
    #[error("The {kind} '{metadata}' has no target URI; every {kind} must have one")]
    OperationTargetMissing { kind: &'static str, metadata: String },

    /// Actions and functions can only be written in responses
    #[error("An {kind} cannot be written in a request payload")]
    OperationInRequest { kind: &'static str },

    /// An association link without a name
    #[error("An association link must have a non-empty name")]
    AssociationLinkNameEmpty,

    /// An association link without a target URI
    #[error("The association link '{0}' has no target URI")]
    AssociationLinkTargetMissing(String),

    /// A property or association link name written twice for one entity
    #[error("Multiple properties or links with the name '{0}' were detected")]
    DuplicatePropertyName(String),

    /// An association link that names a property the entity type does not declare
    #[error("The property '{property}' does not exist on type '{type_name}'")]
    PropertyNotDefined { property: String, type_name: String },

    /// An association link that names a structural property
    #[error("The property '{property}' on type '{type_name}' is not a navigation property")]
    NotNavigationProperty { property: String, type_name: String },

    /// A media resource or named stream that breaks the stream reference rules
    #[error("Invalid stream reference: {0}")]
    InvalidStreamReference(String),

    /// Nested inner errors or values went deeper than the configured limit
    #[error("The maximum recursion depth of {0} was reached")]
    RecursionDepthLimitReached(usize),

    /// A relative URI that must be made absolute while no base URI is set
    #[error("The relative URI '{0}' cannot be made absolute because no base URI was specified")]
    RelativeUriWithoutBase(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an I/O error from the sink's failure message.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates an unsupported type error naming the offending type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use odata_json::Error;
    ///
    /// let err = Error::unsupported_type("tuple variant Shape::Point");
    /// assert!(err.to_string().contains("Shape::Point"));
    /// ```
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a [`Error::DuplicateAnnotationNameInCollection`].
    pub fn duplicate_annotation(name: &str) -> Self {
        Error::DuplicateAnnotationNameInCollection(name.to_string())
    }

    /// Creates a [`Error::NullValueNotAllowed`].
    pub fn null_value_not_allowed(name: &str, type_name: &str) -> Self {
        Error::NullValueNotAllowed {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }

    /// Creates a [`Error::IncompatibleType`].
    pub fn incompatible_type(expected: &str, actual: &str) -> Self {
        Error::IncompatibleType {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates the error raised when nesting exceeds `limit` levels.
    pub fn recursion_depth_limit_reached(limit: usize) -> Self {
        Error::RecursionDepthLimitReached(limit)
    }

    /// Creates a [`Error::InvalidStreamReference`].
    pub fn invalid_stream_reference(msg: &str) -> Self {
        Error::InvalidStreamReference(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use odata_json::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(&e.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = Error::duplicate_annotation("NS.note");
        assert!(err.to_string().contains("NS.note"));

        let err = Error::null_value_not_allowed("NS.count", "Edm.Int32");
        let msg = err.to_string();
        assert!(msg.contains("NS.count"));
        assert!(msg.contains("Edm.Int32"));

        let err = Error::RelativeUriWithoutBase("Customers(1)".to_string());
        assert!(err.to_string().contains("Customers(1)"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(ref m) if m.contains("pipe closed")));
    }
}
