//! # odata_json
//!
//! A writer for the JSON formats of the OData protocol, in both the light
//! dialect and the legacy verbose dialect.
//!
//! ## Layers
//!
//! - [`JsonWriter`]: a scope-stack JSON emitter with protocol-aware scalar
//!   encoding (quoted 64-bit integers and decimals, legacy `\/Date(ms)\/` dates
//!   before V3, a forced decimal marker on floats) and optional JSONP padding.
//! - [`ValueWriter`](value_writer::ValueWriter): null, primitive, complex and
//!   collection values, with type names where the
//!   [`TypeNameOracle`](oracle::TypeNameOracle) asks for them.
//! - [`InstanceAnnotationWriter`](annotation::InstanceAnnotationWriter):
//!   custom annotations, each name written at most once per target.
//! - [`EntityMetadataSerializer`](metadata::EntityMetadataSerializer): the
//!   verbose `__metadata` block of an entity.
//! - [`ErrorSerializer`](error_writer::ErrorSerializer): top-level error
//!   payloads with a bounded inner error chain.
//! - [`EntryWriter`](entry::EntryWriter): verbose entries and feeds.
//!
//! ## Quick Start
//!
//! ```rust
//! use odata_json::{error_to_string, InnerError, ODataError, WriterOptions};
//!
//! let error = ODataError::new("E1", "bad").with_language("en");
//! let json = error_to_string(&error, &WriterOptions::new()).unwrap();
//! assert_eq!(json, r#"{"odata.error":{"code":"E1","message":{"lang":"en","value":"bad"}}}"#);
//!
//! let options = WriterOptions::new().with_debug_information(true);
//! let error = error.with_inner_error(InnerError::new("stack overflow"));
//! let json = error_to_string(&error, &options).unwrap();
//! assert!(json.contains(r#""innererror":{"message":"stack overflow""#));
//! ```
//!
//! ### Verbose entries
//!
//! ```rust
//! use odata_json::{entry_to_string, Dialect, Entry, WriterOptions};
//! use url::Url;
//!
//! let options = WriterOptions::new()
//!     .with_dialect(Dialect::Verbose)
//!     .with_base_uri(Url::parse("http://host/svc/").unwrap());
//! let entry = Entry::new("NS.Customer")
//!     .with_edit_link("Customers(1)")
//!     .with_property("Name", "Alice");
//!
//! assert_eq!(
//!     entry_to_string(&entry, &options).unwrap(),
//!     r#"{"d":{"__metadata":{"uri":"http://host/svc/Customers(1)","type":"NS.Customer"},"Name":"Alice"}}"#
//! );
//! ```
//!
//! ### JSONP
//!
//! ```rust
//! use odata_json::{error_to_string, ODataError, WriterOptions};
//!
//! let options = WriterOptions::new().with_jsonp("callback");
//! let json = error_to_string(&ODataError::new("E", "m"), &options).unwrap();
//! assert!(json.starts_with("callback({") && json.ends_with("})"));
//! ```
//!
//! ## Errors
//!
//! Every protocol violation is reported as an [`Error`]; the sink may hold a
//! partial document afterwards and should be discarded. Misusing the
//! [`JsonWriter`] scope calls directly is a bug and panics.

pub mod annotation;
pub mod checker;
pub mod edm;
pub mod encode;
pub mod entry;
pub mod error;
pub mod error_writer;
pub mod map;
pub mod metadata;
pub mod options;
pub mod oracle;
pub mod ser;
pub mod uri;
pub mod value;
pub mod value_writer;
pub mod writer;

pub use annotation::{InstanceAnnotationWriteTracker, InstanceAnnotationWriter};
pub use checker::{DuplicateNameChecker, DuplicatePropertyNamesChecker};
pub use entry::{Entry, EntryWriter, Feed};
pub use error::{Error, Result};
pub use error_writer::{ErrorSerializer, InnerError, ODataError};
pub use map::PropertyMap;
pub use metadata::{
    AssociationLink, EntityMetadata, EntityMetadataSerializer, Operation, Projection,
    SerializationTypeName,
};
pub use options::{AnnotationFilter, Dialect, ODataVersion, WriterOptions};
pub use ser::{to_value, ValueSerializer};
pub use uri::UriResolver;
pub use value::{
    CollectionValue, ComplexValue, Decimal, InstanceAnnotation, ODataValue, PrimitiveValue,
    StreamReference,
};
pub use writer::{JsonWriter, ScopeKind};

use edm::{EmptyModel, Model};
use oracle::LightTypeNameOracle;
use std::io;
use value_writer::ValueWriter;

/// Writes `error` as a complete document to `writer`.
///
/// The inner error chain is only written when
/// [`WriterOptions::include_debug_information`] is set.
///
/// # Errors
///
/// Returns an error if the inner error chain is deeper than
/// [`WriterOptions::max_inner_error_depth`], an annotation is invalid, or
/// writing to the sink fails.
pub fn write_error<W>(writer: W, error: &ODataError, options: &WriterOptions) -> Result<()>
where
    W: io::Write,
{
    write_error_with_model(writer, error, options, &EmptyModel)
}

/// Writes `error` as a complete document, resolving annotation terms in `model`.
///
/// Declared terms validate their values: a null for a non-nullable term or a
/// value of the wrong type fails.
///
/// # Errors
///
/// See [`write_error`].
pub fn write_error_with_model<W>(
    writer: W,
    error: &ODataError,
    options: &WriterOptions,
    model: &dyn Model,
) -> Result<()>
where
    W: io::Write,
{
    let values = ValueWriter::new(options, model, &LightTypeNameOracle);
    write_document(writer, options, |json| {
        ErrorSerializer::new(&values).write_odata_error(
            json,
            error,
            options.include_debug_information,
        )
    })
}

/// Writes `error` as a complete document into a `String`.
///
/// # Errors
///
/// See [`write_error`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn error_to_string(error: &ODataError, options: &WriterOptions) -> Result<String> {
    let mut buffer = Vec::with_capacity(128);
    write_error(&mut buffer, error, options)?;
    into_string(buffer)
}

/// Writes `error` into a `String`, resolving annotation terms in `model`.
///
/// # Errors
///
/// See [`write_error`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn error_to_string_with_model(
    error: &ODataError,
    options: &WriterOptions,
    model: &dyn Model,
) -> Result<String> {
    let mut buffer = Vec::with_capacity(128);
    write_error_with_model(&mut buffer, error, options, model)?;
    into_string(buffer)
}

/// Writes `entry` as a complete verbose document to `writer`.
///
/// # Errors
///
/// Fails in the light dialect, on invalid entity metadata, on duplicate
/// property or link names, and when writing to the sink fails.
pub fn write_entry<W>(writer: W, entry: &Entry, options: &WriterOptions) -> Result<()>
where
    W: io::Write,
{
    let values = ValueWriter::new(options, &EmptyModel, &LightTypeNameOracle);
    write_document(writer, options, |json| {
        EntryWriter::new(&values).write_entry_document(json, entry, &Projection::All, None)
    })
}

/// Writes `entry` as a complete verbose document into a `String`.
///
/// # Errors
///
/// See [`write_entry`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn entry_to_string(entry: &Entry, options: &WriterOptions) -> Result<String> {
    let mut buffer = Vec::with_capacity(256);
    write_entry(&mut buffer, entry, options)?;
    into_string(buffer)
}

/// Writes `feed` as a complete verbose document to `writer`.
///
/// # Errors
///
/// See [`write_entry`].
pub fn write_feed<W>(writer: W, feed: &Feed, options: &WriterOptions) -> Result<()>
where
    W: io::Write,
{
    let values = ValueWriter::new(options, &EmptyModel, &LightTypeNameOracle);
    write_document(writer, options, |json| {
        EntryWriter::new(&values).write_feed_document(json, feed, &Projection::All, None)
    })
}

/// Writes `feed` as a complete verbose document into a `String`.
///
/// # Errors
///
/// See [`write_entry`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn feed_to_string(feed: &Feed, options: &WriterOptions) -> Result<String> {
    let mut buffer = Vec::with_capacity(1024);
    write_feed(&mut buffer, feed, options)?;
    into_string(buffer)
}

fn write_document<W, F>(writer: W, options: &WriterOptions, body: F) -> Result<()>
where
    W: io::Write,
    F: FnOnce(&mut JsonWriter<W>) -> Result<()>,
{
    let mut json = JsonWriter::new(writer, options);
    if let Some(function) = &options.jsonp_function {
        json.start_padding(function)?;
    }
    body(&mut json)?;
    if options.jsonp_function.is_some() {
        json.end_padding()?;
    }
    json.flush()
}

fn into_string(buffer: Vec<u8>) -> Result<String> {
    String::from_utf8(buffer).map_err(|e| Error::custom(e.to_string()))
}
