//! Top-level error payloads.
//!
//! ```text
//! {"odata.error": {                       // "error" in the verbose dialect
//!     "code": "...",
//!     "message": {"lang": "...", "value": "..."},
//!     "innererror": {"message", "type", "stacktrace",
//!         "internalexception": {...}},
//!     "NS.term": ...                      // light dialect only
//! }}
//! ```

use crate::annotation::{InstanceAnnotationWriteTracker, InstanceAnnotationWriter};
use crate::value_writer::ValueWriter;
use crate::{Error, InstanceAnnotation, JsonWriter, Result};
use std::io::Write;

/// Language written when an error does not name one.
pub const DEFAULT_MESSAGE_LANGUAGE: &str = "en-US";

const INNER_ERROR: &str = "innererror";
const NESTED_INNER_ERROR: &str = "internalexception";

/// A protocol error as reported to the client.
///
/// # Examples
///
/// ```rust
/// use odata_json::{error_to_string, ODataError, WriterOptions};
///
/// let error = ODataError::new("E1", "bad").with_language("en");
/// assert_eq!(
///     error_to_string(&error, &WriterOptions::new()).unwrap(),
///     r#"{"odata.error":{"code":"E1","message":{"lang":"en","value":"bad"}}}"#
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ODataError {
    pub code: Option<String>,
    pub message: Option<String>,
    pub message_language: Option<String>,
    pub inner_error: Option<InnerError>,
    pub instance_annotations: Vec<InstanceAnnotation>,
}

impl ODataError {
    /// Creates an error in the default message language.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ODataError {
            code: Some(code.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Sets the language of the message.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.message_language = Some(language.into());
        self
    }

    /// Attaches debugging details.
    #[must_use]
    pub fn with_inner_error(mut self, inner: InnerError) -> Self {
        self.inner_error = Some(inner);
        self
    }

    /// Appends an instance annotation, written after the message.
    #[must_use]
    pub fn with_annotation(mut self, annotation: InstanceAnnotation) -> Self {
        self.instance_annotations.push(annotation);
        self
    }
}

/// Debugging detail about the cause of an error, possibly itself caused by another.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct InnerError {
    pub message: Option<String>,
    pub type_name: Option<String>,
    pub stack_trace: Option<String>,
    pub inner_error: Option<Box<InnerError>>,
}

impl InnerError {
    /// Creates an inner error with no type name or stack trace.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        InnerError {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Sets the name of the failing type.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Sets the stack trace text.
    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Nests `inner` as the cause, written as `internalexception`.
    #[must_use]
    pub fn caused_by(mut self, inner: InnerError) -> Self {
        self.inner_error = Some(Box::new(inner));
        self
    }

    /// Number of levels in this chain, counting `self`.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self;
        while let Some(next) = &current.inner_error {
            depth += 1;
            current = next;
        }
        depth
    }
}

/// Writes error payloads.
pub struct ErrorSerializer<'a, 'v> {
    values: &'v ValueWriter<'a>,
}

impl<'a, 'v> ErrorSerializer<'a, 'v> {
    /// Creates an error serializer that writes annotations through `values`.
    pub fn new(values: &'v ValueWriter<'a>) -> Self {
        ErrorSerializer { values }
    }

    /// Writes `error` as a complete top-level object.
    ///
    /// Missing code and message are written as empty strings and a missing
    /// language as [`DEFAULT_MESSAGE_LANGUAGE`]. The inner error is written
    /// only when `include_debug_information` is set.
    pub fn write_odata_error<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        error: &ODataError,
        include_debug_information: bool,
    ) -> Result<()> {
        let inner_error = error
            .inner_error
            .as_ref()
            .filter(|_| include_debug_information);
        self.write_error(
            writer,
            error.code.as_deref().unwrap_or(""),
            error.message.as_deref().unwrap_or(""),
            error
                .message_language
                .as_deref()
                .unwrap_or(DEFAULT_MESSAGE_LANGUAGE),
            inner_error,
            &error.instance_annotations,
            self.values.options().max_inner_error_depth,
        )
    }

    /// Writes an error object from its parts.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::RecursionDepthLimitReached`] when the inner error
    /// chain is deeper than `max_inner_depth`; the offending level is not
    /// opened. Annotation failures are those of
    /// [`InstanceAnnotationWriter::write_all`].
    #[allow(clippy::too_many_arguments)]
    pub fn write_error<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        code: &str,
        message: &str,
        message_language: &str,
        inner_error: Option<&InnerError>,
        annotations: &[InstanceAnnotation],
        max_inner_depth: usize,
    ) -> Result<()> {
        let dialect = self.values.options().dialect;

        writer.start_object()?;
        writer.write_name(dialect.error_container())?;
        writer.start_object()?;

        writer.write_name("code")?;
        writer.write_str(code)?;

        writer.write_name("message")?;
        writer.start_object()?;
        writer.write_name("lang")?;
        writer.write_str(message_language)?;
        writer.write_name("value")?;
        writer.write_str(message)?;
        writer.end_object()?;

        if let Some(inner) = inner_error {
            write_inner_error(writer, inner, INNER_ERROR, 0, max_inner_depth)?;
        }

        if dialect.is_light() && !annotations.is_empty() {
            let mut tracker = InstanceAnnotationWriteTracker::new();
            InstanceAnnotationWriter::new(self.values).write_all(writer, annotations, &mut tracker)?;
        }

        writer.end_object()?;
        writer.end_object()
    }
}

fn write_inner_error<W: Write>(
    writer: &mut JsonWriter<W>,
    inner: &InnerError,
    key: &str,
    depth: usize,
    max_depth: usize,
) -> Result<()> {
    let depth = depth + 1;
    if depth > max_depth {
        tracing::debug!(max_depth, "inner error chain exceeds the depth limit");
        return Err(Error::recursion_depth_limit_reached(max_depth));
    }

    writer.write_name(key)?;
    writer.start_object()?;
    writer.write_name("message")?;
    writer.write_str(inner.message.as_deref().unwrap_or(""))?;
    writer.write_name("type")?;
    writer.write_str(inner.type_name.as_deref().unwrap_or(""))?;
    writer.write_name("stacktrace")?;
    writer.write_str(inner.stack_trace.as_deref().unwrap_or(""))?;
    if let Some(nested) = &inner.inner_error {
        write_inner_error(writer, nested, NESTED_INNER_ERROR, depth, max_depth)?;
    }
    writer.end_object()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::EmptyModel;
    use crate::oracle::LightTypeNameOracle;
    use crate::{Dialect, WriterOptions};

    fn render(options: &WriterOptions, error: &ODataError, debug: bool) -> (Result<()>, String) {
        let values = ValueWriter::new(options, &EmptyModel, &LightTypeNameOracle);
        let mut out = Vec::new();
        let result = {
            let mut writer = JsonWriter::new(&mut out, options);
            ErrorSerializer::new(&values).write_odata_error(&mut writer, error, debug)
        };
        (result, String::from_utf8(out).unwrap())
    }

    fn chain(depth: usize) -> InnerError {
        let mut inner = InnerError::new(format!("level {}", depth));
        for level in (1..depth).rev() {
            inner = InnerError::new(format!("level {}", level)).caused_by(inner);
        }
        inner
    }

    #[test]
    fn test_light_error() {
        let error = ODataError::new("E1", "bad").with_language("en");
        let (result, json) = render(&WriterOptions::new(), &error, false);
        result.unwrap();
        assert_eq!(json, r#"{"odata.error":{"code":"E1","message":{"lang":"en","value":"bad"}}}"#);
    }

    #[test]
    fn test_defaults_and_verbose_container() {
        let options = WriterOptions::new().with_dialect(Dialect::Verbose);
        let (result, json) = render(&options, &ODataError::default(), false);
        result.unwrap();
        assert_eq!(json, r#"{"error":{"code":"","message":{"lang":"en-US","value":""}}}"#);
    }

    #[test]
    fn test_inner_error_fields_always_written() {
        let error = ODataError::new("E", "m").with_inner_error(
            InnerError::new("outer")
                .with_type_name("Sys.Err")
                .caused_by(InnerError::default().with_stack_trace("at x")),
        );
        let (result, json) = render(&WriterOptions::new(), &error, true);
        result.unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"odata.error":{"code":"E","message":{"lang":"en-US","value":"m"},"#,
                r#""innererror":{"message":"outer","type":"Sys.Err","stacktrace":"","#,
                r#""internalexception":{"message":"","type":"","stacktrace":"at x"}}}}"#
            )
        );
    }

    #[test]
    fn test_inner_error_hidden_without_debug() {
        let error = ODataError::new("E", "m").with_inner_error(InnerError::new("secret"));
        let (result, json) = render(&WriterOptions::new(), &error, false);
        result.unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_inner_error_depth_limit() {
        let options = WriterOptions::new().with_max_inner_error_depth(2);
        let error = ODataError::new("E", "m").with_inner_error(chain(2));
        let (result, _) = render(&options, &error, true);
        assert!(result.is_ok());

        let error = ODataError::new("E", "m").with_inner_error(chain(3));
        let (result, json) = render(&options, &error, true);
        assert_eq!(result, Err(Error::RecursionDepthLimitReached(2)));
        assert!(json.contains("level 2"));
        assert!(!json.contains("level 3"));
    }

    #[test]
    fn test_annotations_light_only() {
        let error = ODataError::new("E", "m")
            .with_annotation(InstanceAnnotation::new("NS.retry", 30).unwrap());
        let (result, json) = render(&WriterOptions::new(), &error, false);
        result.unwrap();
        assert!(json.ends_with(r#""value":"m"},"NS.retry":30}}"#));

        let options = WriterOptions::new().with_dialect(Dialect::Verbose);
        let (result, json) = render(&options, &error, false);
        result.unwrap();
        assert!(!json.contains("NS.retry"));
    }

    #[test]
    fn test_chain_depth() {
        assert_eq!(chain(4).depth(), 4);
        assert_eq!(InnerError::default().depth(), 1);
    }
}
