//! Low-level JSON writer.
//!
//! [`JsonWriter`] keeps a stack of open scopes (object, array, JSONP padding)
//! and turns discrete write calls into well-formed JSON. It knows nothing
//! about the protocol; the serializers in this crate drive it.
//!
//! ## Usage
//!
//! ```rust
//! use odata_json::{JsonWriter, WriterOptions};
//!
//! let mut out = Vec::new();
//! let mut writer = JsonWriter::new(&mut out, &WriterOptions::new());
//! writer.start_object().unwrap();
//! writer.write_name("a").unwrap();
//! writer.write_i32(1).unwrap();
//! writer.write_name("b").unwrap();
//! writer.write_bool(true).unwrap();
//! writer.end_object().unwrap();
//!
//! assert_eq!(String::from_utf8(out).unwrap(), r#"{"a":1,"b":true}"#);
//! ```
//!
//! ## Contract
//!
//! Scope calls must nest strictly. Ending a scope of the wrong kind, ending
//! with nothing open, writing a member name outside an object, or opening a
//! padding scope anywhere but at the very start of the document is a bug in
//! the caller and panics. Writing a value inside an object without a
//! preceding [`write_name`](JsonWriter::write_name) is equally the caller's
//! obligation but is not checked.

use crate::encode::{encode_primitive, write_escaped_string, Token};
use crate::{ODataVersion, PrimitiveValue, Result, WriterOptions};
use std::io::Write;

/// The kind of an open structural region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Array,
    Object,
    Padding,
}

impl ScopeKind {
    /// Text that opens a scope of this kind.
    #[must_use]
    pub const fn start_token(&self) -> &'static str {
        match self {
            ScopeKind::Array => "[",
            ScopeKind::Object => "{",
            ScopeKind::Padding => "(",
        }
    }

    /// Text that closes a scope of this kind.
    #[must_use]
    pub const fn end_token(&self) -> &'static str {
        match self {
            ScopeKind::Array => "]",
            ScopeKind::Object => "}",
            ScopeKind::Padding => ")",
        }
    }
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    // children written so far; only used to place separators
    element_count: usize,
}

/// A streaming JSON writer over a caller-owned sink.
///
/// The sink is only ever appended to and flushed on request; it is never
/// closed. One writer drives one document from one thread.
pub struct JsonWriter<W: Write> {
    sink: W,
    scopes: Vec<Scope>,
    pretty: bool,
    indent: usize,
    indent_level: usize,
    at_line_start: bool,
    padding_used: bool,
    version: ODataVersion,
    force_decimal_marker: bool,
}

impl<W: Write> JsonWriter<W> {
    /// Creates a writer that takes its whitespace and encoding policy from `options`.
    pub fn new(sink: W, options: &WriterOptions) -> Self {
        JsonWriter {
            sink,
            scopes: Vec::with_capacity(8),
            pretty: options.pretty,
            indent: options.indent,
            indent_level: 0,
            at_line_start: false,
            padding_used: false,
            version: options.version,
            force_decimal_marker: options.force_decimal_marker(),
        }
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Borrows the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Number of currently open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Kind of the innermost open scope, if any.
    #[must_use]
    pub fn current_scope(&self) -> Option<ScopeKind> {
        self.scopes.last().map(|s| s.kind)
    }

    /// Protocol version the writer encodes values for.
    #[must_use]
    pub fn version(&self) -> ODataVersion {
        self.version
    }

    /// Opens an object.
    pub fn start_object(&mut self) -> Result<()> {
        self.start_scope(ScopeKind::Object)
    }

    /// Closes the innermost scope, which must be an object.
    ///
    /// # Panics
    ///
    /// Panics if the innermost open scope is not an object.
    pub fn end_object(&mut self) -> Result<()> {
        self.end_scope(ScopeKind::Object)
    }

    /// Opens an array.
    pub fn start_array(&mut self) -> Result<()> {
        self.start_scope(ScopeKind::Array)
    }

    /// Closes the innermost scope, which must be an array.
    ///
    /// # Panics
    ///
    /// Panics if the innermost open scope is not an array.
    pub fn end_array(&mut self) -> Result<()> {
        self.end_scope(ScopeKind::Array)
    }

    /// Writes `function` followed by `(`, opening the JSONP padding scope.
    ///
    /// # Panics
    ///
    /// Panics if anything has been opened before, or padding was already used
    /// in this document.
    pub fn start_padding(&mut self, function: &str) -> Result<()> {
        assert!(
            self.scopes.is_empty() && !self.padding_used,
            "the padding scope must be the only outermost scope of the document"
        );
        self.padding_used = true;
        tracing::debug!(function, "opening JSONP padding scope");
        self.write_raw(function)?;
        self.start_scope(ScopeKind::Padding)
    }

    /// Writes `)`, closing the JSONP padding scope.
    ///
    /// # Panics
    ///
    /// Panics if the innermost open scope is not the padding scope.
    pub fn end_padding(&mut self) -> Result<()> {
        self.end_scope(ScopeKind::Padding)
    }

    /// Writes an object member name and the name/value separator.
    ///
    /// # Panics
    ///
    /// Panics if the innermost open scope is not an object.
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        let scope = match self.scopes.last_mut() {
            Some(scope) if scope.kind == ScopeKind::Object => scope,
            other => panic!(
                "member name '{}' written outside an object (innermost scope: {:?})",
                name,
                other.map(|s| s.kind)
            ),
        };
        let first = scope.element_count == 0;
        scope.element_count += 1;
        if !first {
            self.write_raw(",")?;
        }
        self.indent_pending()?;
        write_escaped_string(&mut self.sink, name)?;
        self.write_raw(":")
    }

    /// Writes `null`.
    pub fn write_null(&mut self) -> Result<()> {
        self.write_value_separator()?;
        self.write_raw("null")
    }

    /// Writes `true` or `false`.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_primitive(&PrimitiveValue::Boolean(value))
    }

    /// Writes an `Edm.Int32` as a bare number.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_primitive(&PrimitiveValue::Int32(value))
    }

    /// Writes an `Edm.Int64`, quoted.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_primitive(&PrimitiveValue::Int64(value))
    }

    /// Writes an `Edm.Double` following the writer's decimal marker policy.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_primitive(&PrimitiveValue::Double(value))
    }

    /// Writes a string value, escaped and quoted.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_value_separator()?;
        self.indent_pending()?;
        write_escaped_string(&mut self.sink, value)?;
        Ok(())
    }

    /// Writes any primitive value using the writer's version and float policy.
    pub fn write_primitive(&mut self, value: &PrimitiveValue) -> Result<()> {
        let token = encode_primitive(value, self.version, self.force_decimal_marker);
        self.write_value_separator()?;
        match token {
            Token::Bare(text) => self.write_raw(&text),
            Token::Quoted(text) => {
                self.indent_pending()?;
                write_escaped_string(&mut self.sink, &text)?;
                Ok(())
            }
        }
    }

    /// Flushes the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    fn start_scope(&mut self, kind: ScopeKind) -> Result<()> {
        if kind != ScopeKind::Padding {
            self.write_value_separator()?;
        }
        self.scopes.push(Scope {
            kind,
            element_count: 0,
        });
        self.write_raw(kind.start_token())?;
        self.indent_level += 1;
        self.new_line()
    }

    fn end_scope(&mut self, kind: ScopeKind) -> Result<()> {
        self.new_line()?;
        self.indent_level = self.indent_level.saturating_sub(1);
        let scope = self
            .scopes
            .pop()
            .unwrap_or_else(|| panic!("end of {:?} scope with no scope open", kind));
        assert_eq!(
            scope.kind, kind,
            "scope mismatch: tried to end {:?} while {:?} is open",
            kind, scope.kind
        );
        self.write_raw(kind.end_token())
    }

    // Element separator for values inside arrays; object members get theirs from write_name.
    fn write_value_separator(&mut self) -> Result<()> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.kind == ScopeKind::Array {
                let first = scope.element_count == 0;
                scope.element_count += 1;
                if !first {
                    self.write_raw(",")?;
                }
            }
        }
        Ok(())
    }

    fn write_raw(&mut self, text: &str) -> Result<()> {
        self.indent_pending()?;
        self.sink.write_all(text.as_bytes())?;
        Ok(())
    }

    fn indent_pending(&mut self) -> Result<()> {
        if self.at_line_start {
            self.at_line_start = false;
            let width = self.indent_level * self.indent;
            write!(self.sink, "{:width$}", "", width = width)?;
        }
        Ok(())
    }

    fn new_line(&mut self) -> Result<()> {
        if self.pretty && !self.at_line_start {
            self.sink.write_all(b"\n")?;
            self.at_line_start = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact<F>(f: F) -> String
    where
        F: FnOnce(&mut JsonWriter<&mut Vec<u8>>) -> Result<()>,
    {
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out, &WriterOptions::new());
        f(&mut writer).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_two_members() {
        let json = compact(|w| {
            w.start_object()?;
            w.write_name("a")?;
            w.write_i32(1)?;
            w.write_name("b")?;
            w.write_bool(true)?;
            w.end_object()
        });
        assert_eq!(json, r#"{"a":1,"b":true}"#);
    }

    #[test]
    fn test_nested_arrays() {
        let json = compact(|w| {
            w.start_array()?;
            w.write_i32(1)?;
            w.start_array()?;
            w.end_array()?;
            w.start_object()?;
            w.write_name("x")?;
            w.write_null()?;
            w.end_object()?;
            w.write_str("s")?;
            w.end_array()
        });
        assert_eq!(json, r#"[1,[],{"x":null},"s"]"#);
    }

    #[test]
    fn test_top_level_scalar() {
        assert_eq!(compact(|w| w.write_f64(1.0)), "1.0");
        assert_eq!(compact(|w| w.write_i64(5)), "\"5\"");
    }

    #[test]
    fn test_padding() {
        let json = compact(|w| {
            w.start_padding("cb")?;
            w.start_object()?;
            w.write_name("a")?;
            w.write_str("b")?;
            w.end_object()?;
            w.end_padding()
        });
        assert_eq!(json, r#"cb({"a":"b"})"#);
    }

    #[test]
    fn test_pretty_output() {
        let mut out = Vec::new();
        let mut w = JsonWriter::new(&mut out, &WriterOptions::pretty());
        w.start_object().unwrap();
        w.write_name("a").unwrap();
        w.start_array().unwrap();
        w.write_i32(1).unwrap();
        w.end_array().unwrap();
        w.end_object().unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\n  \"a\":[\n    1\n  ]\n}"
        );
    }

    #[test]
    fn test_escaped_name() {
        let json = compact(|w| {
            w.start_object()?;
            w.write_name("a\"b")?;
            w.write_i32(0)?;
            w.end_object()
        });
        assert_eq!(json, r#"{"a\"b":0}"#);
    }

    #[test]
    #[should_panic(expected = "scope mismatch")]
    fn test_mismatched_end_panics() {
        let mut out = Vec::new();
        let mut w = JsonWriter::new(&mut out, &WriterOptions::new());
        w.start_object().unwrap();
        let _ = w.end_array();
    }

    #[test]
    #[should_panic(expected = "no scope open")]
    fn test_end_without_scope_panics() {
        let mut out = Vec::new();
        let mut w = JsonWriter::new(&mut out, &WriterOptions::new());
        let _ = w.end_object();
    }

    #[test]
    #[should_panic(expected = "outside an object")]
    fn test_name_in_array_panics() {
        let mut out = Vec::new();
        let mut w = JsonWriter::new(&mut out, &WriterOptions::new());
        w.start_array().unwrap();
        let _ = w.write_name("a");
    }

    #[test]
    #[should_panic(expected = "only outermost scope")]
    fn test_nested_padding_panics() {
        let mut out = Vec::new();
        let mut w = JsonWriter::new(&mut out, &WriterOptions::new());
        w.start_object().unwrap();
        let _ = w.start_padding("cb");
    }
}
