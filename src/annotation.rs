//! Instance annotation serialization.
//!
//! Instance annotations are `(name, value)` pairs written alongside the
//! members of an entity, error or value. An [`InstanceAnnotationWriteTracker`]
//! remembers which names one target has already emitted, so a caller that
//! flushes annotations in several passes never writes a name twice.
//!
//! ```rust
//! use odata_json::annotation::{InstanceAnnotationWriteTracker, InstanceAnnotationWriter};
//! use odata_json::edm::EmptyModel;
//! use odata_json::oracle::LightTypeNameOracle;
//! use odata_json::value_writer::ValueWriter;
//! use odata_json::{InstanceAnnotation, JsonWriter, WriterOptions};
//!
//! let options = WriterOptions::new();
//! let values = ValueWriter::new(&options, &EmptyModel, &LightTypeNameOracle);
//! let annotations = vec![InstanceAnnotation::new("Display.label", "Hi").unwrap()];
//! let mut tracker = InstanceAnnotationWriteTracker::new();
//!
//! let mut out = Vec::new();
//! let mut writer = JsonWriter::new(&mut out, &options);
//! writer.start_object().unwrap();
//! let annotation_writer = InstanceAnnotationWriter::new(&values);
//! annotation_writer.write_all(&mut writer, &annotations, &mut tracker).unwrap();
//! annotation_writer.write_all(&mut writer, &annotations, &mut tracker).unwrap();
//! writer.end_object().unwrap();
//!
//! assert_eq!(String::from_utf8(out).unwrap(), r#"{"Display.label":"Hi"}"#);
//! ```

use crate::value_writer::ValueWriter;
use crate::{Error, InstanceAnnotation, JsonWriter, ODataValue, Result};
use std::collections::HashSet;
use std::io::Write;

/// Names already written for one annotatable target.
#[derive(Clone, Debug, Default)]
pub struct InstanceAnnotationWriteTracker {
    written: HashSet<String>,
}

impl InstanceAnnotationWriteTracker {
    /// Creates a tracker with no names written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `name` was already written for this target.
    #[must_use]
    pub fn is_written(&self, name: &str) -> bool {
        self.written.contains(name)
    }

    /// Records `name` as written.
    pub fn mark_written(&mut self, name: &str) {
        self.written.insert(name.to_string());
    }

    /// Number of names marked so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.written.len()
    }

    /// Returns `true` if no name has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

/// Writes instance annotation collections into the current object.
pub struct InstanceAnnotationWriter<'a, 'v> {
    values: &'v ValueWriter<'a>,
}

impl<'a, 'v> InstanceAnnotationWriter<'a, 'v> {
    /// Creates an annotation writer that writes values through `values`.
    pub fn new(values: &'v ValueWriter<'a>) -> Self {
        InstanceAnnotationWriter { values }
    }

    /// Writes every annotation of `annotations` that `tracker` has not seen
    /// and the annotation filter accepts.
    ///
    /// # Errors
    ///
    /// Fails before anything is written if a name occurs twice in
    /// `annotations`. Otherwise fails on the first annotation whose value does
    /// not fit its declared term type.
    pub fn write_all<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        annotations: &[InstanceAnnotation],
        tracker: &mut InstanceAnnotationWriteTracker,
    ) -> Result<()> {
        let mut names = HashSet::with_capacity(annotations.len());
        for annotation in annotations {
            if !names.insert(annotation.name()) {
                return Err(Error::duplicate_annotation(annotation.name()));
            }
        }

        let options = self.values.options();
        for annotation in annotations {
            let name = annotation.name();
            if tracker.is_written(name) {
                tracing::trace!(name, "instance annotation already written");
                continue;
            }
            if options.should_skip_annotation(name) {
                tracing::trace!(name, "instance annotation excluded by filter");
                continue;
            }
            self.write_one(writer, annotation)?;
            tracker.mark_written(name);
        }
        Ok(())
    }

    fn write_one<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        annotation: &InstanceAnnotation,
    ) -> Result<()> {
        let name = annotation.name();
        let value = annotation.value();
        let expected = self.values.model().term_type(name);

        match value {
            ODataValue::Null => {
                if let Some(term) = expected.as_ref().filter(|t| !t.nullable) {
                    return Err(Error::null_value_not_allowed(name, &term.name));
                }
                writer.write_name(name)?;
                writer.write_null()
            }
            ODataValue::Stream(_) => Err(Error::StreamValueInAnnotation(name.to_string())),
            _ => self
                .values
                .write_property(writer, name, value, expected.as_ref(), 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::{InMemoryModel, Model, PrimitiveKind, TypeRef};
    use crate::oracle::LightTypeNameOracle;
    use crate::{AnnotationFilter, ComplexValue, WriterOptions};

    fn annotation(name: &str, value: impl Into<ODataValue>) -> InstanceAnnotation {
        InstanceAnnotation::new(name, value).unwrap()
    }

    fn write(
        options: &WriterOptions,
        model: &dyn Model,
        passes: &[&[InstanceAnnotation]],
    ) -> Result<String> {
        let values = ValueWriter::new(options, model, &LightTypeNameOracle);
        let annotations = InstanceAnnotationWriter::new(&values);
        let mut tracker = InstanceAnnotationWriteTracker::new();
        let mut out = Vec::new();
        {
            let mut writer = JsonWriter::new(&mut out, options);
            writer.start_object()?;
            for pass in passes {
                annotations.write_all(&mut writer, pass, &mut tracker)?;
            }
            writer.end_object()?;
        }
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_duplicate_in_collection_writes_nothing() {
        let options = WriterOptions::new();
        let model = InMemoryModel::new();
        let values = ValueWriter::new(&options, &model, &LightTypeNameOracle);
        let list = vec![annotation("NS.a", 1), annotation("NS.b", 2), annotation("NS.a", 3)];
        let mut tracker = InstanceAnnotationWriteTracker::new();
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out, &options);
        writer.start_object().unwrap();
        let result =
            InstanceAnnotationWriter::new(&values).write_all(&mut writer, &list, &mut tracker);
        drop(writer);
        assert_eq!(result, Err(Error::DuplicateAnnotationNameInCollection("NS.a".into())));
        assert_eq!(out, b"{");
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_tracker_skips_across_passes() {
        let first = vec![annotation("NS.a", 1)];
        let second = vec![annotation("NS.a", 2), annotation("NS.b", 3)];
        let passes = [first.as_slice(), second.as_slice()];
        let json = write(&WriterOptions::new(), &InMemoryModel::new(), &passes).unwrap();
        assert_eq!(json, r#"{"NS.a":1,"NS.b":3}"#);
    }

    #[test]
    fn test_filter_skips_without_marking() {
        let options =
            WriterOptions::new().with_annotation_filter(AnnotationFilter::parse("*,-Audit.*"));
        let list = vec![annotation("Audit.user", "bob"), annotation("Display.label", "x")];
        let model = InMemoryModel::new();
        let values = ValueWriter::new(&options, &model, &LightTypeNameOracle);
        let mut tracker = InstanceAnnotationWriteTracker::new();
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out, &options);
        writer.start_object().unwrap();
        InstanceAnnotationWriter::new(&values)
            .write_all(&mut writer, &list, &mut tracker)
            .unwrap();
        writer.end_object().unwrap();
        drop(writer);
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"Display.label":"x"}"#);
        assert!(!tracker.is_written("Audit.user"));
        assert!(tracker.is_written("Display.label"));
    }

    #[test]
    fn test_null_for_non_nullable_term() {
        let model = InMemoryModel::new()
            .with_term("NS.required", TypeRef::primitive(PrimitiveKind::Int32, false));
        let list = vec![annotation("NS.required", ODataValue::Null)];
        let result = write(&WriterOptions::new(), &model, &[list.as_slice()]);
        assert!(matches!(result, Err(Error::NullValueNotAllowed { .. })));

        let list = vec![annotation("NS.optional", ODataValue::Null)];
        let json = write(&WriterOptions::new(), &model, &[list.as_slice()]).unwrap();
        assert_eq!(json, r#"{"NS.optional":null}"#);
    }

    #[test]
    fn test_type_names() {
        let model = InMemoryModel::new()
            .with_term("NS.count", TypeRef::primitive(PrimitiveKind::Int64, true))
            .with_term("NS.address", TypeRef::complex("NS.Address", true))
            .with_base_type("NS.Home", "NS.Address");
        let list = vec![
            annotation("NS.count", 7i64),
            annotation("NS.open", 7i64),
            annotation("NS.address", ComplexValue::new("NS.Home").with_property("City", "Oslo")),
        ];
        let json = write(&WriterOptions::new(), &model, &[list.as_slice()]).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"NS.count":"7","NS.open@odata.type":"Edm.Int64","NS.open":"7","#,
                r#""NS.address":{"odata.type":"NS.Home","City":"Oslo"}}"#
            )
        );
    }

    #[test]
    fn test_open_nan_gets_type_name() {
        let list = vec![annotation("NS.ratio", f64::NAN), annotation("NS.scale", 0.5f64)];
        let json = write(&WriterOptions::new(), &InMemoryModel::new(), &[list.as_slice()]).unwrap();
        assert_eq!(
            json,
            r#"{"NS.ratio@odata.type":"Edm.Double","NS.ratio":"NaN","NS.scale":0.5}"#
        );
    }

    #[test]
    fn test_incompatible_term_type() {
        let model = InMemoryModel::new()
            .with_term("NS.flag", TypeRef::primitive(PrimitiveKind::Boolean, true));
        let list = vec![annotation("NS.flag", "yes")];
        let result = write(&WriterOptions::new(), &model, &[list.as_slice()]);
        assert!(matches!(result, Err(Error::IncompatibleType { .. })));
    }
}
