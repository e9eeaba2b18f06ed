//! Verbose entries and feeds.
//!
//! A response document wraps its payload in `{"d": ...}`. An entry is an
//! object whose first member is its `__metadata` block, followed by its
//! properties. A feed is `{"__count": "...", "results": [...], "__next": "..."}`
//! from V2 on, and a bare array of entries in V1.

use crate::checker::{DuplicateNameChecker, DuplicatePropertyNamesChecker};
use crate::edm::EntityType;
use crate::metadata::{EntityMetadata, EntityMetadataSerializer, Projection};
use crate::uri::to_uri_string;
use crate::value_writer::{ValueWriter, VERBOSE_RESULTS};
use crate::{Error, JsonWriter, ODataValue, ODataVersion, PropertyMap, Result};
use std::io::Write;

/// Member wrapping the payload of a verbose response.
pub const VERBOSE_DATA_WRAPPER: &str = "d";

/// An entity instance: its metadata and its property values.
///
/// # Examples
///
/// ```rust
/// use odata_json::entry::Entry;
///
/// let entry = Entry::new("NS.Customer")
///     .with_id("http://host/svc/Customers(1)")
///     .with_property("Name", "Alice");
/// assert_eq!(entry.properties.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Entry {
    pub metadata: EntityMetadata,
    pub properties: PropertyMap,
}

impl Entry {
    /// Creates an entry of the given entity type with no properties.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Entry {
            metadata: EntityMetadata {
                type_name: Some(type_name.into()),
                ..Default::default()
            },
            properties: PropertyMap::new(),
        }
    }

    /// Sets the entry's id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.id = Some(id.into());
        self
    }

    /// Sets the edit link, written as `__metadata.uri`.
    #[must_use]
    pub fn with_edit_link(mut self, link: impl Into<String>) -> Self {
        self.metadata.edit_link = Some(link.into());
        self
    }

    /// Sets the entity tag.
    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.metadata.etag = Some(etag.into());
        self
    }

    /// Appends a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<ODataValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A set of entries, optionally with an inline count and a next-page link.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Feed {
    pub count: Option<i64>,
    pub next_link: Option<String>,
    pub entries: Vec<Entry>,
}

impl Feed {
    /// Creates a feed of `entries` with no count or next link.
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Feed {
            entries,
            ..Default::default()
        }
    }

    /// Sets the inline count, written as `__count`.
    #[must_use]
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the next page link, written as `__next`.
    #[must_use]
    pub fn with_next_link(mut self, link: impl Into<String>) -> Self {
        self.next_link = Some(link.into());
        self
    }
}

/// Writes verbose entry and feed documents.
pub struct EntryWriter<'a, 'v> {
    values: &'v ValueWriter<'a>,
    metadata: EntityMetadataSerializer<'a>,
}

impl<'a, 'v> EntryWriter<'a, 'v> {
    /// Creates an entry writer that writes values through `values`.
    pub fn new(values: &'v ValueWriter<'a>) -> Self {
        EntryWriter {
            values,
            metadata: EntityMetadataSerializer::new(values.options()),
        }
    }

    /// Writes `entry` as a complete document.
    pub fn write_entry_document<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        entry: &Entry,
        projection: &Projection,
        entity_type: Option<&EntityType>,
    ) -> Result<()> {
        self.ensure_verbose()?;
        self.in_data_wrapper(writer, |this, writer| {
            this.write_entry(writer, entry, projection, entity_type)
        })
    }

    /// Writes `feed` as a complete document.
    pub fn write_feed_document<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        feed: &Feed,
        projection: &Projection,
        entity_type: Option<&EntityType>,
    ) -> Result<()> {
        self.ensure_verbose()?;
        self.in_data_wrapper(writer, |this, writer| {
            this.write_feed(writer, feed, projection, entity_type)
        })
    }

    /// Writes one entry object.
    ///
    /// Property names share one duplicate checker with the entry's
    /// association links. Properties outside `projection` are left out.
    pub fn write_entry<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        entry: &Entry,
        projection: &Projection,
        entity_type: Option<&EntityType>,
    ) -> Result<()> {
        let mut checker = DuplicatePropertyNamesChecker::new();
        writer.start_object()?;
        self.metadata.write_entity_metadata(
            writer,
            &entry.metadata,
            projection,
            entity_type,
            &mut checker,
        )?;
        for (name, value) in &entry.properties {
            checker.check(name)?;
            if projection.should_skip(name) {
                continue;
            }
            self.values.write_property(writer, name, value, None, 0)?;
        }
        writer.end_object()
    }

    /// Writes a feed: a bare array in V1, an object with `results` otherwise.
    pub fn write_feed<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        feed: &Feed,
        projection: &Projection,
        entity_type: Option<&EntityType>,
    ) -> Result<()> {
        let options = self.values.options();
        let wrapped = options.version >= ODataVersion::V2;

        if wrapped {
            writer.start_object()?;
            if let Some(count) = feed.count {
                writer.write_name("__count")?;
                writer.write_str(&count.to_string())?;
            }
            writer.write_name(VERBOSE_RESULTS)?;
        }

        writer.start_array()?;
        for entry in &feed.entries {
            self.write_entry(writer, entry, projection, entity_type)?;
        }
        writer.end_array()?;

        if wrapped {
            if let Some(next) = &feed.next_link {
                writer.write_name("__next")?;
                writer.write_str(&to_uri_string(options, next, true)?)?;
            }
            writer.end_object()?;
        }
        Ok(())
    }

    fn in_data_wrapper<W, F>(&self, writer: &mut JsonWriter<W>, body: F) -> Result<()>
    where
        W: Write,
        F: FnOnce(&Self, &mut JsonWriter<W>) -> Result<()>,
    {
        if !self.values.options().writing_response {
            return body(self, writer);
        }
        writer.start_object()?;
        writer.write_name(VERBOSE_DATA_WRAPPER)?;
        body(self, writer)?;
        writer.end_object()
    }

    fn ensure_verbose(&self) -> Result<()> {
        if self.values.options().dialect.is_light() {
            return Err(Error::unsupported_type(
                "entry and feed payloads in the light dialect",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::EmptyModel;
    use crate::oracle::LightTypeNameOracle;
    use crate::{Dialect, WriterOptions};
    use url::Url;

    fn options() -> WriterOptions {
        WriterOptions::new()
            .with_dialect(Dialect::Verbose)
            .with_base_uri(Url::parse("http://host/svc/").unwrap())
    }

    fn customer(id: i32) -> Entry {
        Entry::new("NS.Customer")
            .with_edit_link(format!("Customers({})", id))
            .with_property("ID", id)
            .with_property("Name", format!("c{}", id))
    }

    fn render_feed(options: &WriterOptions, feed: &Feed) -> Result<String> {
        let values = ValueWriter::new(options, &EmptyModel, &LightTypeNameOracle);
        let mut out = Vec::new();
        {
            let mut writer = JsonWriter::new(&mut out, options);
            EntryWriter::new(&values).write_feed_document(&mut writer, feed, &Projection::All, None)?;
        }
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_entry_document() {
        let options = options();
        let values = ValueWriter::new(&options, &EmptyModel, &LightTypeNameOracle);
        let mut out = Vec::new();
        {
            let mut writer = JsonWriter::new(&mut out, &options);
            EntryWriter::new(&values)
                .write_entry_document(&mut writer, &customer(1), &Projection::select(["Name"]), None)
                .unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                r#"{"d":{"__metadata":{"uri":"http://host/svc/Customers(1)","type":"NS.Customer"},"#,
                r#""Name":"c1"}}"#
            )
        );
    }

    #[test]
    fn test_feed_v3_and_v1() {
        let feed = Feed::new(vec![customer(1), customer(2)])
            .with_count(2)
            .with_next_link("Customers?$skiptoken=2");
        let json = render_feed(&options(), &feed).unwrap();
        assert!(json.starts_with(r#"{"d":{"__count":"2","results":[{"__metadata""#));
        assert!(json.ends_with(r#"],"__next":"http://host/svc/Customers?$skiptoken=2"}}"#));

        let json = render_feed(&options().with_version(ODataVersion::V1), &feed).unwrap();
        assert!(json.starts_with(r#"{"d":[{"__metadata""#));
        assert!(!json.contains("__count"));
        assert!(!json.contains("__next"));
    }

    #[test]
    fn test_request_has_no_wrapper() {
        let feed = Feed::new(vec![customer(1)]);
        let json = render_feed(&options().for_request(), &feed).unwrap();
        assert!(json.starts_with(r#"{"results":["#));
    }

    #[test]
    fn test_duplicate_property_and_link() {
        let mut entry = customer(1);
        entry.metadata.association_links =
            vec![crate::metadata::AssociationLink::new("Name", "Customers(1)/$links/Name")];
        let result = render_feed(&options(), &Feed::new(vec![entry]));
        assert_eq!(result, Err(Error::DuplicatePropertyName("Name".into())));
    }

    #[test]
    fn test_light_dialect_rejected() {
        let result = render_feed(&WriterOptions::new(), &Feed::default());
        assert!(matches!(result, Err(Error::UnsupportedType(_))));
    }
}
