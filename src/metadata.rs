//! The verbose `__metadata` block of an entity.
//!
//! [`EntityMetadataSerializer`] writes an entity's identity, links, etag, type
//! name, media resource, bound operations and association links in a fixed
//! member order:
//!
//! ```text
//! "__metadata": {
//!     "id", "uri", "etag", "type",
//!     "edit_media", "media_src", "content_type", "media_etag",
//!     "actions": { "<metadata uri>": [ { "title", "target" }, ... ] },
//!     "functions": { ... },
//!     "properties": { "<link>": { "associationuri": "..." } }
//! }
//! ```
//!
//! Members whose source field is absent are left out, and the `actions`,
//! `functions` and `properties` wrappers are only opened once something
//! survives validation and projection.

use crate::checker::DuplicateNameChecker;
use crate::edm::{EntityType, PropertyKind};
use crate::uri::to_uri_string;
use crate::value_writer::VERBOSE_METADATA;
use crate::{Error, JsonWriter, ODataVersion, Result, StreamReference, WriterOptions};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::io::Write;

/// Which properties and links of an entity the caller selected.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Projection {
    /// Everything is selected.
    #[default]
    All,
    /// Only the named properties and links are selected.
    Only(HashSet<String>),
}

impl Projection {
    /// A projection selecting exactly `names`.
    pub fn select<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Only(names.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if `name` is outside the projection.
    #[must_use]
    pub fn should_skip(&self, name: &str) -> bool {
        match self {
            Projection::All => false,
            Projection::Only(names) => !names.contains(name),
        }
    }
}

/// A bound action or function advertised by an entity.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Operation {
    /// The metadata URI identifying the operation; operations sharing it are grouped.
    pub metadata: Option<String>,
    pub title: Option<String>,
    /// The URI to invoke the operation on this entity.
    pub target: Option<String>,
}

impl Operation {
    /// Creates an operation from its metadata URI and target URI.
    #[must_use]
    pub fn new(metadata: impl Into<String>, target: impl Into<String>) -> Self {
        Operation {
            metadata: Some(metadata.into()),
            title: None,
            target: Some(target.into()),
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A link to the entities related through a navigation property.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AssociationLink {
    pub name: String,
    pub url: Option<String>,
}

impl AssociationLink {
    /// Creates a link named `name` pointing at `url`.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        AssociationLink {
            name: name.into(),
            url: Some(url.into()),
        }
    }
}

/// Overrides the type name written for an entity.
///
/// A `None` type name suppresses the `type` member altogether.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SerializationTypeName {
    pub type_name: Option<String>,
}

/// Everything about an entity that is not property data.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EntityMetadata {
    pub id: Option<String>,
    pub edit_link: Option<String>,
    pub read_link: Option<String>,
    pub etag: Option<String>,
    pub type_name: Option<String>,
    pub type_annotation: Option<SerializationTypeName>,
    pub media_resource: Option<StreamReference>,
    pub actions: Vec<Operation>,
    pub functions: Vec<Operation>,
    pub association_links: Vec<AssociationLink>,
}

impl EntityMetadata {
    /// Creates metadata with every field unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The type name to write, honoring a serialization-time override.
    #[must_use]
    pub fn effective_type_name(&self) -> Option<&str> {
        match &self.type_annotation {
            Some(annotation) => annotation.type_name.as_deref(),
            None => self.type_name.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum OperationKind {
    Action,
    Function,
}

impl OperationKind {
    const fn member(self) -> &'static str {
        match self {
            OperationKind::Action => "actions",
            OperationKind::Function => "functions",
        }
    }

    const fn noun(self) -> &'static str {
        match self {
            OperationKind::Action => "action",
            OperationKind::Function => "function",
        }
    }
}

/// Writes the `__metadata` member of a verbose entity.
pub struct EntityMetadataSerializer<'a> {
    options: &'a WriterOptions,
}

impl<'a> EntityMetadataSerializer<'a> {
    /// Creates a serializer for documents written with `options`.
    pub fn new(options: &'a WriterOptions) -> Self {
        EntityMetadataSerializer { options }
    }

    /// Writes `"__metadata": {...}` into the current entity object.
    ///
    /// `entity_type`, when given, is used to check that every association
    /// link names a navigation property. Link names are recorded in
    /// `checker` whether or not `projection` selects them.
    ///
    /// # Errors
    ///
    /// Fails on invalid media resources, operations without a metadata or
    /// target URI, operations in request payloads, association links without
    /// a name or target, duplicate link names, links that are not navigation
    /// properties of `entity_type`, and relative URIs with no base URI.
    pub fn write_entity_metadata<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        entity: &EntityMetadata,
        projection: &Projection,
        entity_type: Option<&EntityType>,
        checker: &mut dyn DuplicateNameChecker,
    ) -> Result<()> {
        writer.write_name(VERBOSE_METADATA)?;
        writer.start_object()?;

        if let Some(id) = &entity.id {
            writer.write_name("id")?;
            writer.write_str(id)?;
        }
        if let Some(link) = entity.edit_link.as_ref().or(entity.read_link.as_ref()) {
            writer.write_name("uri")?;
            writer.write_str(&to_uri_string(self.options, link, true)?)?;
        }
        if let Some(etag) = &entity.etag {
            writer.write_name("etag")?;
            writer.write_str(etag)?;
        }
        if let Some(type_name) = entity.effective_type_name() {
            writer.write_name("type")?;
            writer.write_str(type_name)?;
        }
        if let Some(media) = &entity.media_resource {
            self.write_media_resource(writer, media)?;
        }

        self.write_operations(writer, OperationKind::Action, &entity.actions)?;
        self.write_operations(writer, OperationKind::Function, &entity.functions)?;
        self.write_association_links(
            writer,
            &entity.association_links,
            projection,
            entity_type,
            checker,
        )?;

        writer.end_object()
    }

    fn write_media_resource<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        media: &StreamReference,
    ) -> Result<()> {
        self.validate_media_resource(media)?;

        if let Some(edit_link) = &media.edit_link {
            writer.write_name("edit_media")?;
            writer.write_str(&to_uri_string(self.options, edit_link, true)?)?;
        }
        if let Some(read_link) = &media.read_link {
            writer.write_name("media_src")?;
            writer.write_str(&to_uri_string(self.options, read_link, true)?)?;
        }
        if let Some(content_type) = &media.content_type {
            writer.write_name("content_type")?;
            writer.write_str(content_type)?;
        }
        if let Some(etag) = &media.etag {
            writer.write_name("media_etag")?;
            writer.write_str(etag)?;
        }
        Ok(())
    }

    fn validate_media_resource(&self, media: &StreamReference) -> Result<()> {
        if media.content_type.as_deref() == Some("") {
            return Err(Error::invalid_stream_reference(
                "the content type of a media resource must not be empty",
            ));
        }
        if media.read_link.is_some() != media.content_type.is_some() {
            return Err(Error::invalid_stream_reference(
                "a media resource needs both a read link and a content type, or neither",
            ));
        }
        if media.etag.is_some() && media.edit_link.is_none() {
            return Err(Error::invalid_stream_reference(
                "a media resource with an etag must have an edit link",
            ));
        }
        if !self.options.writing_response
            && self.options.version >= ODataVersion::V3
            && media.edit_link.is_some()
        {
            return Err(Error::invalid_stream_reference(
                "a media resource in a request payload must not have an edit link",
            ));
        }
        Ok(())
    }

    fn write_operations<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        kind: OperationKind,
        operations: &[Operation],
    ) -> Result<()> {
        if operations.is_empty() {
            return Ok(());
        }
        if !self.options.writing_response {
            return Err(Error::OperationInRequest { kind: kind.noun() });
        }

        let mut validated = Vec::with_capacity(operations.len());
        for operation in operations {
            let metadata = operation
                .metadata
                .as_deref()
                .ok_or(Error::OperationMetadataMissing { kind: kind.noun() })?;
            let target =
                operation
                    .target
                    .as_deref()
                    .ok_or_else(|| Error::OperationTargetMissing {
                        kind: kind.noun(),
                        metadata: metadata.to_string(),
                    })?;
            validated.push((metadata, operation.title.as_deref(), target));
        }

        let mut groups: IndexMap<String, Vec<(Option<&str>, &str)>> = IndexMap::new();
        for (metadata, title, target) in validated {
            let relation = to_uri_string(self.options, metadata, false)?;
            groups.entry(relation).or_default().push((title, target));
        }
        tracing::debug!(kind = kind.member(), groups = groups.len(), "writing operation groups");

        writer.write_name(kind.member())?;
        writer.start_object()?;
        for (relation, members) in &groups {
            writer.write_name(relation)?;
            writer.start_array()?;
            for (title, target) in members {
                writer.start_object()?;
                if let Some(title) = title {
                    writer.write_name("title")?;
                    writer.write_str(title)?;
                }
                writer.write_name("target")?;
                writer.write_str(&to_uri_string(self.options, target, true)?)?;
                writer.end_object()?;
            }
            writer.end_array()?;
        }
        writer.end_object()
    }

    fn write_association_links<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        links: &[AssociationLink],
        projection: &Projection,
        entity_type: Option<&EntityType>,
        checker: &mut dyn DuplicateNameChecker,
    ) -> Result<()> {
        for link in links {
            if link.name.is_empty() {
                return Err(Error::AssociationLinkNameEmpty);
            }
            if link.url.is_none() {
                return Err(Error::AssociationLinkTargetMissing(link.name.clone()));
            }
        }

        let mut opened = false;
        for link in links {
            checker.check(&link.name)?;
            if projection.should_skip(&link.name) {
                tracing::trace!(name = %link.name, "association link not projected");
                continue;
            }
            if let Some(entity_type) = entity_type {
                validate_navigation(entity_type, &link.name)?;
            }
            let url = match &link.url {
                Some(url) => to_uri_string(self.options, url, true)?,
                None => return Err(Error::AssociationLinkTargetMissing(link.name.clone())),
            };

            if !opened {
                writer.write_name("properties")?;
                writer.start_object()?;
                opened = true;
            }
            writer.write_name(&link.name)?;
            writer.start_object()?;
            writer.write_name("associationuri")?;
            writer.write_str(&url)?;
            writer.end_object()?;
        }
        if opened {
            writer.end_object()?;
        }
        Ok(())
    }
}

fn validate_navigation(entity_type: &EntityType, name: &str) -> Result<()> {
    match entity_type.property_kind(name) {
        Some(PropertyKind::Navigation) => Ok(()),
        Some(PropertyKind::Structural) => Err(Error::NotNavigationProperty {
            property: name.to_string(),
            type_name: entity_type.name.clone(),
        }),
        None if entity_type.is_open => Ok(()),
        None => Err(Error::PropertyNotDefined {
            property: name.to_string(),
            type_name: entity_type.name.clone(),
        }),
    }
}
