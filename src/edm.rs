//! The slice of the entity data model the writers consult.
//!
//! The full type system lives outside this crate; writers only need to know
//! the declared type of an annotation term, whether one type derives from
//! another, and which navigation properties an entity type declares. The
//! [`Model`] trait captures that, and [`InMemoryModel`] is a small map-backed
//! implementation.

use indexmap::IndexMap;
use std::collections::HashMap;

/// The primitive types of the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Guid,
    Binary,
    String,
    DateTime,
    DateTimeOffset,
    Time,
}

impl PrimitiveKind {
    /// Qualified `Edm.*` name of the type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Edm.Boolean",
            PrimitiveKind::Byte => "Edm.Byte",
            PrimitiveKind::SByte => "Edm.SByte",
            PrimitiveKind::Int16 => "Edm.Int16",
            PrimitiveKind::Int32 => "Edm.Int32",
            PrimitiveKind::Int64 => "Edm.Int64",
            PrimitiveKind::Single => "Edm.Single",
            PrimitiveKind::Double => "Edm.Double",
            PrimitiveKind::Decimal => "Edm.Decimal",
            PrimitiveKind::Guid => "Edm.Guid",
            PrimitiveKind::Binary => "Edm.Binary",
            PrimitiveKind::String => "Edm.String",
            PrimitiveKind::DateTime => "Edm.DateTime",
            PrimitiveKind::DateTimeOffset => "Edm.DateTimeOffset",
            PrimitiveKind::Time => "Edm.Time",
        }
    }

    /// Looks a primitive type up by its qualified `Edm.*` name.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "Edm.Boolean" => PrimitiveKind::Boolean,
            "Edm.Byte" => PrimitiveKind::Byte,
            "Edm.SByte" => PrimitiveKind::SByte,
            "Edm.Int16" => PrimitiveKind::Int16,
            "Edm.Int32" => PrimitiveKind::Int32,
            "Edm.Int64" => PrimitiveKind::Int64,
            "Edm.Single" => PrimitiveKind::Single,
            "Edm.Double" => PrimitiveKind::Double,
            "Edm.Decimal" => PrimitiveKind::Decimal,
            "Edm.Guid" => PrimitiveKind::Guid,
            "Edm.Binary" => PrimitiveKind::Binary,
            "Edm.String" => PrimitiveKind::String,
            "Edm.DateTime" => PrimitiveKind::DateTime,
            "Edm.DateTimeOffset" => PrimitiveKind::DateTimeOffset,
            "Edm.Time" => PrimitiveKind::Time,
            _ => return None,
        };
        Some(kind)
    }

    /// Types whose finite values JSON represents without a type hint.
    ///
    /// A non-finite `Double` is written as a string and still needs one; see
    /// [`PrimitiveValue::is_json_native`](crate::PrimitiveValue::is_json_native).
    #[must_use]
    pub const fn is_json_native(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Boolean
                | PrimitiveKind::Int32
                | PrimitiveKind::String
                | PrimitiveKind::Double
        )
    }
}

/// Which family a declared type belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Complex,
    Collection,
    Entity,
}

/// A reference to a declared type, with its nullability.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
    pub nullable: bool,
}

impl TypeRef {
    /// A reference to a primitive type.
    #[must_use]
    pub fn primitive(kind: PrimitiveKind, nullable: bool) -> Self {
        TypeRef {
            name: kind.type_name().to_string(),
            kind: TypeKind::Primitive(kind),
            nullable,
        }
    }

    /// A reference to a named complex type.
    #[must_use]
    pub fn complex(name: impl Into<String>, nullable: bool) -> Self {
        TypeRef {
            name: name.into(),
            kind: TypeKind::Complex,
            nullable,
        }
    }

    /// A collection type, named `Collection(<element>)`.
    #[must_use]
    pub fn collection(element: &str, nullable: bool) -> Self {
        TypeRef {
            name: format!("Collection({})", element),
            kind: TypeKind::Collection,
            nullable,
        }
    }
}

/// Lookups the writers need from the entity data model.
pub trait Model {
    /// Declared type of the value term `name`, if the model knows the term.
    fn term_type(&self, name: &str) -> Option<TypeRef>;

    /// Returns `true` if `derived` is `base` or inherits from it.
    fn is_derived_from(&self, derived: &str, base: &str) -> bool;
}

/// A model that knows no terms and no inheritance.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyModel;

impl Model for EmptyModel {
    fn term_type(&self, _name: &str) -> Option<TypeRef> {
        None
    }

    fn is_derived_from(&self, derived: &str, base: &str) -> bool {
        derived == base
    }
}

/// A [`Model`] backed by in-memory maps.
///
/// # Examples
///
/// ```rust
/// use odata_json::edm::{InMemoryModel, Model, PrimitiveKind, TypeRef};
///
/// let model = InMemoryModel::new()
///     .with_term("Display.order", TypeRef::primitive(PrimitiveKind::Int32, false))
///     .with_base_type("NS.HomeAddress", "NS.Address");
///
/// assert!(model.term_type("Display.order").is_some());
/// assert!(model.is_derived_from("NS.HomeAddress", "NS.Address"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryModel {
    terms: IndexMap<String, TypeRef>,
    base_types: HashMap<String, String>,
}

impl InMemoryModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the type of an annotation term.
    #[must_use]
    pub fn with_term(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.terms.insert(name.into(), type_ref);
        self
    }

    /// Declares that `derived` derives directly from `base`.
    #[must_use]
    pub fn with_base_type(mut self, derived: impl Into<String>, base: impl Into<String>) -> Self {
        self.base_types.insert(derived.into(), base.into());
        self
    }
}

impl Model for InMemoryModel {
    fn term_type(&self, name: &str) -> Option<TypeRef> {
        self.terms.get(name).cloned()
    }

    fn is_derived_from(&self, derived: &str, base: &str) -> bool {
        let mut current = derived;
        // at most one step per declared base type, even if the map has a cycle
        for _ in 0..=self.base_types.len() {
            if current == base {
                return true;
            }
            match self.base_types.get(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

/// How an entity type declares a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Structural,
    Navigation,
}

/// An entity type: its name, openness and declared properties.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EntityType {
    pub name: String,
    pub is_open: bool,
    pub properties: IndexMap<String, PropertyKind>,
}

impl EntityType {
    /// Creates a closed entity type with no properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        EntityType {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Marks the type as open, so undeclared properties are allowed.
    #[must_use]
    pub fn open(mut self) -> Self {
        self.is_open = true;
        self
    }

    /// Declares a structural property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.insert(name.into(), PropertyKind::Structural);
        self
    }

    /// Declares a navigation property.
    #[must_use]
    pub fn with_navigation(mut self, name: impl Into<String>) -> Self {
        self.properties.insert(name.into(), PropertyKind::Navigation);
        self
    }

    /// How `name` is declared, or `None` if it is not.
    #[must_use]
    pub fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        self.properties.get(name).copied()
    }
}
