//! Serialization of null, primitive, complex and collection values.
//!
//! [`ValueWriter`] is shared by the instance annotation writer and the entry
//! writer. It consults the [`TypeNameOracle`] to decide when a type name has
//! to be written and renders it the way the configured [`Dialect`] expects:
//!
//! | Value | Light | Verbose |
//! |-------|-------|---------|
//! | complex | `{"odata.type":"NS.T",...}` | `{"__metadata":{"type":"NS.T"},...}` |
//! | collection | `[...]` | `{"__metadata":{"type":"Collection(T)"},"results":[...]}` |
//! | primitive property | `"p@odata.type":"Edm.Int64","p":"1"` | `"p":"1"` |

use crate::edm::{Model, PrimitiveKind, TypeRef};
use crate::oracle::TypeNameOracle;
use crate::{
    CollectionValue, Dialect, Error, JsonWriter, ODataValue, PrimitiveValue, Result,
    WriterOptions,
};
use std::io::Write;

/// Member carrying a value's type name in the light dialect.
pub const ODATA_TYPE: &str = "odata.type";
/// Suffix of a property annotation carrying a sibling property's type name.
pub const ODATA_TYPE_SUFFIX: &str = "@odata.type";
/// Verbose dialect metadata member.
pub const VERBOSE_METADATA: &str = "__metadata";
/// Verbose dialect member holding collection items and feed entries.
pub const VERBOSE_RESULTS: &str = "results";

/// Writes values for one document.
pub struct ValueWriter<'a> {
    options: &'a WriterOptions,
    model: &'a dyn Model,
    oracle: &'a dyn TypeNameOracle,
}

impl<'a> ValueWriter<'a> {
    /// Creates a value writer over one model and type name oracle.
    pub fn new(
        options: &'a WriterOptions,
        model: &'a dyn Model,
        oracle: &'a dyn TypeNameOracle,
    ) -> Self {
        ValueWriter {
            options,
            model,
            oracle,
        }
    }

    /// Options of the document being written.
    #[must_use]
    pub fn options(&self) -> &'a WriterOptions {
        self.options
    }

    /// Model declared types are resolved in.
    #[must_use]
    pub fn model(&self) -> &'a dyn Model {
        self.model
    }

    /// Oracle deciding which type names are written.
    #[must_use]
    pub fn oracle(&self) -> &'a dyn TypeNameOracle {
        self.oracle
    }

    /// Writes a named property: an optional type annotation, the name, then the value.
    ///
    /// `expected` is the declared type of the property; `None` treats it as open.
    pub fn write_property<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        name: &str,
        value: &ODataValue,
        expected: Option<&TypeRef>,
        depth: usize,
    ) -> Result<()> {
        let treat_as_open = expected.is_none();
        match value {
            ODataValue::Null => {
                writer.write_name(name)?;
                writer.write_null()
            }
            ODataValue::Complex(_) => {
                writer.write_name(name)?;
                self.write_complex(writer, value, expected, treat_as_open, depth)
            }
            ODataValue::Collection(_) | ODataValue::Primitive(_) => {
                let resolved =
                    self.oracle
                        .resolve_and_validate(self.model, expected, value, treat_as_open)?;
                if self.options.dialect.is_light() {
                    let type_name = self.oracle.type_name_to_write(
                        value,
                        expected,
                        resolved.as_ref(),
                        treat_as_open,
                    );
                    if let Some(type_name) = type_name {
                        writer.write_name(&format!("{}{}", name, ODATA_TYPE_SUFFIX))?;
                        writer.write_str(&type_name)?;
                    }
                }
                writer.write_name(name)?;
                match value {
                    ODataValue::Primitive(p) => self.write_primitive(writer, p),
                    ODataValue::Collection(c) => {
                        self.write_collection(writer, c, resolved.as_ref(), depth)
                    }
                    _ => unreachable!("matched above"),
                }
            }
            ODataValue::Stream(_) => Err(Error::unsupported_type(&format!(
                "stream value for property '{}'",
                name
            ))),
        }
    }

    /// Writes a primitive value; primitives never carry an inline type name.
    pub fn write_primitive<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        value: &PrimitiveValue,
    ) -> Result<()> {
        writer.write_primitive(value)
    }

    /// Writes a complex value as an object.
    ///
    /// The type name, when the oracle asks for one, is the first member.
    pub fn write_complex<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        value: &ODataValue,
        expected: Option<&TypeRef>,
        treat_as_open: bool,
        depth: usize,
    ) -> Result<()> {
        let ODataValue::Complex(complex) = value else {
            return Err(Error::incompatible_type("complex", value.kind_name()));
        };
        let depth = self.enter(depth)?;
        let resolved =
            self.oracle
                .resolve_and_validate(self.model, expected, value, treat_as_open)?;
        let type_name =
            self.oracle
                .type_name_to_write(value, expected, resolved.as_ref(), treat_as_open);

        writer.start_object()?;
        if let Some(type_name) = type_name {
            self.write_type_member(writer, &type_name)?;
        }
        for (name, property) in &complex.properties {
            self.write_property(writer, name, property, None, depth)?;
        }
        writer.end_object()
    }

    /// Writes a collection value.
    ///
    /// `resolved` is the collection's resolved type; its element type applies
    /// to every item.
    pub fn write_collection<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        value: &CollectionValue,
        resolved: Option<&TypeRef>,
        depth: usize,
    ) -> Result<()> {
        let depth = self.enter(depth)?;
        let element_name = resolved.and_then(|t| element_type_name(&t.name));
        check_items(&value.items, element_name)?;
        let element_type = element_name
            .filter(|name| !name.starts_with("Edm."))
            .map(|name| TypeRef::complex(name, true));

        let verbose = self.options.dialect == Dialect::Verbose;
        if verbose {
            writer.start_object()?;
            if let Some(collection_type) = resolved {
                writer.write_name(VERBOSE_METADATA)?;
                writer.start_object()?;
                writer.write_name("type")?;
                writer.write_str(&collection_type.name)?;
                writer.end_object()?;
            }
            writer.write_name(VERBOSE_RESULTS)?;
        }

        writer.start_array()?;
        for item in &value.items {
            match item {
                ODataValue::Null => writer.write_null()?,
                ODataValue::Primitive(p) => self.write_primitive(writer, p)?,
                ODataValue::Complex(_) => {
                    let expected = element_type.as_ref();
                    self.write_complex(writer, item, expected, expected.is_none(), depth)?
                }
                ODataValue::Collection(_) => {
                    return Err(Error::unsupported_type("collection nested in a collection"))
                }
                ODataValue::Stream(_) => {
                    return Err(Error::unsupported_type("stream value in a collection"))
                }
            }
        }
        writer.end_array()?;

        if verbose {
            writer.end_object()?;
        }
        Ok(())
    }

    fn write_type_member<W: Write>(
        &self,
        writer: &mut JsonWriter<W>,
        type_name: &str,
    ) -> Result<()> {
        match self.options.dialect {
            Dialect::Light => {
                writer.write_name(ODATA_TYPE)?;
                writer.write_str(type_name)
            }
            Dialect::Verbose => {
                writer.write_name(VERBOSE_METADATA)?;
                writer.start_object()?;
                writer.write_name("type")?;
                writer.write_str(type_name)?;
                writer.end_object()
            }
        }
    }

    fn enter(&self, depth: usize) -> Result<usize> {
        let depth = depth + 1;
        if depth > self.options.max_nesting_depth {
            return Err(Error::recursion_depth_limit_reached(
                self.options.max_nesting_depth,
            ));
        }
        Ok(depth)
    }
}

/// The shape every item of one collection must share.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ItemShape {
    Primitive(PrimitiveKind),
    Complex,
}

impl ItemShape {
    fn of(item: &ODataValue) -> Option<Self> {
        match item {
            ODataValue::Primitive(p) => Some(ItemShape::Primitive(p.kind())),
            ODataValue::Complex(_) => Some(ItemShape::Complex),
            _ => None,
        }
    }

    fn declared(element_name: &str) -> Option<Self> {
        match PrimitiveKind::from_type_name(element_name) {
            Some(kind) => Some(ItemShape::Primitive(kind)),
            // Edm types this crate cannot write as primitives are left unchecked
            None if element_name.starts_with("Edm.") => None,
            None => Some(ItemShape::Complex),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ItemShape::Primitive(kind) => kind.type_name(),
            ItemShape::Complex => "complex",
        }
    }
}

// Items must match the declared element type, or each other when there is none.
// Complex items are checked against their element type when written.
fn check_items(items: &[ODataValue], element_name: Option<&str>) -> Result<()> {
    let mut expected = element_name.and_then(ItemShape::declared);
    let declared = element_name.is_some();
    for item in items {
        let Some(shape) = ItemShape::of(item) else {
            continue;
        };
        match expected {
            Some(expected) if expected != shape => {
                let expected_name = element_name.unwrap_or(expected.name());
                return Err(Error::incompatible_type(expected_name, shape.name()));
            }
            Some(_) => {}
            None if !declared => expected = Some(shape),
            None => {}
        }
    }
    Ok(())
}

/// Extracts `T` from a `Collection(T)` type name.
#[must_use]
pub fn element_type_name(collection_type: &str) -> Option<&str> {
    collection_type
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
}
