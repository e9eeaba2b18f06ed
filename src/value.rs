//! In-memory representation of the values an OData payload carries.
//!
//! ## Core Types
//!
//! - [`PrimitiveValue`]: closed union of every scalar the protocol knows
//! - [`ODataValue`]: null, primitive, complex, collection or stream value
//! - [`Decimal`]: arbitrary-precision decimal with its textual scale preserved
//! - [`InstanceAnnotation`]: a validated `(name, value)` side-channel pair
//!
//! ## Usage Patterns
//!
//! ```rust
//! use odata_json::{ComplexValue, ODataValue, PrimitiveValue};
//!
//! let address = ComplexValue::new("NS.Address")
//!     .with_property("City", "Redmond")
//!     .with_property("Zip", 98052);
//! let value = ODataValue::from(address);
//! assert!(value.is_complex());
//!
//! let amount = ODataValue::from(PrimitiveValue::Double(2.5));
//! assert!(amount.is_primitive());
//! ```

use crate::edm::PrimitiveKind;
use crate::{Error, PropertyMap, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use num_bigint::{BigInt, Sign};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix of annotation names reserved for the protocol itself.
pub const RESERVED_ANNOTATION_PREFIX: &str = "odata.";

/// An arbitrary-precision decimal number.
///
/// Stored as an unscaled integer and a scale, so `1.50` keeps its trailing zero.
///
/// # Examples
///
/// ```rust
/// use odata_json::Decimal;
///
/// let d: Decimal = "-12.50".parse().unwrap();
/// assert_eq!(d.to_string(), "-12.50");
/// assert_eq!(Decimal::from(7).to_string(), "7");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: BigInt,
    scale: u32,
}

impl Decimal {
    /// Creates the decimal `unscaled * 10^-scale`.
    #[must_use]
    pub fn new(unscaled: BigInt, scale: u32) -> Self {
        Decimal { unscaled, scale }
    }

    /// The unscaled integer value.
    #[must_use]
    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(BigInt::from(value), 0)
    }
}

impl From<BigInt> for Decimal {
    fn from(value: BigInt) -> Self {
        Decimal::new(value, 0)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::custom(format!("'{}' is not a valid decimal", s));
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        let unsigned = int_part.trim_start_matches(['-', '+']);
        if unsigned.is_empty() && frac_part.is_empty()
            || !digits_only(unsigned)
            || !digits_only(frac_part)
            || int_part.len() - unsigned.len() > 1
        {
            return Err(invalid());
        }
        let combined = format!("{}{}", int_part, frac_part);
        let unscaled = BigInt::from_str(&combined).map_err(|_| invalid())?;
        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Ok(Decimal::new(unscaled, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.magnitude().to_string();
        let sign = if self.unscaled.sign() == Sign::Minus {
            "-"
        } else {
            ""
        };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

/// A scalar value of one of the protocol's primitive types.
///
/// The set is closed: every scalar is classified once, when it is built, and
/// the encoders match on the variant instead of inspecting runtime types.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    Guid(Uuid),
    Binary(Vec<u8>),
    String(String),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Time(Duration),
}

impl PrimitiveValue {
    /// Returns the primitive type of this value.
    #[must_use]
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Boolean(_) => PrimitiveKind::Boolean,
            PrimitiveValue::Byte(_) => PrimitiveKind::Byte,
            PrimitiveValue::SByte(_) => PrimitiveKind::SByte,
            PrimitiveValue::Int16(_) => PrimitiveKind::Int16,
            PrimitiveValue::Int32(_) => PrimitiveKind::Int32,
            PrimitiveValue::Int64(_) => PrimitiveKind::Int64,
            PrimitiveValue::Single(_) => PrimitiveKind::Single,
            PrimitiveValue::Double(_) => PrimitiveKind::Double,
            PrimitiveValue::Decimal(_) => PrimitiveKind::Decimal,
            PrimitiveValue::Guid(_) => PrimitiveKind::Guid,
            PrimitiveValue::Binary(_) => PrimitiveKind::Binary,
            PrimitiveValue::String(_) => PrimitiveKind::String,
            PrimitiveValue::DateTime(_) => PrimitiveKind::DateTime,
            PrimitiveValue::DateTimeOffset(_) => PrimitiveKind::DateTimeOffset,
            PrimitiveValue::Time(_) => PrimitiveKind::Time,
        }
    }

    /// Returns `true` if a reader can infer this value's type from its JSON token alone.
    ///
    /// `NaN` and the infinities are written as strings, so they never qualify.
    #[must_use]
    pub fn is_json_native(&self) -> bool {
        match self {
            PrimitiveValue::Double(v) => v.is_finite(),
            other => other.kind().is_json_native(),
        }
    }
}

/// A media resource or named stream descriptor.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StreamReference {
    pub edit_link: Option<String>,
    pub read_link: Option<String>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

/// A structured value made of named properties.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ComplexValue {
    pub type_name: Option<String>,
    pub properties: PropertyMap,
}

impl ComplexValue {
    /// Creates an empty complex value of the named type.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        ComplexValue {
            type_name: Some(type_name.into()),
            properties: PropertyMap::new(),
        }
    }

    /// Creates a complex value without a type name.
    #[must_use]
    pub fn untyped() -> Self {
        ComplexValue::default()
    }

    /// Appends a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<ODataValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A homogeneous collection of primitive or complex values.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CollectionValue {
    pub type_name: Option<String>,
    pub items: Vec<ODataValue>,
}

impl CollectionValue {
    /// Creates a collection of the named `Collection(T)` type.
    #[must_use]
    pub fn new(type_name: impl Into<String>, items: Vec<ODataValue>) -> Self {
        CollectionValue {
            type_name: Some(type_name.into()),
            items,
        }
    }

    /// Creates a collection with no type name.
    #[must_use]
    pub fn untyped(items: Vec<ODataValue>) -> Self {
        CollectionValue {
            type_name: None,
            items,
        }
    }
}

/// Any value an OData payload can carry.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ODataValue {
    #[default]
    Null,
    Primitive(PrimitiveValue),
    Complex(ComplexValue),
    Collection(CollectionValue),
    Stream(StreamReference),
}

impl ODataValue {
    /// Returns `true` for [`ODataValue::Null`].
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, ODataValue::Null)
    }

    /// Returns `true` for a primitive value.
    #[inline]
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, ODataValue::Primitive(_))
    }

    /// Returns `true` for a complex value.
    #[inline]
    #[must_use]
    pub const fn is_complex(&self) -> bool {
        matches!(self, ODataValue::Complex(_))
    }

    /// Returns `true` for a collection value.
    #[inline]
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, ODataValue::Collection(_))
    }

    /// Returns `true` for a stream reference.
    #[inline]
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        matches!(self, ODataValue::Stream(_))
    }

    /// If the value is a string primitive, returns it. Otherwise returns `None`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ODataValue::Primitive(PrimitiveValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The type name the value carries on its own, if any.
    ///
    /// Primitives always know their type; complex values and collections only
    /// when one was given.
    #[must_use]
    pub fn type_name(&self) -> Option<String> {
        match self {
            ODataValue::Primitive(p) => Some(p.kind().type_name().to_string()),
            ODataValue::Complex(c) => c.type_name.clone(),
            ODataValue::Collection(c) => c.type_name.clone(),
            ODataValue::Null | ODataValue::Stream(_) => None,
        }
    }

    /// Short description of the variant, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ODataValue::Null => "null",
            ODataValue::Primitive(_) => "primitive",
            ODataValue::Complex(_) => "complex",
            ODataValue::Collection(_) => "collection",
            ODataValue::Stream(_) => "stream",
        }
    }
}

impl From<PrimitiveValue> for ODataValue {
    fn from(value: PrimitiveValue) -> Self {
        ODataValue::Primitive(value)
    }
}

impl From<ComplexValue> for ODataValue {
    fn from(value: ComplexValue) -> Self {
        ODataValue::Complex(value)
    }
}

impl From<CollectionValue> for ODataValue {
    fn from(value: CollectionValue) -> Self {
        ODataValue::Collection(value)
    }
}

impl From<StreamReference> for ODataValue {
    fn from(value: StreamReference) -> Self {
        ODataValue::Stream(value)
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PrimitiveValue {
                fn from(value: $ty) -> Self {
                    PrimitiveValue::$variant(value)
                }
            }

            impl From<$ty> for ODataValue {
                fn from(value: $ty) -> Self {
                    ODataValue::Primitive(PrimitiveValue::$variant(value))
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Boolean,
    u8 => Byte,
    i8 => SByte,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Single,
    f64 => Double,
    Decimal => Decimal,
    Uuid => Guid,
    Vec<u8> => Binary,
    String => String,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeOffset,
    Duration => Time,
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::String(value.to_string())
    }
}

impl From<&str> for ODataValue {
    fn from(value: &str) -> Self {
        ODataValue::Primitive(PrimitiveValue::from(value))
    }
}

impl<T: Into<ODataValue>> From<Option<T>> for ODataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ODataValue::Null, Into::into)
    }
}

/// A named value attached to an entity, error or other value, outside its declared properties.
///
/// # Examples
///
/// ```rust
/// use odata_json::{InstanceAnnotation, Error};
///
/// assert!(InstanceAnnotation::new("Display.label", "Hi").is_ok());
/// assert!(matches!(
///     InstanceAnnotation::new("odata.type", "x"),
///     Err(Error::ReservedAnnotationName(_))
/// ));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceAnnotation {
    name: String,
    value: ODataValue,
}

impl InstanceAnnotation {
    /// Creates an annotation, validating its name and value.
    ///
    /// # Errors
    ///
    /// The name must be non-empty, namespace qualified (`Namespace.term`), free
    /// of `@` and `#`, and outside the reserved `odata.` namespace. Stream
    /// values are rejected.
    pub fn new(name: impl Into<String>, value: impl Into<ODataValue>) -> Result<Self> {
        let name = name.into();
        validate_annotation_name(&name)?;
        let value = value.into();
        if value.is_stream() {
            return Err(Error::StreamValueInAnnotation(name));
        }
        Ok(InstanceAnnotation { name, value })
    }

    /// The annotation's qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The annotation's value.
    #[must_use]
    pub fn value(&self) -> &ODataValue {
        &self.value
    }
}

fn validate_annotation_name(name: &str) -> Result<()> {
    if name.starts_with(RESERVED_ANNOTATION_PREFIX) {
        return Err(Error::ReservedAnnotationName(name.to_string()));
    }
    let well_formed = !name.is_empty()
        && name.contains('.')
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains(['@', '#']);
    if well_formed {
        Ok(())
    } else {
        Err(Error::InvalidAnnotationName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_display() {
        assert_eq!(Decimal::new(BigInt::from(150), 2).to_string(), "1.50");
        assert_eq!(Decimal::new(BigInt::from(-5), 3).to_string(), "-0.005");
        assert_eq!(Decimal::new(BigInt::from(0), 1).to_string(), "0.0");
        assert_eq!(Decimal::from(-42).to_string(), "-42");
    }

    #[test]
    fn test_decimal_parse() {
        let d: Decimal = "0.25".parse().unwrap();
        assert_eq!(d.unscaled(), &BigInt::from(25));
        assert_eq!(d.scale(), 2);

        let big: Decimal = "123456789012345678901234567890.1".parse().unwrap();
        assert_eq!(big.to_string(), "123456789012345678901234567890.1");

        assert!("".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("--1".parse::<Decimal>().is_err());
        assert!("1e5".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_primitive_kinds() {
        assert_eq!(PrimitiveValue::from(1i64).kind(), PrimitiveKind::Int64);
        assert_eq!(PrimitiveValue::from("x").kind(), PrimitiveKind::String);
        assert_eq!(
            ODataValue::from(2.5f64).type_name().as_deref(),
            Some("Edm.Double")
        );
    }

    #[test]
    fn test_annotation_name_validation() {
        assert!(matches!(
            InstanceAnnotation::new("", 1),
            Err(Error::InvalidAnnotationName(_))
        ));
        assert!(matches!(
            InstanceAnnotation::new("noNamespace", 1),
            Err(Error::InvalidAnnotationName(_))
        ));
        assert!(matches!(
            InstanceAnnotation::new("NS.a@b", 1),
            Err(Error::InvalidAnnotationName(_))
        ));
        assert!(matches!(
            InstanceAnnotation::new("odata.count", 1),
            Err(Error::ReservedAnnotationName(_))
        ));
    }

    #[test]
    fn test_annotation_rejects_stream() {
        let result = InstanceAnnotation::new("NS.media", StreamReference::default());
        assert!(matches!(result, Err(Error::StreamValueInAnnotation(_))));
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(ODataValue::from(None::<i32>), ODataValue::Null);
        assert_eq!(ODataValue::from(Some(3)), ODataValue::from(3));
    }
}
