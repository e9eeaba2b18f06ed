//! Conversion of `Serialize` types into [`ODataValue`].
//!
//! [`ValueSerializer`] lets callers build annotation values and entry
//! properties from ordinary Rust data instead of assembling the value tree
//! by hand. Scalars map onto the closest primitive kind, sequences become
//! untyped collections and structs and maps become untyped complex values.
//!
//! ```rust
//! use odata_json::{to_value, ODataValue, PrimitiveValue};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Address {
//!     city: String,
//!     zip: u32,
//! }
//!
//! let value = to_value(&Address { city: "Oslo".into(), zip: 150 }).unwrap();
//! if let ODataValue::Complex(address) = value {
//!     assert_eq!(address.properties.get("city").and_then(|v| v.as_str()), Some("Oslo"));
//!     assert_eq!(
//!         address.properties.get("zip"),
//!         Some(&ODataValue::Primitive(PrimitiveValue::Int64(150)))
//!     );
//! }
//! ```
//!
//! Enum variants carrying data and maps with non-string keys have no
//! counterpart in the value model and fail with
//! [`Error::UnsupportedType`](crate::Error::UnsupportedType).

use crate::{
    CollectionValue, ComplexValue, Decimal, Error, ODataValue, PrimitiveValue, PropertyMap, Result,
};
use num_bigint::BigInt;
use serde::ser::Impossible;
use serde::{ser, Serialize};

/// Converts any `T: Serialize` into an [`ODataValue`].
///
/// # Errors
///
/// Fails with [`Error::UnsupportedType`] for data-carrying enum variants and
/// non-string map keys.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<ODataValue> {
    value.serialize(ValueSerializer)
}

/// A serde serializer whose output is an [`ODataValue`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueSerializer;

/// Collects sequence elements into a collection value.
pub struct SerializeVec {
    items: Vec<ODataValue>,
}

/// Collects map and struct fields into a complex value.
pub struct SerializeMap {
    properties: PropertyMap,
    current_key: Option<String>,
}

fn primitive(value: impl Into<PrimitiveValue>) -> Result<ODataValue> {
    Ok(ODataValue::Primitive(value.into()))
}

impl ser::Serializer for ValueSerializer {
    type Ok = ODataValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = Impossible<ODataValue, Error>;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = Impossible<ODataValue, Error>;

    fn serialize_bool(self, v: bool) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_i8(self, v: i8) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_i16(self, v: i16) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_i32(self, v: i32) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_i64(self, v: i64) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_i128(self, v: i128) -> Result<ODataValue> {
        primitive(Decimal::from(BigInt::from(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_u16(self, v: u16) -> Result<ODataValue> {
        primitive(i32::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<ODataValue> {
        primitive(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<ODataValue> {
        match i64::try_from(v) {
            Ok(v) => primitive(v),
            Err(_) => primitive(Decimal::from(BigInt::from(v))),
        }
    }

    fn serialize_u128(self, v: u128) -> Result<ODataValue> {
        primitive(Decimal::from(BigInt::from(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_f64(self, v: f64) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_char(self, v: char) -> Result<ODataValue> {
        primitive(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<ODataValue> {
        primitive(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ODataValue> {
        primitive(v.to_vec())
    }

    fn serialize_none(self) -> Result<ODataValue> {
        Ok(ODataValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<ODataValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<ODataValue> {
        Ok(ODataValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<ODataValue> {
        Ok(ODataValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<ODataValue> {
        primitive(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<ODataValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<ODataValue>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::unsupported_type(&format!(
            "newtype variant {}::{}",
            name, variant
        )))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::unsupported_type(&format!(
            "tuple variant {}::{}",
            name, variant
        )))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::with_capacity(len))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::unsupported_type(&format!(
            "struct variant {}::{}",
            name, variant
        )))
    }
}

impl SerializeVec {
    fn with_capacity(capacity: usize) -> Self {
        SerializeVec {
            items: Vec::with_capacity(capacity),
        }
    }

    fn finish(self) -> ODataValue {
        ODataValue::Collection(CollectionValue::untyped(self.items))
    }
}

impl SerializeMap {
    fn with_capacity(capacity: usize) -> Self {
        SerializeMap {
            properties: PropertyMap::with_capacity(capacity),
            current_key: None,
        }
    }

    fn finish(self) -> ODataValue {
        ODataValue::Complex(ComplexValue {
            type_name: None,
            properties: self.properties,
        })
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = ODataValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ODataValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = ODataValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ODataValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = ODataValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ODataValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = ODataValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            ODataValue::Primitive(PrimitiveValue::String(s)) => {
                self.current_key = Some(s);
                Ok(())
            }
            other => Err(Error::unsupported_type(&format!(
                "map key of kind {}",
                other.kind_name()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.properties.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ODataValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = ODataValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.properties.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ODataValue> {
        Ok(self.finish())
    }
}
