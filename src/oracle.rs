//! Type name decisions.
//!
//! Before a value is written, the serializers ask a [`TypeNameOracle`] two
//! questions: which type does the value resolve to given what the model
//! declares, and does that type have to be spelled out in the payload.

use crate::edm::{Model, TypeKind, TypeRef};
use crate::{Error, ODataValue, Result};

/// Decides whether a value needs an explicit type name.
pub trait TypeNameOracle {
    /// Resolves the type of `value` against the `expected` declared type.
    ///
    /// Returns `None` for values that carry no type of their own and have no
    /// declared type. Fails if the value cannot be an instance of `expected`.
    fn resolve_and_validate(
        &self,
        model: &dyn Model,
        expected: Option<&TypeRef>,
        value: &ODataValue,
        treat_as_open: bool,
    ) -> Result<Option<TypeRef>>;

    /// The type name to write before `value`, or `None` if the reader can infer it.
    fn type_name_to_write(
        &self,
        value: &ODataValue,
        expected: Option<&TypeRef>,
        resolved: Option<&TypeRef>,
        treat_as_open: bool,
    ) -> Option<String>;
}

/// The rules of the light dialect.
///
/// Open values (no declared type) get a type name unless they are one of the
/// primitives JSON represents natively. A `NaN` or infinite double is written
/// as a string, so it is named too. Declared values get one only when the
/// runtime type differs from, and so derives from, the declared type.
#[derive(Clone, Copy, Debug, Default)]
pub struct LightTypeNameOracle;

impl TypeNameOracle for LightTypeNameOracle {
    fn resolve_and_validate(
        &self,
        model: &dyn Model,
        expected: Option<&TypeRef>,
        value: &ODataValue,
        treat_as_open: bool,
    ) -> Result<Option<TypeRef>> {
        let actual = match value {
            ODataValue::Null => return Ok(expected.cloned()),
            ODataValue::Primitive(p) => Some(TypeRef::primitive(p.kind(), true)),
            ODataValue::Complex(c) => c.type_name.as_ref().map(|n| TypeRef::complex(n, true)),
            ODataValue::Collection(c) => c.type_name.as_ref().map(|n| TypeRef {
                name: n.clone(),
                kind: TypeKind::Collection,
                nullable: true,
            }),
            ODataValue::Stream(_) => {
                return Err(Error::unsupported_type("stream value in a value position"))
            }
        };

        let expected = match expected {
            Some(expected) if !treat_as_open => expected,
            _ => return Ok(actual),
        };

        if !same_family(&expected.kind, value) {
            return Err(Error::incompatible_type(
                &expected.name,
                &actual.map_or_else(|| value.kind_name().to_string(), |t| t.name),
            ));
        }

        match actual {
            None => Ok(Some(expected.clone())),
            Some(actual) => {
                let compatible = match expected.kind {
                    TypeKind::Primitive(kind) => {
                        matches!(actual.kind, TypeKind::Primitive(k) if k == kind)
                    }
                    _ => model.is_derived_from(&actual.name, &expected.name),
                };
                if compatible {
                    Ok(Some(TypeRef {
                        nullable: expected.nullable,
                        ..actual
                    }))
                } else {
                    Err(Error::incompatible_type(&expected.name, &actual.name))
                }
            }
        }
    }

    fn type_name_to_write(
        &self,
        value: &ODataValue,
        expected: Option<&TypeRef>,
        resolved: Option<&TypeRef>,
        treat_as_open: bool,
    ) -> Option<String> {
        let resolved = resolved?;
        if value.is_null() {
            return None;
        }
        if treat_as_open || expected.is_none() {
            return match value {
                ODataValue::Primitive(p) if p.is_json_native() => None,
                _ => Some(resolved.name.clone()),
            };
        }
        match expected {
            Some(expected) if expected.name == resolved.name => None,
            _ => Some(resolved.name.clone()),
        }
    }
}

fn same_family(kind: &TypeKind, value: &ODataValue) -> bool {
    matches!(
        (kind, value),
        (TypeKind::Primitive(_), ODataValue::Primitive(_))
            | (TypeKind::Complex, ODataValue::Complex(_))
            | (TypeKind::Collection, ODataValue::Collection(_))
    )
}
