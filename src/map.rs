//! Ordered property map for complex values.
//!
//! [`PropertyMap`] wraps an [`IndexMap`] so properties are written in the order
//! they were inserted. Member order is part of the wire contract, so a hashed map
//! would make output non-deterministic.
//!
//! ## Examples
//!
//! ```rust
//! use odata_json::{ODataValue, PropertyMap};
//!
//! let mut map = PropertyMap::new();
//! map.insert("City".to_string(), ODataValue::from("Redmond"));
//! map.insert("Zip".to_string(), ODataValue::from(98052));
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, vec!["City", "Zip"]);
//! ```

use crate::ODataValue;
use indexmap::IndexMap;

/// An insertion-ordered map of property names to values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyMap(IndexMap<String, ODataValue>);

impl PropertyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        PropertyMap(IndexMap::new())
    }

    /// Creates an empty map with room for `capacity` properties.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        PropertyMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a property, returning the previous value if the name was taken.
    ///
    /// A replaced property keeps its original position.
    pub fn insert(&mut self, key: String, value: ODataValue) -> Option<ODataValue> {
        self.0.insert(key, value)
    }

    /// Returns the value of property `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ODataValue> {
        self.0.get(key)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the property names, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, ODataValue> {
        self.0.keys()
    }

    /// Returns an iterator over the property values, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, ODataValue> {
        self.0.values()
    }

    /// Returns an iterator over the properties, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ODataValue> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a PropertyMap {
    type Item = (&'a String, &'a ODataValue);
    type IntoIter = indexmap::map::Iter<'a, String, ODataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, ODataValue);
    type IntoIter = indexmap::map::IntoIter<String, ODataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, ODataValue)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (String, ODataValue)>>(iter: T) -> Self {
        PropertyMap(IndexMap::from_iter(iter))
    }
}
