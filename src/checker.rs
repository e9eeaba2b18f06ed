//! Duplicate property and link name detection.

use crate::{Error, Result};
use std::collections::HashSet;

/// Rejects a second property or link with the same name inside one entity.
pub trait DuplicateNameChecker {
    /// Records `name`, failing if it was already recorded.
    fn check(&mut self, name: &str) -> Result<()>;
}

/// A [`DuplicateNameChecker`] backed by a hash set, scoped to one entity.
///
/// # Examples
///
/// ```rust
/// use odata_json::{DuplicateNameChecker, DuplicatePropertyNamesChecker};
///
/// let mut checker = DuplicatePropertyNamesChecker::new();
/// assert!(checker.check("Orders").is_ok());
/// assert!(checker.check("Orders").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DuplicatePropertyNamesChecker {
    seen: HashSet<String>,
    allow_duplicates: bool,
}

impl DuplicatePropertyNamesChecker {
    /// Creates a checker that rejects every repeated name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A checker that accepts repeated names.
    #[must_use]
    pub fn allowing_duplicates() -> Self {
        DuplicatePropertyNamesChecker {
            seen: HashSet::new(),
            allow_duplicates: true,
        }
    }

    /// Forgets every recorded name.
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

impl DuplicateNameChecker for DuplicatePropertyNamesChecker {
    fn check(&mut self, name: &str) -> Result<()> {
        if self.allow_duplicates || self.seen.insert(name.to_string()) {
            Ok(())
        } else {
            Err(Error::DuplicatePropertyName(name.to_string()))
        }
    }
}
