//! Configuration options for OData JSON writing.
//!
//! This module provides the types that shape the emitted payload:
//!
//! - [`WriterOptions`]: Main configuration struct
//! - [`ODataVersion`]: Protocol version, which selects legacy or ISO date formats
//! - [`Dialect`]: The JSON rendering, "light" or the legacy "verbose"
//! - [`AnnotationFilter`]: Which instance annotations make it into the output
//!
//! ## Examples
//!
//! ```rust
//! use odata_json::{Dialect, ODataVersion, WriterOptions};
//!
//! let options = WriterOptions::new()
//!     .with_dialect(Dialect::Verbose)
//!     .with_version(ODataVersion::V2)
//!     .with_jsonp("callback");
//! assert!(!options.force_decimal_marker());
//! ```

use crate::uri::UriResolver;
use std::cmp::Ordering;
use std::sync::Arc;
use url::Url;

/// Protocol version of the payload being written.
///
/// Versions below [`ODataVersion::V3`] encode date/time values with the legacy
/// `\/Date(ms)\/` format; V3 uses ISO-8601.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ODataVersion {
    V1,
    V2,
    #[default]
    V3,
}

impl ODataVersion {
    /// Version header text, e.g. `3.0`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ODataVersion::V1 => "1.0",
            ODataVersion::V2 => "2.0",
            ODataVersion::V3 => "3.0",
        }
    }

    /// Returns `true` when date/time values use the `\/Date(...)\/` encoding.
    #[inline]
    #[must_use]
    pub fn uses_legacy_dates(&self) -> bool {
        *self < ODataVersion::V3
    }
}

/// The JSON rendering a payload follows.
///
/// # Examples
///
/// ```rust
/// use odata_json::Dialect;
///
/// assert_eq!(Dialect::Light.error_container(), "odata.error");
/// assert_eq!(Dialect::Verbose.error_container(), "error");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Light,
    Verbose,
}

impl Dialect {
    /// Name of the member wrapping a top-level error payload.
    #[must_use]
    pub const fn error_container(&self) -> &'static str {
        match self {
            Dialect::Light => "odata.error",
            Dialect::Verbose => "error",
        }
    }

    /// Returns `true` for the light dialect.
    #[inline]
    #[must_use]
    pub const fn is_light(&self) -> bool {
        matches!(self, Dialect::Light)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum FilterPattern {
    All,
    Namespace(String),
    Exact(String),
}

impl FilterPattern {
    fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            FilterPattern::All
        } else if let Some(ns) = pattern.strip_suffix(".*") {
            FilterPattern::Namespace(ns.to_string())
        } else {
            FilterPattern::Exact(pattern.to_string())
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            FilterPattern::All => true,
            FilterPattern::Namespace(ns) => name
                .strip_prefix(ns.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
            FilterPattern::Exact(exact) => exact == name,
        }
    }

    fn specificity(&self) -> usize {
        match self {
            FilterPattern::All => 0,
            FilterPattern::Namespace(ns) => 1 + ns.split('.').count(),
            FilterPattern::Exact(_) => usize::MAX,
        }
    }
}

/// Decides which instance annotation names are written.
///
/// Patterns are `*`, `Namespace.*` or an exact `Namespace.term`; a leading `-`
/// turns a pattern into an exclusion. The most specific matching pattern wins,
/// and an exclusion beats an inclusion of equal specificity. A name matched by
/// no pattern is skipped, except for the default filter which includes
/// everything.
///
/// # Examples
///
/// ```rust
/// use odata_json::AnnotationFilter;
///
/// let filter = AnnotationFilter::parse("Display.*,-Display.secret");
/// assert!(filter.matches("Display.label"));
/// assert!(!filter.matches("Display.secret"));
/// assert!(!filter.matches("Other.term"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationFilter {
    rules: Vec<(FilterPattern, bool)>,
}

impl Default for AnnotationFilter {
    fn default() -> Self {
        AnnotationFilter::include_all()
    }
}

impl AnnotationFilter {
    /// A filter that writes every annotation.
    #[must_use]
    pub fn include_all() -> Self {
        AnnotationFilter {
            rules: vec![(FilterPattern::All, true)],
        }
    }

    /// A filter that writes no annotation.
    #[must_use]
    pub fn exclude_all() -> Self {
        AnnotationFilter { rules: Vec::new() }
    }

    /// Parses a comma separated list of patterns.
    #[must_use]
    pub fn parse(patterns: &str) -> Self {
        let rules = patterns
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| match p.strip_prefix('-') {
                Some(excluded) => (FilterPattern::parse(excluded), false),
                None => (FilterPattern::parse(p), true),
            })
            .collect();
        AnnotationFilter { rules }
    }

    /// Returns `true` if an annotation named `name` should be written.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.rules
            .iter()
            .filter(|(pattern, _)| pattern.matches(name))
            .max_by(|(a, a_inc), (b, b_inc)| {
                a.specificity()
                    .cmp(&b.specificity())
                    // exclusions rank above inclusions of equal specificity
                    .then_with(|| match (a_inc, b_inc) {
                        (true, false) => Ordering::Less,
                        (false, true) => Ordering::Greater,
                        _ => Ordering::Equal,
                    })
            })
            .is_some_and(|(_, include)| *include)
    }
}

/// Configuration options for OData JSON writing.
///
/// # Examples
///
/// ```rust
/// use odata_json::WriterOptions;
///
/// // Compact light JSON for a V3 response
/// let options = WriterOptions::new();
/// assert!(options.writing_response);
///
/// // Indented output
/// let options = WriterOptions::pretty().with_indent(4);
/// assert_eq!(options.indent, 4);
/// ```
#[derive(Clone, Debug)]
pub struct WriterOptions {
    pub indent: usize,
    pub pretty: bool,
    pub version: ODataVersion,
    pub dialect: Dialect,
    /// Overrides the dialect's default for "always show decimal point or exponent".
    pub decimal_marker: Option<bool>,
    pub jsonp_function: Option<String>,
    pub writing_response: bool,
    pub base_uri: Option<Url>,
    pub uri_resolver: Option<Arc<dyn UriResolver>>,
    pub annotation_filter: AnnotationFilter,
    pub include_debug_information: bool,
    pub max_inner_error_depth: usize,
    pub max_nesting_depth: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            indent: 2,
            pretty: false,
            version: ODataVersion::default(),
            dialect: Dialect::default(),
            decimal_marker: None,
            jsonp_function: None,
            writing_response: true,
            base_uri: None,
            uri_resolver: None,
            annotation_filter: AnnotationFilter::default(),
            include_debug_information: false,
            max_inner_error_depth: 100,
            max_nesting_depth: 100,
        }
    }
}

impl WriterOptions {
    /// Creates default options (compact light JSON, V3, response payload).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use odata_json::{Dialect, WriterOptions};
    ///
    /// let options = WriterOptions::new();
    /// assert_eq!(options.dialect, Dialect::Light);
    /// assert!(!options.pretty);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for indented output.
    #[must_use]
    pub fn pretty() -> Self {
        WriterOptions {
            pretty: true,
            ..Default::default()
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Only affects pretty-printed output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn with_version(mut self, version: ODataVersion) -> Self {
        self.version = version;
        self
    }

    /// Sets the JSON dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Forces (or suppresses) a decimal point or exponent in every floating point value.
    #[must_use]
    pub fn with_decimal_marker(mut self, force: bool) -> Self {
        self.decimal_marker = Some(force);
        self
    }

    /// Wraps the whole document in a JSONP call to `function`.
    #[must_use]
    pub fn with_jsonp(mut self, function: impl Into<String>) -> Self {
        self.jsonp_function = Some(function.into());
        self
    }

    /// Marks the payload as a request rather than a response.
    #[must_use]
    pub fn for_request(mut self) -> Self {
        self.writing_response = false;
        self
    }

    /// Sets the base URI relative links are resolved against.
    #[must_use]
    pub fn with_base_uri(mut self, base: Url) -> Self {
        self.base_uri = Some(base);
        self
    }

    /// Sets a resolver consulted before the base URI.
    #[must_use]
    pub fn with_uri_resolver(mut self, resolver: Arc<dyn UriResolver>) -> Self {
        self.uri_resolver = Some(resolver);
        self
    }

    /// Sets which instance annotations are written.
    #[must_use]
    pub fn with_annotation_filter(mut self, filter: AnnotationFilter) -> Self {
        self.annotation_filter = filter;
        self
    }

    /// Includes inner errors (stack traces and the like) in error payloads.
    #[must_use]
    pub fn with_debug_information(mut self, include: bool) -> Self {
        self.include_debug_information = include;
        self
    }

    /// Sets the maximum nesting of inner errors.
    #[must_use]
    pub fn with_max_inner_error_depth(mut self, depth: usize) -> Self {
        self.max_inner_error_depth = depth;
        self
    }

    /// Sets the maximum nesting of complex and collection values.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Whether floating point values must always contain `.` or an exponent.
    ///
    /// Defaults to `true` for the light dialect and `false` for verbose.
    #[must_use]
    pub fn force_decimal_marker(&self) -> bool {
        self.decimal_marker.unwrap_or(self.dialect.is_light())
    }

    /// Returns `true` if the annotation named `name` must not be written.
    #[must_use]
    pub fn should_skip_annotation(&self, name: &str) -> bool {
        !self.annotation_filter.matches(name)
    }
}
