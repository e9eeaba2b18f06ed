//! Conversion of possibly-relative URIs to the text written on the wire.

use crate::{Error, Result, WriterOptions};
use std::fmt;
use url::Url;

/// A pluggable hook consulted before the built-in URI handling.
///
/// Returning `None` falls back to resolving against the configured base URI.
pub trait UriResolver: fmt::Debug + Send + Sync {
    fn resolve(&self, base: Option<&Url>, uri: &str) -> Option<String>;
}

/// Converts `uri` to its canonical textual form.
///
/// Absolute URIs are normalized. Relative URIs are returned unchanged unless
/// `make_absolute` is set, in which case they are joined onto the base URI.
///
/// # Errors
///
/// Fails with [`Error::RelativeUriWithoutBase`] when `make_absolute` is set,
/// the URI is relative and no base URI is configured.
///
/// # Examples
///
/// ```rust
/// use odata_json::{uri::to_uri_string, WriterOptions};
/// use url::Url;
///
/// let options = WriterOptions::new()
///     .with_base_uri(Url::parse("http://host/service/").unwrap());
/// assert_eq!(
///     to_uri_string(&options, "Customers(1)", true).unwrap(),
///     "http://host/service/Customers(1)"
/// );
/// assert_eq!(to_uri_string(&options, "#Container.Act", false).unwrap(), "#Container.Act");
/// ```
pub fn to_uri_string(options: &WriterOptions, uri: &str, make_absolute: bool) -> Result<String> {
    let resolved = options
        .uri_resolver
        .as_ref()
        .and_then(|resolver| resolver.resolve(options.base_uri.as_ref(), uri));
    let uri = resolved.as_deref().unwrap_or(uri);

    if let Ok(absolute) = Url::parse(uri) {
        return Ok(absolute.to_string());
    }
    if !make_absolute {
        return Ok(uri.to_string());
    }
    match &options.base_uri {
        Some(base) => base
            .join(uri)
            .map(|joined| joined.to_string())
            .map_err(|e| Error::custom(format!("cannot resolve '{}': {}", uri, e))),
        None => Err(Error::RelativeUriWithoutBase(uri.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct PrefixResolver;

    impl UriResolver for PrefixResolver {
        fn resolve(&self, _base: Option<&Url>, uri: &str) -> Option<String> {
            uri.strip_prefix("~/")
                .map(|rest| format!("http://resolved/{}", rest))
        }
    }

    #[test]
    fn test_relative_without_base() {
        let options = WriterOptions::new();
        assert_eq!(
            to_uri_string(&options, "Customers(1)", true),
            Err(Error::RelativeUriWithoutBase("Customers(1)".to_string()))
        );
        assert_eq!(to_uri_string(&options, "Customers(1)", false).unwrap(), "Customers(1)");
    }

    #[test]
    fn test_absolute_passes_through() {
        let options = WriterOptions::new();
        assert_eq!(
            to_uri_string(&options, "http://host/svc/Orders(2)", true).unwrap(),
            "http://host/svc/Orders(2)"
        );
    }

    #[test]
    fn test_resolver_runs_first() {
        let options = WriterOptions::new().with_uri_resolver(Arc::new(PrefixResolver));
        assert_eq!(
            to_uri_string(&options, "~/Things(3)", true).unwrap(),
            "http://resolved/Things(3)"
        );
        assert!(to_uri_string(&options, "Things(3)", true).is_err());
    }
}
