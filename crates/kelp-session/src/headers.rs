//! Header merging

use http::header::{HeaderMap, HeaderName, HeaderValue};
use kelp_core::{Error, Result};

/// A per-request header override. `None` removes the header from the merge.
pub type HeaderOverride = (String, Option<String>);

/// Parse a header name
pub fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| Error::InvalidHeader(format!("{name:?}: {e}")))
}

/// Parse a header value
pub fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidHeader(format!("value for {name:?}: {e}")))
}

/// Merge session headers with per-request overrides.
///
/// Overrides are applied in order and replace session values with the same
/// name (names compare case-insensitively). A `None` value drops the header
/// entirely, whether it came from the session or an earlier override.
pub fn merge(base: &HeaderMap, overrides: &[HeaderOverride]) -> Result<HeaderMap> {
    let mut merged = base.clone();

    for (name, value) in overrides {
        let key = header_name(name)?;
        match value {
            Some(value) => {
                merged.insert(key, header_value(name, value)?);
            }
            None => {
                merged.remove(key);
            }
        }
    }

    Ok(merged)
}

/// Build a header map from name/value pairs
pub fn from_pairs<'a, I>(pairs: I) -> Result<HeaderMap>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(header_name(name)?, header_value(name, value)?);
    }
    Ok(headers)
}
