//! Parameter encoding and normalization (RFC 5849 Section 3.4.1.3).

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::EncodingError;

/// OAuth unreserved characters: A-Z a-z 0-9 - . _ ~
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode string per RFC 3986 (uppercase hex, UTF-8 bytes).
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Decode a percent-encoded string.
///
/// # Errors
///
/// Returns [`EncodingError`] if the decoded bytes are not valid UTF-8.
pub fn percent_decode(input: &str) -> Result<String, EncodingError> {
    percent_decode_str(input)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|source| EncodingError {
            input: input.to_owned(),
            source,
        })
}

/// Parse an `application/x-www-form-urlencoded` string into decoded pairs.
///
/// `+` decodes to a space, a segment without `=` gets an empty value, and
/// empty segments are skipped. Order and duplicates are preserved.
///
/// # Errors
///
/// Returns [`EncodingError`] if any name or value is not valid UTF-8 once
/// decoded.
pub fn parse_form_urlencoded(input: &str) -> Result<Vec<(String, String)>, EncodingError> {
    input
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            Ok((decode_form_component(key)?, decode_form_component(value)?))
        })
        .collect()
}

fn decode_form_component(component: &str) -> Result<String, EncodingError> {
    if component.contains('+') {
        percent_decode(&component.replace('+', " "))
    } else {
        percent_decode(component)
    }
}

/// Normalize parameters into the canonical parameter string.
///
/// Each name and value is encoded, pairs are sorted by encoded name and then
/// encoded value (byte order), and joined as `name=value` with `&`.
/// Duplicate names stay as separate pairs.
pub fn canonicalize<K, V>(params: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut encoded: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (percent_encode(k.as_ref()), percent_encode(v.as_ref())))
        .collect();
    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonicalize an `&`-joined parameter string.
///
/// Applying this to its own output returns the same string.
///
/// # Errors
///
/// Returns [`EncodingError`] if a component is not valid UTF-8 once decoded.
pub fn canonicalize_str(input: &str) -> Result<String, EncodingError> {
    Ok(canonicalize(parse_form_urlencoded(input)?))
}
