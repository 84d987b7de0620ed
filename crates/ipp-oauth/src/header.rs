//! `Authorization` header assembly (RFC 5849 Section 3.5.1).

use std::collections::BTreeMap;

use crate::encode::percent_encode;

/// Authorization header name.
pub const AUTHORIZATION: &str = "Authorization";

/// Protocol parameter carrying the signature.
pub(crate) const OAUTH_SIGNATURE: &str = "oauth_signature";

/// Build the `OAuth ...` header value.
///
/// Parameters appear in ascending name order followed by
/// `oauth_signature`; names and values are percent-encoded and values are
/// quoted.
pub fn assemble(params: &BTreeMap<String, String>, signature: &str) -> String {
    let header_parts: Vec<String> = params
        .iter()
        .filter(|(k, _)| k.as_str() != OAUTH_SIGNATURE)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(std::iter::once((OAUTH_SIGNATURE, signature)))
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect();
    format!("OAuth {}", header_parts.join(", "))
}
