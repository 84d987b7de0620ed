//! Signature base string construction (RFC 5849 Section 3.4.1).

use url::Url;

use crate::encode::percent_encode;

/// Base string URI (RFC 5849 Section 3.4.1.2).
///
/// Scheme and host are lowercase, the default port for the scheme is
/// dropped, and the query and fragment are removed.
pub fn normalize_uri(url: &Url) -> String {
    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str().unwrap_or("").to_ascii_lowercase();

    // `Url::port` already hides the scheme's default port
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}{}", url.path()),
        None => format!("{scheme}://{host}{}", url.path()),
    }
}

/// Build the signature base string.
///
/// Format: `METHOD&encoded_base_uri&encoded_parameters`
pub fn build(method: &str, url: &Url, canonical_params: &str) -> String {
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&normalize_uri(url)),
        percent_encode(canonical_params)
    )
}
