//! Outgoing request descriptor.

use url::Url;

use crate::encode::parse_form_urlencoded;
use crate::error::EncodingError;

/// Media type whose body parameters are signed.
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Method, URI, headers and optional body of a request to be authorized.
///
/// The authorizer only reads it, apart from appending `Authorization`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: String,
    uri: Url,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    /// Create a descriptor with no headers and no body.
    pub fn new(method: &str, uri: Url) -> Self {
        Self {
            method: method.to_owned(),
            uri,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Parse `uri` and create a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `uri` is not an absolute URL.
    pub fn parse(method: &str, uri: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(method, Url::parse(uri)?))
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// HTTP method as given.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Body bytes, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Query and form-body parameters covered by the signature.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError`] if a parameter is not valid UTF-8.
    pub fn signed_parameters(&self) -> Result<Vec<(String, String)>, EncodingError> {
        let content_type = self.header("Content-Type");
        request_parameters(&self.uri, content_type, self.body())
    }

    /// Replace every header named `name` (case-insensitive) with one value.
    pub(crate) fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value));
    }
}

/// Request body that may carry form-encoded parameters.
///
/// Implemented for the body types used with [`ureq::http::Request`],
/// including `()` for bodiless requests.
pub trait SignableBody {
    /// Raw body bytes, or `None` when there is no body.
    fn body_bytes(&self) -> Option<&[u8]>;
}

impl SignableBody for () {
    fn body_bytes(&self) -> Option<&[u8]> {
        None
    }
}

impl SignableBody for Vec<u8> {
    fn body_bytes(&self) -> Option<&[u8]> {
        Some(self.as_slice())
    }
}

impl SignableBody for String {
    fn body_bytes(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

impl SignableBody for &[u8] {
    fn body_bytes(&self) -> Option<&[u8]> {
        Some(*self)
    }
}

impl SignableBody for &str {
    fn body_bytes(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

impl<T: SignableBody> SignableBody for Option<T> {
    fn body_bytes(&self) -> Option<&[u8]> {
        self.as_ref().and_then(SignableBody::body_bytes)
    }
}

/// Collect query parameters, plus body parameters for form-encoded bodies
/// (RFC 5849 Section 3.4.1.3.1).
pub(crate) fn request_parameters(
    uri: &Url,
    content_type: Option<&str>,
    body: Option<&[u8]>,
) -> Result<Vec<(String, String)>, EncodingError> {
    let mut params = match uri.query() {
        Some(query) => parse_form_urlencoded(query)?,
        None => Vec::new(),
    };

    if let Some(body) = body
        && is_form_urlencoded(content_type)
    {
        let body = std::str::from_utf8(body).map_err(|source| EncodingError {
            input: String::from_utf8_lossy(body).into_owned(),
            source,
        })?;
        params.extend(parse_form_urlencoded(body)?);
    }

    Ok(params)
}

fn is_form_urlencoded(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}
