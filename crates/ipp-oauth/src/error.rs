//! Error types for OAuth request authorization.

use std::str::Utf8Error;

/// A required credential field is missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} cannot be null or empty")]
pub struct InvalidCredentialError {
    /// Name of the offending field (e.g., `access_token_secret`).
    pub field: &'static str,
}

/// RSA-SHA1 signing was attempted without a private key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("RSA-SHA1 signature method requires a signing key")]
pub struct SigningKeyMissingError;

/// A parameter could not be decoded into a UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parameter is not valid percent-encoded UTF-8: {input:?}")]
pub struct EncodingError {
    /// The raw input that failed to decode.
    pub input: String,
    /// Underlying UTF-8 error.
    #[source]
    pub source: Utf8Error,
}

/// Failure to authorize a request.
///
/// Wraps the most specific underlying error. The request is never modified
/// when this is returned.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    /// Credential context is invalid.
    #[error("invalid credential")]
    InvalidCredential(#[from] InvalidCredentialError),

    /// RSA-SHA1 selected without a key.
    #[error("signing key missing")]
    SigningKeyMissing(#[from] SigningKeyMissingError),

    /// Query or body parameter could not be decoded.
    #[error("parameter encoding error")]
    Encoding(#[from] EncodingError),

    /// Request URI is not an absolute URL.
    #[error("invalid request URI")]
    InvalidUri(#[from] url::ParseError),

    /// HMAC key rejected by the MAC implementation.
    #[error("invalid HMAC-SHA1 key")]
    HmacKey(#[from] hmac::digest::InvalidLength),

    /// RSA signature computation failed.
    #[error("signature computation failed")]
    Signature(#[from] rsa::signature::Error),

    /// Header value rejected by the HTTP request type.
    #[error("invalid Authorization header value")]
    Header(#[from] ureq::http::header::InvalidHeaderValue),
}

/// RSA key loading/parsing error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    /// Key file could not be read.
    #[error("failed to read key file {path}")]
    Io {
        /// Path of the key file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid UTF-8 in key file.
    #[error("invalid UTF-8 in key")]
    InvalidUtf8(#[from] Utf8Error),

    /// PKCS#1 key parsing error.
    #[error("PKCS#1 key error")]
    Pkcs1(#[from] rsa::pkcs1::Error),

    /// PKCS#8 key parsing error (any PEM not labelled `RSA PRIVATE KEY`).
    #[error("PKCS#8 key error")]
    Pkcs8(#[from] rsa::pkcs8::Error),
}

/// Failure to build a credential context from configuration.
#[derive(Debug, thiserror::Error)]
pub enum CredentialSourceError {
    /// Configuration section is invalid.
    #[error("credential configuration error")]
    Config(#[from] ipp_config::ConfigError),

    /// Private key could not be loaded.
    #[error("RSA key error")]
    Key(#[from] KeyError),

    /// Credential values are invalid.
    #[error("invalid credential")]
    InvalidCredential(#[from] InvalidCredentialError),
}
