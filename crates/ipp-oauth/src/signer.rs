//! HMAC-SHA1 and RSA-SHA1 signature methods (RFC 5849 Section 3.4.2-3.4.3).

use std::fmt;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::{Hmac, Mac};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use sha1::Sha1;

use crate::encode::percent_encode;
use crate::error::{AuthorizationError, SigningKeyMissingError};

/// OAuth signature method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureMethod {
    /// Shared-secret signing for user-delegated access.
    HmacSha1,
    /// Private-key signing for application-level access.
    RsaSha1,
}

impl SignatureMethod {
    /// Value sent as `oauth_signature_method`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HmacSha1 => "HMAC-SHA1",
            Self::RsaSha1 => "RSA-SHA1",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key material for one signature method.
///
/// Signing is a pure function of the base string and the key material.
#[derive(Clone, Copy)]
pub enum Signer<'a> {
    /// HMAC-SHA1 keyed with `consumer_secret&token_secret`.
    HmacSha1 {
        /// OAuth consumer secret.
        consumer_secret: &'a str,
        /// OAuth token secret (empty when there is no token).
        token_secret: &'a str,
    },
    /// RSASSA-PKCS1-v1_5 with SHA-1.
    RsaSha1 {
        /// Private key, if one has been configured.
        private_key: Option<&'a RsaPrivateKey>,
    },
}

impl Signer<'_> {
    /// Signature method implemented by this signer.
    pub const fn method(&self) -> SignatureMethod {
        match self {
            Self::HmacSha1 { .. } => SignatureMethod::HmacSha1,
            Self::RsaSha1 { .. } => SignatureMethod::RsaSha1,
        }
    }

    /// Sign `base_string` and return the base64-encoded signature.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::SigningKeyMissing`] for RSA-SHA1 without
    /// a key, [`AuthorizationError::HmacKey`] if the MAC rejects the key, or
    /// [`AuthorizationError::Signature`] if RSA signing fails.
    pub fn sign(&self, base_string: &str) -> Result<String, AuthorizationError> {
        match *self {
            Self::HmacSha1 {
                consumer_secret,
                token_secret,
            } => sign_hmac_sha1(&hmac_key(consumer_secret, token_secret), base_string),
            Self::RsaSha1 { private_key } => {
                let private_key = private_key.ok_or(SigningKeyMissingError)?;
                sign_rsa_sha1(private_key, base_string)
            }
        }
    }
}

/// HMAC-SHA1 key: both secrets encoded and joined by a literal `&`.
fn hmac_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

fn sign_hmac_sha1(key: &str, data: &str) -> Result<String, AuthorizationError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())?;
    mac.update(data.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

fn sign_rsa_sha1(private_key: &RsaPrivateKey, data: &str) -> Result<String, AuthorizationError> {
    let signing_key = SigningKey::<Sha1>::new(private_key.clone());
    let signature = signing_key.try_sign(data.as_bytes())?;
    Ok(BASE64_STANDARD.encode(signature.to_bytes()))
}
