//! Credential context for signing requests.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use ipp_config::{CredentialsConfig, CredentialsMode};
use rsa::RsaPrivateKey;

use crate::error::{CredentialSourceError, InvalidCredentialError};
use crate::key::load_private_key_from_file;
use crate::signer::{SignatureMethod, Signer};

/// Consumer and token credentials plus the selected signature method.
///
/// Required fields are validated on construction. The signing key and the
/// additional header parameters can be replaced later; each replacement
/// publishes a new `Arc` so an authorization in progress keeps the snapshot
/// it started with.
///
/// # Thread Safety
///
/// The context is `Send + Sync` and meant to be shared behind an `Arc`
/// across concurrent authorizations.
pub struct CredentialContext {
    consumer_key: String,
    consumer_secret: Option<String>,
    access_token: Option<String>,
    access_token_secret: Option<String>,
    signature_method: SignatureMethod,
    /// Current signing key (atomically swappable).
    signing_key: RwLock<Option<Arc<RsaPrivateKey>>>,
    /// Current additional header parameters (atomically swappable).
    additional_parameters: RwLock<Arc<Vec<(String, String)>>>,
}

impl CredentialContext {
    /// Create an HMAC-SHA1 context for user-delegated access.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCredentialError`] naming the first field that is
    /// empty or whitespace-only.
    pub fn hmac(
        access_token: &str,
        access_token_secret: &str,
        consumer_key: &str,
        consumer_secret: &str,
    ) -> Result<Self, InvalidCredentialError> {
        let access_token = require(access_token, "access_token")?;
        let access_token_secret = require(access_token_secret, "access_token_secret")?;
        let consumer_key = require(consumer_key, "consumer_key")?;
        let consumer_secret = require(consumer_secret, "consumer_secret")?;

        Ok(Self::with_fields(
            consumer_key,
            Some(consumer_secret),
            Some(access_token),
            Some(access_token_secret),
            SignatureMethod::HmacSha1,
        ))
    }

    /// Create an RSA-SHA1 context for application-level access.
    ///
    /// The signing key is assigned separately with
    /// [`CredentialContext::set_signing_key`] or
    /// [`CredentialContext::with_signing_key`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCredentialError`] if `application_token` is blank.
    pub fn rsa(application_token: &str) -> Result<Self, InvalidCredentialError> {
        let consumer_key = require(application_token, "application_token")?;
        Ok(Self::with_fields(
            consumer_key,
            None,
            None,
            None,
            SignatureMethod::RsaSha1,
        ))
    }

    /// Create a context from the `[credentials]` config section.
    ///
    /// RSA mode loads the PEM key file named by the section.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is invalid or the key cannot be loaded.
    pub fn from_config(config: &CredentialsConfig) -> Result<Self, CredentialSourceError> {
        match config.mode()? {
            CredentialsMode::HmacSha1 {
                consumer_key,
                consumer_secret,
                access_token,
                access_token_secret,
            } => Ok(Self::hmac(
                access_token,
                access_token_secret,
                consumer_key,
                consumer_secret,
            )?),
            CredentialsMode::RsaSha1 {
                consumer_key,
                key_path,
            } => {
                let private_key = load_private_key_from_file(key_path)?;
                Ok(Self::rsa(consumer_key)?.with_signing_key(private_key))
            }
        }
    }

    fn with_fields(
        consumer_key: String,
        consumer_secret: Option<String>,
        access_token: Option<String>,
        access_token_secret: Option<String>,
        signature_method: SignatureMethod,
    ) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
            signature_method,
            signing_key: RwLock::new(None),
            additional_parameters: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Builder-style variant of [`CredentialContext::set_signing_key`].
    #[must_use]
    pub fn with_signing_key(self, private_key: RsaPrivateKey) -> Self {
        self.set_signing_key(private_key);
        self
    }

    /// Consumer key (application token in RSA mode).
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Access token, present in HMAC mode.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Signature method chosen at construction.
    pub fn signature_method(&self) -> SignatureMethod {
        self.signature_method
    }

    /// Replace the signing key.
    pub fn set_signing_key(&self, private_key: RsaPrivateKey) {
        *self
            .signing_key
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(private_key));
        tracing::info!(consumer_key = %self.consumer_key, "Signing key replaced");
    }

    /// Remove the signing key.
    pub fn clear_signing_key(&self) {
        *self
            .signing_key
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!(consumer_key = %self.consumer_key, "Signing key cleared");
    }

    /// Replace all additional header parameters.
    pub fn set_additional_parameters<K, V>(&self, params: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        *self
            .additional_parameters
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(params);
    }

    /// Append one additional header parameter.
    ///
    /// A later entry with the same name wins when the header is assembled.
    pub fn add_additional_parameter(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut guard = self
            .additional_parameters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut params = Vec::clone(&guard);
        params.push((name.into(), value.into()));
        *guard = Arc::new(params);
    }

    /// Take a consistent view of the mutable fields for one authorization.
    pub fn snapshot(&self) -> CredentialSnapshot<'_> {
        let signing_key = self
            .signing_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let additional_parameters = Arc::clone(
            &self
                .additional_parameters
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        );

        CredentialSnapshot {
            context: self,
            signing_key,
            additional_parameters,
        }
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .field("signature_method", &self.signature_method)
            .finish_non_exhaustive()
    }
}

/// Credentials as seen by a single authorization.
pub struct CredentialSnapshot<'a> {
    context: &'a CredentialContext,
    signing_key: Option<Arc<RsaPrivateKey>>,
    additional_parameters: Arc<Vec<(String, String)>>,
}

impl CredentialSnapshot<'_> {
    /// Consumer key.
    pub fn consumer_key(&self) -> &str {
        &self.context.consumer_key
    }

    /// Access token, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.context.access_token.as_deref()
    }

    /// Signature method.
    pub fn signature_method(&self) -> SignatureMethod {
        self.context.signature_method
    }

    /// Additional header parameters in insertion order.
    pub fn additional_parameters(&self) -> &[(String, String)] {
        &self.additional_parameters
    }

    /// Signer for the context's signature method and key material.
    pub fn signer(&self) -> Signer<'_> {
        match self.context.signature_method {
            SignatureMethod::HmacSha1 => Signer::HmacSha1 {
                consumer_secret: self.context.consumer_secret.as_deref().unwrap_or(""),
                token_secret: self.context.access_token_secret.as_deref().unwrap_or(""),
            },
            SignatureMethod::RsaSha1 => Signer::RsaSha1 {
                private_key: self.signing_key.as_deref(),
            },
        }
    }
}

/// Reject empty and whitespace-only values.
fn require(value: &str, field: &'static str) -> Result<String, InvalidCredentialError> {
    if value.trim().is_empty() {
        return Err(InvalidCredentialError { field });
    }
    Ok(value.to_owned())
}
