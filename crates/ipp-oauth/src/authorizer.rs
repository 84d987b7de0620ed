//! Request authorization façade.
//!
//! Runs the whole signing pipeline for one request:
//! 1. Build the protocol parameter set with a fresh nonce and timestamp
//! 2. Canonicalize it with the request's query/body parameters and build
//!    the signature base string
//! 3. Sign the base string
//! 4. Assemble the `Authorization` header value
//! 5. Attach it to the request
//!
//! Steps 1-4 never touch the request, so a failure leaves it unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ipp_config::{Config, OAuthEndpoints};
use ureq::http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use url::Url;

use crate::base_string;
use crate::credentials::{CredentialContext, CredentialSnapshot};
use crate::encode::canonicalize;
use crate::error::{AuthorizationError, CredentialSourceError};
use crate::header::{self, OAUTH_SIGNATURE};
use crate::request::{RequestDescriptor, SignableBody, request_parameters};

/// Protocol version sent as `oauth_version`.
const OAUTH_VERSION: &str = "1.0";

/// Header-only parameter excluded from the signature (RFC 5849 Section 3.4.1.3.1).
const REALM: &str = "realm";

/// Signs outgoing requests with a shared [`CredentialContext`].
#[derive(Debug, Clone)]
pub struct RequestAuthorizer {
    credentials: Arc<CredentialContext>,
    endpoints: OAuthEndpoints,
}

impl RequestAuthorizer {
    /// Create an authorizer.
    pub fn new(credentials: Arc<CredentialContext>, endpoints: OAuthEndpoints) -> Self {
        tracing::debug!(
            request_token_url = %endpoints.request_token_url,
            authorize_url = %endpoints.authorize_url,
            access_token_url = %endpoints.access_token_url,
            signature_method = %credentials.signature_method(),
            "Created request authorizer"
        );
        Self {
            credentials,
            endpoints,
        }
    }

    /// Create an authorizer from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an `[oauth]` URL is invalid, `[credentials]` is
    /// missing or invalid, or the RSA key file cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self, CredentialSourceError> {
        config.validate()?;
        let credentials = CredentialContext::from_config(config.require_credentials()?)?;
        Ok(Self::new(Arc::new(credentials), config.oauth.clone()))
    }

    /// Shared credential context.
    pub fn credentials(&self) -> &Arc<CredentialContext> {
        &self.credentials
    }

    /// OAuth provider endpoints.
    pub fn endpoints(&self) -> &OAuthEndpoints {
        &self.endpoints
    }

    /// Sign `request` with a fresh nonce and the current time, then set
    /// the `Authorization` header, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError`] and leaves `request` unchanged if any
    /// step fails.
    pub fn authorize(&self, request: &mut RequestDescriptor) -> Result<(), AuthorizationError> {
        self.authorize_with(request, &generate_nonce(), generate_timestamp())
    }

    /// Like [`RequestAuthorizer::authorize`] with a caller-supplied nonce and
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError`] and leaves `request` unchanged if any
    /// step fails.
    pub fn authorize_with(
        &self,
        request: &mut RequestDescriptor,
        nonce: &str,
        timestamp: u64,
    ) -> Result<(), AuthorizationError> {
        let header = self.authorization_header(request, nonce, timestamp)?;
        request.set_header(header::AUTHORIZATION, header);
        Ok(())
    }

    /// Compute the `Authorization` header value without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError`] if a parameter cannot be decoded or
    /// signing fails.
    pub fn authorization_header(
        &self,
        request: &RequestDescriptor,
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, AuthorizationError> {
        self.sign(
            request.method(),
            request.uri(),
            request.signed_parameters()?,
            nonce,
            timestamp,
        )
    }

    /// Signature base string that [`RequestAuthorizer::authorization_header`]
    /// signs for the same inputs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::Encoding`] if a parameter cannot be
    /// decoded.
    pub fn signature_base_string(
        &self,
        request: &RequestDescriptor,
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, AuthorizationError> {
        let request_params = request.signed_parameters()?;
        let snapshot = self.credentials.snapshot();
        let prepared = prepare(
            &snapshot,
            request.method(),
            request.uri(),
            &request_params,
            nonce,
            timestamp,
        );
        Ok(prepared.base_string)
    }

    /// Sign a `ureq` request in place, replacing any `Authorization` header.
    ///
    /// Form-encoded bodies are included in the signature when the request
    /// carries a matching `Content-Type`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError`] and leaves `request` unchanged if any
    /// step fails.
    pub fn authorize_http<B: SignableBody>(
        &self,
        request: &mut ureq::http::Request<B>,
    ) -> Result<(), AuthorizationError> {
        self.authorize_http_with(request, &generate_nonce(), generate_timestamp())
    }

    /// Like [`RequestAuthorizer::authorize_http`] with a caller-supplied
    /// nonce and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError`] and leaves `request` unchanged if any
    /// step fails.
    pub fn authorize_http_with<B: SignableBody>(
        &self,
        request: &mut ureq::http::Request<B>,
        nonce: &str,
        timestamp: u64,
    ) -> Result<(), AuthorizationError> {
        let uri = Url::parse(&request.uri().to_string())?;
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        let params = request_parameters(&uri, content_type, request.body().body_bytes())?;

        let header = self.sign(request.method().as_str(), &uri, params, nonce, timestamp)?;
        let value = HeaderValue::from_str(&header)?;

        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    fn sign(
        &self,
        method: &str,
        uri: &Url,
        request_params: Vec<(String, String)>,
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, AuthorizationError> {
        let snapshot = self.credentials.snapshot();
        let prepared = prepare(&snapshot, method, uri, &request_params, nonce, timestamp);

        let signer = snapshot.signer();
        let signature = signer.sign(&prepared.base_string)?;

        tracing::debug!(
            method,
            signature_method = %signer.method(),
            oauth_params = prepared.oauth_params.len(),
            request_params = request_params.len(),
            "Signed request"
        );

        Ok(header::assemble(&prepared.oauth_params, &signature))
    }
}

/// Parameter set and base string for one authorization.
struct Prepared {
    oauth_params: BTreeMap<String, String>,
    base_string: String,
}

fn prepare(
    snapshot: &CredentialSnapshot<'_>,
    method: &str,
    uri: &Url,
    request_params: &[(String, String)],
    nonce: &str,
    timestamp: u64,
) -> Prepared {
    let oauth_params = protocol_parameters(snapshot, nonce, timestamp);

    let signature_params = oauth_params
        .iter()
        .filter(|(k, _)| k.as_str() != REALM)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(request_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let canonical = canonicalize(signature_params);
    let base_string = base_string::build(method, uri, &canonical);

    Prepared {
        oauth_params,
        base_string,
    }
}

/// OAuth parameters echoed in the header.
///
/// Additional parameters override derived values of the same name.
fn protocol_parameters(
    snapshot: &CredentialSnapshot<'_>,
    nonce: &str,
    timestamp: u64,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("oauth_consumer_key".to_owned(), snapshot.consumer_key().to_owned());
    params.insert("oauth_nonce".to_owned(), nonce.to_owned());
    params.insert(
        "oauth_signature_method".to_owned(),
        snapshot.signature_method().as_str().to_owned(),
    );
    params.insert("oauth_timestamp".to_owned(), timestamp.to_string());
    params.insert("oauth_version".to_owned(), OAUTH_VERSION.to_owned());
    if let Some(token) = snapshot.access_token() {
        params.insert("oauth_token".to_owned(), token.to_owned());
    }

    for (name, value) in snapshot.additional_parameters() {
        if name == OAUTH_SIGNATURE {
            tracing::warn!("Ignoring caller-supplied oauth_signature parameter");
            continue;
        }
        params.insert(name.clone(), value.clone());
    }

    params
}

/// Generate cryptographically random nonce (128 bits, 32 hex characters).
fn generate_nonce() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Current Unix time in seconds.
fn generate_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
