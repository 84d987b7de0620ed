//! OAuth 1.0a request authorization for the IPP API client.
//!
//! This crate signs outgoing requests per RFC 5849 with either:
//! - HMAC-SHA1 for user-delegated access (consumer and access token secrets)
//! - RSA-SHA1 for application-level access (application token and private key)
//!
//! [`RequestAuthorizer`] runs the pipeline and appends the `Authorization`
//! header; the building blocks are public for callers that need the base
//! string or the header value on their own.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ipp_config::OAuthEndpoints;
//! use ipp_oauth::{CredentialContext, RequestAuthorizer, RequestDescriptor};
//!
//! let credentials = CredentialContext::hmac("access_token", "access_secret", "consumer_key", "consumer_secret")?;
//! let authorizer = RequestAuthorizer::new(Arc::new(credentials), OAuthEndpoints::default());
//!
//! let mut request = RequestDescriptor::parse("GET", "https://quickbooks.api.intuit.com/v3/company/123/query?query=select%20*%20from%20Customer")?;
//! authorizer.authorize(&mut request)?;
//! ```

// Request authorization
mod authorizer;
pub use authorizer::RequestAuthorizer;

// Credentials
mod credentials;
pub use credentials::{CredentialContext, CredentialSnapshot};

// Request descriptor
mod request;
pub use request::{RequestDescriptor, SignableBody};

// Signing primitives
pub mod base_string;
pub mod encode;
pub mod header;
pub mod key;
mod signer;
pub use signer::{SignatureMethod, Signer};

// Errors
pub mod error;
pub use error::{
    AuthorizationError, EncodingError, InvalidCredentialError, SigningKeyMissingError,
};
