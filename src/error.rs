//! use certstore::error::CertStoreError;

use thiserror::Error;

use crate::key::AuthMethod;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, CertStoreError>;

/// Represents errors that can occur while building, registering, or
/// selecting certificate chains.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertStoreError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding (malformed PEM, DER, or key material).
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error while producing a signature.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// The key algorithm or curve is not one this crate can use.
    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    /// A chain was built from zero certificates.
    #[error("Certificate chain is empty")]
    EmptyChain,

    /// Certificate `index` was not issued by certificate `index + 1`.
    #[error("Certificate {index} in the chain is not issued by the certificate that follows it")]
    BrokenChain { index: usize },

    /// The private key does not belong to the leaf certificate.
    #[error("Private key does not match the leaf certificate public key")]
    KeyMismatch,

    /// The leaf carries no usable domain names and none were supplied.
    #[error("Certificate has no valid domain names")]
    NoValidDomains,

    /// Both registration APIs were used on the same configuration.
    #[error("Certificate ownership conflict: library-owned and application-owned chains cannot be mixed")]
    CertOwnershipConflict,

    /// A second default chain was supplied for one auth method.
    #[error("A default certificate for {0} is already configured")]
    MultipleDefaultCertificatesPerAuthType(AuthMethod),

    /// No server name matched and no default chain exists.
    #[error("No default certificate is configured for the accepted auth methods")]
    NoDefaultCertificate,

    /// The matched name has no chain for the accepted auth methods.
    #[error("No certificate matches the accepted auth methods")]
    NoMatch,

    /// Several chains matched and no tiebreak resolver is configured.
    #[error("Multiple certificates match and no tiebreak resolver is configured")]
    AmbiguousCertificateSelection,
}

impl From<der::Error> for CertStoreError {
    /// Converts a `der::Error` into a `CertStoreError`.
    fn from(err: der::Error) -> Self {
        CertStoreError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertStoreError {
    fn from(err: pem::PemError) -> Self {
        CertStoreError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertStoreError {
    fn from(err: pkcs8::Error) -> Self {
        CertStoreError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertStoreError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertStoreError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertStoreError {
    fn from(err: rsa::Error) -> Self {
        CertStoreError::KeyGenerationError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CertStoreError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CertStoreError::DecodingError(err.to_string())
    }
}

impl From<ecdsa::signature::Error> for CertStoreError {
    fn from(err: ecdsa::signature::Error) -> Self {
        CertStoreError::SigningError(err.to_string())
    }
}
