pub mod extensions;
pub mod params;

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::{rfc5912, rfc8410};
use der::asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef};
use der::{Decode, Encode, Tag, Tagged};
use extensions::ToAndFromX509Extension;
use params::{CertificationRequestInfo, DistinguishedName};
use rsa::pkcs1::RsaPssParams;
use x509_cert::Certificate as X509Certificate;
use x509_cert::attr::AttributeValue;
use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::Result;
use crate::issuer::Issuer;
use crate::key::KeyPair;
use crate::pem_utils;

const MD5_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4");
const ECDSA_WITH_SHA_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");
const ID_MD_5: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.2.5");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Represents the signature algorithms a certificate can be signed with.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// MD5 with RSA encryption.
    Md5WithRSA,
    /// SHA-1 with RSA encryption.
    Sha1WithRSA,
    /// SHA-224 with RSA encryption.
    Sha224WithRSA,
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-384 with RSA encryption.
    Sha384WithRSA,
    /// SHA-512 with RSA encryption.
    Sha512WithRSA,
    /// RSASSA-PSS; the digest lives in the algorithm parameters.
    RsaPss,
    /// SHA-1 with ECDSA.
    Sha1WithECDSA,
    /// SHA-224 with ECDSA.
    Sha224WithECDSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
    /// Pure Ed25519.
    Ed25519,
    /// Any algorithm not listed above.
    Unknown(ObjectIdentifier),
}

impl SignatureAlgorithm {
    pub fn from_oid(oid: ObjectIdentifier) -> Self {
        match oid {
            MD5_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Md5WithRSA,
            rfc5912::SHA_1_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Sha1WithRSA,
            rfc5912::SHA_224_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Sha224WithRSA,
            rfc5912::SHA_256_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Sha256WithRSA,
            rfc5912::SHA_384_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Sha384WithRSA,
            rfc5912::SHA_512_WITH_RSA_ENCRYPTION => SignatureAlgorithm::Sha512WithRSA,
            rfc5912::ID_RSASSA_PSS => SignatureAlgorithm::RsaPss,
            ECDSA_WITH_SHA_1 => SignatureAlgorithm::Sha1WithECDSA,
            rfc5912::ECDSA_WITH_SHA_224 => SignatureAlgorithm::Sha224WithECDSA,
            rfc5912::ECDSA_WITH_SHA_256 => SignatureAlgorithm::Sha256WithECDSA,
            rfc5912::ECDSA_WITH_SHA_384 => SignatureAlgorithm::Sha384WithECDSA,
            rfc5912::ECDSA_WITH_SHA_512 => SignatureAlgorithm::Sha512WithECDSA,
            rfc8410::ID_ED_25519 => SignatureAlgorithm::Ed25519,
            other => SignatureAlgorithm::Unknown(other),
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Md5WithRSA => MD5_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha1WithRSA => rfc5912::SHA_1_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha224WithRSA => rfc5912::SHA_224_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha256WithRSA => rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRSA => rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::RsaPss => rfc5912::ID_RSASSA_PSS,
            SignatureAlgorithm::Sha1WithECDSA => ECDSA_WITH_SHA_1,
            SignatureAlgorithm::Sha224WithECDSA => rfc5912::ECDSA_WITH_SHA_224,
            SignatureAlgorithm::Sha256WithECDSA => rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithECDSA => rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::Sha512WithECDSA => rfc5912::ECDSA_WITH_SHA_512,
            SignatureAlgorithm::Ed25519 => rfc8410::ID_ED_25519,
            SignatureAlgorithm::Unknown(oid) => *oid,
        }
    }

    /// The digest of an algorithm identifier whose hash is implied by its OID.
    fn fixed_digest(&self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::Md5WithRSA => DigestAlgorithm::Md5,
            SignatureAlgorithm::Sha1WithRSA | SignatureAlgorithm::Sha1WithECDSA => {
                DigestAlgorithm::Sha1
            }
            SignatureAlgorithm::Sha224WithRSA | SignatureAlgorithm::Sha224WithECDSA => {
                DigestAlgorithm::Sha224
            }
            SignatureAlgorithm::Sha256WithRSA | SignatureAlgorithm::Sha256WithECDSA => {
                DigestAlgorithm::Sha256
            }
            SignatureAlgorithm::Sha384WithRSA | SignatureAlgorithm::Sha384WithECDSA => {
                DigestAlgorithm::Sha384
            }
            SignatureAlgorithm::Sha512WithRSA | SignatureAlgorithm::Sha512WithECDSA => {
                DigestAlgorithm::Sha512
            }
            SignatureAlgorithm::Ed25519 => DigestAlgorithm::Intrinsic,
            SignatureAlgorithm::RsaPss | SignatureAlgorithm::Unknown(_) => DigestAlgorithm::Unknown,
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    fn from(value: SignatureAlgorithm) -> Self {
        AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters: None,
        }
    }
}

/// The message digest a certificate signature was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    /// The signature scheme hashes internally (Ed25519).
    Intrinsic,
    Unknown,
}

impl DigestAlgorithm {
    pub fn from_oid(oid: ObjectIdentifier) -> Self {
        match oid {
            ID_MD_5 => DigestAlgorithm::Md5,
            rfc5912::ID_SHA_1 => DigestAlgorithm::Sha1,
            rfc5912::ID_SHA_224 => DigestAlgorithm::Sha224,
            rfc5912::ID_SHA_256 => DigestAlgorithm::Sha256,
            rfc5912::ID_SHA_384 => DigestAlgorithm::Sha384,
            rfc5912::ID_SHA_512 => DigestAlgorithm::Sha512,
            _ => DigestAlgorithm::Unknown,
        }
    }

    /// Resolves the digest of a signature algorithm identifier, reading
    /// RSASSA-PSS parameters when present.
    pub fn for_signature(algorithm: &AlgorithmIdentifierOwned) -> Self {
        let signature_algorithm = SignatureAlgorithm::from_oid(algorithm.oid);
        if signature_algorithm != SignatureAlgorithm::RsaPss {
            return signature_algorithm.fixed_digest();
        }
        match &algorithm.parameters {
            // Absent parameters mean the RFC 4055 defaults, SHA-1 included.
            None => DigestAlgorithm::Sha1,
            Some(params) => params
                .decode_as::<RsaPssParams<'_>>()
                .map(|pss| DigestAlgorithm::from_oid(pss.hash.oid))
                .unwrap_or(DigestAlgorithm::Unknown),
        }
    }
}

/// Metadata derived once from a parsed certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// The issuer name equals the subject name.
    pub self_signed: bool,
    pub signature_algorithm: SignatureAlgorithm,
    pub signature_digest: DigestAlgorithm,
}

impl CertInfo {
    fn from_x509(cert: &X509Certificate) -> Self {
        let tbs = &cert.tbs_certificate;
        CertInfo {
            self_signed: tbs.issuer == tbs.subject,
            signature_algorithm: SignatureAlgorithm::from_oid(cert.signature_algorithm.oid),
            signature_digest: DigestAlgorithm::for_signature(&cert.signature_algorithm),
        }
    }
}

/// Represents a parsed X.509 certificate together with its encoding.
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    inner: X509Certificate,
    info: CertInfo,
}

impl Certificate {
    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = X509Certificate::from_der(der)?;
        let info = CertInfo::from_x509(&inner);
        Ok(Self {
            der: der.to_vec(),
            inner,
            info,
        })
    }

    /// Parses the first certificate of a PEM document.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let ders = pem_utils::pem_to_der_chain(pem_str)?;
        let der = ders.first().ok_or_else(|| {
            crate::error::CertStoreError::DecodingError("no certificate block found".to_string())
        })?;
        Self::from_der(der)
    }

    pub(crate) fn from_x509(inner: X509Certificate) -> Result<Self> {
        let der = inner.to_der()?;
        let info = CertInfo::from_x509(&inner);
        Ok(Self { der, inner, info })
    }

    /// The DER encoding the certificate was parsed from.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> String {
        pem_utils::der_to_pem(&self.der, "CERTIFICATE")
    }

    /// The underlying `x509-cert` structure.
    pub fn inner(&self) -> &X509Certificate {
        &self.inner
    }

    pub fn info(&self) -> &CertInfo {
        &self.info
    }

    pub fn is_self_signed(&self) -> bool {
        self.info.self_signed
    }

    pub fn signature_algorithm(&self) -> &SignatureAlgorithm {
        &self.info.signature_algorithm
    }

    pub fn signature_digest(&self) -> DigestAlgorithm {
        self.info.signature_digest
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// Whether `next` is the certificate that issued this one.
    pub fn is_issued_by(&self, next: &Certificate) -> bool {
        self.issuer() == next.subject()
    }

    /// The last Common Name attribute of the subject, if any.
    pub fn common_name(&self) -> Option<String> {
        self.subject()
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .filter(|attr| attr.oid == COMMON_NAME)
            .filter_map(|attr| directory_string(&attr.value))
            .last()
    }

    /// DNS names listed in the subjectAltName extension.
    pub fn dns_names(&self) -> Result<Vec<String>> {
        let Some(extensions) = &self.inner.tbs_certificate.extensions else {
            return Ok(Vec::new());
        };
        let mut names = Vec::new();
        for ext in extensions
            .iter()
            .filter(|ext| ext.extn_id == extensions::SubjectAltName::OID)
        {
            let san = extensions::SubjectAltName::from_x509_extension_value(ext.extn_value.as_bytes())?;
            names.extend(san.names);
        }
        Ok(names)
    }

    /// Extracts certificate information into a `CertificationRequestInfo` object.
    ///
    /// Used to re-issue a certificate, such as when rotating a leaf under a
    /// new intermediate.
    pub fn to_cert_info(&self) -> Result<CertificationRequestInfo> {
        let subject_public_key = self.inner.tbs_certificate.subject_public_key_info.clone();
        let is_ca = self
            .inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .filter(|ext| ext.extn_id == extensions::BasicConstraints::OID)
            .find_map(|ext| {
                extensions::BasicConstraints::from_x509_extension_value(ext.extn_value.as_bytes())
                    .ok()
            })
            .map(|bc| bc.is_ca)
            .unwrap_or(false);

        Ok(CertificationRequestInfo {
            subject: DistinguishedName::from_x509_name(self.subject()),
            subject_public_key,
            subject_alt_names: self.dns_names()?,
            is_ca,
            extensions: Vec::new(),
        })
    }

    /// Creates a new self-signed certificate.
    ///
    /// # Arguments
    /// * `cert_info` - The certification request information.
    /// * `key` - The key pair used to sign the certificate.
    /// * `validity` - The validity period.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: params::Validity,
    ) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.as_x509_name()?,
            key,
        };
        self_issuer.issue(cert_info, validity)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject().to_string())
            .field("issuer", &self.issuer().to_string())
            .field("info", &self.info)
            .finish()
    }
}

fn directory_string(value: &AttributeValue) -> Option<String> {
    match value.tag() {
        Tag::Utf8String => value.decode_as::<Utf8StringRef<'_>>().ok().map(|s| s.to_string()),
        Tag::PrintableString => value
            .decode_as::<PrintableStringRef<'_>>()
            .ok()
            .map(|s| s.to_string()),
        Tag::Ia5String => value.decode_as::<Ia5StringRef<'_>>().ok().map(|s| s.to_string()),
        _ => None,
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

/// A certificate together with the key that can issue under it.
#[derive(Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl fmt::Debug for CertificateWithPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateWithPrivateKey")
            .field("cert", &self.cert)
            .field("key", &self.key)
            .finish()
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject().clone()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}
