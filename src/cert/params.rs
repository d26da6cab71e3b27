use std::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use time::Duration;
use time::OffsetDateTime;
use x509_cert::name::RdnSequence;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use super::extensions::ToAndFromX509Extension;
use crate::error::{CertStoreError, Result};
use crate::key::KeyPair;

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `subject_alt_names` - DNS names placed in the subjectAltName extension.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `extensions` - Additional X.509 extensions.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    #[builder(default)]
    pub subject_alt_names: Vec<String>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

impl CertificationRequestInfo {
    /// Starts a request for the public half of `key`.
    pub fn for_key(subject: DistinguishedName, key: &KeyPair) -> Result<Self> {
        Ok(Self::builder()
            .subject(subject)
            .subject_public_key(key.public_key_info()?)
            .build())
    }
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: Option<String>,
    pub country: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Only the attributes that are set are emitted.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        let attributes = [
            ("CN", &self.common_name),
            ("OU", &self.organization_unit),
            ("O", &self.organization),
            ("C", &self.country),
        ];
        let rfc4514_name = attributes
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key}={}", escape(v))))
            .collect::<Vec<_>>()
            .join(",");
        if rfc4514_name.is_empty() {
            return Ok(RdnSequence(Vec::new()));
        }
        RdnSequence::from_str(&rfc4514_name)
            .map_err(|e| CertStoreError::InvalidInput(format!("{rfc4514_name:?}: {e}")))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes without a string value are skipped.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let mut dn = DistinguishedName::default();
        for attr in x509dn.0.iter().flat_map(|rdn| rdn.0.iter()) {
            let Ok(value) = attr.value.decode_as::<String>().or_else(|_| {
                attr.value
                    .decode_as::<der::asn1::PrintableStringRef<'_>>()
                    .map(|s| s.to_string())
            }) else {
                continue;
            };
            match attr.oid.to_string().as_str() {
                "2.5.4.3" => dn.common_name = Some(value),
                "2.5.4.6" => dn.country = Some(value),
                "2.5.4.10" => dn.organization = Some(value),
                "2.5.4.11" => dn.organization_unit = Some(value),
                _ => {}
            }
        }
        dn
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }
}
