use der::Encode;
use log::debug;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{BasicConstraints, SubjectAltName, SubjectKeyIdentifier};
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use crate::error::Result;
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a certificate based on the provided certification request information.
    ///
    /// The certificate carries basicConstraints, a subject key identifier,
    /// and a subjectAltName extension when the request lists DNS names.
    fn issue(&self, cert_request: &CertificationRequestInfo, validity: Validity) -> Result<Certificate> {
        let signing_key = self.signing_key();
        let signature_algorithm = signing_key.signature_algorithm();

        let basic_constraints = BasicConstraints {
            is_ca: cert_request.is_ca,
            max_path_length: None,
        };
        let mut extensions: Vec<ExtensionParam> = vec![
            ExtensionParam::from_extension(basic_constraints, true)?,
            ExtensionParam::from_extension(
                SubjectKeyIdentifier::from_spki(&cert_request.subject_public_key),
                false,
            )?,
        ];
        if !cert_request.subject_alt_names.is_empty() {
            let san = SubjectAltName {
                names: cert_request.subject_alt_names.clone(),
            };
            extensions.push(ExtensionParam::from_extension(san, false)?);
        }
        extensions.extend(cert_request.extensions.iter().cloned());

        let mut serial_number: [u8; 16] = rand::random();
        // Positive and minimally encoded.
        serial_number[0] = (serial_number[0] & 0x7f) | 0x40;

        let tbs_cert = TbsCertificate {
            serial_number: serial_number.to_vec(),
            signature_algorithm: signature_algorithm.clone(),
            issuer: self.issuer_name(),
            not_before: validity.not_before,
            not_after: validity.not_after,
            subject: cert_request.subject.as_x509_name()?,
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = signing_key.sign_data(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        debug!(
            "issued certificate for {} signed by {}",
            cert_inner.tbs_certificate.subject, cert_inner.tbs_certificate.issuer
        );
        Certificate::from_x509(cert_inner)
    }
}
