use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::{rfc5912, rfc8410};
use der::Encode;
use der::asn1::BitString;
use ecdsa::signature::{SignatureEncoding, Signer};
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use pkcs8::{AlgorithmIdentifierRef, DecodePrivateKey, EncodePrivateKey, PrivateKeyInfo};
use rand_core::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use sha2::Sha256;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::cert::SignatureAlgorithm;
use crate::error::{CertStoreError, Result};
use crate::pem_utils;

/// The key-algorithm category a certificate chain can authenticate with.
///
/// The handshake layer derives the accepted methods from the negotiated
/// cipher suite or signature schemes, and chain selection only considers
/// chains whose leaf key falls into one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuthMethod {
    /// RSA keys (`rsaEncryption`), usable for PKCS#1 v1.5 and PSS signatures.
    Rsa,
    /// RSA keys restricted to PSS (`id-RSASSA-PSS`).
    RsaPss,
    /// ECDSA keys on P-256, P-384, or P-521.
    Ecdsa,
    /// Ed25519 keys.
    Ed25519,
}

impl AuthMethod {
    /// Every auth method, in a stable order.
    pub const ALL: [AuthMethod; 4] = [
        AuthMethod::Rsa,
        AuthMethod::RsaPss,
        AuthMethod::Ecdsa,
        AuthMethod::Ed25519,
    ];

    /// Classifies a certificate public key.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        match spki.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => Ok(AuthMethod::Rsa),
            rfc5912::ID_RSASSA_PSS => Ok(AuthMethod::RsaPss),
            rfc5912::ID_EC_PUBLIC_KEY => Ok(AuthMethod::Ecdsa),
            rfc8410::ID_ED_25519 => Ok(AuthMethod::Ed25519),
            other => Err(CertStoreError::UnsupportedKey(format!(
                "public key algorithm {other}"
            ))),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthMethod::Rsa => "RSA",
            AuthMethod::RsaPss => "RSA-PSS",
            AuthMethod::Ecdsa => "ECDSA",
            AuthMethod::Ed25519 => "Ed25519",
        };
        f.write_str(name)
    }
}

/// A private key together with everything derivable from it.
///
/// Supported key types for chain registration and certificate issuing.
///
/// `Debug` names the key type only; key material is never formatted.
#[derive(Clone)]
pub enum KeyPair {
    Rsa { private: Box<RsaPrivateKey> },
    RsaPss { private: Box<RsaPrivateKey> },
    EcdsaP256 { secret: p256::SecretKey },
    EcdsaP384 { secret: p384::SecretKey },
    EcdsaP521 { secret: p521::SecretKey },
    Ed25519 { signing_key: Ed25519SigningKey },
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            KeyPair::Rsa { .. } => "Rsa",
            KeyPair::RsaPss { .. } => "RsaPss",
            KeyPair::EcdsaP256 { .. } => "EcdsaP256",
            KeyPair::EcdsaP384 { .. } => "EcdsaP384",
            KeyPair::EcdsaP521 { .. } => "EcdsaP521",
            KeyPair::Ed25519 { .. } => "Ed25519",
        };
        f.debug_struct("KeyPair")
            .field("kind", &kind)
            .field("auth_method", &self.auth_method())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)?;
        Ok(KeyPair::Rsa {
            private: Box::new(private),
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        KeyPair::EcdsaP256 {
            secret: p256::SecretKey::random(&mut OsRng),
        }
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        KeyPair::EcdsaP384 {
            secret: p384::SecretKey::random(&mut OsRng),
        }
    }

    /// Generate an ECDSA P-521 key pair.
    pub fn generate_ecdsa_p521() -> Self {
        KeyPair::EcdsaP521 {
            secret: p521::SecretKey::random(&mut OsRng),
        }
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        KeyPair::Ed25519 {
            signing_key: Ed25519SigningKey::generate(&mut OsRng),
        }
    }

    /// Imports the first private key found in a PEM document.
    ///
    /// Accepts PKCS#8 (`PRIVATE KEY`), PKCS#1 (`RSA PRIVATE KEY`), and SEC1
    /// (`EC PRIVATE KEY`) blocks. Other blocks, such as the `EC PARAMETERS`
    /// block OpenSSL emits ahead of SEC1 keys, are skipped.
    pub fn import_from_pem(pem_str: &str) -> Result<Self> {
        let blocks = pem::parse_many(pem_str)?;
        let block = blocks
            .iter()
            .find(|block| block.tag().ends_with("PRIVATE KEY"))
            .ok_or_else(|| {
                CertStoreError::DecodingError("no private key block found".to_string())
            })?;

        match block.tag() {
            "PRIVATE KEY" => Self::import_from_pkcs8_der(block.contents()),
            "RSA PRIVATE KEY" => Ok(KeyPair::Rsa {
                private: Box::new(RsaPrivateKey::from_pkcs1_der(block.contents())?),
            }),
            "EC PRIVATE KEY" => Self::import_from_sec1_der(block.contents()),
            other => Err(CertStoreError::UnsupportedKey(format!(
                "PEM block {other:?}"
            ))),
        }
    }

    /// Imports a PKCS#8 `PrivateKeyInfo`, dispatching on its algorithm.
    pub fn import_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)?;
        match info.algorithm.oid {
            rfc5912::RSA_ENCRYPTION => Ok(KeyPair::Rsa {
                private: Box::new(RsaPrivateKey::from_pkcs8_der(der)?),
            }),
            rfc5912::ID_RSASSA_PSS => Ok(KeyPair::RsaPss {
                private: Box::new(RsaPrivateKey::from_pkcs1_der(info.private_key)?),
            }),
            rfc5912::ID_EC_PUBLIC_KEY => match info.algorithm.parameters_oid()? {
                rfc5912::SECP_256_R_1 => Ok(KeyPair::EcdsaP256 {
                    secret: p256::SecretKey::from_pkcs8_der(der)?,
                }),
                rfc5912::SECP_384_R_1 => Ok(KeyPair::EcdsaP384 {
                    secret: p384::SecretKey::from_pkcs8_der(der)?,
                }),
                rfc5912::SECP_521_R_1 => Ok(KeyPair::EcdsaP521 {
                    secret: p521::SecretKey::from_pkcs8_der(der)?,
                }),
                curve => Err(CertStoreError::UnsupportedKey(format!("EC curve {curve}"))),
            },
            rfc8410::ID_ED_25519 => Ok(KeyPair::Ed25519 {
                signing_key: Ed25519SigningKey::from_pkcs8_der(der)?,
            }),
            other => Err(CertStoreError::UnsupportedKey(format!(
                "private key algorithm {other}"
            ))),
        }
    }

    fn import_from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP256 { secret });
        }
        if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP384 { secret });
        }
        if let Ok(secret) = p521::SecretKey::from_sec1_der(der) {
            return Ok(KeyPair::EcdsaP521 { secret });
        }
        Err(CertStoreError::DecodingError(
            "SEC1 key is not on a supported curve".to_string(),
        ))
    }

    /// Encodes the key as PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            KeyPair::Rsa { private } => private.to_pkcs8_der()?,
            KeyPair::RsaPss { private } => {
                let pkcs1 = private.to_pkcs1_der()?;
                let algorithm = AlgorithmIdentifierRef {
                    oid: rfc5912::ID_RSASSA_PSS,
                    parameters: None,
                };
                return Ok(PrivateKeyInfo::new(algorithm, pkcs1.as_bytes()).to_der()?);
            }
            KeyPair::EcdsaP256 { secret } => secret.to_pkcs8_der()?,
            KeyPair::EcdsaP384 { secret } => secret.to_pkcs8_der()?,
            KeyPair::EcdsaP521 { secret } => secret.to_pkcs8_der()?,
            KeyPair::Ed25519 { signing_key } => signing_key.to_pkcs8_der()?,
        };
        Ok(document.as_bytes().to_vec())
    }

    /// Encodes the key as a PKCS#8 `PRIVATE KEY` PEM block.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(&self.to_pkcs8_der()?, "PRIVATE KEY"))
    }

    /// The auth method a certificate for this key authenticates with.
    pub fn auth_method(&self) -> AuthMethod {
        match self {
            KeyPair::Rsa { .. } => AuthMethod::Rsa,
            KeyPair::RsaPss { .. } => AuthMethod::RsaPss,
            KeyPair::EcdsaP256 { .. } | KeyPair::EcdsaP384 { .. } | KeyPair::EcdsaP521 { .. } => {
                AuthMethod::Ecdsa
            }
            KeyPair::Ed25519 { .. } => AuthMethod::Ed25519,
        }
    }

    /// The `SubjectPublicKeyInfo` of the public half of this key.
    pub fn public_key_info(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            KeyPair::Rsa { private } => SubjectPublicKeyInfoOwned::from_key(private.to_public_key())?,
            KeyPair::RsaPss { private } => {
                let pkcs1 = private.to_public_key().to_pkcs1_der()?;
                SubjectPublicKeyInfoOwned {
                    algorithm: AlgorithmIdentifierOwned {
                        oid: rfc5912::ID_RSASSA_PSS,
                        parameters: None,
                    },
                    subject_public_key: BitString::from_bytes(pkcs1.as_bytes())?,
                }
            }
            KeyPair::EcdsaP256 { secret } => SubjectPublicKeyInfoOwned::from_key(secret.public_key())?,
            KeyPair::EcdsaP384 { secret } => SubjectPublicKeyInfoOwned::from_key(secret.public_key())?,
            KeyPair::EcdsaP521 { secret } => SubjectPublicKeyInfoOwned::from_key(secret.public_key())?,
            KeyPair::Ed25519 { signing_key } => {
                SubjectPublicKeyInfoOwned::from_key(signing_key.verifying_key())?
            }
        };
        Ok(spki)
    }

    /// Whether `spki` is the public half of this key.
    ///
    /// Algorithm, named curve, and key bits must all agree. Algorithm
    /// parameters other than a curve name (RSA-PSS constraints) are ignored.
    pub fn matches_public_key(&self, spki: &SubjectPublicKeyInfoOwned) -> Result<bool> {
        let own = self.public_key_info()?;
        Ok(own.algorithm.oid == spki.algorithm.oid
            && parameters_oid(&own.algorithm) == parameters_oid(&spki.algorithm)
            && own.subject_public_key == spki.subject_public_key)
    }

    /// The signature algorithm certificates signed by this key carry.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::RsaPss { .. } => SignatureAlgorithm::RsaPss,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
            KeyPair::EcdsaP384 { .. } => SignatureAlgorithm::Sha384WithECDSA,
            KeyPair::EcdsaP521 { .. } => SignatureAlgorithm::Sha512WithECDSA,
            KeyPair::Ed25519 { .. } => SignatureAlgorithm::Ed25519,
        }
    }

    /// Signs `data` with the algorithm reported by [`KeyPair::signature_algorithm`].
    ///
    /// ECDSA signatures are DER encoded, as X.509 requires.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Rsa { private } => {
                let signing_key = rsa::pkcs1v15::SigningKey::<Sha256>::new(private.as_ref().clone());
                Ok(signing_key.try_sign(data)?.to_vec())
            }
            KeyPair::RsaPss { .. } => Err(CertStoreError::UnsupportedKey(
                "signing with RSA-PSS keys".to_string(),
            )),
            KeyPair::EcdsaP256 { secret } => {
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384 { secret } => {
                let signing_key = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP521 { secret } => {
                let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())?;
                let signature: p521::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519 { signing_key } => Ok(signing_key.try_sign(data)?.to_bytes().to_vec()),
        }
    }
}

/// The named-curve parameter of an algorithm identifier, if it has one.
pub(crate) fn parameters_oid(algorithm: &AlgorithmIdentifierOwned) -> Option<ObjectIdentifier> {
    algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.decode_as::<ObjectIdentifier>().ok())
}
