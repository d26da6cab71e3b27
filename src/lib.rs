//! # certstore - Certificate chain management for TLS servers
//!
//! certstore keeps the certificate chains a TLS server can present and
//! picks one for every handshake, based on the server name the client
//! requested (SNI) and the signature schemes it accepts. Everything is
//! built on the pure Rust X.509 and key crates.
//!
//! ## Supported Key Types
//!
//! - **RSA**: PKCS#8 and PKCS#1 private keys
//! - **RSA-PSS**: `id-RSASSA-PSS` leaf keys
//! - **ECDSA**: P-256, P-384 and P-521, as PKCS#8 or SEC1 private keys
//! - **Ed25519**
//!
//! ## Registration
//!
//! A [`Config`](config::Config) is populated through exactly one of two
//! APIs:
//!
//! - [`add_cert_chain_and_key`](config::Config::add_cert_chain_and_key)
//!   loads PEM material and makes it the default chain for its auth method.
//!   At most one chain per auth method.
//! - [`add_cert_chain_and_key_to_store`](config::Config::add_cert_chain_and_key_to_store)
//!   registers shared chains under their domain names, any number per name.
//!
//! Mixing the two fails with
//! [`CertOwnershipConflict`](error::CertStoreError::CertOwnershipConflict).
//!
//! ## Selection
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use certstore::chain::CertChainAndKey;
//! use certstore::config::Config;
//! use certstore::connection::Connection;
//! use certstore::key::AuthMethod;
//!
//! /// Priority attached to each chain by the application.
//! struct Priority(u32);
//!
//! fn highest_priority<'a>(
//!     current: &'a CertChainAndKey,
//!     candidate: &'a CertChainAndKey,
//!     _name: &[u8],
//! ) -> &'a CertChainAndKey {
//!     let priority = |chain: &CertChainAndKey| chain.context::<Priority>().map_or(0, |p| p.0);
//!     if priority(candidate) > priority(current) { candidate } else { current }
//! }
//!
//! # fn main() -> certstore::error::Result<()> {
//! # let (chain_pem, key_pem) = (String::new(), String::new());
//! let mut chain = CertChainAndKey::load_pem(&chain_pem, &key_pem)?;
//! chain.set_context(Arc::new(Priority(10)));
//!
//! let mut config = Config::builder()
//!     .cert_tiebreak(Arc::new(highest_priority))
//!     .build();
//! config.add_cert_chain_and_key_to_store(Arc::new(chain))?;
//!
//! let mut conn = Connection::new(Arc::new(config));
//! conn.set_server_name("www.example.com")?;
//! let selected = conn.select_certificate(&[AuthMethod::Ecdsa, AuthMethod::Rsa])?;
//! println!("presenting {}", selected.id());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::Result`]:
//!
//! ```rust
//! use certstore::{chain::CertChainAndKey, error::CertStoreError};
//!
//! match CertChainAndKey::load_public_pem("not a certificate") {
//!     Ok(chain) => println!("loaded {}", chain.id()),
//!     Err(CertStoreError::EmptyChain) => println!("no certificates found"),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`chain`]: Chain construction, metadata and caller context
//! - [`store`]: Domain-indexed chain storage
//! - [`select`] and [`tiebreak`]: Handshake-time selection
//! - [`ownership`]: Registration API exclusivity
//! - [`config`] and [`connection`]: The public entry points
//! - [`cert`], [`key`], [`issuer`]: X.509 parsing, key handling and issuance
//! - [`error`]: Error types

pub mod cert;
pub mod chain;
pub mod config;
pub mod connection;
pub mod error;
pub mod issuer;
pub mod key;
pub mod ownership;
pub mod pem_utils;
pub mod select;
pub mod store;
pub mod tbs_certificate;
pub mod tiebreak;
