use crate::error::Result;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}

/// Splits a PEM certificate chain into DER certificates, in document order.
///
/// Blocks with other labels (keys, parameters) are skipped, so a combined
/// chain-and-key file can be passed as is.
pub fn pem_to_der_chain(pem_str: &str) -> Result<Vec<Vec<u8>>> {
    let blocks = pem::parse_many(pem_str)?;
    Ok(blocks
        .into_iter()
        .filter(|block| block.tag() == CERTIFICATE_TAG)
        .map(|block| block.into_contents())
        .collect())
}

/// Joins DER certificates into one PEM chain.
pub fn der_chain_to_pem<'a>(ders: impl IntoIterator<Item = &'a [u8]>) -> String {
    ders.into_iter()
        .map(|der| der_to_pem(der, CERTIFICATE_TAG))
        .collect()
}
