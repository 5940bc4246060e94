//! The `<nonceHex>:<tagHex>:<ciphertextHex>` text format.
//!
//! Strict on parse: exactly three segments, lowercase hex only, fixed nonce
//! and tag lengths. There is no fallback path that treats a non-parsing
//! value as plaintext; callers that need to migrate legacy plaintext rows
//! use [`looks_sealed`] and re-seal explicitly.

use crate::error::VaultError;

/// Nonce length emitted by the current cipher.
pub const NONCE_LEN: usize = 12;
/// Poly1305 tag length.
pub const TAG_LEN: usize = 16;
/// Earlier releases sealed with a 16-byte IV. Those blobs still parse (and
/// count as sealed for migration sweeps) but can no longer be opened.
const RETIRED_NONCE_LEN: usize = 16;

/// Decoded segments of a sealed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedParts {
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Encodes parts into the colon-separated lowercase-hex form.
pub fn encode(parts: &SealedParts) -> String {
    format!(
        "{}:{}:{}",
        hex::encode(&parts.nonce),
        hex::encode(&parts.tag),
        hex::encode(&parts.ciphertext)
    )
}

/// Parses a blob, enforcing segment count, hex alphabet, and lengths.
pub fn parse(blob: &str) -> Result<SealedParts, VaultError> {
    let mut segments = blob.split(':');
    let (Some(nonce), Some(tag), Some(ciphertext), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(VaultError::Format("expected three colon-separated segments"));
    };

    let nonce = decode_segment(nonce, "nonce segment is not lowercase hex")?;
    let tag = decode_segment(tag, "tag segment is not lowercase hex")?;
    let ciphertext = decode_segment(ciphertext, "ciphertext segment is not lowercase hex")?;

    if nonce.len() != NONCE_LEN && nonce.len() != RETIRED_NONCE_LEN {
        return Err(VaultError::Format("unexpected nonce length"));
    }
    if tag.len() != TAG_LEN {
        return Err(VaultError::Format("unexpected tag length"));
    }

    Ok(SealedParts {
        nonce,
        tag,
        ciphertext,
    })
}

/// Whether a stored value is structurally a sealed blob.
///
/// Used by migration sweeps to find legacy plaintext rows without ever
/// guessing at decrypt time.
pub fn looks_sealed(value: &str) -> bool {
    parse(value).is_ok()
}

fn decode_segment(segment: &str, err: &'static str) -> Result<Vec<u8>, VaultError> {
    if segment.chars().any(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
        return Err(VaultError::Format(err));
    }
    hex::decode(segment).map_err(|_| VaultError::Format(err))
}
