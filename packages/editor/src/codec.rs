//! # Share Link Codec
//!
//! Converts a component list to and from a compact string that can sit in a
//! URL query or fragment without escaping.
//!
//! ## Format
//!
//! ```text
//! encode:  components → canonical JSON → raw DEFLATE → base64url (no padding)
//! decode:  base64url → inflate → JSON          (current scheme)
//!          base64 → UTF-8 JSON                 (legacy links, read only)
//! ```
//!
//! Decoding never fails loudly: anything unreadable by both paths logs a
//! warning and yields `None`.

use std::io::{Read, Write};

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use crate::component::PlacedComponent;
use crate::document::Document;
use crate::errors::EditorError;

/// Standard alphabet, padding optional: older links were often trimmed
const LEGACY: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Upper bound on inflated payload size
const MAX_DECODED_BYTES: u64 = 16 * 1024 * 1024;

/// Encode components into a URL-safe share string
pub fn encode(components: &[PlacedComponent]) -> Result<String, EditorError> {
    let json = serde_json::to_vec(components)?;

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Decode a share string, trying the current scheme first and then the
/// legacy plain-base64 scheme
pub fn decode(value: &str) -> Option<Vec<PlacedComponent>> {
    let value = value.trim();
    if value.is_empty() {
        warn!("empty share string");
        return None;
    }

    if let Some(components) = decode_compressed(value) {
        return Some(components);
    }

    if let Some(components) = decode_legacy(value) {
        debug!(count = components.len(), "decoded legacy share string");
        return Some(components);
    }

    warn!(len = value.len(), "could not decode share string");
    None
}

/// Decode a share string straight into a validated [`Document`]
pub fn decode_document(session_id: &str, value: &str) -> Result<Document, EditorError> {
    let components = decode(value)
        .ok_or_else(|| EditorError::Decode("not a recognised share string".to_string()))?;
    Ok(Document::from_components(session_id, components)?)
}

fn decode_compressed(value: &str) -> Option<Vec<PlacedComponent>> {
    let bytes = URL_SAFE_NO_PAD.decode(value.trim_end_matches('=')).ok()?;
    let json = inflate(&bytes, MAX_DECODED_BYTES)?;
    serde_json::from_str(&json).ok()
}

/// Inflate raw DEFLATE data, refusing output larger than `limit` bytes
fn inflate(bytes: &[u8], limit: u64) -> Option<String> {
    let mut json = String::new();
    let read = DeflateDecoder::new(bytes)
        .take(limit + 1)
        .read_to_string(&mut json)
        .ok()?;

    if read as u64 > limit {
        warn!(limit, "share string inflates past the size cap");
        return None;
    }
    Some(json)
}

fn decode_legacy(value: &str) -> Option<Vec<PlacedComponent>> {
    let bytes = LEGACY.decode(value).ok()?;
    let json = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&json).ok()
}
