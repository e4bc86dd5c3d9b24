// crates/pdp-core/src/hashing.rs
// ============================================================================
// Module: Registry Fingerprints
// Description: RFC 8785 JSON canonicalization and SHA-256 registry digests.
// Purpose: Provide deterministic content digests for assembled registries.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Registries are fingerprinted by hashing the RFC 8785 (JCS) canonical JSON
//! of their entries in identifier order. Two registries with the same content
//! always yield the same digest, regardless of how they were assembled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Hashes the canonical JSON form of `value` with SHA-256.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<HashDigest, HashError> {
    let bytes =
        serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))?;
    let digest = Sha256::digest(&bytes);
    Ok(HashDigest {
        algorithm: HashAlgorithm::Sha256,
        value: hex_encode(&digest),
    })
}

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}
