use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output length of every master key, in bytes.
pub const MASTER_KEY_LEN: usize = 32;

/// Cost parameter keys understood by the KDF layer.
pub mod cost {
    /// Argon2id memory cost in KiB
    pub const MEMORY_KIB: &str = "memoryKib";
    /// Argon2id passes or PBKDF2 rounds
    pub const ITERATIONS: &str = "iterations";
    /// Argon2id lanes
    pub const PARALLELISM: &str = "parallelism";
}

/// Supported password-based key derivation functions.
///
/// Closed on purpose: an unrecognized identifier fails deserialization
/// instead of silently falling back to something weaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    /// Memory-hard default
    #[serde(rename = "argon2id")]
    Argon2id,
    /// Legacy iterated HMAC-SHA256, kept for accounts not yet migrated
    #[serde(rename = "pbkdf2-sha256")]
    Pbkdf2Sha256,
}

impl KdfAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            KdfAlgorithm::Argon2id => "argon2id",
            KdfAlgorithm::Pbkdf2Sha256 => "pbkdf2-sha256",
        }
    }
}

impl std::fmt::Display for KdfAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-issued KDF parameter record.
///
/// Wire form: `{"algorithm": "...", "costParameters": {...}, "outputLength": 32}`.
/// This is untrusted input; the crypto layer validates it before deriving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    pub cost_parameters: BTreeMap<String, u64>,
    pub output_length: usize,
}

impl KdfParams {
    pub fn argon2id(memory_kib: u64, iterations: u64, parallelism: u64) -> Self {
        let mut cost_parameters = BTreeMap::new();
        cost_parameters.insert(cost::MEMORY_KIB.to_string(), memory_kib);
        cost_parameters.insert(cost::ITERATIONS.to_string(), iterations);
        cost_parameters.insert(cost::PARALLELISM.to_string(), parallelism);
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            cost_parameters,
            output_length: MASTER_KEY_LEN,
        }
    }

    pub fn pbkdf2_sha256(iterations: u64) -> Self {
        let mut cost_parameters = BTreeMap::new();
        cost_parameters.insert(cost::ITERATIONS.to_string(), iterations);
        Self {
            algorithm: KdfAlgorithm::Pbkdf2Sha256,
            cost_parameters,
            output_length: MASTER_KEY_LEN,
        }
    }

    /// Parse a JSON parameter record as issued by the server.
    pub fn from_json(data: &[u8]) -> Result<Self, crate::OczError> {
        serde_json::from_slice(data)
            .map_err(|e| crate::OczError::KdfFailure(format!("invalid parameter record: {e}")))
    }
}

impl Default for KdfParams {
    /// Argon2id, 64 MiB, 3 passes, 4 lanes
    fn default() -> Self {
        Self::argon2id(65536, 3, 4)
    }
}

/// AEAD ciphers usable for container chunks.
///
/// Both use 32-byte keys, 12-byte nonces and 16-byte tags, so container
/// length arithmetic does not depend on the choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AeadAlgorithm {
    #[default]
    #[serde(rename = "AES-256-GCM")]
    Aes256Gcm,
    #[serde(rename = "CHACHA20-POLY1305")]
    ChaCha20Poly1305,
}

impl AeadAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            AeadAlgorithm::Aes256Gcm => "AES-256-GCM",
            AeadAlgorithm::ChaCha20Poly1305 => "CHACHA20-POLY1305",
        }
    }
}

impl std::fmt::Display for AeadAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-object metadata handed to the transport layer, persisted verbatim.
///
/// All fields are base64 (standard alphabet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Container base nonce (same value as the header's `baseIv`)
    #[serde(rename = "cipherIv")]
    pub cipher_iv: String,
    /// Wrapped data encryption key (ciphertext + tag)
    #[serde(rename = "edek")]
    pub edek: String,
    /// Nonce used to wrap the data key
    #[serde(rename = "edekIv")]
    pub edek_iv: String,
    /// Encrypted display name (ciphertext + tag)
    #[serde(rename = "metaNameEnc")]
    pub meta_name_enc: String,
    /// Nonce used to encrypt the display name
    #[serde(rename = "metaNameIv")]
    pub meta_name_iv: String,
}
