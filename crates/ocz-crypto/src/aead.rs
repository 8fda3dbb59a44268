//! AEAD primitive layer: byte- and string-level seal/open with explicit nonces
//!
//! Output format: `[ciphertext][16-byte tag]`. The nonce is never generated
//! inside `encrypt`; callers pass a fresh [`Nonce`] for every call and
//! persist it next to the ciphertext.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use zeroize::Zeroize;

use ocz_core::{AeadAlgorithm, OczError, OczResult};

use crate::{KEY_SIZE, NONCE_SIZE};

/// A 96-bit AEAD nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Draw a fresh nonce from the thread-local CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        encode_b64(&self.0)
    }

    pub fn from_base64(s: &str) -> OczResult<Self> {
        let raw = decode_b64(s)?;
        let bytes: [u8; NONCE_SIZE] = raw.as_slice().try_into().map_err(|_| {
            OczError::Encoding(format!(
                "nonce must be {NONCE_SIZE} bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

/// A keyed AEAD instance, reusable across many seal/open calls.
///
/// Construction expands the key schedule once, so the container codec
/// builds one per object and shares it across chunk workers.
pub enum AeadCipher {
    Aes256Gcm(Aes256Gcm),
    ChaCha20Poly1305(ChaCha20Poly1305),
}

impl AeadCipher {
    pub fn new(algorithm: AeadAlgorithm, key: &[u8; KEY_SIZE]) -> Self {
        match algorithm {
            AeadAlgorithm::Aes256Gcm => AeadCipher::Aes256Gcm(Aes256Gcm::new(key.into())),
            AeadAlgorithm::ChaCha20Poly1305 => {
                AeadCipher::ChaCha20Poly1305(ChaCha20Poly1305::new(key.into()))
            }
        }
    }

    pub fn algorithm(&self) -> AeadAlgorithm {
        match self {
            AeadCipher::Aes256Gcm(_) => AeadAlgorithm::Aes256Gcm,
            AeadCipher::ChaCha20Poly1305(_) => AeadAlgorithm::ChaCha20Poly1305,
        }
    }

    /// Encrypt and authenticate `plaintext`, binding `aad` into the tag.
    pub fn seal(&self, nonce: &Nonce, plaintext: &[u8], aad: Option<&[u8]>) -> OczResult<Vec<u8>> {
        let payload = Payload {
            msg: plaintext,
            aad: aad.unwrap_or_default(),
        };
        let nonce = aes_gcm::Nonce::from_slice(nonce.as_bytes());
        match self {
            AeadCipher::Aes256Gcm(cipher) => cipher.encrypt(nonce, payload),
            AeadCipher::ChaCha20Poly1305(cipher) => cipher.encrypt(nonce, payload),
        }
        .map_err(|e| OczError::EncryptionFailure(format!("{} seal: {e}", self.algorithm())))
    }

    /// Verify and decrypt `ciphertext` (ciphertext || tag).
    pub fn open(&self, nonce: &Nonce, ciphertext: &[u8], aad: Option<&[u8]>) -> OczResult<Vec<u8>> {
        let payload = Payload {
            msg: ciphertext,
            aad: aad.unwrap_or_default(),
        };
        let nonce = aes_gcm::Nonce::from_slice(nonce.as_bytes());
        match self {
            AeadCipher::Aes256Gcm(cipher) => cipher.decrypt(nonce, payload),
            AeadCipher::ChaCha20Poly1305(cipher) => cipher.decrypt(nonce, payload),
        }
        .map_err(|_| OczError::AuthenticationFailure)
    }
}

/// AES-256-GCM encrypt. Returns `ciphertext || tag`.
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    nonce: &Nonce,
    plaintext: &[u8],
    aad: Option<&[u8]>,
) -> OczResult<Vec<u8>> {
    AeadCipher::new(AeadAlgorithm::Aes256Gcm, key).seal(nonce, plaintext, aad)
}

/// AES-256-GCM decrypt. Any tag mismatch is `AuthenticationFailure`.
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    nonce: &Nonce,
    ciphertext: &[u8],
    aad: Option<&[u8]>,
) -> OczResult<Vec<u8>> {
    AeadCipher::new(AeadAlgorithm::Aes256Gcm, key).open(nonce, ciphertext, aad)
}

/// Encrypt a UTF-8 string, returning base64 of `ciphertext || tag`.
pub fn encrypt_string(
    key: &[u8; KEY_SIZE],
    nonce: &Nonce,
    plaintext: &str,
    aad: Option<&[u8]>,
) -> OczResult<String> {
    let ciphertext = encrypt(key, nonce, plaintext.as_bytes(), aad)?;
    Ok(encode_b64(&ciphertext))
}

/// Inverse of [`encrypt_string`].
pub fn decrypt_string(
    key: &[u8; KEY_SIZE],
    nonce: &Nonce,
    encoded: &str,
    aad: Option<&[u8]>,
) -> OczResult<String> {
    let ciphertext = decode_b64(encoded)?;
    let plaintext = decrypt(key, nonce, &ciphertext, aad)?;
    // A valid tag over non-UTF-8 bytes was not produced by encrypt_string.
    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        OczError::AuthenticationFailure
    })
}

pub fn encode_b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode_b64(s: &str) -> OczResult<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| OczError::Encoding(format!("base64 decode: {e}")))
}
