//! Envelope encryption: data keys wrapped under a key-encrypting key
//!
//! AES-256-GCM with a fresh random nonce per wrap. The wrapped form is
//! `[32-byte key ciphertext][16-byte tag]`; the nonce travels separately
//! (`edek` / `edekIv` in the object metadata).

use zeroize::Zeroize;

use ocz_core::{OczError, OczResult};

use crate::aead::{self, decode_b64, encode_b64, Nonce};
use crate::keys::{DataKey, DerivedKey};
use crate::{KEY_SIZE, TAG_SIZE};

/// A data key encrypted under a key-encrypting key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    pub ciphertext: Vec<u8>,
    pub nonce: Nonce,
}

impl WrappedKey {
    pub fn ciphertext_base64(&self) -> String {
        encode_b64(&self.ciphertext)
    }

    pub fn nonce_base64(&self) -> String {
        self.nonce.to_base64()
    }

    /// Rebuild from the transport encoding. Malformed input is an unwrap failure.
    pub fn from_base64(edek: &str, edek_iv: &str) -> OczResult<Self> {
        let ciphertext = decode_b64(edek).map_err(|_| OczError::UnwrapFailure)?;
        let nonce = Nonce::from_base64(edek_iv).map_err(|_| OczError::UnwrapFailure)?;
        Ok(Self { ciphertext, nonce })
    }
}

/// Wrap (encrypt) a data key.
pub fn wrap_key(kek: &DerivedKey, dek: &DataKey) -> OczResult<WrappedKey> {
    let nonce = Nonce::random();
    let ciphertext = aead::encrypt(kek.as_bytes(), &nonce, dek.as_bytes(), None)?;
    Ok(WrappedKey { ciphertext, nonce })
}

/// Unwrap (decrypt) a data key.
///
/// Wrong key, corrupted bytes and wrong length all yield `UnwrapFailure`.
pub fn unwrap_key(kek: &DerivedKey, wrapped: &WrappedKey) -> OczResult<DataKey> {
    if wrapped.ciphertext.len() != KEY_SIZE + TAG_SIZE {
        return Err(OczError::UnwrapFailure);
    }

    let mut plaintext = aead::decrypt(kek.as_bytes(), &wrapped.nonce, &wrapped.ciphertext, None)
        .map_err(|_| OczError::UnwrapFailure)?;

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&plaintext);
    plaintext.zeroize();

    Ok(DataKey::from_bytes(key_bytes))
}

/// Re-wrap a data key under a new key-encrypting key (password change,
/// KEK rotation). Object content is untouched.
pub fn rewrap_key(
    wrapped: &WrappedKey,
    old_kek: &DerivedKey,
    new_kek: &DerivedKey,
) -> OczResult<WrappedKey> {
    let dek = unwrap_key(old_kek, wrapped)?;
    wrap_key(new_kek, &dek)
}
