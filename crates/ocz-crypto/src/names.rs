//! Display-name encryption
//!
//! Names are encrypted under the name key (HKDF from the master key,
//! domain "ocz-names-v1"), never under the object's data key, with a fresh
//! random nonce. The AAD binds the name to its object id so an encrypted
//! name cannot be moved onto another object.

use ocz_core::OczResult;

use crate::aead::{self, Nonce};
use crate::keys::DerivedKey;

/// An encrypted display name, base64 ciphertext plus its nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedName {
    pub ciphertext: String,
    pub nonce: Nonce,
}

fn name_aad(object_id: &str) -> Vec<u8> {
    format!("{object_id}:name").into_bytes()
}

/// Encrypt a display name for `object_id`.
pub fn encrypt_name(
    name_key: &DerivedKey,
    object_id: &str,
    plaintext_name: &str,
) -> OczResult<EncryptedName> {
    let nonce = Nonce::random();
    let aad = name_aad(object_id);
    let ciphertext = aead::encrypt_string(name_key.as_bytes(), &nonce, plaintext_name, Some(aad.as_slice()))?;
    Ok(EncryptedName { ciphertext, nonce })
}

/// Decrypt a display name produced by [`encrypt_name`] for the same object.
pub fn decrypt_name(
    name_key: &DerivedKey,
    object_id: &str,
    encrypted: &EncryptedName,
) -> OczResult<String> {
    let aad = name_aad(object_id);
    aead::decrypt_string(name_key.as_bytes(), &encrypted.nonce, &encrypted.ciphertext, Some(aad.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use ocz_core::OczError;

    fn test_name_key() -> DerivedKey {
        DerivedKey::from_bytes([0x55u8; KEY_SIZE])
    }

    #[test]
    fn test_encrypt_decrypt_name_roundtrip() {
        let key = test_name_key();
        let encrypted = encrypt_name(&key, "obj-1", "my-photo.jpg").unwrap();
        assert_eq!(decrypt_name(&key, "obj-1", &encrypted).unwrap(), "my-photo.jpg");
    }

    #[test]
    fn test_same_name_encrypts_differently() {
        let key = test_name_key();
        let a = encrypt_name(&key, "obj-1", "report.pdf").unwrap();
        let b = encrypt_name(&key, "obj-1", "report.pdf").unwrap();
        assert_ne!(a.ciphertext, b.ciphertext, "fresh nonce per encryption");
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let encrypted = encrypt_name(&DerivedKey::from_bytes([0x11; KEY_SIZE]), "o", "secret.txt").unwrap();
        let result = decrypt_name(&DerivedKey::from_bytes([0x22; KEY_SIZE]), "o", &encrypted);
        assert_eq!(result, Err(OczError::AuthenticationFailure));
    }

    #[test]
    fn test_name_bound_to_object() {
        let key = test_name_key();
        let encrypted = encrypt_name(&key, "obj-a", "notes.md").unwrap();
        assert_eq!(
            decrypt_name(&key, "obj-b", &encrypted),
            Err(OczError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_unicode_and_empty_names() {
        let key = test_name_key();
        for name in ["", "日本語のファイル.txt", "emoji 📁 folder"] {
            let encrypted = encrypt_name(&key, "obj", name).unwrap();
            assert_eq!(decrypt_name(&key, "obj", &encrypted).unwrap(), name);
        }
    }
}
