//! Per-object encrypt/decrypt orchestration
//!
//! Encrypt: fresh DEK -> OCZ1 container -> DEK wrapped under the KEK ->
//! display name encrypted under the name key. Both keys are HKDF sub-keys of
//! the session's master key, so content and names never share a key.
//!
//! Decrypt runs the inverse in order (unwrap, container, name) and stops at
//! the first failure. No partial plaintext is ever returned.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use ocz_core::{ContainerConfig, ObjectMetadata, OczConfig, OczError, OczResult};
use ocz_crypto::{
    decode_with_layout, decrypt_name, derive_kek, derive_name_key, encode_container,
    encrypt_name, generate_data_key, parse_container, rewrap_key, unwrap_key, wrap_key,
    EncryptedName, MasterKey, Nonce, WrappedKey,
};

use crate::session::SessionCache;

/// Output of [`ObjectCipher::encrypt_object`]: opaque container bytes plus
/// the metadata bundle the transport stores alongside them.
#[derive(Debug, Clone)]
pub struct EncryptedObject {
    pub container: Vec<u8>,
    pub metadata: ObjectMetadata,
}

/// Output of [`ObjectCipher::decrypt_object`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedObject {
    pub plaintext: Vec<u8>,
    pub display_name: String,
}

/// Encrypts and decrypts objects with the key held by a [`SessionCache`].
#[derive(Debug, Clone)]
pub struct ObjectCipher {
    session: Arc<SessionCache>,
    container: ContainerConfig,
}

fn encrypted_name(metadata: &ObjectMetadata) -> OczResult<EncryptedName> {
    Ok(EncryptedName {
        ciphertext: metadata.meta_name_enc.clone(),
        nonce: Nonce::from_base64(&metadata.meta_name_iv)?,
    })
}

impl ObjectCipher {
    pub fn new(session: Arc<SessionCache>, container: ContainerConfig) -> Self {
        Self { session, container }
    }

    pub fn from_config(session: Arc<SessionCache>, config: &OczConfig) -> Self {
        Self::new(session, config.container)
    }

    pub fn session(&self) -> &Arc<SessionCache> {
        &self.session
    }

    /// Encrypt `plaintext` as object `object_id` with the given display name.
    ///
    /// Fails with `NoActiveSession` when the session is absent or expired.
    pub fn encrypt_object(
        &self,
        plaintext: &[u8],
        object_id: &str,
        display_name: &str,
    ) -> OczResult<EncryptedObject> {
        let master = self.session.get()?;

        let dek = generate_data_key();
        let encoded = encode_container(plaintext, &dek, object_id, &self.container)?;
        let wrapped = wrap_key(&derive_kek(&master)?, &dek)?;
        let name = encrypt_name(&derive_name_key(&master)?, object_id, display_name)?;

        self.session.touch();
        info!(
            object_id,
            bytes = plaintext.len(),
            chunks = encoded.header.total_chunks,
            algo = %encoded.header.algo,
            "encrypted object"
        );

        Ok(EncryptedObject {
            container: encoded.bytes,
            metadata: ObjectMetadata {
                cipher_iv: encoded.header.base_iv,
                edek: wrapped.ciphertext_base64(),
                edek_iv: wrapped.nonce_base64(),
                meta_name_enc: name.ciphertext,
                meta_name_iv: name.nonce.to_base64(),
            },
        })
    }

    /// Read a file and encrypt it, using its file name as the display name.
    pub fn encrypt_file(&self, path: &Path, object_id: &str) -> Result<EncryptedObject> {
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("no usable file name in {}", path.display()))?;
        let plaintext =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

        self.encrypt_object(&plaintext, object_id, display_name)
            .with_context(|| format!("encrypting {}", path.display()))
    }

    /// Decrypt a container and its display name.
    pub fn decrypt_object(
        &self,
        container: &[u8],
        metadata: &ObjectMetadata,
        object_id: &str,
    ) -> OczResult<DecryptedObject> {
        let master = self.session.get()?;

        let wrapped = WrappedKey::from_base64(&metadata.edek, &metadata.edek_iv)?;
        let dek = unwrap_key(&derive_kek(&master)?, &wrapped)?;

        let layout = parse_container(container)?;
        if layout.header.base_iv != metadata.cipher_iv {
            return Err(OczError::ContainerFormat(
                "cipherIv does not match the container header".into(),
            ));
        }
        let plaintext = decode_with_layout(container, &layout, &dek, object_id)?;

        let display_name = decrypt_name(
            &derive_name_key(&master)?,
            object_id,
            &encrypted_name(metadata)?,
        )?;

        self.session.touch();
        info!(object_id, bytes = plaintext.len(), "decrypted object");
        Ok(DecryptedObject {
            plaintext,
            display_name,
        })
    }

    /// Re-encrypt only the display name. The container and wrapped key are
    /// carried over unchanged.
    pub fn rename_object(
        &self,
        metadata: &ObjectMetadata,
        object_id: &str,
        new_name: &str,
    ) -> OczResult<ObjectMetadata> {
        let master = self.session.get()?;
        let name = encrypt_name(&derive_name_key(&master)?, object_id, new_name)?;

        self.session.touch();
        debug!(object_id, "renamed object");
        Ok(ObjectMetadata {
            meta_name_enc: name.ciphertext,
            meta_name_iv: name.nonce.to_base64(),
            ..metadata.clone()
        })
    }

    /// Move an object's keys from `previous` (the master key before a
    /// password change) to the current session key.
    ///
    /// The DEK is re-wrapped and the display name re-encrypted; the
    /// container itself is not touched.
    pub fn rewrap_object(
        &self,
        metadata: &ObjectMetadata,
        object_id: &str,
        previous: &MasterKey,
    ) -> OczResult<ObjectMetadata> {
        let master = self.session.get()?;

        let wrapped = WrappedKey::from_base64(&metadata.edek, &metadata.edek_iv)?;
        let rewrapped = rewrap_key(&wrapped, &derive_kek(previous)?, &derive_kek(&master)?)?;

        let name = decrypt_name(
            &derive_name_key(previous)?,
            object_id,
            &encrypted_name(metadata)?,
        )?;
        let reencrypted = encrypt_name(&derive_name_key(&master)?, object_id, &name)?;

        self.session.touch();
        debug!(object_id, "rewrapped object keys");
        Ok(ObjectMetadata {
            cipher_iv: metadata.cipher_iv.clone(),
            edek: rewrapped.ciphertext_base64(),
            edek_iv: rewrapped.nonce_base64(),
            meta_name_enc: reencrypted.ciphertext,
            meta_name_iv: reencrypted.nonce.to_base64(),
        })
    }
}
