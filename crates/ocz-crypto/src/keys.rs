//! Key hierarchy: master key → HKDF sub-keys, data key generation

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use ocz_core::{OczError, OczResult};

use crate::kdf::MasterKey;
use crate::KEY_SIZE;

/// HKDF label for the key-encrypting key that wraps data keys.
pub const KEK_LABEL: &str = "ocz-kek-v1";

/// HKDF label for the display-name encryption key.
pub const NAME_KEY_LABEL: &str = "ocz-names-v1";

/// HKDF-SHA256 can expand to at most 255 hash blocks.
const MAX_SUBKEY_LEN: usize = 255 * 32;

macro_rules! secret_key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            bytes: [u8; KEY_SIZE],
        }

        impl $name {
            pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
                Self { bytes }
            }

            pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
                &self.bytes
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.bytes.zeroize();
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("bytes", &"[REDACTED]")
                    .finish()
            }
        }
    };
}

secret_key_type!(
    /// A per-object 256-bit data encryption key. Zeroized on drop.
    DataKey
);

secret_key_type!(
    /// A 256-bit purpose key derived from the master key. Zeroized on drop.
    DerivedKey
);

/// Generate a random 256-bit data encryption key.
pub fn generate_data_key() -> DataKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    DataKey::from_bytes(bytes)
}

/// HKDF-SHA256 with no salt (the master key is already uniformly random)
/// and `label` as the info string.
///
/// Distinct labels yield independent keys.
pub fn derive_subkey(master: &MasterKey, label: &str, len: usize) -> OczResult<Zeroizing<Vec<u8>>> {
    if len == 0 || len > MAX_SUBKEY_LEN {
        return Err(OczError::KdfFailure(format!(
            "sub-key length must be 1..={MAX_SUBKEY_LEN}, got {len}"
        )));
    }
    let hkdf = Hkdf::<Sha256>::new(None, master.as_bytes());
    let mut okm = Zeroizing::new(vec![0u8; len]);
    hkdf.expand(label.as_bytes(), &mut okm)
        .map_err(|e| OczError::KdfFailure(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

fn derive_key32(master: &MasterKey, label: &str) -> OczResult<DerivedKey> {
    let okm = derive_subkey(master, label, KEY_SIZE)?;
    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&okm);
    Ok(DerivedKey::from_bytes(bytes))
}

/// Derive the key-encrypting key used to wrap every data key.
pub fn derive_kek(master: &MasterKey) -> OczResult<DerivedKey> {
    derive_key32(master, KEK_LABEL)
}

/// Derive the display-name encryption key.
pub fn derive_name_key(master: &MasterKey) -> OczResult<DerivedKey> {
    derive_key32(master, NAME_KEY_LABEL)
}
