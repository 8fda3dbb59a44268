//! ocz-crypto: client-side zero-knowledge encryption
//!
//! Key hierarchy:
//! ```text
//! User Master Key (256-bit, Argon2id or PBKDF2 from password + salt)
//!   ├── Key-Encrypting Key (HKDF-SHA256, label "ocz-kek-v1")
//!   │   └── wraps each Data Encryption Key (AES-256-GCM, random nonce)
//!   └── Name Key (HKDF-SHA256, label "ocz-names-v1")
//!       └── display names (AES-256-GCM, random nonce, AAD = "{objectId}:name")
//!
//! Data Encryption Key (per object, 256-bit random)
//!   └── OCZ1 container chunks (AEAD, nonce = base ⊕ LE32(index),
//!       AAD = "{objectId}:{index}:{headerVersion}")
//! ```
//!
//! Only the master key is ever cached; every other key is derived or
//! unwrapped on demand and zeroized on drop.

pub mod aead;
pub mod container;
pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod names;

pub use aead::{decrypt, decrypt_string, encrypt, encrypt_string, AeadCipher, Nonce};
pub use container::{
    decode_container, decode_with_layout, encode_container, parse_container, ChunkSpan,
    ContainerHeader, ContainerLayout, EncodedContainer,
};
pub use envelope::{rewrap_key, unwrap_key, wrap_key, WrappedKey};
pub use kdf::{derive_master_key, derive_master_key_with_progress, generate_salt, MasterKey};
pub use keys::{derive_kek, derive_name_key, derive_subkey, generate_data_key, DataKey, DerivedKey};
pub use names::{decrypt_name, encrypt_name, EncryptedName};

/// Size of every symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM / ChaCha20-Poly1305 nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of an AEAD authentication tag (128-bit)
pub const TAG_SIZE: usize = 16;

/// Minimum salt length accepted by the KDF
pub const MIN_SALT_SIZE: usize = 16;
