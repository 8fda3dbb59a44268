//! OCZ1 chunked container codec
//!
//! Binary layout:
//! ```text
//! ["OCZ1"][u32 LE header length][header JSON][chunk 0]...[chunk N-1]
//! chunk i   = AEAD(dek, nonce_i, plaintext[i*chunkSize..], aad_i) (ciphertext || 16-byte tag)
//! nonce_i   = baseIv with its last 4 bytes XORed with LE32(i)
//! aad_i     = "{objectId}:{i}:{headerVersion}"
//! ```
//!
//! Per-chunk nonces are derived, so only the base nonce is stored. The AAD
//! binds each chunk to its object and position: chunks cannot be swapped,
//! reordered or transplanted into another object's container.
//!
//! Every container carries at least one chunk. Empty plaintext encodes as a
//! single zero-length chunk, so even an empty object has a tag bound to its
//! id.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ocz_core::config::MAX_CHUNK_SIZE;
use ocz_core::{AeadAlgorithm, ContainerConfig, OczError, OczResult};

use crate::aead::{AeadCipher, Nonce};
use crate::keys::DataKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Container magic tag
pub const MAGIC: &[u8; 4] = b"OCZ1";

/// Container crypto format version
pub const CRYPTO_VERSION: u32 = 1;

/// AAD layout version
pub const AAD_VERSION: u32 = 1;

/// Header record version, also mixed into each chunk's AAD
pub const HEADER_VERSION: u32 = 1;

/// Upper bound on the JSON header length: 64 KiB
pub const MAX_HEADER_LEN: usize = 64 * 1024;

/// Magic + header length prefix
const PREFIX_LEN: usize = 8;

/// The container header record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerHeader {
    pub crypto_version: u32,
    pub algo: AeadAlgorithm,
    pub chunk_size: u32,
    pub total_chunks: u32,
    /// Base nonce, base64
    pub base_iv: String,
    pub aad_version: u32,
    pub header_version: u32,
}

impl ContainerHeader {
    /// Check versions and bounds, returning the decoded base nonce.
    fn validate(&self) -> OczResult<Nonce> {
        if self.crypto_version != CRYPTO_VERSION {
            return Err(OczError::ContainerFormat(format!(
                "unsupported cryptoVersion {}",
                self.crypto_version
            )));
        }
        if self.aad_version != AAD_VERSION {
            return Err(OczError::ContainerFormat(format!(
                "unsupported aadVersion {}",
                self.aad_version
            )));
        }
        if self.header_version != HEADER_VERSION {
            return Err(OczError::ContainerFormat(format!(
                "unsupported headerVersion {}",
                self.header_version
            )));
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(OczError::ContainerFormat(format!(
                "chunkSize {} outside [1, {MAX_CHUNK_SIZE}]",
                self.chunk_size
            )));
        }
        if self.total_chunks == 0 {
            return Err(OczError::ContainerFormat("totalChunks must be at least 1".into()));
        }
        Nonce::from_base64(&self.base_iv)
            .map_err(|e| OczError::ContainerFormat(format!("invalid baseIv: {e}")))
    }
}

/// Location of one ciphertext chunk inside the container bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: u32,
    pub offset: usize,
    pub len: usize,
}

impl ChunkSpan {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }

    /// Plaintext bytes carried by this chunk. Zero for a span shorter than a tag.
    pub fn plaintext_len(&self) -> usize {
        self.len.saturating_sub(TAG_SIZE)
    }
}

/// A parsed, length-checked container: header plus the byte span of every chunk.
///
/// Useful on its own for ranged downloads; [`decode_container`] builds one
/// before decrypting anything.
#[derive(Debug, Clone)]
pub struct ContainerLayout {
    pub header: ContainerHeader,
    pub base_nonce: Nonce,
    pub chunks: Vec<ChunkSpan>,
}

impl ContainerLayout {
    pub fn plaintext_len(&self) -> u64 {
        self.chunks.iter().map(|c| c.plaintext_len() as u64).sum()
    }
}

/// An encoded container and the header it was written with.
#[derive(Debug, Clone)]
pub struct EncodedContainer {
    pub bytes: Vec<u8>,
    pub header: ContainerHeader,
}

/// Number of chunks for a plaintext of `len` bytes (at least one).
pub fn total_chunks(len: u64, chunk_size: u32) -> u64 {
    len.div_ceil(u64::from(chunk_size)).max(1)
}

/// Derive chunk `index`'s nonce: base nonce with its last 4 bytes XORed with LE32(index).
pub fn chunk_nonce(base: &Nonce, index: u32) -> Nonce {
    let mut bytes = *base.as_bytes();
    for (b, x) in bytes[NONCE_SIZE - 4..].iter_mut().zip(index.to_le_bytes()) {
        *b ^= x;
    }
    Nonce::from_bytes(bytes)
}

/// AAD for chunk `index`: UTF-8 `"{objectId}:{index}:{headerVersion}"`.
pub fn chunk_aad(object_id: &str, index: u32, header_version: u32) -> Vec<u8> {
    format!("{object_id}:{index}:{header_version}").into_bytes()
}

/// Encrypt `plaintext` into an OCZ1 container bound to `object_id`.
///
/// Chunks are sealed in parallel and written in index order.
pub fn encode_container(
    plaintext: &[u8],
    dek: &DataKey,
    object_id: &str,
    config: &ContainerConfig,
) -> OczResult<EncodedContainer> {
    let chunk_size = config.chunk_size;
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(OczError::EncryptionFailure(format!(
            "chunk size {chunk_size} outside [1, {MAX_CHUNK_SIZE}]"
        )));
    }
    let count = total_chunks(plaintext.len() as u64, chunk_size);
    let count = u32::try_from(count).map_err(|_| {
        OczError::EncryptionFailure(format!("{count} chunks exceed the container limit"))
    })?;

    let base_nonce = Nonce::random();
    let header = ContainerHeader {
        crypto_version: CRYPTO_VERSION,
        algo: config.algorithm,
        chunk_size,
        total_chunks: count,
        base_iv: base_nonce.to_base64(),
        aad_version: AAD_VERSION,
        header_version: HEADER_VERSION,
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| OczError::EncryptionFailure(format!("header serialization: {e}")))?;

    let pieces: Vec<&[u8]> = if plaintext.is_empty() {
        vec![plaintext]
    } else {
        plaintext.chunks(chunk_size as usize).collect()
    };

    let cipher = AeadCipher::new(config.algorithm, dek.as_bytes());
    let sealed = pieces
        .par_iter()
        .enumerate()
        .map(|(i, piece)| {
            let index = i as u32;
            let aad = chunk_aad(object_id, index, HEADER_VERSION);
            cipher.seal(&chunk_nonce(&base_nonce, index), piece, Some(aad.as_slice()))
        })
        .collect::<OczResult<Vec<_>>>()?;

    let mut bytes = Vec::with_capacity(
        PREFIX_LEN + header_json.len() + plaintext.len() + TAG_SIZE * count as usize,
    );
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&(header_json.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&header_json);
    for chunk in &sealed {
        bytes.extend_from_slice(chunk);
    }

    debug!(
        object_id,
        algo = %config.algorithm,
        chunks = count,
        plaintext_bytes = plaintext.len(),
        container_bytes = bytes.len(),
        "encoded container"
    );
    Ok(EncodedContainer { bytes, header })
}

/// Parse and validate a container's framing without decrypting anything.
///
/// Rejects bad magic, malformed or unsupported headers, and any container
/// whose length is not exactly accounted for by its declared chunks
/// (truncated, padded or oversized).
pub fn parse_container(bytes: &[u8]) -> OczResult<ContainerLayout> {
    if bytes.len() < PREFIX_LEN {
        return Err(OczError::ContainerFormat(format!(
            "container too short: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[..4] != MAGIC {
        return Err(OczError::ContainerFormat("bad magic".into()));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[4..PREFIX_LEN]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if header_len == 0 || header_len > MAX_HEADER_LEN {
        return Err(OczError::ContainerFormat(format!(
            "header length {header_len} outside [1, {MAX_HEADER_LEN}]"
        )));
    }
    let body_offset = PREFIX_LEN + header_len;
    if bytes.len() < body_offset {
        return Err(OczError::ContainerFormat(format!(
            "header length {header_len} exceeds container"
        )));
    }

    let header: ContainerHeader = serde_json::from_slice(&bytes[PREFIX_LEN..body_offset])
        .map_err(|e| OczError::ContainerFormat(format!("invalid header: {e}")))?;
    let base_nonce = header.validate()?;

    let body_len = (bytes.len() - body_offset) as u64;
    let full = u64::from(header.chunk_size) + TAG_SIZE as u64;
    let count = u64::from(header.total_chunks);
    let fixed = (count - 1) * full;
    if body_len < fixed + TAG_SIZE as u64 {
        return Err(OczError::ContainerFormat(format!(
            "container truncated: {body_len} body bytes for {count} chunks"
        )));
    }
    let last = body_len - fixed;
    if last > full {
        return Err(OczError::ContainerFormat(format!(
            "container oversized: {body_len} body bytes for {count} chunks"
        )));
    }
    // The encoder only writes an empty chunk for empty plaintext.
    if count > 1 && last == TAG_SIZE as u64 {
        return Err(OczError::ContainerFormat("empty trailing chunk".into()));
    }

    let chunks = (0..header.total_chunks)
        .map(|index| {
            let len = if u64::from(index) + 1 == count { last } else { full };
            ChunkSpan {
                index,
                offset: body_offset + (u64::from(index) * full) as usize,
                len: len as usize,
            }
        })
        .collect();

    Ok(ContainerLayout {
        header,
        base_nonce,
        chunks,
    })
}

/// Decrypt an OCZ1 container produced for `object_id`.
///
/// Framing is fully validated first. Chunks are opened in parallel and
/// reassembled in index order; any failing chunk aborts the whole decode
/// with `ChunkDecryptFailure` and no plaintext is returned.
pub fn decode_container(bytes: &[u8], dek: &DataKey, object_id: &str) -> OczResult<Vec<u8>> {
    let layout = parse_container(bytes)?;
    decode_with_layout(bytes, &layout, dek, object_id)
}

/// Decrypt a container whose framing was already checked by [`parse_container`].
pub fn decode_with_layout(
    bytes: &[u8],
    layout: &ContainerLayout,
    dek: &DataKey,
    object_id: &str,
) -> OczResult<Vec<u8>> {
    let header_version = layout.header.header_version;
    let cipher = AeadCipher::new(layout.header.algo, dek.as_bytes());

    let opened = layout
        .chunks
        .par_iter()
        .map(|span| {
            let chunk = bytes
                .get(span.range())
                .ok_or_else(|| OczError::ContainerFormat("chunk span outside container".into()))?;
            let aad = chunk_aad(object_id, span.index, header_version);
            cipher
                .open(
                    &chunk_nonce(&layout.base_nonce, span.index),
                    chunk,
                    Some(aad.as_slice()),
                )
                .map_err(|_| OczError::ChunkDecryptFailure { index: span.index })
        })
        .collect::<OczResult<Vec<_>>>()?;

    let mut plaintext = Vec::with_capacity(layout.plaintext_len() as usize);
    for chunk in &opened {
        plaintext.extend_from_slice(chunk);
    }

    debug!(
        object_id,
        chunks = layout.chunks.len(),
        plaintext_bytes = plaintext.len(),
        "decoded container"
    );
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_data_key;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn config(chunk_size: u32) -> ContainerConfig {
        ContainerConfig {
            chunk_size,
            algorithm: AeadAlgorithm::Aes256Gcm,
        }
    }

    fn make_data(size: usize) -> Vec<u8> {
        (0..size)
            .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
            .collect()
    }

    #[test]
    fn test_chunk_span_shorter_than_tag() {
        let span = ChunkSpan {
            index: 0,
            offset: 8,
            len: TAG_SIZE - 1,
        };
        assert_eq!(span.plaintext_len(), 0);
        let full = ChunkSpan { len: TAG_SIZE + 10, ..span };
        assert_eq!(full.plaintext_len(), 10);
    }

    /// Rebuild a container around a replacement header.
    fn with_header(container: &[u8], header_json: &[u8]) -> Vec<u8> {
        let old_len = u32::from_le_bytes(container[4..8].try_into().unwrap()) as usize;
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&(header_json.len() as u32).to_le_bytes());
        out.extend_from_slice(header_json);
        out.extend_from_slice(&container[8 + old_len..]);
        out
    }

    #[test]
    fn test_roundtrip_multiple_chunks() {
        let dek = generate_data_key();
        let data = make_data(1000);
        let encoded = encode_container(&data, &dek, "obj-1", &config(64)).unwrap();
        assert_eq!(encoded.header.total_chunks, 16);
        assert_eq!(decode_container(&encoded.bytes, &dek, "obj-1").unwrap(), data);
    }

    #[test]
    fn test_roundtrip_chacha() {
        let dek = generate_data_key();
        let data = make_data(300);
        let cfg = ContainerConfig {
            chunk_size: 100,
            algorithm: AeadAlgorithm::ChaCha20Poly1305,
        };
        let encoded = encode_container(&data, &dek, "obj-c", &cfg).unwrap();
        assert_eq!(encoded.header.algo, AeadAlgorithm::ChaCha20Poly1305);
        assert_eq!(decode_container(&encoded.bytes, &dek, "obj-c").unwrap(), data);
    }

    #[test]
    fn test_empty_plaintext_has_one_authenticated_chunk() {
        let dek = generate_data_key();
        let encoded = encode_container(b"", &dek, "empty", &config(64)).unwrap();
        assert_eq!(encoded.header.total_chunks, 1);

        let layout = parse_container(&encoded.bytes).unwrap();
        assert_eq!(layout.chunks[0].len, TAG_SIZE);
        assert_eq!(decode_container(&encoded.bytes, &dek, "empty").unwrap(), b"");

        assert_eq!(
            decode_container(&encoded.bytes, &dek, "other").unwrap_err(),
            OczError::ChunkDecryptFailure { index: 0 }
        );
    }

    #[test]
    fn test_boundary_sizes() {
        let dek = generate_data_key();
        let cs = 64usize;
        let cases = [
            (0, 1, 0),
            (1, 1, 1),
            (cs - 1, 1, cs - 1),
            (cs, 1, cs),
            (cs + 1, 2, 1),
            (10 * cs, 10, cs),
        ];
        for (size, expected_chunks, last_plain) in cases {
            let data = make_data(size);
            let encoded = encode_container(&data, &dek, "b", &config(cs as u32)).unwrap();
            let layout = parse_container(&encoded.bytes).unwrap();

            assert_eq!(layout.header.total_chunks as usize, expected_chunks, "size {size}");
            assert_eq!(layout.chunks.len(), expected_chunks);
            assert_eq!(layout.chunks.last().unwrap().plaintext_len(), last_plain, "size {size}");
            assert_eq!(layout.plaintext_len(), size as u64);
            assert_eq!(decode_container(&encoded.bytes, &dek, "b").unwrap(), data);
        }
    }

    #[test]
    fn test_total_chunks_arithmetic() {
        assert_eq!(total_chunks(0, 4), 1);
        assert_eq!(total_chunks(4, 4), 1);
        assert_eq!(total_chunks(5, 4), 2);
        assert_eq!(total_chunks(10 * 1024 * 1024, 4 * 1024 * 1024), 3);
    }

    #[test]
    fn test_header_wire_format() {
        let dek = generate_data_key();
        let encoded = encode_container(b"abc", &dek, "o", &config(4096)).unwrap();
        let bytes = &encoded.bytes;

        assert_eq!(&bytes[..4], b"OCZ1");
        let header_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let header = std::str::from_utf8(&bytes[8..8 + header_len]).unwrap();
        let expected = format!(
            r#"{{"cryptoVersion":1,"algo":"AES-256-GCM","chunkSize":4096,"totalChunks":1,"baseIv":"{}","aadVersion":1,"headerVersion":1}}"#,
            encoded.header.base_iv
        );
        assert_eq!(header, expected);
        assert_eq!(bytes.len(), 8 + header_len + 3 + TAG_SIZE);
    }

    #[test]
    fn test_chunk_nonce_derivation() {
        let base = Nonce::from_bytes([0u8; NONCE_SIZE]);
        assert_eq!(chunk_nonce(&base, 0), base);

        let n = chunk_nonce(&base, 0x0102_0304);
        assert_eq!(&n.as_bytes()[..8], &[0u8; 8]);
        assert_eq!(&n.as_bytes()[8..], &[0x04, 0x03, 0x02, 0x01]);

        let base = Nonce::from_bytes([0xFF; NONCE_SIZE]);
        assert_eq!(&chunk_nonce(&base, 1).as_bytes()[8..], &[0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_chunk_nonces_pairwise_distinct() {
        let base = Nonce::random();
        let nonces: HashSet<Nonce> = (0..10_000).map(|i| chunk_nonce(&base, i)).collect();
        assert_eq!(nonces.len(), 10_000);
    }

    #[test]
    fn test_chunk_aad_format() {
        assert_eq!(chunk_aad("abc-123", 7, 1), b"abc-123:7:1");
    }

    #[test]
    fn test_cross_object_binding() {
        let dek = generate_data_key();
        let encoded = encode_container(&make_data(200), &dek, "object-A", &config(64)).unwrap();
        let err = decode_container(&encoded.bytes, &dek, "object-B").unwrap_err();
        assert!(matches!(err, OczError::ChunkDecryptFailure { .. }));
    }

    #[test]
    fn test_wrong_dek() {
        let encoded =
            encode_container(&make_data(200), &generate_data_key(), "o", &config(64)).unwrap();
        let err = decode_container(&encoded.bytes, &generate_data_key(), "o").unwrap_err();
        assert!(matches!(err, OczError::ChunkDecryptFailure { .. }));
    }

    #[test]
    fn test_tampered_chunk_reports_index() {
        let dek = generate_data_key();
        let encoded = encode_container(&make_data(200), &dek, "o", &config(64)).unwrap();
        let layout = parse_container(&encoded.bytes).unwrap();

        let mut bytes = encoded.bytes.clone();
        bytes[layout.chunks[2].offset + 5] ^= 0x01;
        assert_eq!(
            decode_container(&bytes, &dek, "o").unwrap_err(),
            OczError::ChunkDecryptFailure { index: 2 }
        );
    }

    #[test]
    fn test_every_single_bit_flip_is_detected() {
        let dek = generate_data_key();
        let data = make_data(40);
        let encoded = encode_container(&data, &dek, "flip", &config(16)).unwrap();

        for byte in 0..encoded.bytes.len() {
            for bit in 0..8 {
                let mut bytes = encoded.bytes.clone();
                bytes[byte] ^= 1 << bit;
                match decode_container(&bytes, &dek, "flip") {
                    Err(OczError::ContainerFormat(_)) | Err(OczError::ChunkDecryptFailure { .. }) => {}
                    other => panic!("flip at byte {byte} bit {bit} not detected: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_swapped_chunks_rejected() {
        let dek = generate_data_key();
        let encoded = encode_container(&make_data(128), &dek, "o", &config(64)).unwrap();
        let layout = parse_container(&encoded.bytes).unwrap();
        let (a, b) = (layout.chunks[0], layout.chunks[1]);

        let mut bytes = encoded.bytes.clone();
        let first = encoded.bytes[a.range()].to_vec();
        let second = encoded.bytes[b.range()].to_vec();
        bytes[a.range()].copy_from_slice(&second);
        bytes[b.range()].copy_from_slice(&first);

        assert!(matches!(
            decode_container(&bytes, &dek, "o"),
            Err(OczError::ChunkDecryptFailure { .. })
        ));
    }

    #[test]
    fn test_truncated_and_padded_rejected_before_decrypt() {
        let dek = generate_data_key();
        let encoded = encode_container(&make_data(130), &dek, "o", &config(64)).unwrap();

        let mut truncated = encoded.bytes.clone();
        truncated.pop();
        // A short last chunk still satisfies framing; AEAD rejects it.
        assert!(decode_container(&truncated, &dek, "o").is_err());

        let layout = parse_container(&encoded.bytes).unwrap();
        let without_last = &encoded.bytes[..layout.chunks[2].offset];
        assert!(matches!(
            parse_container(without_last),
            Err(OczError::ContainerFormat(_))
        ));

        let mut padded = encoded.bytes.clone();
        padded.extend_from_slice(&[0u8; 64]);
        assert!(matches!(parse_container(&padded), Err(OczError::ContainerFormat(_))));
    }

    #[test]
    fn test_bad_magic() {
        let dek = generate_data_key();
        let mut bytes = encode_container(b"x", &dek, "o", &config(64)).unwrap().bytes;
        bytes[0] = b'X';
        assert_eq!(
            parse_container(&bytes).unwrap_err(),
            OczError::ContainerFormat("bad magic".into())
        );
        assert!(matches!(parse_container(b"OCZ"), Err(OczError::ContainerFormat(_))));
    }

    #[test]
    fn test_unsupported_crypto_version() {
        let dek = generate_data_key();
        let encoded = encode_container(b"payload", &dek, "o", &config(64)).unwrap();
        let mut header = encoded.header.clone();
        header.crypto_version = 2;
        let bytes = with_header(&encoded.bytes, &serde_json::to_vec(&header).unwrap());

        let err = decode_container(&bytes, &dek, "o").unwrap_err();
        assert!(matches!(err, OczError::ContainerFormat(msg) if msg.contains("cryptoVersion")));
    }

    #[test]
    fn test_unknown_header_field_rejected() {
        let dek = generate_data_key();
        let encoded = encode_container(b"payload", &dek, "o", &config(64)).unwrap();
        let mut value = serde_json::to_value(&encoded.header).unwrap();
        value["compression"] = serde_json::json!("zstd");
        let bytes = with_header(&encoded.bytes, &serde_json::to_vec(&value).unwrap());

        assert!(matches!(parse_container(&bytes), Err(OczError::ContainerFormat(_))));
    }

    #[test]
    fn test_missing_header_field_rejected() {
        let dek = generate_data_key();
        let encoded = encode_container(b"payload", &dek, "o", &config(64)).unwrap();
        let mut value = serde_json::to_value(&encoded.header).unwrap();
        value.as_object_mut().unwrap().remove("aadVersion");
        let bytes = with_header(&encoded.bytes, &serde_json::to_vec(&value).unwrap());

        assert!(matches!(parse_container(&bytes), Err(OczError::ContainerFormat(_))));
    }

    #[test]
    fn test_oversized_header_length_rejected() {
        let mut bytes = Vec::from(&MAGIC[..]);
        bytes.extend_from_slice(&(MAX_HEADER_LEN as u32 + 1).to_le_bytes());
        bytes.extend_from_slice(&[b' '; 32]);
        assert!(matches!(parse_container(&bytes), Err(OczError::ContainerFormat(_))));
    }

    #[test]
    fn test_rejects_invalid_chunk_size_on_encode() {
        let dek = generate_data_key();
        assert!(encode_container(b"x", &dek, "o", &config(0)).is_err());
        assert!(encode_container(b"x", &dek, "o", &config(MAX_CHUNK_SIZE + 1)).is_err());
    }

    #[test]
    fn test_base_nonce_fresh_per_container() {
        let dek = generate_data_key();
        let a = encode_container(b"same", &dek, "o", &config(64)).unwrap();
        let b = encode_container(b"same", &dek, "o", &config(64)).unwrap();
        assert_ne!(a.header.base_iv, b.header.base_iv);
    }

    proptest! {
        #[test]
        fn container_roundtrip(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            chunk_size in 1u32..300,
        ) {
            let dek = generate_data_key();
            let encoded = encode_container(&data, &dek, "prop", &config(chunk_size)).unwrap();
            prop_assert_eq!(
                u64::from(encoded.header.total_chunks),
                total_chunks(data.len() as u64, chunk_size)
            );
            prop_assert_eq!(decode_container(&encoded.bytes, &dek, "prop").unwrap(), data);
        }

        #[test]
        fn nonces_distinct_for_any_base(base in any::<[u8; 12]>(), n in 2u32..512) {
            let base = Nonce::from_bytes(base);
            let nonces: HashSet<Nonce> = (0..n).map(|i| chunk_nonce(&base, i)).collect();
            prop_assert_eq!(nonces.len(), n as usize);
        }
    }
}
