//! Key derivation: password + salt + server-issued parameters → master key
//!
//! Two algorithms are supported so the server can migrate accounts over time:
//! Argon2id (memory-hard, default) and PBKDF2-HMAC-SHA256 (legacy).
//! Parameters are untrusted input and are bounds-checked before any work
//! starts, so a hostile record cannot pin the client on a multi-GiB derivation.

use std::time::Instant;

use argon2::{Algorithm, Argon2, Params, Version};
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use zeroize::Zeroize;

use ocz_core::types::{cost, MASTER_KEY_LEN};
use ocz_core::{KdfAlgorithm, KdfParams, OczError, OczResult};

use crate::{KEY_SIZE, MIN_SALT_SIZE};

/// Upper bound on Argon2id memory: 4 GiB
const MAX_ARGON2_MEMORY_KIB: u64 = 4 * 1024 * 1024;
const MAX_ARGON2_ITERATIONS: u64 = 64;
const MAX_ARGON2_PARALLELISM: u64 = 64;
const MAX_PBKDF2_ITERATIONS: u64 = 10_000_000;

/// PBKDF2 rounds are split into this many work units for progress and cancellation.
const PBKDF2_WORK_UNITS: u32 = 100;

/// A 256-bit master key derived from a password.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 16-byte salt for a new account.
///
/// The salt is not secret; the caller persists it with the account.
pub fn generate_salt() -> [u8; MIN_SALT_SIZE] {
    let mut salt = [0u8; MIN_SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// A parameter record that passed validation.
enum Derivation {
    Argon2id(Params),
    Pbkdf2Sha256 { iterations: u32 },
}

fn cost_param(params: &KdfParams, key: &str) -> OczResult<u64> {
    params
        .cost_parameters
        .get(key)
        .copied()
        .ok_or_else(|| OczError::KdfFailure(format!("{}: missing cost parameter {key}", params.algorithm)))
}

fn bounded(params: &KdfParams, key: &str, min: u64, max: u64) -> OczResult<u32> {
    let value = cost_param(params, key)?;
    if value < min || value > max {
        return Err(OczError::KdfFailure(format!(
            "{}: {key} = {value} outside [{min}, {max}]",
            params.algorithm
        )));
    }
    u32::try_from(value)
        .map_err(|_| OczError::KdfFailure(format!("{}: {key} overflows u32", params.algorithm)))
}

fn validate(password: &SecretString, salt: &[u8], params: &KdfParams) -> OczResult<Derivation> {
    if password.expose_secret().is_empty() {
        return Err(OczError::KdfFailure("empty password".into()));
    }
    if salt.len() < MIN_SALT_SIZE {
        return Err(OczError::KdfFailure(format!(
            "salt too short: {} bytes (minimum {MIN_SALT_SIZE})",
            salt.len()
        )));
    }
    if params.output_length != MASTER_KEY_LEN {
        return Err(OczError::KdfFailure(format!(
            "outputLength must be {MASTER_KEY_LEN}, got {}",
            params.output_length
        )));
    }

    let allowed: &[&str] = match params.algorithm {
        KdfAlgorithm::Argon2id => &[cost::MEMORY_KIB, cost::ITERATIONS, cost::PARALLELISM],
        KdfAlgorithm::Pbkdf2Sha256 => &[cost::ITERATIONS],
    };
    if let Some(unknown) = params
        .cost_parameters
        .keys()
        .find(|k| !allowed.contains(&k.as_str()))
    {
        return Err(OczError::KdfFailure(format!(
            "{}: unknown cost parameter {unknown}",
            params.algorithm
        )));
    }

    match params.algorithm {
        KdfAlgorithm::Argon2id => {
            let parallelism = bounded(params, cost::PARALLELISM, 1, MAX_ARGON2_PARALLELISM)?;
            let iterations = bounded(params, cost::ITERATIONS, 1, MAX_ARGON2_ITERATIONS)?;
            let memory_kib = bounded(
                params,
                cost::MEMORY_KIB,
                8 * u64::from(parallelism),
                MAX_ARGON2_MEMORY_KIB,
            )?;
            let argon2_params = Params::new(memory_kib, iterations, parallelism, Some(KEY_SIZE))
                .map_err(|e| OczError::KdfFailure(format!("invalid Argon2id params: {e}")))?;
            Ok(Derivation::Argon2id(argon2_params))
        }
        KdfAlgorithm::Pbkdf2Sha256 => {
            let iterations = bounded(params, cost::ITERATIONS, 1, MAX_PBKDF2_ITERATIONS)?;
            Ok(Derivation::Pbkdf2Sha256 { iterations })
        }
    }
}

/// Derive the master key. Blocks for as long as the parameters demand.
pub fn derive_master_key(
    password: &SecretString,
    salt: &[u8],
    params: &KdfParams,
) -> OczResult<MasterKey> {
    derive_master_key_with_progress(password, salt, params, &CancellationToken::new(), &|_| {})
}

/// Derive the master key, reporting progress (0..=100) and polling `cancel`
/// between work units.
///
/// PBKDF2 is split into 100 units of rounds. Argon2id runs as a single
/// indivisible unit because its passes share one memory matrix: progress
/// jumps from 0 to 100, and cancellation is honoured only before it starts.
/// A 64 MiB default derivation cannot be interrupted once running. A
/// cancelled derivation returns `KdfCancelled` and never a partial key.
pub fn derive_master_key_with_progress(
    password: &SecretString,
    salt: &[u8],
    params: &KdfParams,
    cancel: &CancellationToken,
    progress: &dyn Fn(u8),
) -> OczResult<MasterKey> {
    let derivation = validate(password, salt, params)?;
    if cancel.is_cancelled() {
        return Err(OczError::KdfCancelled);
    }

    let started = Instant::now();
    progress(0);
    let key = match derivation {
        Derivation::Argon2id(argon2_params) => {
            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);
            let mut key = [0u8; KEY_SIZE];
            argon2
                .hash_password_into(password.expose_secret().as_bytes(), salt, &mut key)
                .map_err(|e| OczError::KdfFailure(format!("Argon2id KDF failed: {e}")))?;
            progress(100);
            let master = MasterKey::from_bytes(key);
            key.zeroize();
            master
        }
        Derivation::Pbkdf2Sha256 { iterations } => {
            pbkdf2_sha256(password.expose_secret().as_bytes(), salt, iterations, cancel, progress)?
        }
    };

    debug!(
        algorithm = %params.algorithm,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "derived master key"
    );
    Ok(key)
}

type HmacSha256 = Hmac<Sha256>;

/// PBKDF2-HMAC-SHA256 (RFC 8018) for a single 32-byte output block.
fn pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    cancel: &CancellationToken,
    progress: &dyn Fn(u8),
) -> OczResult<MasterKey> {
    let prf = HmacSha256::new_from_slice(password)
        .map_err(|e| OczError::KdfFailure(format!("HMAC key setup: {e}")))?;

    let mut u = [0u8; KEY_SIZE];
    let mut t = [0u8; KEY_SIZE];

    let mut mac = prf.clone();
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    u.copy_from_slice(&mac.finalize().into_bytes());
    t.copy_from_slice(&u);

    let units = PBKDF2_WORK_UNITS.min(iterations);
    let mut done = 1u32;
    for unit in 1..=units {
        if cancel.is_cancelled() {
            u.zeroize();
            t.zeroize();
            return Err(OczError::KdfCancelled);
        }
        let target = (u64::from(iterations) * u64::from(unit) / u64::from(units)) as u32;
        while done < target {
            let mut mac = prf.clone();
            mac.update(&u);
            u.copy_from_slice(&mac.finalize().into_bytes());
            t.iter_mut().zip(u.iter()).for_each(|(acc, x)| *acc ^= x);
            done += 1;
        }
        progress((unit * 100 / units) as u8);
    }

    let master = MasterKey::from_bytes(t);
    u.zeroize();
    t.zeroize();
    Ok(master)
}
