//! Session key cache
//!
//! One slot holding the User Master Key behind a mutex, with a sliding idle
//! timeout measured on a monotonic [`Clock`]. Readers get a clone of the key
//! taken under the lock, so a concurrent re-initialize is never observed
//! half-written. Keys leaving the slot (clear, expiry, replacement) are
//! zeroized when dropped.
//!
//! Expiry is evaluated lazily on every access. [`SessionCache::spawn_expiry_watcher`]
//! additionally polls on an interval so that subscribers hear about an idle
//! session going away even when nothing touches it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use secrecy::SecretString;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use ocz_core::config::MAX_SESSION_SECS;
use ocz_core::{KdfParams, OczError, OczResult, SessionConfig};
use ocz_crypto::{derive_master_key, derive_master_key_with_progress, MasterKey};

use crate::clock::{Clock, MonotonicClock};

const EVENT_CAPACITY: usize = 16;

/// Shortest period the expiry watcher polls at.
const MIN_WATCH_PERIOD: Duration = Duration::from_millis(1);

/// Observable session transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A master key was installed (first unlock or re-initialize).
    Started,
    /// The idle timeout elapsed. Emitted once per session.
    Expired,
    /// The session was cleared explicitly.
    Cleared,
}

struct SessionEntry {
    key: MasterKey,
    expires_at: Instant,
    last_activity: Instant,
}

/// Evict the entry if it is past its deadline. Returns true when it did.
fn evict_if_expired(slot: &mut Option<SessionEntry>, now: Instant) -> bool {
    if slot.as_ref().is_some_and(|entry| now >= entry.expires_at) {
        *slot = None;
        true
    } else {
        false
    }
}

/// Single-slot, time-bounded holder for the User Master Key.
pub struct SessionCache {
    slot: Mutex<Option<SessionEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("ttl", &self.ttl)
            .field("active", &self.lock().is_some())
            .finish()
    }
}

impl SessionCache {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    pub fn with_clock(config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            slot: Mutex::new(None),
            ttl: config.ttl().min(Duration::from_secs(MAX_SESSION_SECS)),
            clock,
            events,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expiry deadline for activity at `now`. An unrepresentable deadline
    /// expires immediately.
    fn deadline(&self, now: Instant) -> Instant {
        now.checked_add(self.ttl).unwrap_or(now)
    }

    // A panic while holding the lock cannot leave the Option half-written.
    fn lock(&self) -> MutexGuard<'_, Option<SessionEntry>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn notify_expired(&self) {
        info!("session expired after {}s idle", self.ttl.as_secs());
        self.emit(SessionEvent::Expired);
    }

    /// Derive the master key from `password` and start a session with it.
    ///
    /// Blocks for the duration of the KDF. On failure the previous session,
    /// if any, is left untouched.
    pub fn initialize(
        &self,
        password: &SecretString,
        salt: &[u8],
        params: &KdfParams,
    ) -> OczResult<()> {
        let key = derive_master_key(password, salt, params)?;
        self.install(key);
        Ok(())
    }

    /// Like [`initialize`](Self::initialize), with progress and cancellation.
    pub fn initialize_with_progress(
        &self,
        password: &SecretString,
        salt: &[u8],
        params: &KdfParams,
        cancel: &CancellationToken,
        progress: &dyn Fn(u8),
    ) -> OczResult<()> {
        let key = derive_master_key_with_progress(password, salt, params, cancel, progress)?;
        self.install(key);
        Ok(())
    }

    /// Run the KDF on the blocking pool and start a session with the result.
    ///
    /// Progress (0..=100) is published on `progress` if given. Cancelling
    /// `cancel` stops the derivation at its next work unit with `KdfCancelled`.
    ///
    /// Argon2id is a single work unit: it reports only 0 and 100, and once
    /// started it runs to completion even if `cancel` fires. Cancellation
    /// then takes effect before the key is installed only for PBKDF2.
    pub async fn initialize_in_background(
        self: &Arc<Self>,
        password: SecretString,
        salt: Vec<u8>,
        params: KdfParams,
        cancel: CancellationToken,
        progress: Option<watch::Sender<u8>>,
    ) -> OczResult<()> {
        let cache = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let report = |percent: u8| {
                if let Some(tx) = &progress {
                    tx.send_replace(percent);
                }
            };
            cache.initialize_with_progress(&password, &salt, &params, &cancel, &report)
        })
        .await
        .map_err(|e| OczError::KdfFailure(format!("derivation task failed: {e}")))?
    }

    /// Start a session with an already-derived master key, replacing any
    /// existing one.
    ///
    /// A previous session that had already lapsed is reported as `Expired`
    /// before the new one's `Started`.
    pub fn install(&self, key: MasterKey) {
        let now = self.clock.now();
        let mut slot = self.lock();
        let expired = evict_if_expired(&mut slot, now);
        let previous = slot.replace(SessionEntry {
            key,
            expires_at: self.deadline(now),
            last_activity: now,
        });
        drop(slot);
        if previous.is_some() {
            debug!("replaced previous session key");
        }
        drop(previous);

        if expired {
            self.notify_expired();
        }
        info!(ttl_secs = self.ttl.as_secs(), "session started");
        self.emit(SessionEvent::Started);
    }

    /// The cached master key, or `NoActiveSession` if absent or expired.
    ///
    /// Does not extend the session; call [`touch`](Self::touch) on activity.
    pub fn get(&self) -> OczResult<MasterKey> {
        let mut slot = self.lock();
        let expired = evict_if_expired(&mut slot, self.clock.now());
        let key = slot.as_ref().map(|entry| entry.key.clone());
        drop(slot);

        if expired {
            self.notify_expired();
        }
        key.ok_or(OczError::NoActiveSession)
    }

    /// Whether a live session exists.
    pub fn has(&self) -> bool {
        let mut slot = self.lock();
        let expired = evict_if_expired(&mut slot, self.clock.now());
        let active = slot.is_some();
        drop(slot);

        if expired {
            self.notify_expired();
        }
        active
    }

    /// Slide the expiry forward from now. Returns false if there was no live
    /// session to extend.
    pub fn touch(&self) -> bool {
        let now = self.clock.now();
        let mut slot = self.lock();
        let expired = evict_if_expired(&mut slot, now);
        let extended = match slot.as_mut() {
            Some(entry) => {
                entry.expires_at = self.deadline(now);
                entry.last_activity = now;
                true
            }
            None => false,
        };
        drop(slot);

        if expired {
            self.notify_expired();
        }
        extended
    }

    /// Time left before the session expires, if one is live.
    pub fn remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.lock()
            .as_ref()
            .and_then(|entry| entry.expires_at.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    /// When the session was last used, if one is held.
    pub fn last_activity(&self) -> Option<Instant> {
        self.lock().as_ref().map(|entry| entry.last_activity)
    }

    /// Evict the session now, wiping the key.
    ///
    /// `Cleared` is emitted only when a live session was removed; a session
    /// that had already lapsed is reported as `Expired` instead.
    pub fn clear(&self) {
        let mut slot = self.lock();
        let expired = evict_if_expired(&mut slot, self.clock.now());
        let previous = slot.take();
        drop(slot);

        if expired {
            self.notify_expired();
        } else if previous.is_some() {
            drop(previous);
            info!("session cleared");
            self.emit(SessionEvent::Cleared);
        }
    }

    /// Evict the session if it has expired. Returns true if this call evicted it.
    pub fn check_expiry(&self) -> bool {
        let expired = evict_if_expired(&mut self.lock(), self.clock.now());
        if expired {
            self.notify_expired();
        }
        expired
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Poll [`check_expiry`](Self::check_expiry) every `period` until
    /// `shutdown` is cancelled. Periods below 1 ms are raised to 1 ms.
    pub fn spawn_expiry_watcher(
        self: &Arc<Self>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = period.max(MIN_WATCH_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(period_ms = period.as_millis() as u64, "session expiry watcher started");
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        debug!("session expiry watcher stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.check_expiry();
                    }
                }
            }
        })
    }
}
