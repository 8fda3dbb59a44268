//! ocz-engine: session key cache and object orchestration
//!
//! [`SessionCache`] holds the one live User Master Key with a sliding idle
//! timeout. [`ObjectCipher`] borrows it per call to encrypt and decrypt
//! objects: fresh data key, OCZ1 container, wrapped key and encrypted
//! display name.

pub mod clock;
pub mod object;
pub mod session;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use object::{DecryptedObject, EncryptedObject, ObjectCipher};
pub use session::{SessionCache, SessionEvent};
