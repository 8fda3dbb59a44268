pub mod config;
pub mod error;
pub mod types;

pub use config::{ContainerConfig, OczConfig, SessionConfig};
pub use error::{OczError, OczResult};
pub use types::{AeadAlgorithm, KdfAlgorithm, KdfParams, ObjectMetadata};
