//! Durable playback state
//!
//! `codec` is pure (projection, validation, expiry); `manager` owns every
//! interaction with the key-value store.

pub mod codec;
mod manager;

pub use codec::{PersistedItem, PersistedSnapshot};
pub use manager::PersistenceManager;
