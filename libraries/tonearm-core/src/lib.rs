//! Tonearm Core
//!
//! Platform-agnostic types and collaborator traits for the Tonearm playback engine.
//!
//! This crate provides the boundary the playback engine talks through:
//! - **Domain Types**: `Track`, `TrackId`
//! - **Collaborator Traits**: `CatalogLookup` (track metadata), `KeyValueStore` (durable state)
//! - **Stores**: `MemoryStore` and `FileStore` implementations of `KeyValueStore`
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tonearm_core::{KeyValueStore, MemoryStore, Track};
//! use std::time::Duration;
//!
//! let track = Track::new("t1", "Blue in Green")
//!     .with_artists(["Miles Davis"])
//!     .with_duration(Duration::from_secs(337));
//! assert_eq!(track.id.as_str(), "t1");
//!
//! let store = MemoryStore::new();
//! store.set("key", "value").unwrap();
//! assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use storage::{FileStore, MemoryStore};
pub use traits::{CatalogLookup, KeyValueStore};
pub use types::{Track, TrackId};
