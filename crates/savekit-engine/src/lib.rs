//! Savekit Engine -- save/load orchestration over pluggable storage.
//!
//! [`SaveManager`](manager::SaveManager) walks trackable
//! [`SaveObject`](object::SaveObject)s, discovers the saved fields of each
//! attached component, converts them to JSON-safe values under
//! `"{id}.{Component}.{key}"` keys and hands the snapshot to a
//! [`SaveBackend`](backend::SaveBackend). Loading resolves each field by its
//! primary key first and its aliases second.
//!
//! # Quick Start
//!
//! ```
//! use savekit_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Stats {
//!     health: i32,
//!     pos: Vector3,
//! }
//!
//! savekit_engine::save_component!(Stats {
//!     health: i32 => save("health", "hp"),
//!     pos: Vector3 => save(),
//! });
//!
//! let mut manager = SaveManager::new(MemoryBackend::new());
//! let objects = vec![SaveObject::new("player")
//!     .with_id(SaveId::new("P1").unwrap())
//!     .with_component(Stats { health: 100, pos: Vector3::new(1.0, 2.0, 3.0) })];
//!
//! let report = manager.save("slot1", &objects).unwrap();
//! assert_eq!(report.entries_written, 2);
//!
//! let mut fresh = vec![SaveObject::new("player")
//!     .with_id(SaveId::new("P1").unwrap())
//!     .with_component(Stats::default())];
//! manager.load("slot1", &mut fresh).unwrap();
//! assert_eq!(fresh[0].component::<Stats>().map(|s| s.health), Some(100));
//! ```

#![deny(unsafe_code)]

pub mod backend;
pub mod config;
pub mod context;
pub mod manager;
pub mod object;

use std::path::PathBuf;

pub use savekit_convert;
pub use savekit_schema;
pub use savekit_convert::{save_enum, save_struct};
pub use savekit_schema::save_component;

use savekit_schema::SchemaError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort a whole save, load or backend operation.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Slot names must be non-empty.
    #[error("slot name must not be empty")]
    InvalidSlotName,

    /// Save ids must be non-empty.
    #[error("save id must not be empty")]
    InvalidId,

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A save file exists but is not a JSON object of values.
    #[error("malformed save data at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by a custom backend.
    #[error("backend failed for slot '{slot}': {details}")]
    Backend { slot: String, details: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid configuration {}: {details}", path.display())]
    Config { path: PathBuf, details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::backend::{FileBackend, MemoryBackend, SaveBackend};
    pub use crate::config::{init_logging, SaveConfig};
    pub use crate::context::SaveContext;
    pub use crate::manager::{LoadReport, SaveManager, SaveReport};
    pub use crate::object::{ObjectSource, SaveId, SaveObject};
    pub use crate::SaveError;
    pub use savekit_schema::prelude::*;
}
