//! # tally-core
//!
//! Core library for Tally, the rolling activity-time summarizer. Folds a
//! stream of incremental "seen" observations into a deduplicated,
//! display-ordered set of per-(class, name) totals with a trailing
//! retention window, backed by a single JSON storage slot.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients provide their
//!   own synchronization (`Mutex`, `RwLock`).
//! - **Graceful degradation**: A missing or corrupt storage slot loads as
//!   an empty track set, never an error.
//! - **Explicit state**: The track set is owned by an [`Engine`] value that
//!   callers create and thread through; there is no process-wide singleton.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tally_core::{Engine, EngineConfig, SlotStore};
//!
//! let store = SlotStore::new(config.tracks_file());
//! let mut engine = Engine::new(Box::new(store), EngineConfig::default(), Utc::now());
//! engine.observe(&observation, Utc::now());
//! let rollup = engine.rollup();
//! ```

pub mod duration;
pub mod engine;
pub mod error;
pub mod retention;
pub mod rollup;
pub mod storage;
pub mod store;
pub mod track;

pub use engine::{Engine, EngineConfig};
pub use error::{Result, TallyError};
pub use retention::DEFAULT_WINDOW_HOURS;
pub use rollup::{rollup, ClassRollup, ClassTotal};
pub use storage::StorageConfig;
pub use store::{SlotStore, TrackStore};
pub use track::{Observation, Track, TrackSet};
