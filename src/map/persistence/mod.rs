//! Map persistence: the async load/save pipelines and their state.
//!
//! Handles async file I/O for map documents, including:
//! - Save/load with async task pooling
//! - Crash-safe atomic writes through `.saving` temporaries
//! - Post-write verification before commit
//! - Per-filename save coalescing (one in-flight, one pending)
//!
//! ## Module Structure
//!
//! - [`messages`] - Request and notification message types
//! - [`resources`] - Session, in-flight/pending maps, task components
//! - [`results`] - Result types for async operations
//! - [`atomic`] - Temporary-file durability protocol
//! - [`save`] - Save system and task polling
//! - [`verify`] - Post-write verification polling
//! - [`load`] - Load/new-map systems and task polling

pub mod atomic;
mod load;
mod messages;
mod resources;
mod results;
mod save;
mod verify;


// Re-exports - Messages
pub use messages::{
    AfterSaveHook, BeforeSaveHook, ClearHistoryRequest, InvalidateRenderCache, LoadAnnounce,
    LoadBlocked, LoadFailed, LoadMapRequest, MapLoaded, MapNew, MapSaved, NewMapRequest,
    SaveFailed, SaveInterrupted, SaveMapRequest, VerificationFailed,
};

// Re-exports - Resources
pub use resources::{
    Document, InFlightSaves, LoadInProgress, PendingSaves, Session, stamp_document_filename,
};

// Re-exports - Systems
pub use load::{load_map_system, new_map_system, poll_load_tasks};
pub use save::{poll_save_tasks, save_map_system};
pub use verify::poll_verify_tasks;
