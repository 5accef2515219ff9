//! Message types for map persistence operations.
//!
//! Requests are consumed by the session systems; the remaining messages are
//! fire-and-forget notifications for the UI and renderer layers.

use bevy::prelude::*;
use std::path::{Path, PathBuf};

use crate::map::map_data::{Side, sanitize_side};

use super::resources::{Session, stamp_document_filename};

/// Hook run synchronously before a save starts. Returning false vetoes the
/// save.
pub type BeforeSaveHook = fn(&Side) -> bool;

/// Hook run after a verified write has been committed, before save success
/// is declared.
pub type AfterSaveHook = fn(&mut Session, &Path);

#[derive(Message, Clone)]
pub struct SaveMapRequest {
    pub path: PathBuf,
    /// Default stamps the document filename and clears the unsaved flag
    pub after_save: Option<AfterSaveHook>,
    /// Default runs the document sanitizer; `None` skips the check
    pub before_save: Option<BeforeSaveHook>,
    /// Append the map extension when the path lacks it
    pub add_ext_if_missing: bool,
    /// Write through a temporary file and re-read it before committing
    pub verify: bool,
}

impl SaveMapRequest {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            after_save: Some(stamp_document_filename),
            before_save: Some(sanitize_side),
            add_ext_if_missing: true,
            verify: true,
        }
    }

    /// Save to a secondary path without adopting it as the document's
    /// filename (backup semantics): no stamp, no recent-files entry.
    pub fn backup(path: PathBuf) -> Self {
        Self {
            after_save: None,
            ..Self::new(path)
        }
    }
}

/// Which notification a finished load emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAnnounce {
    Loaded,
    New,
}

#[derive(Message, Clone)]
pub struct LoadMapRequest {
    pub path: PathBuf,
    /// Room to select after the load; falls back to the document's first room
    pub room: Option<String>,
    pub announce: LoadAnnounce,
}

impl LoadMapRequest {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            room: None,
            announce: LoadAnnounce::Loaded,
        }
    }
}

#[derive(Message)]
pub struct NewMapRequest;

/// A load was refused because the current document has unsaved changes.
#[derive(Message)]
pub struct LoadBlocked {
    pub current: Option<PathBuf>,
    pub requested: PathBuf,
}

#[derive(Message)]
pub struct LoadFailed {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Message)]
pub struct MapLoaded {
    pub path: Option<PathBuf>,
}

#[derive(Message)]
pub struct MapNew;

/// A before-save hook refused the save. Intentional interruption, not an
/// error.
#[derive(Message)]
pub struct SaveInterrupted {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct SaveFailed {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Message)]
pub struct MapSaved {
    pub path: PathBuf,
}

/// A written file failed its post-write re-read. The corrupt artifact has
/// been deleted.
#[derive(Message)]
pub struct VerificationFailed {
    pub path: PathBuf,
    pub error: String,
}

/// Tells the external renderer to drop filename-scoped and per-room caches
/// and redraw the visible rooms.
#[derive(Message)]
pub struct InvalidateRenderCache;

/// Tells the external history tracker to reset the undo stack.
#[derive(Message)]
pub struct ClearHistoryRequest;
