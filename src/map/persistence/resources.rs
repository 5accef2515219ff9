//! Resource types for the document session and save/load state tracking.

use bevy::prelude::*;
use bevy::tasks::Task;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::map::map_data::Side;

use super::messages::SaveMapRequest;
use super::results::{LoadTaskResult, SaveTaskResult, VerifyTaskResult};

/// The currently loaded document. Replaced wholesale on each load; identity
/// fields are only mutated through the designated setters.
pub struct Document {
    pub filename: Option<PathBuf>,
    pub side: Side,
    /// Distinct decal depths per layer, derived at install time
    pub sub_layers: HashMap<String, Vec<i32>>,
}

impl Document {
    pub fn new(filename: Option<PathBuf>, side: Side) -> Self {
        let sub_layers = side.derive_sub_layers();
        Self {
            filename,
            side,
            sub_layers,
        }
    }
}

/// Session state for the open document.
#[derive(Resource, Default)]
pub struct Session {
    pub document: Option<Document>,
    pub unsaved_changes: bool,
}

impl Session {
    pub fn filename(&self) -> Option<&Path> {
        self.document.as_ref()?.filename.as_deref()
    }

    pub fn side(&self) -> Option<&Side> {
        self.document.as_ref().map(|d| &d.side)
    }
}

/// Default after-save hook: adopt the saved path as the document's filename
/// and mark the session clean.
pub fn stamp_document_filename(session: &mut Session, path: &Path) {
    if let Some(document) = session.document.as_mut() {
        document.filename = Some(path.to_path_buf());
        session.unsaved_changes = false;
    }
}

/// Filenames with an outstanding save. An entry exists only while a save
/// operation for that filename is in flight; saves to distinct filenames may
/// run concurrently.
#[derive(Resource, Default)]
pub struct InFlightSaves {
    saving: HashSet<PathBuf>,
}

impl InFlightSaves {
    pub fn is_saving(&self, path: &Path) -> bool {
        self.saving.contains(path)
    }

    pub fn mark(&mut self, path: PathBuf) {
        self.saving.insert(path);
    }

    pub fn clear(&mut self, path: &Path) {
        self.saving.remove(path);
    }

    pub fn is_empty(&self) -> bool {
        self.saving.is_empty()
    }
}

/// At most one queued save request per filename. A request arriving while
/// its filename is in flight overwrites any earlier queued request
/// (last-write-wins) instead of forming a queue.
#[derive(Resource, Default)]
pub struct PendingSaves {
    pending: HashMap<PathBuf, SaveMapRequest>,
}

impl PendingSaves {
    pub fn queue_delayed_save(&mut self, request: SaveMapRequest) {
        self.pending.insert(request.path.clone(), request);
    }

    pub fn take(&mut self, path: &Path) -> Option<SaveMapRequest> {
        self.pending.remove(path)
    }

    pub fn has_pending(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }
}

/// Tracks the single in-flight load for the modal loading state.
#[derive(Resource, Default)]
pub struct LoadInProgress {
    pub active: bool,
    pub description: Option<String>,
}

/// Component for save tasks
#[derive(Component)]
pub struct SaveMapTask(pub Task<SaveTaskResult>);

/// Component for load tasks
#[derive(Component)]
pub struct LoadMapTask(pub Task<LoadTaskResult>);

/// Component for post-write verification tasks
#[derive(Component)]
pub struct VerifySaveTask(pub Task<VerifyTaskResult>);
