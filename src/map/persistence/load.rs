//! Map load pipeline: crash recovery, async decode/deserialize, commit.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;
use std::path::PathBuf;

use crate::config::{AddRecentMapRequest, UpdateLastMapPathRequest, UpdateLastRoomRequest};
use crate::editor::{SelectableItem, Selection, SelectionChanged};
use crate::map::codec;
use crate::map::map_data::Side;
use crate::ui::{ActiveScene, SceneKind};

use super::atomic;
use super::messages::{
    ClearHistoryRequest, InvalidateRenderCache, LoadAnnounce, LoadBlocked, LoadFailed,
    LoadMapRequest, MapLoaded, MapNew, NewMapRequest,
};
use super::resources::{Document, LoadInProgress, LoadMapTask, Session};
use super::results::LoadTaskResult;

/// Messages written while committing a freshly decoded document.
#[derive(SystemParam)]
pub struct CommitMessages<'w> {
    invalidate: MessageWriter<'w, InvalidateRenderCache>,
    clear_history: MessageWriter<'w, ClearHistoryRequest>,
    recent: MessageWriter<'w, AddRecentMapRequest>,
    last_map: MessageWriter<'w, UpdateLastMapPathRequest>,
    last_room: MessageWriter<'w, UpdateLastRoomRequest>,
    loaded: MessageWriter<'w, MapLoaded>,
    map_new: MessageWriter<'w, MapNew>,
    selection_changed: MessageWriter<'w, SelectionChanged>,
}

/// Starts an async load operation.
pub fn load_map_system(
    mut commands: Commands,
    mut events: MessageReader<LoadMapRequest>,
    session: Res<Session>,
    mut load_state: ResMut<LoadInProgress>,
    mut scene: ResMut<ActiveScene>,
    mut blocked_events: MessageWriter<LoadBlocked>,
    mut failed_events: MessageWriter<LoadFailed>,
) {
    for event in events.read() {
        if event.path.as_os_str().is_empty() {
            continue;
        }

        if session.unsaved_changes {
            blocked_events.write(LoadBlocked {
                current: session.filename().map(|p| p.to_path_buf()),
                requested: event.path.clone(),
            });
            continue;
        }

        if load_state.active {
            warn!("Load operation already in progress");
            continue;
        }

        // Finish or discard a save interrupted by a crash before reading
        // the target.
        if let Err(e) = atomic::recover_interrupted_save(&event.path) {
            failed_events.write(LoadFailed {
                path: event.path.clone(),
                error: format!("Failed to recover interrupted save: {}", e),
            });
            continue;
        }

        let map_name = event
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("map")
            .to_string();

        scene.scene = SceneKind::Loading;
        load_state.active = true;
        load_state.description = Some(format!("Loading {}...", map_name));

        let path = event.path.clone();
        let room = event.room.clone();
        let announce = event.announce;
        let task_pool = IoTaskPool::get();
        let task = task_pool.spawn(async move {
            match codec::read_side(&path) {
                Ok(side) => LoadTaskResult {
                    path,
                    room,
                    announce,
                    side: Some(side),
                    error: None,
                },
                Err(e) => LoadTaskResult {
                    path,
                    room,
                    announce,
                    side: None,
                    error: Some(e),
                },
            }
        });

        commands.spawn(LoadMapTask(task));
    }
}

/// Polls load tasks and commits the decoded document.
pub fn poll_load_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadMapTask)>,
    mut session: ResMut<Session>,
    mut selection: ResMut<Selection>,
    mut load_state: ResMut<LoadInProgress>,
    mut scene: ResMut<ActiveScene>,
    mut failed_events: MessageWriter<LoadFailed>,
    mut messages: CommitMessages,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();

        load_state.active = false;
        load_state.description = None;

        let Some(side) = result.side else {
            let error = result
                .error
                .unwrap_or_else(|| "Load produced no document".to_string());
            error!("Failed to load {:?}: {}", result.path, error);
            scene.scene = SceneKind::Editor;
            failed_events.write(LoadFailed {
                path: result.path,
                error,
            });
            continue;
        };

        info!("Map loaded from {:?}", result.path);
        update_side_state(
            &mut session,
            &mut selection,
            &mut scene,
            &mut messages,
            Some(result.path),
            side,
            result.room,
            result.announce,
        );
    }
}

/// Installs a freshly created blank document unless unsaved changes block
/// the replacement.
pub fn new_map_system(
    mut events: MessageReader<NewMapRequest>,
    mut session: ResMut<Session>,
    mut selection: ResMut<Selection>,
    mut scene: ResMut<ActiveScene>,
    mut blocked_events: MessageWriter<LoadBlocked>,
    mut messages: CommitMessages,
) {
    for _ in events.read() {
        if session.unsaved_changes {
            blocked_events.write(LoadBlocked {
                current: session.filename().map(|p| p.to_path_buf()),
                requested: PathBuf::from("untitled"),
            });
            continue;
        }

        info!("Created new map");
        update_side_state(
            &mut session,
            &mut selection,
            &mut scene,
            &mut messages,
            None,
            Side::new_untitled(),
            None,
            LoadAnnounce::New,
        );
    }
}

/// Commit step shared by load and new-map.
///
/// The ordering is a contract: cache invalidation and history reset happen
/// before the document is installed and the initial room selected, which
/// happens before the persistence writes, which happen before the scene
/// switch and the final notification. Observers of the loaded/new message
/// may assume document and selection are fully established.
#[allow(clippy::too_many_arguments)]
fn update_side_state(
    session: &mut Session,
    selection: &mut Selection,
    scene: &mut ActiveScene,
    messages: &mut CommitMessages,
    filename: Option<PathBuf>,
    side: Side,
    requested_room: Option<String>,
    announce: LoadAnnounce,
) {
    messages.invalidate.write(InvalidateRenderCache);
    messages.clear_history.write(ClearHistoryRequest);

    let document = Document::new(filename.clone(), side);
    let initial_room = requested_room
        .filter(|name| document.side.room_by_name(name).is_some())
        .or_else(|| document.side.first_room_name());
    session.document = Some(document);
    session.unsaved_changes = false;

    if let Some(room) = initial_room {
        if let Some(changed) = selection.select(SelectableItem::Room(room.clone()), false) {
            messages.selection_changed.write(changed);
        }
        messages.last_room.write(UpdateLastRoomRequest { room });
    }

    if let Some(path) = &filename {
        messages.recent.write(AddRecentMapRequest { path: path.clone() });
        messages.last_map.write(UpdateLastMapPathRequest { path: path.clone() });
    }

    scene.scene = SceneKind::Editor;

    match announce {
        LoadAnnounce::Loaded => {
            messages.loaded.write(MapLoaded { path: filename });
        }
        LoadAnnounce::New => {
            messages.map_new.write(MapNew);
        }
    }
}
