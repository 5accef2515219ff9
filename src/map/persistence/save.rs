//! Map save pipeline: coalescing gate, async serialize/encode, task polling.
//!
//! For a single filename saves are strictly sequential: the in-flight flag
//! refuses overlap and the newest overlapping request waits in the pending
//! slot. Saves to distinct filenames run concurrently. All state maps are
//! only touched from main-thread system bodies; the background task carries
//! nothing but the request and a clone of the side.

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;
use std::path::Path;

use crate::config::AddRecentMapRequest;
use crate::map::codec;

use super::atomic;
use super::messages::{MapSaved, SaveFailed, SaveInterrupted, SaveMapRequest};
use super::resources::{InFlightSaves, PendingSaves, SaveMapTask, Session, VerifySaveTask};
use super::results::{SaveTaskResult, VerifyTaskResult};

/// Starts an async save, or queues the request when its filename is already
/// being written.
pub fn save_map_system(
    mut commands: Commands,
    mut events: MessageReader<SaveMapRequest>,
    session: Res<Session>,
    mut in_flight: ResMut<InFlightSaves>,
    mut pending: ResMut<PendingSaves>,
    mut interrupted_events: MessageWriter<SaveInterrupted>,
    mut failed_events: MessageWriter<SaveFailed>,
) {
    for event in events.read() {
        if event.path.as_os_str().is_empty() {
            continue;
        }
        let Some(side) = session.side() else {
            warn!("Save requested with no open document");
            continue;
        };

        let mut request = event.clone();
        if request.add_ext_if_missing {
            request.path = atomic::ensure_map_extension(request.path);
        }

        // Coalescing gate: one save per filename at a time. The newest
        // overlapping request replaces whatever was waiting.
        if in_flight.is_saving(&request.path) {
            pending.queue_delayed_save(request);
            continue;
        }
        in_flight.mark(request.path.clone());

        if let Some(check) = request.before_save
            && !check(side)
        {
            // Veto leaves the in-flight flag set and skips queue
            // resumption; saves to this filename stay blocked until the
            // session is restarted. Matches the observed editor behavior.
            warn!("Save of {:?} vetoed by before-save hook", request.path);
            interrupted_events.write(SaveInterrupted {
                path: request.path.clone(),
            });
            continue;
        }

        let write_target = if request.verify {
            atomic::saving_path(&request.path)
        } else {
            request.path.clone()
        };

        if let Err(e) = atomic::ensure_parent_dir(&write_target) {
            error!("Failed to create save directory for {:?}: {}", request.path, e);
            in_flight.clear(&request.path);
            failed_events.write(SaveFailed {
                path: request.path.clone(),
                error: format!("Failed to create save directory: {}", e),
            });
            // Terminal path like the poll failures: release any queued
            // request. Goes through commands since this system reads the
            // save message stream.
            if let Some(queued) = pending.take(&request.path) {
                commands.write_message(queued);
            }
            continue;
        }

        let side = side.clone();
        let task_pool = IoTaskPool::get();
        let task = task_pool.spawn(async move {
            let outcome = codec::serialize_side(&side)
                .and_then(|payload| codec::encode_file(&write_target, &payload));
            match outcome {
                Ok(()) => SaveTaskResult {
                    request,
                    write_target,
                    success: true,
                    error: None,
                },
                Err(e) => SaveTaskResult {
                    request,
                    write_target,
                    success: false,
                    error: Some(e),
                },
            }
        });

        commands.spawn(SaveMapTask(task));
    }
}

/// Polls save tasks; hands verified writes to the verify pipeline and
/// finishes direct writes.
pub fn poll_save_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut SaveMapTask)>,
    mut session: ResMut<Session>,
    mut in_flight: ResMut<InFlightSaves>,
    mut pending: ResMut<PendingSaves>,
    mut save_events: MessageWriter<SaveMapRequest>,
    mut failed_events: MessageWriter<SaveFailed>,
    mut saved_events: MessageWriter<MapSaved>,
    mut recent_events: MessageWriter<AddRecentMapRequest>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if !result.success {
            let error = result
                .error
                .unwrap_or_else(|| "Save failed".to_string());
            error!("{}", error);
            in_flight.clear(&result.request.path);
            failed_events.write(SaveFailed {
                path: result.request.path.clone(),
                error,
            });
            resume_queued_save(&mut pending, &mut save_events, &result.request.path);
            continue;
        }

        if result.request.verify {
            let temp_path = result.write_target;
            let request = result.request;
            let task_pool = IoTaskPool::get();
            let task = task_pool.spawn(async move {
                match codec::read_side(&temp_path) {
                    Ok(_) => VerifyTaskResult {
                        request,
                        temp_path,
                        success: true,
                        error: None,
                    },
                    Err(e) => VerifyTaskResult {
                        request,
                        temp_path,
                        success: false,
                        error: Some(e),
                    },
                }
            });
            commands.spawn(VerifySaveTask(task));
        } else {
            finish_save(
                result.request,
                &mut session,
                &mut in_flight,
                &mut pending,
                &mut save_events,
                &mut saved_events,
                &mut recent_events,
            );
        }
    }
}

/// Runs the after-save hook and declares save success: clears the in-flight
/// flag, updates recent files when this was not a backup save, and resumes
/// the pending queue last.
pub(super) fn finish_save(
    request: SaveMapRequest,
    session: &mut Session,
    in_flight: &mut InFlightSaves,
    pending: &mut PendingSaves,
    save_events: &mut MessageWriter<SaveMapRequest>,
    saved_events: &mut MessageWriter<MapSaved>,
    recent_events: &mut MessageWriter<AddRecentMapRequest>,
) {
    if let Some(hook) = request.after_save {
        hook(session, &request.path);
    }

    in_flight.clear(&request.path);
    info!("Map saved to {:?}", request.path);

    if session.filename() == Some(request.path.as_path()) {
        recent_events.write(AddRecentMapRequest {
            path: request.path.clone(),
        });
        saved_events.write(MapSaved {
            path: request.path.clone(),
        });
    }

    resume_queued_save(pending, save_events, &request.path);
}

/// Re-submits the queued request for a filename, if any. Called from every
/// terminal state of a save; re-submission goes through the message bus so
/// it is never re-entrant.
pub(super) fn resume_queued_save(
    pending: &mut PendingSaves,
    save_events: &mut MessageWriter<SaveMapRequest>,
    path: &Path,
) {
    if let Some(request) = pending.take(path) {
        save_events.write(request);
    }
}
