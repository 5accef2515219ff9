//! Post-write verification: re-read the just-written temp file to prove it
//! is loadable before renaming it over the target.

use bevy::prelude::*;
use futures_lite::future;

use crate::config::AddRecentMapRequest;

use super::atomic;
use super::messages::{MapSaved, SaveFailed, SaveMapRequest, VerificationFailed};
use super::resources::{InFlightSaves, PendingSaves, Session, VerifySaveTask};
use super::save::{finish_save, resume_queued_save};

/// Polls verification tasks and commits or discards the written file.
///
/// Verification failure means corrupt bytes reached the disk, so it is
/// treated as more severe than a plain task failure: the artifact is
/// deleted before anything else happens. The in-flight flag is cleared and
/// the queue resumed on every terminal path so the filename cannot wedge.
pub fn poll_verify_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut VerifySaveTask)>,
    mut session: ResMut<Session>,
    mut in_flight: ResMut<InFlightSaves>,
    mut pending: ResMut<PendingSaves>,
    mut save_events: MessageWriter<SaveMapRequest>,
    mut failed_events: MessageWriter<SaveFailed>,
    mut saved_events: MessageWriter<MapSaved>,
    mut recent_events: MessageWriter<AddRecentMapRequest>,
    mut verification_events: MessageWriter<VerificationFailed>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();

        let path = result.request.path.clone();

        if !result.success {
            let error = result
                .error
                .unwrap_or_else(|| "Verification failed".to_string());
            error!("Verification of {:?} failed: {}", path, error);
            if result.temp_path.exists()
                && let Err(e) = std::fs::remove_file(&result.temp_path)
            {
                warn!("Failed to remove unverifiable file {:?}: {}", result.temp_path, e);
            }
            verification_events.write(VerificationFailed {
                path: path.clone(),
                error,
            });
            in_flight.clear(&path);
            resume_queued_save(&mut pending, &mut save_events, &path);
            continue;
        }

        if let Err(e) = atomic::commit_saved_file(&path) {
            let error = format!("Failed to commit saved file: {}", e);
            error!("{}", error);
            in_flight.clear(&path);
            failed_events.write(SaveFailed {
                path: path.clone(),
                error,
            });
            resume_queued_save(&mut pending, &mut save_events, &path);
            continue;
        }

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
