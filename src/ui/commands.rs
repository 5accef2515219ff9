//! Document commands issued by the UI shell.
//!
//! These bridge menu/shortcut actions into the persistence requests: the
//! open and save-as commands run a native dialog first, the save command
//! reuses the document's filename when it has one.

use bevy::prelude::*;

use crate::constants::MAP_EXTENSION;
use crate::map::{LoadMapRequest, SaveMapRequest, Session};
use crate::paths;

use super::dialogs;

/// Open a map chosen through the file dialog
#[derive(Message)]
pub struct OpenMapCommand;

/// Save to the document's filename, or fall through to save-as
#[derive(Message)]
pub struct SaveMapCommand;

/// Save to a path chosen through the file dialog
#[derive(Message)]
pub struct SaveMapAsCommand;

pub fn open_map_command_system(
    mut events: MessageReader<OpenMapCommand>,
    mut load_events: MessageWriter<LoadMapRequest>,
) {
    for _ in events.read() {
        let Some(path) = dialogs::pick_map_to_open(&paths::maps_dir()) else {
            continue;
        };
        load_events.write(LoadMapRequest::new(path));
    }
}

pub fn save_map_command_system(
    mut events: MessageReader<SaveMapCommand>,
    session: Res<Session>,
    mut save_events: MessageWriter<SaveMapRequest>,
    mut save_as_events: MessageWriter<SaveMapAsCommand>,
) {
    for _ in events.read() {
        match session.filename() {
            Some(path) => {
                save_events.write(SaveMapRequest::new(path.to_path_buf()));
            }
            None => {
                save_as_events.write(SaveMapAsCommand);
            }
        }
    }
}

pub fn save_map_as_command_system(
    mut events: MessageReader<SaveMapAsCommand>,
    session: Res<Session>,
    mut save_events: MessageWriter<SaveMapRequest>,
) {
    for _ in events.read() {
        if session.document.is_none() {
            warn!("Save-as requested with no open document");
            continue;
        }
        let suggested = session
            .filename()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("untitled.{}", MAP_EXTENSION));

        let Some(path) = dialogs::pick_save_target(&paths::maps_dir(), &suggested) else {
            continue;
        };
        save_events.write(SaveMapRequest::new(path));
    }
}
