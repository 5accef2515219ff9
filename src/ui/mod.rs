//! Thin surface consumed by the external UI shell: the active scene, window
//! title text, and native file dialogs.

pub mod commands;
pub mod dialogs;

use bevy::prelude::*;

use crate::map::{LoadInProgress, Session};

pub use commands::{OpenMapCommand, SaveMapAsCommand, SaveMapCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneKind {
    #[default]
    Editor,
    Loading,
}

/// Which scene the UI shell should present. Switched to `Loading` while a
/// load is decoding and back to `Editor` at commit or failure.
#[derive(Resource, Default)]
pub struct ActiveScene {
    pub scene: SceneKind,
}

/// Title text the external shell should display, recomputed whenever the
/// session or the loading state changes.
#[derive(Resource, Default)]
pub struct WindowTitle {
    pub text: String,
}

/// Window title text for the external shell: map name plus a dirty marker.
pub fn window_title(session: &Session) -> String {
    let name = session
        .filename()
        .and_then(|p| p.file_stem())
        .and_then(|n| n.to_str())
        .unwrap_or("Untitled")
        .to_string();

    if session.unsaved_changes {
        format!("Mapwright - {} *", name)
    } else {
        format!("Mapwright - {}", name)
    }
}

fn update_window_title_system(
    session: Res<Session>,
    load_state: Res<LoadInProgress>,
    scene: Res<ActiveScene>,
    mut title: ResMut<WindowTitle>,
) {
    let text = match (&scene.scene, &load_state.description) {
        (SceneKind::Loading, Some(description)) => description.clone(),
        _ => window_title(&session),
    };
    if title.text != text {
        title.text = text;
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveScene>()
            .init_resource::<WindowTitle>()
            .add_message::<OpenMapCommand>()
            .add_message::<SaveMapCommand>()
            .add_message::<SaveMapAsCommand>()
            .add_systems(
                Update,
                (
                    commands::open_map_command_system.run_if(on_message::<OpenMapCommand>),
                    commands::save_map_command_system.run_if(on_message::<SaveMapCommand>),
                    commands::save_map_as_command_system.run_if(on_message::<SaveMapAsCommand>),
                    update_window_title_system,
                ),
            );
    }
}
