mod selection;

pub use selection::{
    SelectItemRequest, SelectableItem, Selection, SelectionChanged, select_item_system,
};

use bevy::prelude::*;

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Selection>()
            .add_message::<SelectItemRequest>()
            .add_message::<SelectionChanged>()
            .add_systems(
                Update,
                selection::select_item_system.run_if(on_message::<SelectItemRequest>),
            );
    }
}
