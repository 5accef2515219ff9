mod codec;
mod layer;
pub mod map_data;
pub mod persistence;

pub use codec::{read_side, write_side};
pub use layer::{
    CurrentLayer, LayerInformation, LayerState, LayerTargets, SetCurrentLayerRequest,
    SetLayerForceRenderRequest, SetLayerVisibleRequest, layer_display_name,
};
pub use layer::{LayerInfoChanged, ShownDependenciesChanged};
pub use map_data::{Decal, Filler, MapData, Room, Side, SideMeta, sanitize_side};
pub use persistence::{
    ClearHistoryRequest, Document, InFlightSaves, InvalidateRenderCache, LoadAnnounce,
    LoadBlocked, LoadFailed, LoadInProgress, LoadMapRequest, MapLoaded, MapNew, MapSaved,
    NewMapRequest, PendingSaves, SaveFailed, SaveInterrupted, SaveMapRequest, Session,
    VerificationFailed,
};

use bevy::prelude::*;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Session>()
            .init_resource::<InFlightSaves>()
            .init_resource::<PendingSaves>()
            .init_resource::<LoadInProgress>()
            .init_resource::<LayerInformation>()
            .init_resource::<CurrentLayer>()
            .add_message::<SaveMapRequest>()
            .add_message::<LoadMapRequest>()
            .add_message::<NewMapRequest>()
            .add_message::<LoadBlocked>()
            .add_message::<LoadFailed>()
            .add_message::<MapLoaded>()
            .add_message::<MapNew>()
            .add_message::<SaveInterrupted>()
            .add_message::<SaveFailed>()
            .add_message::<MapSaved>()
            .add_message::<VerificationFailed>()
            .add_message::<InvalidateRenderCache>()
            .add_message::<ClearHistoryRequest>()
            .add_message::<SetCurrentLayerRequest>()
            .add_message::<SetLayerVisibleRequest>()
            .add_message::<SetLayerForceRenderRequest>()
            .add_message::<LayerInfoChanged>()
            .add_message::<ShownDependenciesChanged>()
            .add_systems(
                Update,
                (
                    persistence::save_map_system.run_if(on_message::<SaveMapRequest>),
                    persistence::load_map_system.run_if(on_message::<LoadMapRequest>),
                    persistence::new_map_system.run_if(on_message::<NewMapRequest>),
                    persistence::poll_save_tasks,
                    persistence::poll_verify_tasks,
                    persistence::poll_load_tasks,
                    layer::set_current_layer_system.run_if(on_message::<SetCurrentLayerRequest>),
                    layer::set_layer_visible_system.run_if(on_message::<SetLayerVisibleRequest>),
                    layer::set_layer_force_render_system
                        .run_if(on_message::<SetLayerForceRenderRequest>),
                ),
            );
    }
}
