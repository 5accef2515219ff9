//! Per-layer render-state table.
//!
//! Tracks `visible` and `force_render` flags per layer. A layer renders when
//! either flag is set. Flag changes that flip any layer's computed
//! should-render value trigger a render-cache invalidation so the external
//! renderer redraws the visible rooms.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use super::persistence::InvalidateRenderCache;

#[derive(Debug, Clone)]
pub struct LayerState {
    pub visible: bool,
    pub force_render: bool,
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            visible: true,
            force_render: false,
        }
    }
}

impl LayerState {
    pub fn should_render(&self) -> bool {
        self.visible || self.force_render
    }
}

/// Target set for a force-render update: one layer or several.
#[derive(Debug, Clone)]
pub enum LayerTargets {
    One(String),
    Many(HashSet<String>),
}

impl LayerTargets {
    pub fn contains(&self, layer: &str) -> bool {
        match self {
            LayerTargets::One(name) => name == layer,
            LayerTargets::Many(names) => names.contains(layer),
        }
    }

    fn names(&self) -> Vec<String> {
        match self {
            LayerTargets::One(name) => vec![name.clone()],
            LayerTargets::Many(names) => names.iter().cloned().collect(),
        }
    }
}

/// Resource mapping layer identifier to its render state.
///
/// Entries are created lazily on first access and are keyed by layer name,
/// so they persist across document reloads; staleness is handled by cache
/// invalidation rather than clearing the table.
#[derive(Resource, Default)]
pub struct LayerInformation {
    layers: HashMap<String, LayerState>,
}

impl LayerInformation {
    fn entry(&mut self, layer: &str) -> &mut LayerState {
        self.layers.entry(layer.to_string()).or_default()
    }

    pub fn layer_visible(&self, layer: &str) -> bool {
        self.layers.get(layer).map(|l| l.visible).unwrap_or(true)
    }

    pub fn layer_force_render(&self, layer: &str) -> bool {
        self.layers
            .get(layer)
            .map(|l| l.force_render)
            .unwrap_or(false)
    }

    pub fn layer_should_render(&self, layer: &str) -> bool {
        self.layers
            .get(layer)
            .map(LayerState::should_render)
            .unwrap_or(true)
    }

    /// Sets the visible flag. Returns true when any layer's computed
    /// should-render value changed.
    pub fn set_layer_visible(&mut self, layer: &str, visible: bool) -> bool {
        let state = self.entry(layer);
        let before = state.should_render();
        state.visible = visible;
        state.should_render() != before
    }

    /// Applies `current` to every layer in the target set and `other` to all
    /// other existing entries. Supports isolating a subset of layers to
    /// force-render while clearing the flag everywhere else in one call.
    ///
    /// Returns true when any layer's computed should-render value changed.
    pub fn set_layer_force_render(
        &mut self,
        targets: &LayerTargets,
        current: bool,
        other: bool,
    ) -> bool {
        for name in targets.names() {
            self.entry(&name);
        }

        let mut changed = false;
        for (name, state) in self.layers.iter_mut() {
            let before = state.should_render();
            state.force_render = if targets.contains(name) { current } else { other };
            changed |= state.should_render() != before;
        }
        changed
    }
}

/// Layer the editor currently places new items on
#[derive(Resource)]
pub struct CurrentLayer {
    pub name: String,
}

impl Default for CurrentLayer {
    fn default() -> Self {
        Self {
            name: "entities".to_string(),
        }
    }
}

/// Human-readable name for a layer identifier
pub fn layer_display_name(layer: &str) -> &str {
    match layer {
        "tilesFg" => "Foreground Tiles",
        "tilesBg" => "Background Tiles",
        "decalsFg" => "Foreground Decals",
        "decalsBg" => "Background Decals",
        "entities" => "Entities",
        "triggers" => "Triggers",
        other => other,
    }
}

#[derive(Message)]
pub struct SetLayerVisibleRequest {
    pub layer: String,
    pub visible: bool,
    /// Suppress cache invalidation and change notification
    pub silent: bool,
}

#[derive(Message)]
pub struct SetLayerForceRenderRequest {
    pub targets: LayerTargets,
    pub current: bool,
    pub other: bool,
    /// Suppress cache invalidation and change notification
    pub silent: bool,
}

impl SetLayerForceRenderRequest {
    pub fn isolate(targets: LayerTargets) -> Self {
        Self {
            targets,
            current: true,
            other: false,
            silent: false,
        }
    }
}

/// Switch the layer new items are placed on
#[derive(Message)]
pub struct SetCurrentLayerRequest {
    pub layer: String,
}

/// Notification that a layer's render state changed
#[derive(Message)]
pub struct LayerInfoChanged;

/// Notification that a layer's shown-dependency list changed
#[derive(Message)]
pub struct ShownDependenciesChanged {
    pub layer: String,
}

pub fn set_layer_visible_system(
    mut events: MessageReader<SetLayerVisibleRequest>,
    mut layer_info: ResMut<LayerInformation>,
    mut changed_events: MessageWriter<LayerInfoChanged>,
    mut invalidate_events: MessageWriter<InvalidateRenderCache>,
) {
    for event in events.read() {
        let changed = layer_info.set_layer_visible(&event.layer, event.visible);
        if changed && !event.silent {
            changed_events.write(LayerInfoChanged);
            invalidate_events.write(InvalidateRenderCache);
        }
    }
}

pub fn set_current_layer_system(
    mut events: MessageReader<SetCurrentLayerRequest>,
    mut current: ResMut<CurrentLayer>,
) {
    for event in events.read() {
        if current.name != event.layer {
            info!("Current layer: {}", layer_display_name(&event.layer));
            current.name = event.layer.clone();
        }
    }
}

pub fn set_layer_force_render_system(
    mut events: MessageReader<SetLayerForceRenderRequest>,
    mut layer_info: ResMut<LayerInformation>,
    mut changed_events: MessageWriter<LayerInfoChanged>,
    mut invalidate_events: MessageWriter<InvalidateRenderCache>,
) {
    for event in events.read() {
        let changed = layer_info.set_layer_force_render(&event.targets, event.current, event.other);
        if changed && !event.silent {
            changed_events.write(LayerInfoChanged);
            invalidate_events.write(InvalidateRenderCache);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_layer_defaults() {
        let info = LayerInformation::default();
        assert!(info.layer_visible("tilesFg"));
        assert!(!info.layer_force_render("tilesFg"));
        assert!(info.layer_should_render("tilesFg"));
    }

    #[test]
    fn test_force_render_overrides_hidden() {
        let mut info = LayerInformation::default();
        info.set_layer_visible("decalsFg", false);
        assert!(!info.layer_should_render("decalsFg"));

        info.set_layer_force_render(&LayerTargets::One("decalsFg".into()), true, false);
        assert!(info.layer_should_render("decalsFg"));

        info.set_layer_force_render(&LayerTargets::One("decalsFg".into()), false, false);
        assert!(!info.layer_should_render("decalsFg"));
    }

    #[test]
    fn test_set_visible_reports_effective_change_only() {
        let mut info = LayerInformation::default();
        // visible -> visible is not an effective change
        assert!(!info.set_layer_visible("entities", true));
        assert!(info.set_layer_visible("entities", false));
        // hidden layer with force_render set: toggling visible changes nothing
        info.set_layer_force_render(&LayerTargets::One("entities".into()), true, false);
        assert!(!info.set_layer_visible("entities", true));
    }

    #[test]
    fn test_force_render_isolates_target_set() {
        let mut info = LayerInformation::default();
        info.set_layer_visible("a", false);
        info.set_layer_visible("b", false);
        info.set_layer_visible("c", false);
        info.set_layer_force_render(&LayerTargets::One("b".into()), true, false);

        let mut targets = HashSet::new();
        targets.insert("a".to_string());
        targets.insert("c".to_string());
        info.set_layer_force_render(&LayerTargets::Many(targets), true, false);

        assert!(info.layer_should_render("a"));
        assert!(!info.layer_should_render("b"));
        assert!(info.layer_should_render("c"));
    }

    #[test]
    fn test_isolate_request_forces_target_and_clears_rest() {
        let request = SetLayerForceRenderRequest::isolate(LayerTargets::One("decalsFg".into()));
        assert!(request.current);
        assert!(!request.other);
        assert!(!request.silent);

        let mut info = LayerInformation::default();
        info.set_layer_visible("decalsFg", false);
        info.set_layer_visible("entities", false);
        info.set_layer_force_render(&LayerTargets::One("entities".into()), true, false);

        info.set_layer_force_render(&request.targets, request.current, request.other);
        assert!(info.layer_should_render("decalsFg"));
        assert!(!info.layer_should_render("entities"));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(layer_display_name("tilesFg"), "Foreground Tiles");
        assert_eq!(layer_display_name("custom"), "custom");
    }
}
