//! Item selection for the editor.
//!
//! Selection is either a single item or a set; additive selection promotes a
//! single selection into a set seeded with the previous item. Selecting a
//! room also persists the room name so the session can be restored.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::config::UpdateLastRoomRequest;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectableItem {
    Room(String),
    Filler(usize),
}

impl SelectableItem {
    pub fn kind(&self) -> &'static str {
        match self {
            SelectableItem::Room(_) => "room",
            SelectableItem::Filler(_) => "filler",
        }
    }

    pub fn room_name(&self) -> Option<&str> {
        match self {
            SelectableItem::Room(name) => Some(name),
            SelectableItem::Filler(_) => None,
        }
    }
}

/// Current selection state. Never simultaneously single and multi.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Single(SelectableItem),
    Multi(HashSet<SelectableItem>),
}

impl Selection {
    /// Applies a select operation and returns the change notification to
    /// emit, or `None` when nothing changed (re-adding an item already in a
    /// multi selection).
    pub fn select(&mut self, item: SelectableItem, add: bool) -> Option<SelectionChanged> {
        let old = self.clone();
        let new = if !add {
            Selection::Single(item)
        } else {
            match &*self {
                Selection::None => Selection::Multi(HashSet::from([item])),
                Selection::Single(prev) => {
                    let mut set = HashSet::from([prev.clone()]);
                    set.insert(item);
                    Selection::Multi(set)
                }
                Selection::Multi(set) => {
                    if set.contains(&item) {
                        return None;
                    }
                    let mut set = set.clone();
                    set.insert(item);
                    Selection::Multi(set)
                }
            }
        };

        *self = new.clone();
        Some(SelectionChanged { old, new })
    }

    pub fn is_item_selected(&self, item: &SelectableItem) -> bool {
        match self {
            Selection::None => false,
            Selection::Single(selected) => selected == item,
            Selection::Multi(set) => set.contains(item),
        }
    }

    /// Room name of a single room selection
    pub fn selected_room(&self) -> Option<&str> {
        match self {
            Selection::Single(item) => item.room_name(),
            _ => None,
        }
    }

    /// Filler index of a single filler selection
    pub fn selected_filler(&self) -> Option<usize> {
        match self {
            Selection::Single(SelectableItem::Filler(index)) => Some(*index),
            _ => None,
        }
    }
}

#[derive(Message)]
pub struct SelectItemRequest {
    pub item: SelectableItem,
    pub add: bool,
}

#[derive(Message, Debug, Clone)]
pub struct SelectionChanged {
    pub old: Selection,
    pub new: Selection,
}

pub fn select_item_system(
    mut events: MessageReader<SelectItemRequest>,
    mut selection: ResMut<Selection>,
    mut changed_events: MessageWriter<SelectionChanged>,
    mut last_room_events: MessageWriter<UpdateLastRoomRequest>,
) {
    for event in events.read() {
        let Some(changed) = selection.select(event.item.clone(), event.add) else {
            continue;
        };
        if let Some(room) = event.item.room_name() {
            last_room_events.write(UpdateLastRoomRequest {
                room: room.to_string(),
            });
        }
        changed_events.write(changed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, ConfigPlugin};
    use crate::editor::EditorPlugin;

    fn room(name: &str) -> SelectableItem {
        SelectableItem::Room(name.to_string())
    }

    fn select_test_app() -> App {
        let mut app = App::new();
        app.add_plugins((ConfigPlugin, EditorPlugin));

        // Run Startup, then isolate the config so the test does not write
        // through the development config.json
        app.update();
        let scratch = std::env::temp_dir().join(format!(
            "mapwright-select-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&scratch).unwrap();
        let mut config = app.world_mut().resource_mut::<AppConfig>();
        config.data = Default::default();
        config.config_path = scratch.join("config.json");
        config.dirty = false;

        app
    }

    fn last_room(app: &App) -> Option<String> {
        app.world()
            .resource::<AppConfig>()
            .data
            .last_room_name
            .clone()
    }

    fn select(app: &mut App, item: SelectableItem, add: bool) {
        app.world_mut().write_message(SelectItemRequest { item, add });
        app.update();
        app.update();
    }

    #[test]
    fn test_selecting_room_persists_last_room_name() {
        let mut app = select_test_app();

        select(&mut app, room("lvl_a"), false);
        assert_eq!(last_room(&app).as_deref(), Some("lvl_a"));

        select(&mut app, room("lvl_b"), true);
        assert_eq!(last_room(&app).as_deref(), Some("lvl_b"));

        // Filler selections do not touch the persisted room
        select(&mut app, SelectableItem::Filler(2), true);
        assert_eq!(last_room(&app).as_deref(), Some("lvl_b"));

        // A multi-mode duplicate is a silent no-op: nothing is persisted
        app.world_mut()
            .resource_mut::<AppConfig>()
            .data
            .last_room_name = None;
        select(&mut app, room("lvl_b"), true);
        assert_eq!(last_room(&app), None);
    }

    #[test]
    fn test_select_replaces_wholesale() {
        let mut selection = Selection::default();
        assert!(selection.select(room("a"), false).is_some());
        let changed = selection.select(room("b"), false).unwrap();
        assert_eq!(changed.old, Selection::Single(room("a")));
        assert_eq!(selection, Selection::Single(room("b")));
    }

    #[test]
    fn test_additive_select_promotes_to_multi() {
        let mut selection = Selection::default();
        selection.select(room("a"), false);
        selection.select(room("b"), true).unwrap();

        assert_eq!(
            selection,
            Selection::Multi(HashSet::from([room("a"), room("b")]))
        );
    }

    #[test]
    fn test_re_adding_selected_item_is_silent_noop() {
        let mut selection = Selection::default();
        selection.select(room("a"), false);
        selection.select(room("b"), true);

        assert!(selection.select(room("b"), true).is_none());
        assert_eq!(
            selection,
            Selection::Multi(HashSet::from([room("a"), room("b")]))
        );
    }

    #[test]
    fn test_additive_select_from_empty() {
        let mut selection = Selection::default();
        selection.select(room("a"), true).unwrap();
        assert_eq!(selection, Selection::Multi(HashSet::from([room("a")])));
    }

    #[test]
    fn test_is_item_selected() {
        let mut selection = Selection::default();
        assert!(!selection.is_item_selected(&room("a")));

        selection.select(room("a"), false);
        assert!(selection.is_item_selected(&room("a")));
        assert!(!selection.is_item_selected(&room("b")));

        selection.select(SelectableItem::Filler(3), true);
        assert!(selection.is_item_selected(&room("a")));
        assert!(selection.is_item_selected(&SelectableItem::Filler(3)));
    }

    #[test]
    fn test_selected_room_and_filler_queries() {
        let mut selection = Selection::default();
        selection.select(room("a"), false);
        assert_eq!(selection.selected_room(), Some("a"));
        assert_eq!(selection.selected_filler(), None);

        selection.select(SelectableItem::Filler(7), false);
        assert_eq!(selection.selected_room(), None);
        assert_eq!(selection.selected_filler(), Some(7));

        selection.select(room("b"), true);
        assert_eq!(selection.selected_room(), None);
    }

    #[test]
    fn test_item_kinds() {
        assert_eq!(room("a").kind(), "room");
        assert_eq!(SelectableItem::Filler(0).kind(), "filler");
    }
}
