use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::UNTITLED_PACKAGE;

/// The decoded in-memory form of a map document ("side").
///
/// A side owns the map proper plus side-level metadata that is not part of
/// the room structure (mod dependencies, format revision).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Side {
    pub map: MapData,
    #[serde(default)]
    pub meta: SideMeta,
}

impl Default for Side {
    fn default() -> Self {
        Self {
            map: MapData::default(),
            meta: SideMeta::default(),
        }
    }
}

impl Side {
    /// A fresh side with a single empty room, used for "new map".
    pub fn new_untitled() -> Self {
        Self {
            map: MapData {
                package: UNTITLED_PACKAGE.to_string(),
                rooms: vec![Room {
                    name: "lvl_1".to_string(),
                    ..Room::default()
                }],
                fillers: Vec::new(),
            },
            meta: SideMeta::default(),
        }
    }

    pub fn room_by_name(&self, name: &str) -> Option<&Room> {
        self.map.rooms.iter().find(|r| r.name == name)
    }

    pub fn first_room_name(&self) -> Option<String> {
        self.map.rooms.first().map(|r| r.name.clone())
    }

    /// Derives the per-layer sub-layer index from decal depths.
    ///
    /// Sub-layers are the distinct depth values present on each layer,
    /// sorted ascending. Recomputed whenever a document is installed.
    pub fn derive_sub_layers(&self) -> HashMap<String, Vec<i32>> {
        let mut sub_layers: HashMap<String, Vec<i32>> = HashMap::new();
        for room in &self.map.rooms {
            for decal in &room.decals {
                let depths = sub_layers.entry(decal.layer.clone()).or_default();
                if !depths.contains(&decal.depth) {
                    depths.push(decal.depth);
                }
            }
        }
        for depths in sub_layers.values_mut() {
            depths.sort_unstable();
        }
        sub_layers
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideMeta {
    /// Format revision of the file this side was decoded from
    pub revision: u32,
    /// Mod packages this side depends on
    pub dependencies: Vec<String>,
}

impl Default for SideMeta {
    fn default() -> Self {
        Self {
            revision: 1,
            dependencies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapData {
    pub package: String,
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub fillers: Vec<Filler>,
}

impl Default for MapData {
    fn default() -> Self {
        Self {
            package: UNTITLED_PACKAGE.to_string(),
            rooms: Vec::new(),
            fillers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub decals: Vec<Decal>,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: 0,
            y: 0,
            width: 320,
            height: 184,
            decals: Vec::new(),
        }
    }
}

/// Rectangular filler block outside any room
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Filler {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decal {
    pub texture: String,
    pub layer: String,
    pub depth: i32,
    pub x: f32,
    pub y: f32,
}

/// Default before-save hook: rejects documents that would round-trip badly.
///
/// A save is vetoed when two rooms share a name or a room has a
/// non-positive extent, since both break room lookup on reload.
pub fn sanitize_side(side: &Side) -> bool {
    let mut seen: Vec<&str> = Vec::with_capacity(side.map.rooms.len());
    for room in &side.map.rooms {
        if room.width <= 0 || room.height <= 0 {
            return false;
        }
        if seen.contains(&room.name.as_str()) {
            return false;
        }
        seen.push(&room.name);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str) -> Room {
        Room {
            name: name.to_string(),
            ..Room::default()
        }
    }

    #[test]
    fn test_new_untitled_has_one_room() {
        let side = Side::new_untitled();
        assert_eq!(side.map.rooms.len(), 1);
        assert_eq!(side.map.package, UNTITLED_PACKAGE);
        assert_eq!(side.first_room_name().as_deref(), Some("lvl_1"));
    }

    #[test]
    fn test_room_by_name() {
        let mut side = Side::default();
        side.map.rooms = vec![room("a"), room("b")];
        assert!(side.room_by_name("b").is_some());
        assert!(side.room_by_name("c").is_none());
    }

    #[test]
    fn test_derive_sub_layers_sorted_and_deduplicated() {
        let mut side = Side::default();
        let mut r = room("a");
        r.decals = vec![
            Decal {
                texture: "t1".into(),
                layer: "decalsFg".into(),
                depth: 5,
                x: 0.0,
                y: 0.0,
            },
            Decal {
                texture: "t2".into(),
                layer: "decalsFg".into(),
                depth: -3,
                x: 0.0,
                y: 0.0,
            },
            Decal {
                texture: "t3".into(),
                layer: "decalsFg".into(),
                depth: 5,
                x: 8.0,
                y: 8.0,
            },
            Decal {
                texture: "t4".into(),
                layer: "decalsBg".into(),
                depth: 0,
                x: 0.0,
                y: 0.0,
            },
        ];
        side.map.rooms.push(r);

        let sub_layers = side.derive_sub_layers();
        assert_eq!(sub_layers["decalsFg"], vec![-3, 5]);
        assert_eq!(sub_layers["decalsBg"], vec![0]);
    }

    #[test]
    fn test_sanitize_accepts_valid_side() {
        let mut side = Side::default();
        side.map.rooms = vec![room("a"), room("b")];
        assert!(sanitize_side(&side));
    }

    #[test]
    fn test_sanitize_rejects_duplicate_room_names() {
        let mut side = Side::default();
        side.map.rooms = vec![room("a"), room("a")];
        assert!(!sanitize_side(&side));
    }

    #[test]
    fn test_sanitize_rejects_degenerate_room() {
        let mut side = Side::default();
        let mut bad = room("a");
        bad.width = 0;
        side.map.rooms = vec![bad];
        assert!(!sanitize_side(&side));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let side = Side::new_untitled();
        let json = serde_json::to_string(&side).unwrap();
        let parsed: Side = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.map.package, side.map.package);
        assert_eq!(parsed.map.rooms.len(), 1);
    }
}
