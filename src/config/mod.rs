use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::constants::MAX_RECENT_MAPS;
use crate::map::{InvalidateRenderCache, ShownDependenciesChanged};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfigData {
    /// Recently opened maps, most recent first, no duplicates
    #[serde(default)]
    pub recent_maps: Vec<PathBuf>,

    /// Last loaded map file path (not auto-loaded, just remembered)
    #[serde(default)]
    pub last_map_path: Option<PathBuf>,

    /// Name of the room selected when the session ended
    #[serde(default)]
    pub last_room_name: Option<String>,

    /// Per-layer list of mod dependencies whose content is shown
    #[serde(default)]
    pub shown_dependencies: HashMap<String, Vec<String>>,
}

impl AppConfigData {
    /// Moves the path to the front of the recent list, deduplicating and
    /// trimming to the configured maximum.
    pub fn add_recent_map(&mut self, path: PathBuf) {
        self.recent_maps.retain(|p| p != &path);
        self.recent_maps.insert(0, path);
        self.recent_maps.truncate(MAX_RECENT_MAPS);
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Resource for the "last map missing" startup warning
#[derive(Resource, Default)]
pub struct MissingMapWarning {
    pub show: bool,
    pub path: Option<PathBuf>,
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to add a map to the recent list
#[derive(Message)]
pub struct AddRecentMapRequest {
    pub path: PathBuf,
}

/// Message to update the last map path in config
#[derive(Message)]
pub struct UpdateLastMapPathRequest {
    pub path: PathBuf,
}

/// Message to persist the selected room name
#[derive(Message)]
pub struct UpdateLastRoomRequest {
    pub room: String,
}

/// Message to replace the shown-dependency list of a layer
#[derive(Message)]
pub struct SetShownDependenciesRequest {
    pub layer: String,
    pub dependencies: Vec<String>,
}

/// Result of loading config from disk
struct LoadConfigResult {
    config: AppConfig,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Load configuration from disk
fn load_config(config_path: PathBuf) -> LoadConfigResult {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    info!("Loaded config from {:?}", config_path);
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        AppConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    LoadConfigResult {
        config: AppConfig {
            data,
            config_path,
            dirty: false,
        },
        reset_reason,
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Installs a load result into the live resources, raising the reset
/// notification when the file had to be discarded.
fn apply_load_result(
    result: LoadConfigResult,
    config: &mut AppConfig,
    reset_notification: &mut ConfigResetNotification,
) {
    config.data = result.config.data;
    config.config_path = result.config.config_path;
    config.dirty = result.config.dirty;

    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(crate::paths::config_file());
    apply_load_result(result, &mut config, &mut reset_notification);
}

/// Startup system to check if the last loaded map still exists
fn check_last_map_exists(config: Res<AppConfig>, mut warning: ResMut<MissingMapWarning>) {
    if let Some(ref path) = config.data.last_map_path
        && !path.exists()
    {
        warning.show = true;
        warning.path = Some(path.clone());
        info!("Last opened map no longer exists: {:?}", path);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// System to add a map to the recent list
fn add_recent_map_system(
    mut events: MessageReader<AddRecentMapRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.add_recent_map(event.path.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

/// System to update the last map path
fn update_last_map_path_system(
    mut events: MessageReader<UpdateLastMapPathRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.last_map_path = Some(event.path.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

/// System to persist the selected room name
fn update_last_room_system(
    mut events: MessageReader<UpdateLastRoomRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.last_room_name = Some(event.room.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

/// System to update a layer's shown-dependency list. Changing which mod
/// content is displayed invalidates the render caches.
fn set_shown_dependencies_system(
    mut events: MessageReader<SetShownDependenciesRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
    mut changed_events: MessageWriter<ShownDependenciesChanged>,
    mut invalidate_events: MessageWriter<InvalidateRenderCache>,
) {
    for event in events.read() {
        let current = config.data.shown_dependencies.get(&event.layer);
        if current == Some(&event.dependencies) {
            continue;
        }
        config
            .data
            .shown_dependencies
            .insert(event.layer.clone(), event.dependencies.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        changed_events.write(ShownDependenciesChanged {
            layer: event.layer.clone(),
        });
        invalidate_events.write(InvalidateRenderCache);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<MissingMapWarning>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<AddRecentMapRequest>()
            .add_message::<UpdateLastMapPathRequest>()
            .add_message::<UpdateLastRoomRequest>()
            .add_message::<SetShownDependenciesRequest>()
            .add_systems(
                Startup,
                (load_config_system, check_last_map_exists)
                    .chain()
                    .in_set(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                    add_recent_map_system.run_if(on_message::<AddRecentMapRequest>),
                    update_last_map_path_system.run_if(on_message::<UpdateLastMapPathRequest>),
                    update_last_room_system.run_if(on_message::<UpdateLastRoomRequest>),
                    set_shown_dependencies_system
                        .run_if(on_message::<SetShownDependenciesRequest>),
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scratch_config(name: &str, contents: Option<&str>) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mapwright-config-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        path
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let path = scratch_config("missing", None);
        let result = load_config(path.clone());

        assert!(result.reset_reason.is_none());
        assert!(result.config.data.recent_maps.is_empty());
        assert_eq!(result.config.config_path, path);
        assert!(!result.config.dirty);
    }

    #[test]
    fn test_load_config_corrupted_file_resets_with_reason() {
        let path = scratch_config("corrupt", Some("{ this is not json"));
        let result = load_config(path);

        assert!(result.reset_reason.is_some());
        assert!(result.config.data.recent_maps.is_empty());
        assert!(result.config.data.last_map_path.is_none());
    }

    #[test]
    fn test_corrupted_config_raises_reset_notification() {
        let path = scratch_config("notify", Some("[1, 2, 3]"));
        let result = load_config(path);

        let mut config = AppConfig::default();
        let mut notification = ConfigResetNotification::default();
        apply_load_result(result, &mut config, &mut notification);

        assert!(notification.show);
        assert!(notification.reason.unwrap().contains("corrupted"));
        assert!(config.data.recent_maps.is_empty());
    }

    #[test]
    fn test_missing_last_map_sets_warning() {
        let mut app = App::new();
        let mut config = AppConfig::default();
        config.data.last_map_path = Some(PathBuf::from("/definitely/not/here.map"));
        app.insert_resource(config);
        app.init_resource::<MissingMapWarning>();
        app.add_systems(Update, check_last_map_exists);
        app.update();

        let warning = app.world().resource::<MissingMapWarning>();
        assert!(warning.show);
        assert_eq!(
            warning.path.as_deref(),
            Some(Path::new("/definitely/not/here.map"))
        );
    }

    #[test]
    fn test_existing_last_map_raises_no_warning() {
        let path = scratch_config("present", Some("{}"));

        let mut app = App::new();
        let mut config = AppConfig::default();
        config.data.last_map_path = Some(path);
        app.insert_resource(config);
        app.init_resource::<MissingMapWarning>();
        app.add_systems(Update, check_last_map_exists);
        app.update();

        let warning = app.world().resource::<MissingMapWarning>();
        assert!(!warning.show);
        assert!(warning.path.is_none());
    }

    #[test]
    fn test_app_config_data_default() {
        let data = AppConfigData::default();
        assert!(data.recent_maps.is_empty());
        assert!(data.last_map_path.is_none());
        assert!(data.last_room_name.is_none());
        assert!(data.shown_dependencies.is_empty());
    }

    #[test]
    fn test_add_recent_map_is_idempotent() {
        let mut data = AppConfigData::default();
        for _ in 0..5 {
            data.add_recent_map(PathBuf::from("/maps/a.map"));
        }
        assert_eq!(data.recent_maps, vec![PathBuf::from("/maps/a.map")]);
    }

    #[test]
    fn test_add_recent_map_moves_existing_to_front() {
        let mut data = AppConfigData::default();
        data.add_recent_map(PathBuf::from("/maps/a.map"));
        data.add_recent_map(PathBuf::from("/maps/b.map"));
        data.add_recent_map(PathBuf::from("/maps/a.map"));

        assert_eq!(
            data.recent_maps,
            vec![PathBuf::from("/maps/a.map"), PathBuf::from("/maps/b.map")]
        );
    }

    #[test]
    fn test_recent_maps_bounded() {
        let mut data = AppConfigData::default();
        for i in 0..(MAX_RECENT_MAPS + 10) {
            data.add_recent_map(PathBuf::from(format!("/maps/{}.map", i)));
        }
        assert_eq!(data.recent_maps.len(), MAX_RECENT_MAPS);
        // Most recent insertion stays at the front
        assert_eq!(
            data.recent_maps[0],
            PathBuf::from(format!("/maps/{}.map", MAX_RECENT_MAPS + 9))
        );
    }

    #[test]
    fn test_app_config_data_serialization() {
        let mut data = AppConfigData {
            recent_maps: vec![PathBuf::from("/maps/one.map"), PathBuf::from("/maps/two.map")],
            last_map_path: Some(PathBuf::from("/maps/one.map")),
            last_room_name: Some("lvl_2".to_string()),
            shown_dependencies: HashMap::new(),
        };
        data.shown_dependencies
            .insert("decalsFg".to_string(), vec!["somemod".to_string()]);

        let json = serde_json::to_string(&data).unwrap();
        let parsed: AppConfigData = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.recent_maps, data.recent_maps);
        assert_eq!(parsed.last_map_path, data.last_map_path);
        assert_eq!(parsed.last_room_name, data.last_room_name);
        assert_eq!(parsed.shown_dependencies, data.shown_dependencies);
    }

    #[test]
    fn test_missing_map_warning_default() {
        let warning = MissingMapWarning::default();
        assert!(!warning.show);
        assert!(warning.path.is_none());
    }
}
