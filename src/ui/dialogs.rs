//! Native file dialog helpers for opening and saving maps.

use std::path::{Path, PathBuf};

use crate::constants::MAP_EXTENSION;

/// Asks the user for a map file to open, starting in `dir`.
pub fn pick_map_to_open(dir: &Path) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Map Files", &[MAP_EXTENSION])
        .set_directory(dir)
        .set_title("Open Map")
        .pick_file()
}

/// Asks the user for a save target, starting in `dir`. The save pipeline
/// appends the map extension when it is missing.
pub fn pick_save_target(dir: &Path, suggested_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Map Files", &[MAP_EXTENSION])
        .set_directory(dir)
        .set_file_name(suggested_name)
        .set_title("Save Map As")
        .save_file()
}
