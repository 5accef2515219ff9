//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// File extension for map files (without the leading dot)
pub const MAP_EXTENSION: &str = "map";

/// Extension appended to a map path while a save is being written.
/// The temporary file is only renamed over the target once the written
/// bytes have been verified.
pub const SAVING_EXTENSION: &str = "saving";

/// Maximum number of recent maps to remember in config
pub const MAX_RECENT_MAPS: usize = 10;

/// Package name assigned to freshly created maps
pub const UNTITLED_PACKAGE: &str = "untitled";
