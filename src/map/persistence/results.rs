//! Result types carried back from background tasks.

use std::path::PathBuf;

use crate::map::map_data::Side;

use super::messages::{LoadAnnounce, SaveMapRequest};

/// Result of an async serialize + encode step. Carries the originating
/// request so the poll system can run its hooks and resume the queue.
pub struct SaveTaskResult {
    pub request: SaveMapRequest,
    /// Where the bytes were written: the temp file when verifying, the
    /// final path otherwise
    pub write_target: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

/// Result of an async decode + deserialize step.
pub struct LoadTaskResult {
    pub path: PathBuf,
    pub room: Option<String>,
    pub announce: LoadAnnounce,
    pub side: Option<Side>,
    pub error: Option<String>,
}

/// Result of re-reading a just-written temp file.
pub struct VerifyTaskResult {
    pub request: SaveMapRequest,
    pub temp_path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}
