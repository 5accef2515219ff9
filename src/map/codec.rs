//! On-disk codec for map files.
//!
//! A map file is a small magic header followed by the serialized document
//! form. Decode/encode move raw bytes between disk and memory;
//! serialize/deserialize move between bytes and the [`Side`] structure.
//! The save and load pipelines run these stages on background tasks and
//! carry errors back to the main thread as strings.

use std::path::Path;

use super::map_data::Side;

/// Magic bytes prefixed to every map file
const MAGIC: &[u8; 8] = b"MWMAP\x00\x00\x01";

/// Read and unwrap the payload bytes of a map file.
pub fn decode_file(path: &Path) -> Result<Vec<u8>, String> {
    let raw = std::fs::read(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    if raw.len() < MAGIC.len() || &raw[..MAGIC.len()] != MAGIC {
        return Err(format!("{:?} is not a map file", path));
    }
    Ok(raw[MAGIC.len()..].to_vec())
}

/// Wrap payload bytes with the map header and write them to disk.
pub fn encode_file(path: &Path, payload: &[u8]) -> Result<(), String> {
    let mut raw = Vec::with_capacity(MAGIC.len() + payload.len());
    raw.extend_from_slice(MAGIC);
    raw.extend_from_slice(payload);
    std::fs::write(path, raw).map_err(|e| format!("Failed to write {:?}: {}", path, e))
}

pub fn serialize_side(side: &Side) -> Result<Vec<u8>, String> {
    serde_json::to_vec(side).map_err(|e| format!("Failed to serialize map: {}", e))
}

pub fn deserialize_side(payload: &[u8]) -> Result<Side, String> {
    serde_json::from_slice(payload).map_err(|e| format!("Failed to parse map: {}", e))
}

/// Full decode + deserialize, used by the load and verify pipelines.
pub fn read_side(path: &Path) -> Result<Side, String> {
    let payload = decode_file(path)?;
    deserialize_side(&payload)
}

/// Full serialize + encode, used by the save pipeline.
pub fn write_side(path: &Path, side: &Side) -> Result<(), String> {
    let payload = serialize_side(side)?;
    encode_file(path, &payload)
}
