use std::path::PathBuf;

const DATA_DIR_NAME: &str = "velocity-remap";

/// Returns a directory to store plugin data in,
/// if the platform has a data directory at all.
pub fn global_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(DATA_DIR_NAME))
}
