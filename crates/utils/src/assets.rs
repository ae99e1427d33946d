use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "";
const ORGANIZATION: &str = "";
const APPLICATION: &str = "dashboard";

/// Per-user data directory, e.g. `~/.local/share/dashboard` on Linux.
pub fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Default location of the persisted session file.
pub fn session_file() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("session.json"))
}
