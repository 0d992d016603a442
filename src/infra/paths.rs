// src/infra/paths.rs — Config path management
//
// All paths respect the DESIGNLOOP_HOME environment variable for isolation.
// When unset, config lives under ~/.designloop/.

use std::path::PathBuf;

/// Returns the DESIGNLOOP_HOME override, if set.
fn designloop_home() -> Option<PathBuf> {
    std::env::var_os("DESIGNLOOP_HOME").map(PathBuf::from)
}

/// Configuration directory: $DESIGNLOOP_HOME/ or ~/.designloop/
pub fn config_dir() -> PathBuf {
    if let Some(home) = designloop_home() {
        return home;
    }
    dirs_home().join(".designloop")
}

/// Home directory, or the working directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
