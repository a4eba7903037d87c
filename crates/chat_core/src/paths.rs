use std::path::PathBuf;

const APP_DIR_NAME: &str = ".chat_frontend";

/// Per-user application directory (~/.chat_frontend)
pub fn app_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

/// User level config.json
pub fn config_json_path() -> PathBuf {
    app_dir().join("config.json")
}

/// Project level config.toml, resolved against the working directory
pub fn config_toml_path() -> PathBuf {
    PathBuf::from("config.toml")
}
