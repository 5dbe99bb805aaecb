use std::path::{Path, PathBuf};

/// Reserved directory at the workspace root; never scanned as a topic.
pub const RESERVED_DIR: &str = ".hangar";

/// Workspace metadata document, under the reserved directory
pub const WORKSPACES_FILE: &str = "workspaces.json";

/// Per-root preferences, under the reserved directory
pub const LOCAL_CONFIG_FILE: &str = "config.toml";

pub const LOG_FILE: &str = "hangar.log";

/// Get the global config file path, respecting XDG_CONFIG_HOME
pub fn global_config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    config_dir.join("hangar").join("config.toml")
}

/// Get the user's home directory
pub fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

pub fn reserved_dir(root: &Path) -> PathBuf {
    root.join(RESERVED_DIR)
}

pub fn workspaces_file(root: &Path) -> PathBuf {
    reserved_dir(root).join(WORKSPACES_FILE)
}

pub fn local_config_file(root: &Path) -> PathBuf {
    reserved_dir(root).join(LOCAL_CONFIG_FILE)
}

/// Pick the workspace root: explicit flag, then `HANGAR_ROOT`, then the
/// global config's `root`, then `~/hangar`.
pub fn resolve_root(flag: Option<&str>, configured: Option<&str>) -> PathBuf {
    let env = std::env::var("HANGAR_ROOT").ok();
    resolve_root_from(flag, env.as_deref(), configured)
}

fn resolve_root_from(flag: Option<&str>, env: Option<&str>, configured: Option<&str>) -> PathBuf {
    let chosen = flag
        .or(env)
        .or(configured)
        .filter(|s| !s.trim().is_empty());
    match chosen {
        Some(p) => expand_tilde(p),
        None => home_dir().join("hangar"),
    }
}

/// Expand a leading `~` to $HOME
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

/// Abbreviate a path by replacing $HOME with ~
pub fn abbreviate_path(path: &Path) -> String {
    let text = path.to_string_lossy().to_string();
    if let Ok(home) = std::env::var("HOME")
        && let Some(rest) = text.strip_prefix(&home)
    {
        return format!("~{}", rest);
    }
    text
}

/// Directory entries that are never topics or workspaces
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
