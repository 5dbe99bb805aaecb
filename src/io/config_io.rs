use std::path::Path;

use chrono::Utc;

use crate::io::paths;
use crate::model::{GlobalConfig, LocalConfig};
use crate::store::{Datasource, StoreError};

/// Open the home-level config at its default location.
pub fn global_config() -> Result<Datasource<GlobalConfig>, StoreError> {
    global_config_at(&paths::global_config_path())
}

/// Open a home-level config stored at `path`. A missing file yields defaults.
pub fn global_config_at(path: &Path) -> Result<Datasource<GlobalConfig>, StoreError> {
    let ds = Datasource::toml(path);
    ds.load_or_recover()?;
    Ok(ds)
}

/// Open the per-root config under the reserved directory.
pub fn local_config(root: &Path) -> Result<Datasource<LocalConfig>, StoreError> {
    let ds = Datasource::toml(paths::local_config_file(root));
    ds.load_or_recover()?;
    Ok(ds)
}

/// Record that the TUI was started, for the update reminder.
pub fn touch_update_check(config: &Datasource<GlobalConfig>) -> Result<(), StoreError> {
    config.update(|c| c.last_update_check = Some(Utc::now()))
}
