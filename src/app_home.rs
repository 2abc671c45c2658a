//! Per-user configuration directory.

use directories_next::ProjectDirs;
use once_cell::sync::Lazy;
use std::ffi::OsString;
use std::ops::Deref;
use std::path::Path;
use std::path::PathBuf;
use tracing::warn;

/// Directory holding `base_url.txt` and `settings.json`.
#[derive(Clone, Debug)]
pub struct AppHome(pub PathBuf);

impl AppHome {
    pub const ENV_VAR: &'static str = "THUMBINFO_CONFIG_DIR";

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }

    /// `$THUMBINFO_CONFIG_DIR` when set, else the platform config dir.
    pub fn resolve() -> eyre::Result<AppHome> {
        Self::resolve_with(std::env::var_os(Self::ENV_VAR))
    }

    fn resolve_with(override_dir: Option<OsString>) -> eyre::Result<AppHome> {
        if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
            return Ok(AppHome(PathBuf::from(dir)));
        }
        project_dirs()
            .map(|pd| AppHome(pd.config_dir().to_path_buf()))
            .ok_or_else(|| eyre::eyre!("Could not determine config directory"))
    }
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "teamdman", "thumbinfo")
}

impl Deref for AppHome {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.0.as_path()
    }
}

pub static APP_HOME: Lazy<AppHome> = Lazy::new(|| match AppHome::resolve() {
    Ok(a) => a,
    Err(e) => {
        warn!("Failed to resolve app home: {}", e);
        AppHome(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
});
