//! Default locations for thumbnail and remote-original caches.
//!
//! Only naming and locating lives here; nothing is ever evicted.

use crate::app_home::project_dirs;
use once_cell::sync::Lazy;
use std::path::Path;
use std::path::PathBuf;
use tracing::warn;

/// The cache home directory.
pub static CACHE_HOME: Lazy<CacheHome> = Lazy::new(|| match CacheHome::resolve() {
    Ok(c) => c,
    Err(e) => {
        warn!("Failed to resolve cache home: {}", e);
        CacheHome(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
});

/// Helper that resolves the application cache directory.
#[derive(Clone, Debug)]
pub struct CacheHome(pub PathBuf);

impl CacheHome {
    pub const ENV_VAR: &'static str = "THUMBINFO_CACHE_DIR";

    /// `$THUMBINFO_CACHE_DIR` when set, else the platform cache dir.
    pub fn resolve() -> eyre::Result<CacheHome> {
        match std::env::var_os(Self::ENV_VAR).filter(|d| !d.is_empty()) {
            Some(dir) => Ok(CacheHome(PathBuf::from(dir))),
            None => project_dirs()
                .map(|pd| CacheHome(pd.cache_dir().to_path_buf()))
                .ok_or_else(|| eyre::eyre!("Could not determine cache directory")),
        }
    }

    /// Where generated thumbnails are named.
    pub fn thumbs_dir(&self) -> PathBuf {
        self.0.join("thumbs")
    }

    /// Where copies of remote originals and their info files go.
    pub fn remote_dir(&self) -> PathBuf {
        self.0.join("remote")
    }
}

impl std::ops::Deref for CacheHome {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.0.as_path()
    }
}
