//! Persisted cache policy: where caches live, layout, and remote copy behaviour.

use crate::app_home::AppHome;
use crate::cache::CACHE_HOME;
use crate::safe_name::CacheLayout;
use facet::Facet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tracing::warn;

/// On-disk form of the settings, stored as `settings.json` in the app home.
#[derive(Clone, Debug, PartialEq, Facet)]
pub struct Settings {
    /// Directory served at the site's base URL; the working directory when unset.
    pub site_root: Option<String>,
    pub thumbs_dir: String,
    /// Unset disables both remote copies and info files.
    pub remote_dir: Option<String>,
    pub copy_remote: bool,
    pub subdirs: bool,
    pub index_placeholder: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_root: None,
            thumbs_dir: CACHE_HOME.thumbs_dir().display().to_string(),
            remote_dir: Some(CACHE_HOME.remote_dir().display().to_string()),
            copy_remote: false,
            subdirs: false,
            index_placeholder: true,
        }
    }
}

/// Settings with every path made absolute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub site_root: PathBuf,
    pub thumbs_dir: PathBuf,
    pub remote_dir: Option<PathBuf>,
    pub copy_remote: bool,
    pub layout: CacheLayout,
    pub index_placeholder: bool,
}

impl CacheConfig {
    /// Copy remote originals locally (requires a remote directory).
    #[must_use]
    pub fn copies_remote(&self) -> bool {
        self.copy_remote && self.remote_dir.is_some()
    }

    /// Keep info files for remote originals instead of copying them.
    #[must_use]
    pub fn uses_info_files(&self) -> bool {
        !self.copy_remote && self.remote_dir.is_some()
    }
}

impl Settings {
    const FILE_NAME: &'static str = "settings.json";

    pub fn file_path(home: &AppHome) -> PathBuf {
        home.file_path(Self::FILE_NAME)
    }

    /// Loads `settings.json`, writing defaults when it is missing or unreadable.
    pub fn load_from(home: &AppHome) -> eyre::Result<Settings> {
        let path = Self::file_path(home);
        if path.exists() {
            let s = fs::read_to_string(&path)?;
            match facet_json::from_str::<Settings>(&s) {
                Ok(settings) => return Ok(settings),
                Err(e) => warn!(
                    "Invalid {} contents: {}, resetting to default",
                    path.display(),
                    e
                ),
            }
        }
        let settings = Settings::default();
        settings.save_to(home)?;
        Ok(settings)
    }

    pub fn save_to(&self, home: &AppHome) -> eyre::Result<()> {
        let path = Self::file_path(home);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = facet_json::to_string(self)
            .map_err(|e| eyre::eyre!("Failed to serialize settings: {}", e))?;
        fs::write(&path, json)?;
        Ok(())
    }

    /// Make every directory absolute; relative cache dirs hang off the site root.
    pub fn resolve(&self) -> eyre::Result<CacheConfig> {
        let site_root = match &self.site_root {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir()?,
        };
        let site_root = dunce::canonicalize(&site_root).unwrap_or(site_root);
        let under_root = |dir: &str| -> PathBuf {
            let p = Path::new(dir);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                site_root.join(p)
            }
        };
        Ok(CacheConfig {
            thumbs_dir: under_root(&self.thumbs_dir),
            remote_dir: self.remote_dir.as_deref().map(under_root),
            copy_remote: self.copy_remote,
            layout: if self.subdirs {
                CacheLayout::Hierarchical
            } else {
                CacheLayout::Flat
            },
            index_placeholder: self.index_placeholder,
            site_root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_written_and_reloaded() -> eyre::Result<()> {
        let td = tempdir()?;
        let home = AppHome(td.path().to_path_buf());

        let first = Settings::load_from(&home)?;
        assert!(Settings::file_path(&home).exists());
        assert_eq!(Settings::load_from(&home)?, first);
        Ok(())
    }

    #[test]
    fn saved_values_round_trip() -> eyre::Result<()> {
        let td = tempdir()?;
        let home = AppHome(td.path().to_path_buf());
        let settings = Settings {
            site_root: Some(td.path().display().to_string()),
            thumbs_dir: "cache/thumbs".into(),
            remote_dir: None,
            copy_remote: true,
            subdirs: true,
            index_placeholder: false,
        };
        settings.save_to(&home)?;
        assert_eq!(Settings::load_from(&home)?, settings);
        Ok(())
    }

    #[test]
    fn garbage_file_resets_to_default() -> eyre::Result<()> {
        let td = tempdir()?;
        let home = AppHome(td.path().to_path_buf());
        fs::write(Settings::file_path(&home), "{ nope")?;
        assert_eq!(Settings::load_from(&home)?, Settings::default());
        Ok(())
    }

    #[test]
    fn relative_dirs_resolve_under_site_root() -> eyre::Result<()> {
        let td = tempdir()?;
        let settings = Settings {
            site_root: Some(td.path().display().to_string()),
            thumbs_dir: "images/thumbnails".into(),
            remote_dir: Some("images/remote".into()),
            copy_remote: true,
            subdirs: true,
            index_placeholder: true,
        };
        let config = settings.resolve()?;
        assert_eq!(config.thumbs_dir, config.site_root.join("images/thumbnails"));
        assert_eq!(config.layout, CacheLayout::Hierarchical);
        assert!(config.copies_remote());
        assert!(!config.uses_info_files());
        Ok(())
    }
}
