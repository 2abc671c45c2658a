use crate::app_home::APP_HOME;
use crate::app_home::AppHome;
use reqwest::Url;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::warn;

/// The site under which "local" URLs are recognised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteContext {
    pub base_url: Url,
}

impl SiteContext {
    /// Default base URL
    pub const DEFAULT: &'static str = "http://localhost/";
    const FILE_NAME: &'static str = "base_url.txt";

    pub fn parse(s: &str) -> eyre::Result<SiteContext> {
        let base_url = Url::parse(s.trim())
            .map_err(|e| eyre::eyre!("Invalid base URL '{}': {}", s.trim(), e))?;
        if base_url.cannot_be_a_base() || base_url.host_str().is_none() {
            return Err(eyre::eyre!("Base URL '{}' must name a host", s.trim()));
        }
        Ok(SiteContext { base_url })
    }

    #[must_use]
    pub fn default_site() -> SiteContext {
        SiteContext {
            base_url: Url::parse(Self::DEFAULT).expect("default base URL is valid"),
        }
    }

    /// Loads resolving rules:
    /// 1. If $`THUMBINFO_BASE_URL` is set and valid -> use it (and DO NOT create file)
    /// 2. Otherwise, look for `${config_dir}/base_url.txt`
    ///    - if file exists and parses, use its trimmed contents
    ///    - otherwise, create the file containing the default and return default
    pub fn load() -> eyre::Result<SiteContext> {
        if let Ok(envv) = env::var("THUMBINFO_BASE_URL") {
            match Self::parse(&envv) {
                Ok(site) => return Ok(site),
                Err(e) => warn!("Ignoring THUMBINFO_BASE_URL: {}", e),
            }
        }
        Self::load_from(&APP_HOME)
    }

    /// File-backed half of [`SiteContext::load`].
    pub fn load_from(home: &AppHome) -> eyre::Result<SiteContext> {
        let path = home.file_path(Self::FILE_NAME);
        if path.exists() {
            let s = fs::read_to_string(&path)?;
            match Self::parse(&s) {
                Ok(site) => return Ok(site),
                Err(e) => warn!(
                    "Invalid {} contents: {}, resetting to default",
                    path.display(),
                    e
                ),
            }
        }

        // create containing default
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        f.write_all(Self::DEFAULT.as_bytes())?;
        f.flush()?;
        Ok(Self::default_site())
    }

    /// Returns the path the file should live at
    pub fn config_file_path() -> PathBuf {
        APP_HOME.file_path(Self::FILE_NAME)
    }

    /// Validate and persist a base URL (creates dirs if needed).
    /// The new value is picked up on the next `SiteContext::load()`.
    pub fn set_to(home: &AppHome, base_url: &str) -> eyre::Result<SiteContext> {
        let site = Self::parse(base_url)?;
        let path = home.file_path(Self::FILE_NAME);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, site.base_url.as_str().as_bytes())?;
        Ok(site)
    }
}

/// Site context for the running process, resolved using the rules above.
pub static SITE_CONTEXT: LazyLock<SiteContext> = LazyLock::new(|| match SiteContext::load() {
    Ok(s) => s,
    Err(e) => {
        warn!(
            "Failed to load base URL: {}. Using default {}",
            e,
            SiteContext::DEFAULT
        );
        SiteContext::default_site()
    }
});

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_creates_default_then_reads_back_set_value() -> eyre::Result<()> {
        let td = tempdir()?;
        let home = AppHome(td.path().to_path_buf());

        assert_eq!(SiteContext::load_from(&home)?, SiteContext::default_site());
        assert!(home.file_path("base_url.txt").exists());

        SiteContext::set_to(&home, "https://www.example.com/site/")?;
        let loaded = SiteContext::load_from(&home)?;
        assert_eq!(loaded.base_url.as_str(), "https://www.example.com/site/");
        Ok(())
    }

    #[test]
    fn corrupt_file_falls_back_to_default() -> eyre::Result<()> {
        let td = tempdir()?;
        let home = AppHome(td.path().to_path_buf());
        fs::write(home.file_path("base_url.txt"), "not a url")?;
        assert_eq!(SiteContext::load_from(&home)?, SiteContext::default_site());
        Ok(())
    }

    #[test]
    fn rejects_hostless_base() {
        assert!(SiteContext::parse("mailto:someone@example.com").is_err());
        assert!(SiteContext::set_to(&AppHome(PathBuf::from("/nonexistent")), "::").is_err());
    }
}
