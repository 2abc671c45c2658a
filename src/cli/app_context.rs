use crate::app_home::APP_HOME;
use crate::fs_port::LocalFileSystem;
use crate::http::ReqwestRangeClient;
use crate::safe_name::PathNameSanitizer;
use crate::settings::CacheConfig;
use crate::settings::Settings;
use crate::site_context::SITE_CONTEXT;
use crate::site_context::SiteContext;
use crate::thumb_info::ThumbInfoBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration loaded once per command and handed to the components.
#[derive(Debug)]
pub struct AppContext {
    pub site: SiteContext,
    pub config: CacheConfig,
    pub fs: Arc<LocalFileSystem>,
}

impl AppContext {
    pub fn load() -> eyre::Result<AppContext> {
        let site = SITE_CONTEXT.clone();
        let config = Settings::load_from(&APP_HOME)?.resolve()?;
        debug!(
            base_url = %site.base_url,
            site_root = %config.site_root.display(),
            "Loaded configuration"
        );
        let fs = Arc::new(LocalFileSystem::new(config.site_root.clone(), site.base_url.clone()));
        Ok(AppContext { site, config, fs })
    }

    #[must_use]
    pub fn sanitizer(&self) -> PathNameSanitizer {
        PathNameSanitizer::new(
            self.fs.clone(),
            self.config.layout,
            self.config.index_placeholder,
        )
    }

    #[must_use]
    pub fn builder(&self, timeout: Option<Duration>) -> ThumbInfoBuilder {
        let http = Arc::new(ReqwestRangeClient::new(reqwest::Client::new()));
        ThumbInfoBuilder::new(
            self.config.clone(),
            self.site.clone(),
            self.fs.clone(),
            http,
        )
        .with_timeout(timeout)
    }
}
