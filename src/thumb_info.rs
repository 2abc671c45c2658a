//! Assembling everything known about an original image and where its thumbnails belong.

use crate::error::Result;
use crate::error::ThumbError;
use crate::fs_port::FileSystemPort;
use crate::http::HttpRangePort;
use crate::http::with_timeout;
use crate::image_source::ImageSource;
use crate::image_source::SourceClassifier;
use crate::info_file::InfoFileStore;
use crate::materialize::RemoteFileMaterializer;
use crate::metadata::ImageMetadata;
use crate::metadata::ImageMetadataResolver;
use crate::safe_name::PathNameSanitizer;
use crate::safe_name::SafeNameRequest;
use crate::settings::CacheConfig;
use crate::site_context::SiteContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing::warn;

#[derive(Clone, Debug, PartialEq)]
pub struct OriginalImage {
    pub source: ImageSource,
    /// `None` only when the source was empty.
    pub metadata: Option<ImageMetadata>,
}

/// Where one thumbnail of the original lives, and how big it is.
#[derive(Clone, Debug, PartialEq)]
pub struct ThumbVariant {
    pub ratio: f64,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThumbInfo {
    pub original: OriginalImage,
    pub thumbnails: Vec<ThumbVariant>,
}

/// Wires the classifier, resolver, sanitizer, materializer and info files together.
#[derive(Clone, Debug)]
pub struct ThumbInfoBuilder {
    config: CacheConfig,
    fs: Arc<dyn FileSystemPort>,
    classifier: SourceClassifier,
    resolver: ImageMetadataResolver,
    sanitizer: PathNameSanitizer,
    materializer: RemoteFileMaterializer,
    info_files: InfoFileStore,
    timeout: Option<Duration>,
}

impl ThumbInfoBuilder {
    pub fn new(
        config: CacheConfig,
        site: SiteContext,
        fs: Arc<dyn FileSystemPort>,
        http: Arc<dyn HttpRangePort>,
    ) -> Self {
        let sanitizer = PathNameSanitizer::new(fs.clone(), config.layout, config.index_placeholder);
        Self {
            classifier: SourceClassifier::new(fs.clone(), site),
            resolver: ImageMetadataResolver::new(fs.clone(), http.clone()),
            materializer: RemoteFileMaterializer::new(fs.clone(), http, sanitizer.clone()),
            info_files: InfoFileStore::new(fs.clone()),
            sanitizer,
            config,
            fs,
            timeout: None,
        }
    }

    /// Bound every network operation by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify `src`, copying remote originals locally when configured to.
    pub async fn source(&self, src: &str) -> ImageSource {
        let source = self.classifier.classify(src);
        if source.is_local || !self.config.copies_remote() {
            return source;
        }
        let Some(remote_dir) = &self.config.remote_dir else {
            return source;
        };

        let copy = self.materializer.materialize(&source.url, remote_dir);
        let copied = match self.timeout {
            Some(t) => with_timeout(&source.url, t, copy).await,
            None => copy.await,
        };
        match copied {
            Ok(path) => ImageSource::local(path.display().to_string(), self.fs.path_to_url(&path)),
            Err(e) => {
                warn!(url = %source.url, error = %e, "Could not copy remote image, using it in place");
                source
            }
        }
    }

    /// Resolve metadata, going through the info file for uncopied remote sources.
    ///
    /// The info file only ever saves a probe: failing to name, read or write
    /// it is logged and resolution carries on without it.
    pub async fn metadata(&self, source: &ImageSource, use_info_file: bool) -> Result<ImageMetadata> {
        let info_path = if use_info_file {
            self.info_file_path(source)
        } else {
            None
        };

        if let Some(path) = &info_path
            && let Some(metadata) = self.info_files.read(path)
        {
            return Ok(metadata);
        }

        let metadata = match self.timeout {
            Some(t) => self.resolver.resolve_with_timeout(source, t).await?,
            None => self.resolver.resolve(source).await?,
        };

        if let Some(path) = &info_path {
            match self.info_files.write(path, &source.url, &metadata) {
                Ok(()) => debug!(url = %source.url, path = %path.display(), "Stored info file"),
                Err(e) => warn!(url = %source.url, error = %e, "Could not store info file"),
            }
        }
        Ok(metadata)
    }

    fn info_file_path(&self, source: &ImageSource) -> Option<PathBuf> {
        let remote_dir = self.config.remote_dir.as_ref()?;
        if source.is_local || !self.config.uses_info_files() {
            return None;
        }
        let request = SafeNameRequest::new(&source.url, remote_dir)
            .remote()
            .extra_extension(Some("info"));
        match self.sanitizer.safe_name(&request) {
            Ok(spec) => Some(spec.absolute_path),
            Err(e) => {
                warn!(url = %source.url, error = %e, "No info file location, probing directly");
                None
            }
        }
    }

    pub async fn original(&self, src: &str, use_info_file: bool) -> Result<OriginalImage> {
        let src = decode_html_entities(src);
        let source = self.source(&src).await;
        if source.path.is_empty() {
            return Ok(OriginalImage {
                source,
                metadata: None,
            });
        }
        let metadata = self.metadata(&source, use_info_file).await?;
        Ok(OriginalImage {
            source,
            metadata: Some(metadata),
        })
    }

    /// Describe the original and one thumbnail per ratio (`[1.0]` when empty).
    pub async fn make(
        &self,
        src: &str,
        thumb_width: u32,
        thumb_height: u32,
        ratios: &[f64],
    ) -> Result<ThumbInfo> {
        if let Some(bad) = ratios.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(ThumbError::InvalidRatio(*bad));
        }
        let original = self.original(src, true).await?;
        if original.source.path.is_empty() {
            return Ok(ThumbInfo {
                original,
                thumbnails: Vec::new(),
            });
        }

        let ratios = if ratios.is_empty() { &[1.0][..] } else { ratios };
        let mut thumbnails = Vec::with_capacity(ratios.len());
        for &ratio in ratios {
            let width = scale(thumb_width, ratio);
            let height = scale(thumb_height, ratio);
            let suffix = format!("-{width}x{height}");
            let spec = self.sanitizer.safe_name(
                &SafeNameRequest::new(&original.source.path, &self.config.thumbs_dir)
                    .suffix(&suffix)
                    .local(original.source.is_local),
            )?;
            thumbnails.push(ThumbVariant {
                ratio,
                width,
                height,
                url: self.fs.path_to_url(&spec.absolute_path),
                path: spec.absolute_path,
            });
        }
        Ok(ThumbInfo {
            original,
            thumbnails,
        })
    }
}

/// `size * ratio`, rounded and saturated to the `u32` range.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to the u32 range first"
)]
fn scale(size: u32, ratio: f64) -> u32 {
    (f64::from(size) * ratio).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Undo the HTML escaping that image sources pick up inside markup.
fn decode_html_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
