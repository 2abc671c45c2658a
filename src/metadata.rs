//! Cheap width/height/format/size probing for local files and remote URLs.

use crate::error::Result;
use crate::error::ThumbError;
use crate::fs_port::FileSystemPort;
use crate::http::HttpRangePort;
use crate::http::ResponseHeaders;
use crate::http::with_timeout;
use crate::image_source::ImageSource;
use std::io::Cursor;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing::warn;

/// Bytes read from the head of an image to learn its dimensions.
///
/// Common containers keep their header well inside this window, so a
/// multi-megabyte original never has to be fetched in full.
pub const PROBE_WINDOW: usize = 64 * 1024;

/// Encoded image container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::WebP,
        ImageFormat::Bmp,
    ];

    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }

    fn from_image(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// What the probe learned about an image. Any field may be unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<ImageFormat>,
    pub file_size_bytes: Option<u64>,
}

impl ImageMetadata {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.width.is_some() && self.height.is_some() && self.format.is_some()
    }
}

/// Decode dimensions and container from the head of an image.
#[must_use]
pub fn decode_header(bytes: &[u8]) -> (Option<u32>, Option<u32>, Option<ImageFormat>) {
    let reader = match image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        Ok(r) => r,
        Err(_) => return (None, None, None),
    };
    let format = reader.format().and_then(ImageFormat::from_image);
    if format.is_none() {
        return (None, None, None);
    }
    match reader.into_dimensions() {
        Ok((w, h)) => (Some(w), Some(h), format),
        Err(e) => {
            debug!(error = %e, "Could not read dimensions from image header");
            (None, None, format)
        }
    }
}

/// Resolves [`ImageMetadata`] for a classified source.
#[derive(Clone, Debug)]
pub struct ImageMetadataResolver {
    fs: Arc<dyn FileSystemPort>,
    http: Arc<dyn HttpRangePort>,
}

impl ImageMetadataResolver {
    pub fn new(fs: Arc<dyn FileSystemPort>, http: Arc<dyn HttpRangePort>) -> Self {
        Self { fs, http }
    }

    pub async fn resolve(&self, source: &ImageSource) -> Result<ImageMetadata> {
        if source.is_local {
            // header read and size query are plain blocking file I/O
            let fs = Arc::clone(&self.fs);
            let path = PathBuf::from(&source.path);
            tokio::task::spawn_blocking(move || resolve_local(fs.as_ref(), &path))
                .await
                .map_err(|e| {
                    ThumbError::io(Path::new(&source.path), std::io::Error::other(e))
                })?
        } else {
            self.resolve_remote(&source.url).await
        }
    }

    /// [`Self::resolve`] bounded by a caller deadline.
    pub async fn resolve_with_timeout(
        &self,
        source: &ImageSource,
        timeout: Duration,
    ) -> Result<ImageMetadata> {
        with_timeout(source.reference(), timeout, self.resolve(source)).await
    }

    async fn resolve_remote(&self, url: &str) -> Result<ImageMetadata> {
        let response = self
            .http
            .get_range(url, 0, PROBE_WINDOW as u64 - 1)
            .await?;
        let headers = ResponseHeaders::parse(&response.header_lines);
        let Some(file_size) = headers.total_size() else {
            return Err(ThumbError::transfer(url, "cannot get size of file"));
        };

        let (width, height, format) = decode_header(&response.body);
        let metadata = ImageMetadata {
            width,
            height,
            format,
            file_size_bytes: Some(file_size),
        };
        if !metadata.is_complete() {
            return Err(ThumbError::image_info(url));
        }
        debug!(url, status = ?headers.status, file_size, "Resolved remote image");
        Ok(metadata)
    }
}

fn resolve_local(fs: &dyn FileSystemPort, path: &Path) -> Result<ImageMetadata> {
    let head = fs
        .read_prefix(path, PROBE_WINDOW)
        .map_err(|e| ThumbError::io(path, e))?;
    let file_size = fs.file_size(path).map_err(|e| ThumbError::io(path, e))?;
    let (width, height, format) = decode_header(&head);
    if format.is_none() || width.is_none() {
        warn!(path = %path.display(), "Local image header not recognised");
    }
    Ok(ImageMetadata {
        width,
        height,
        format,
        file_size_bytes: Some(file_size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_port::LocalFileSystem;
    use crate::http::RangeResponse;
    use async_trait::async_trait;
    use reqwest::Url;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut data = Vec::new();
        img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
            .expect("encode png");
        data
    }

    /// Answers every range request with the same scripted response.
    #[derive(Debug)]
    struct ScriptedHttp {
        lines: Vec<String>,
        body: Vec<u8>,
        requested: Mutex<Vec<(u64, u64)>>,
    }

    impl ScriptedHttp {
        fn new(lines: &[&str], body: Vec<u8>) -> Self {
            Self {
                lines: lines.iter().map(|s| s.to_string()).collect(),
                body,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpRangePort for ScriptedHttp {
        async fn get_range(&self, _url: &str, start: u64, end: u64) -> Result<RangeResponse> {
            self.requested.lock().unwrap().push((start, end));
            Ok(RangeResponse {
                header_lines: self.lines.clone(),
                body: self.body.clone(),
            })
        }

        async fn download(&self, _url: &str, sink: &mut (dyn Write + Send)) -> Result<u64> {
            sink.write_all(&self.body).unwrap();
            Ok(self.body.len() as u64)
        }
    }

    fn resolver(root: &Path, http: Arc<dyn HttpRangePort>) -> ImageMetadataResolver {
        let fs = LocalFileSystem::new(root, Url::parse("https://example.com/").unwrap());
        ImageMetadataResolver::new(Arc::new(fs), http)
    }

    fn remote(url: &str) -> ImageSource {
        ImageSource::remote(url)
    }

    #[test]
    fn decodes_png_header() {
        let png = png_bytes(640, 480);
        let (w, h, f) = decode_header(&png);
        assert_eq!((w, h, f), (Some(640), Some(480), Some(ImageFormat::Png)));
    }

    #[test]
    fn garbage_decodes_to_nothing() {
        assert_eq!(decode_header(b"definitely not an image"), (None, None, None));
    }

    #[tokio::test]
    async fn local_size_is_exact_beyond_probe_window() -> eyre::Result<()> {
        let td = tempdir()?;
        let path = td.path().join("big.png");
        let mut data = png_bytes(32, 16);
        // trailing bytes after IEND push the file well past the window
        data.extend(std::iter::repeat_n(0u8, PROBE_WINDOW * 3));
        std::fs::write(&path, &data)?;

        let http = Arc::new(ScriptedHttp::new(&[], Vec::new()));
        let r = resolver(td.path(), http.clone());
        let source = ImageSource::local(path.display().to_string(), "/big.png".to_string());
        let meta = r.resolve(&source).await?;

        assert_eq!(meta.file_size_bytes, Some(data.len() as u64));
        assert_eq!(meta.width, Some(32));
        assert_eq!(meta.height, Some(16));
        assert_eq!(meta.format, Some(ImageFormat::Png));
        assert!(http.requested.lock().unwrap().is_empty());
        Ok(())
    }

    /// Local disk whose header reads wait for a signal from another task.
    #[derive(Debug)]
    struct GatedFs {
        inner: LocalFileSystem,
        gate: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl FileSystemPort for GatedFs {
        fn read_prefix(&self, path: &Path, max_bytes: usize) -> std::io::Result<Vec<u8>> {
            self.gate
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(5))
                .map_err(std::io::Error::other)?;
            self.inner.read_prefix(path, max_bytes)
        }
        fn file_size(&self, path: &Path) -> std::io::Result<u64> {
            self.inner.file_size(path)
        }
        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }
        fn stage(&self, target: &Path) -> std::io::Result<crate::fs_port::StagedFile> {
            self.inner.stage(target)
        }
        fn ensure_dir(&self, path: &Path) -> std::io::Result<bool> {
            self.inner.ensure_dir(path)
        }
        fn real_path(&self, candidate: &str) -> Option<PathBuf> {
            self.inner.real_path(candidate)
        }
        fn path_to_url(&self, path: &Path) -> String {
            self.inner.path_to_url(path)
        }
        fn url_to_path(&self, url_path: &str) -> PathBuf {
            self.inner.url_to_path(url_path)
        }
        fn site_root(&self) -> &Path {
            self.inner.site_root()
        }
    }

    // Single-threaded runtime: the signal can only be sent if the read is off this thread.
    #[tokio::test]
    async fn local_header_read_leaves_the_runtime_free() -> eyre::Result<()> {
        let td = tempdir()?;
        let path = td.path().join("gated.png");
        std::fs::write(&path, png_bytes(12, 9))?;

        let (tx, rx) = std::sync::mpsc::channel();
        let fs = GatedFs {
            inner: LocalFileSystem::new(td.path(), Url::parse("https://example.com/")?),
            gate: Mutex::new(rx),
        };
        let r = ImageMetadataResolver::new(
            Arc::new(fs),
            Arc::new(ScriptedHttp::new(&[], Vec::new())),
        );
        let opener = tokio::spawn(async move { tx.send(()) });

        let meta = r
            .resolve(&ImageSource::local(path.display().to_string(), "/gated.png".into()))
            .await?;
        assert_eq!((meta.width, meta.height), (Some(12), Some(9)));
        opener.await??;
        Ok(())
    }

    #[tokio::test]
    async fn local_unrecognised_image_keeps_size() -> eyre::Result<()> {
        let td = tempdir()?;
        let path = td.path().join("notes.txt");
        std::fs::write(&path, b"hello")?;
        let r = resolver(td.path(), Arc::new(ScriptedHttp::new(&[], Vec::new())));
        let meta = r
            .resolve(&ImageSource::local(path.display().to_string(), "/notes.txt".into()))
            .await?;
        assert_eq!(meta.file_size_bytes, Some(5));
        assert_eq!(meta.format, None);
        Ok(())
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() -> eyre::Result<()> {
        let td = tempdir()?;
        let r = resolver(td.path(), Arc::new(ScriptedHttp::new(&[], Vec::new())));
        let path = td.path().join("gone.png");
        let err = r
            .resolve(&ImageSource::local(path.display().to_string(), "/gone.png".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ThumbError::Io { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn partial_content_total_is_file_size() -> eyre::Result<()> {
        let td = tempdir()?;
        let http = Arc::new(ScriptedHttp::new(
            &[
                "HTTP/1.1 206 Partial Content",
                "Content-Range: bytes=0-65535/123456",
            ],
            png_bytes(100, 50),
        ));
        let r = resolver(td.path(), http.clone());
        let meta = r.resolve(&remote("https://cdn.test/a.png")).await?;

        assert_eq!(meta.file_size_bytes, Some(123_456));
        assert_eq!((meta.width, meta.height), (Some(100), Some(50)));
        assert_eq!(
            http.requested.lock().unwrap().as_slice(),
            &[(0, PROBE_WINDOW as u64 - 1)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn ignored_range_uses_content_length() -> eyre::Result<()> {
        let td = tempdir()?;
        let http = Arc::new(ScriptedHttp::new(
            &["HTTP/1.1 200 OK", "Content-Length: 98765"],
            png_bytes(7, 9),
        ));
        let meta = resolver(td.path(), http)
            .resolve(&remote("https://cdn.test/b.png"))
            .await?;
        assert_eq!(meta.file_size_bytes, Some(98_765));
        Ok(())
    }

    #[tokio::test]
    async fn missing_size_is_transfer_error() -> eyre::Result<()> {
        let td = tempdir()?;
        let http = Arc::new(ScriptedHttp::new(&["HTTP/1.1 200 OK"], png_bytes(7, 9)));
        let err = resolver(td.path(), http)
            .resolve(&remote("https://cdn.test/c.png"))
            .await
            .unwrap_err();
        assert!(err.is_transfer(), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_body_is_image_info_error() -> eyre::Result<()> {
        let td = tempdir()?;
        let http = Arc::new(ScriptedHttp::new(
            &["HTTP/1.1 206 Partial Content", "Content-Range: bytes 0-9/10"],
            b"<html></html>".to_vec(),
        ));
        let err = resolver(td.path(), http)
            .resolve(&remote("https://cdn.test/d.png"))
            .await
            .unwrap_err();
        assert!(err.is_image_info(), "{err}");
        Ok(())
    }

    #[derive(Debug)]
    struct NeverAnswers;

    #[async_trait]
    impl HttpRangePort for NeverAnswers {
        async fn get_range(&self, _url: &str, _start: u64, _end: u64) -> Result<RangeResponse> {
            std::future::pending().await
        }

        async fn download(&self, _url: &str, _sink: &mut (dyn Write + Send)) -> Result<u64> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn caller_timeout_surfaces_as_transfer_error() -> eyre::Result<()> {
        let td = tempdir()?;
        let err = resolver(td.path(), Arc::new(NeverAnswers))
            .resolve_with_timeout(&remote("https://slow.test/e.png"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_transfer());
        Ok(())
    }
}
