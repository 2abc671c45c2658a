//! Sidecar files remembering metadata of remote images that are not copied locally.

use crate::error::Result;
use crate::error::ThumbError;
use crate::fs_port::CommitOutcome;
use crate::fs_port::FileSystemPort;
use crate::metadata::ImageFormat;
use crate::metadata::ImageMetadata;
use facet::Facet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use tracing::warn;

/// Sidecars are tiny; anything bigger than this is not one of ours.
const MAX_INFO_FILE_BYTES: usize = 16 * 1024;

/// Serialized form of [`ImageMetadata`], also used for printing.
#[derive(Clone, Debug, PartialEq, Eq, Facet)]
pub struct MetadataRecord {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    #[facet(rename = "fileSizeBytes")]
    pub file_size_bytes: Option<u64>,
}

impl From<&ImageMetadata> for MetadataRecord {
    fn from(m: &ImageMetadata) -> Self {
        Self {
            width: m.width,
            height: m.height,
            format: m.format.map(|f| f.tag().to_string()),
            file_size_bytes: m.file_size_bytes,
        }
    }
}

impl From<&MetadataRecord> for ImageMetadata {
    fn from(r: &MetadataRecord) -> Self {
        Self {
            width: r.width,
            height: r.height,
            format: r.format.as_deref().and_then(ImageFormat::from_tag),
            file_size_bytes: r.file_size_bytes,
        }
    }
}

/// Contents of an `.info` sidecar.
#[derive(Clone, Debug, PartialEq, Eq, Facet)]
pub struct InfoFileContents {
    pub url: String,
    #[facet(rename = "probedAt")]
    pub probed_at: String,
    pub metadata: MetadataRecord,
}

#[derive(Clone, Debug)]
pub struct InfoFileStore {
    fs: Arc<dyn FileSystemPort>,
}

impl InfoFileStore {
    pub fn new(fs: Arc<dyn FileSystemPort>) -> Self {
        Self { fs }
    }

    /// Previously stored metadata, or `None` when absent or unreadable.
    pub fn read(&self, path: &Path) -> Option<ImageMetadata> {
        if !self.fs.exists(path) {
            return None;
        }
        let raw = match self
            .fs
            .read_prefix(path, MAX_INFO_FILE_BYTES)
            .and_then(|b| String::from_utf8(b).map_err(std::io::Error::other))
        {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read info file");
                return None;
            }
        };
        match facet_json::from_str::<InfoFileContents>(&raw) {
            Ok(contents) => {
                debug!(path = %path.display(), url = %contents.url, "Info file hit");
                let metadata = ImageMetadata::from(&contents.metadata);
                // A sidecar without a byte count is as good as none.
                metadata.file_size_bytes.map(|_| metadata)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt info file");
                None
            }
        }
    }

    /// Store `metadata` for `url`, replacing an unreadable sidecar if one is there.
    pub fn write(&self, path: &Path, url: &str, metadata: &ImageMetadata) -> Result<()> {
        let contents = InfoFileContents {
            url: url.to_string(),
            probed_at: chrono::Utc::now().to_rfc3339(),
            metadata: MetadataRecord::from(metadata),
        };
        let json = facet_json::to_string(&contents).map_err(|e| ThumbError::InfoFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let outcome = self
            .fs
            .write(path, json.as_bytes())
            .map_err(|e| ThumbError::io(path, e))?;
        if outcome == CommitOutcome::AlreadyPresent && self.read(path).is_none() {
            debug!(path = %path.display(), "Replacing unreadable info file");
            self.fs
                .replace(path, json.as_bytes())
                .map_err(|e| ThumbError::io(path, e))?;
        }
        Ok(())
    }
}
