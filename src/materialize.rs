//! Copying remote originals into the local cache so later lookups are local.

use crate::error::Result;
use crate::error::ThumbError;
use crate::fs_port::CommitOutcome;
use crate::fs_port::FileSystemPort;
use crate::http::HttpRangePort;
use crate::safe_name::PathNameSanitizer;
use crate::safe_name::SafeNameRequest;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing::info;

#[derive(Clone, Debug)]
pub struct RemoteFileMaterializer {
    fs: Arc<dyn FileSystemPort>,
    http: Arc<dyn HttpRangePort>,
    sanitizer: PathNameSanitizer,
}

impl RemoteFileMaterializer {
    pub fn new(
        fs: Arc<dyn FileSystemPort>,
        http: Arc<dyn HttpRangePort>,
        sanitizer: PathNameSanitizer,
    ) -> Self {
        Self {
            fs,
            http,
            sanitizer,
        }
    }

    /// Local path holding a full copy of `url`, downloading it if needed.
    ///
    /// The body is streamed into a staging file beside the target and moved
    /// into place without replacing an existing file, so concurrent callers
    /// all end up with the first complete copy.
    pub async fn materialize(&self, url: &str, remote_dir: &Path) -> Result<PathBuf> {
        let target = self
            .sanitizer
            .safe_name(&SafeNameRequest::new(url, remote_dir).remote())?
            .absolute_path;
        if self.fs.exists(&target) {
            debug!(url, path = %target.display(), "Remote copy already present");
            return Ok(target);
        }

        let fs = Arc::clone(&self.fs);
        let stage_target = target.clone();
        let mut staged = blocking(&target, move || fs.stage(&stage_target)).await?;
        let bytes = self.http.download(url, &mut staged).await?;
        // commit fsyncs before the rename
        match blocking(&target, move || staged.commit()).await? {
            CommitOutcome::Written => {
                info!(url, path = %target.display(), bytes, "Copied remote image");
            }
            CommitOutcome::AlreadyPresent => {
                debug!(url, path = %target.display(), "Another caller copied it first");
            }
        }
        Ok(target)
    }
}

/// Run file I/O for `path` on the blocking pool.
async fn blocking<T, F>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(|e| ThumbError::io(path, e)),
        Err(e) => Err(ThumbError::io(path, std::io::Error::other(e))),
    }
}
