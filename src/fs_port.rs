//! Filesystem collaborator used by the classifier, resolver, sanitizer and materializer.

use reqwest::Url;
use std::fs;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

/// Outcome of committing a staged write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Our bytes now live at the target path.
    Written,
    /// Another writer got there first; our bytes were discarded.
    AlreadyPresent,
}

/// The filesystem operations the core needs, passed explicitly into every component.
pub trait FileSystemPort: std::fmt::Debug + Send + Sync {
    /// Read at most `max_bytes` from the start of the file.
    fn read_prefix(&self, path: &Path, max_bytes: usize) -> io::Result<Vec<u8>>;

    fn file_size(&self, path: &Path) -> io::Result<u64>;

    fn exists(&self, path: &Path) -> bool;

    /// Begin an atomic, no-clobber write of `target`.
    fn stage(&self, target: &Path) -> io::Result<StagedFile>;

    /// Atomically write `bytes` to `path` unless a file is already there.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<CommitOutcome> {
        let mut staged = self.stage(path)?;
        staged.write_all(bytes)?;
        staged.commit()
    }

    /// Atomically write `bytes` to `path`, replacing whatever file is there.
    fn replace(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut staged = self.stage(path)?;
        staged.write_all(bytes)?;
        staged.commit_replacing()
    }

    /// Create a single directory. Returns `false` when it already existed.
    fn ensure_dir(&self, path: &Path) -> io::Result<bool>;

    /// Resolve `candidate` to a canonical existing path, or `None`.
    fn real_path(&self, candidate: &str) -> Option<PathBuf>;

    /// Public address for a filesystem path.
    fn path_to_url(&self, path: &Path) -> String;

    /// Filesystem location served at the given URL path.
    fn url_to_path(&self, url_path: &str) -> PathBuf;

    /// Directory the site's base URL is served from.
    fn site_root(&self) -> &Path;
}

/// A write in progress. Dropping it without [`StagedFile::commit`] leaves nothing behind.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    pub fn new_in(dir: &Path, target: &Path) -> io::Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix(".staging-")
            .tempfile_in(dir)?;
        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Flush and move into place. Never replaces an existing file.
    pub fn commit(mut self) -> io::Result<CommitOutcome> {
        self.temp.as_file_mut().sync_all()?;
        match self.temp.persist_noclobber(&self.target) {
            Ok(_) => Ok(CommitOutcome::Written),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(target = %self.target.display(), "Lost write race, discarding staged copy");
                Ok(CommitOutcome::AlreadyPresent)
            }
            Err(e) => Err(e.error),
        }
    }

    /// Flush and move into place, replacing any file already at the target.
    pub fn commit_replacing(mut self) -> io::Result<()> {
        self.temp.as_file_mut().sync_all()?;
        self.temp.persist(&self.target).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.temp.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.temp.flush()
    }
}

/// [`FileSystemPort`] over the local disk, rooted at the directory served by the site.
#[derive(Clone, Debug)]
pub struct LocalFileSystem {
    site_root: PathBuf,
    base_url: Url,
}

impl LocalFileSystem {
    pub fn new(site_root: impl Into<PathBuf>, base_url: Url) -> Self {
        let site_root = site_root.into();
        let site_root = dunce::canonicalize(&site_root).unwrap_or(site_root);
        Self {
            site_root,
            base_url,
        }
    }

    /// Base URL path with a trailing slash, e.g. `/` or `/site/`.
    fn base_path(&self) -> String {
        let path = self.base_url.path();
        if path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        }
    }
}

impl FileSystemPort for LocalFileSystem {
    fn read_prefix(&self, path: &Path, max_bytes: usize) -> io::Result<Vec<u8>> {
        let file = fs::File::open(path)?;
        let mut buf = Vec::with_capacity(max_bytes.min(64 * 1024));
        file.take(max_bytes as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn stage(&self, target: &Path) -> io::Result<StagedFile> {
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        StagedFile::new_in(dir, target)
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<bool> {
        match fs::create_dir(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn real_path(&self, candidate: &str) -> Option<PathBuf> {
        if candidate.is_empty() {
            return None;
        }
        if let Ok(p) = dunce::canonicalize(candidate) {
            return Some(p);
        }
        let relative = candidate.trim_start_matches(['/', '\\']);
        dunce::canonicalize(self.site_root.join(relative)).ok()
    }

    fn path_to_url(&self, path: &Path) -> String {
        match path.strip_prefix(&self.site_root) {
            Ok(rel) => {
                let segments: Vec<String> = rel
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect();
                format!("{}{}", self.base_path(), segments.join("/"))
            }
            Err(_) => Url::from_file_path(path)
                .map(|u| u.to_string())
                .unwrap_or_else(|()| path.display().to_string()),
        }
    }

    fn url_to_path(&self, url_path: &str) -> PathBuf {
        let base = self.base_path();
        let rel = url_path
            .strip_prefix(base.as_str())
            .unwrap_or(url_path)
            .trim_start_matches('/');

        // Borrow the url crate's percent-decoding through a file URL.
        let decoded = Url::parse("file:///")
            .and_then(|u| u.join(rel))
            .ok()
            .and_then(|u| u.to_file_path().ok());

        let mut out = self.site_root.clone();
        match decoded {
            Some(p) => {
                for c in p.components() {
                    if let Component::Normal(s) = c {
                        out.push(s);
                    }
                }
            }
            None => out.push(rel),
        }
        out
    }

    fn site_root(&self) -> &Path {
        &self.site_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn local(root: &Path) -> LocalFileSystem {
        LocalFileSystem::new(root, Url::parse("https://www.example.com/").unwrap())
    }

    #[test]
    fn read_prefix_is_bounded() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        let path = td.path().join("big.bin");
        fs::write(&path, vec![7u8; 10_000])?;

        assert_eq!(fsys.read_prefix(&path, 100)?.len(), 100);
        assert_eq!(fsys.read_prefix(&path, 1_000_000)?.len(), 10_000);
        assert_eq!(fsys.file_size(&path)?, 10_000);
        Ok(())
    }

    #[test]
    fn write_never_clobbers() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        let path = td.path().join("a.txt");

        assert_eq!(fsys.write(&path, b"first")?, CommitOutcome::Written);
        assert_eq!(fsys.write(&path, b"second")?, CommitOutcome::AlreadyPresent);
        assert_eq!(fs::read(&path)?, b"first");

        // no staging leftovers
        let names: Vec<_> = fs::read_dir(td.path())?
            .map(|e| e.map(|e| e.file_name()))
            .collect::<Result<_, _>>()?;
        assert_eq!(names.len(), 1);
        Ok(())
    }

    #[test]
    fn replace_overwrites_and_creates() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        let path = td.path().join("b.info");

        fsys.replace(&path, b"fresh")?;
        assert_eq!(fs::read(&path)?, b"fresh");
        fsys.replace(&path, b"newer")?;
        assert_eq!(fs::read(&path)?, b"newer");
        assert_eq!(fs::read_dir(td.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn dropped_stage_leaves_nothing() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        let path = td.path().join("partial.bin");
        {
            let mut staged = fsys.stage(&path)?;
            staged.write_all(b"half")?;
        }
        assert!(!path.exists());
        assert_eq!(fs::read_dir(td.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn ensure_dir_reports_creation_once() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        let dir = td.path().join("sub");
        assert!(fsys.ensure_dir(&dir)?);
        assert!(!fsys.ensure_dir(&dir)?);
        Ok(())
    }

    #[test]
    fn path_and_url_mapping_round_trip() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        let root = fsys.site_root().to_path_buf();

        let path = root.join("images").join("my photo.png");
        assert_eq!(fsys.path_to_url(&path), "/images/my photo.png");
        assert_eq!(fsys.url_to_path("/images/my%20photo.png"), path);
        Ok(())
    }

    #[test]
    fn url_to_path_drops_traversal() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        let mapped = fsys.url_to_path("/../../etc/passwd");
        assert!(mapped.starts_with(fsys.site_root()));
        Ok(())
    }

    #[test]
    fn real_path_falls_back_to_site_root() -> eyre::Result<()> {
        let td = tempdir()?;
        let fsys = local(td.path());
        fs::create_dir_all(td.path().join("images"))?;
        fs::write(td.path().join("images").join("a.png"), b"x")?;

        let resolved = fsys.real_path("/images/a.png");
        assert_eq!(
            resolved,
            Some(fsys.site_root().join("images").join("a.png"))
        );
        assert_eq!(fsys.real_path("/images/missing.png"), None);
        Ok(())
    }
}
