//! Deterministic, collision-safe cache file names for originals and thumbnails.

use crate::error::Result;
use crate::error::ThumbError;
use crate::fs_port::FileSystemPort;
use facet::Facet;
use reqwest::Url;
use sha2::Digest;
use sha2::Sha256;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Dropped into freshly created cache directories so web servers don't list them.
pub const INDEX_PLACEHOLDER: &str = "<html><body bgcolor=\"#FFFFFF\"></body></html>";
const INDEX_FILE_NAME: &str = "index.html";

/// Hex characters of the query hash kept in names.
const QUERY_HASH_LEN: usize = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheLayout {
    /// Every entry directly in the cache dir, separators replaced by `-`.
    #[default]
    Flat,
    /// Mirror the source directory structure under the cache dir.
    Hierarchical,
}

/// A resolved on-disk cache location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePathSpec {
    pub absolute_path: PathBuf,
    /// Whether any directory had to be created to hold the entry.
    pub containing_directory_created: bool,
}

/// Printable form of [`CachePathSpec`].
#[derive(Clone, Debug, PartialEq, Eq, Facet)]
pub struct CachePathReport {
    #[facet(rename = "absolutePath")]
    pub absolute_path: String,
    #[facet(rename = "containingDirectoryCreated")]
    pub containing_directory_created: bool,
}

impl From<&CachePathSpec> for CachePathReport {
    fn from(spec: &CachePathSpec) -> Self {
        Self {
            absolute_path: spec.absolute_path.display().to_string(),
            containing_directory_created: spec.containing_directory_created,
        }
    }
}

/// Arguments to [`PathNameSanitizer::safe_name`].
#[derive(Clone, Copy, Debug)]
pub struct SafeNameRequest<'a> {
    /// Local path or URL of the image the entry derives from.
    pub source: &'a str,
    pub cache_dir: &'a Path,
    /// Spliced in before the extension, e.g. `-200x150`.
    pub suffix: &'a str,
    pub is_local: bool,
    /// Appended after the extension, e.g. `info` for sidecars.
    pub extra_extension: Option<&'a str>,
}

impl<'a> SafeNameRequest<'a> {
    pub fn new(source: &'a str, cache_dir: &'a Path) -> Self {
        Self {
            source,
            cache_dir,
            suffix: "",
            is_local: true,
            extra_extension: None,
        }
    }

    #[must_use]
    pub fn suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = suffix;
        self
    }

    #[must_use]
    pub fn remote(mut self) -> Self {
        self.is_local = false;
        self
    }

    #[must_use]
    pub fn local(mut self, is_local: bool) -> Self {
        self.is_local = is_local;
        self
    }

    #[must_use]
    pub fn extra_extension(mut self, ext: Option<&'a str>) -> Self {
        self.extra_extension = ext;
        self
    }
}

#[derive(Clone, Debug)]
pub struct PathNameSanitizer {
    fs: Arc<dyn FileSystemPort>,
    layout: CacheLayout,
    index_placeholder: bool,
}

impl PathNameSanitizer {
    pub fn new(fs: Arc<dyn FileSystemPort>, layout: CacheLayout, index_placeholder: bool) -> Self {
        Self {
            fs,
            layout,
            index_placeholder,
        }
    }

    /// Derive the cache location for `req`, creating missing directories.
    pub fn safe_name(&self, req: &SafeNameRequest<'_>) -> Result<CachePathSpec> {
        let relative = self.relative_source(req);
        let mut components = safe_components(&relative);
        let leaf = components.pop().unwrap_or_else(|| "unnamed".to_string());
        let leaf = splice_name(&leaf, req.suffix, req.extra_extension);

        let mut dir = if req.cache_dir.is_absolute() {
            req.cache_dir.to_path_buf()
        } else {
            self.fs.site_root().join(req.cache_dir)
        };
        let name = match self.layout {
            CacheLayout::Flat => {
                components.push(leaf);
                components.join("-")
            }
            CacheLayout::Hierarchical => {
                dir.extend(&components);
                leaf
            }
        };

        let created = self.provision(&dir)?;
        Ok(CachePathSpec {
            absolute_path: dir.join(name),
            containing_directory_created: created,
        })
    }

    /// The source reduced to a root-relative identifier.
    fn relative_source(&self, req: &SafeNameRequest<'_>) -> String {
        let mut path = if req.is_local {
            req.source.to_string()
        } else {
            remote_identifier(req.source)
        };

        let root = self.fs.site_root().display().to_string();
        if !root.is_empty()
            && let Some(rest) = path.strip_prefix(root.as_str())
            && (rest.is_empty() || rest.starts_with(['/', '\\']))
        {
            path = rest.to_string();
        }
        path
    }

    /// Create `dir` and any missing ancestors, each with an index placeholder.
    fn provision(&self, dir: &Path) -> Result<bool> {
        if dir.is_dir() {
            return Ok(false);
        }
        let mut missing = Vec::new();
        let mut cursor = Some(dir);
        while let Some(d) = cursor {
            if d.as_os_str().is_empty() || d.is_dir() {
                break;
            }
            missing.push(d.to_path_buf());
            cursor = d.parent();
        }

        let mut created_any = false;
        for d in missing.iter().rev() {
            if self.fs.ensure_dir(d).map_err(|e| ThumbError::io(d, e))? {
                created_any = true;
                debug!(dir = %d.display(), "Created cache directory");
                if self.index_placeholder {
                    let index = d.join(INDEX_FILE_NAME);
                    self.fs
                        .write(&index, INDEX_PLACEHOLDER.as_bytes())
                        .map_err(|e| ThumbError::io(&index, e))?;
                }
            }
        }
        Ok(created_any)
    }
}

/// `host/path`, plus `_<hash>` on the file stem when a query string is present.
fn remote_identifier(source: &str) -> String {
    let Ok(url) = Url::parse(source) else {
        return source.to_string();
    };
    let host = match url.port() {
        Some(port) => format!("{}_{}", url.host_str().unwrap_or_default(), port),
        None => url.host_str().unwrap_or_default().to_string(),
    };
    let mut id = format!("{}{}", host, url.path());
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        let hash = hex::encode(Sha256::digest(query.as_bytes()));
        let hash = &hash[..QUERY_HASH_LEN];
        let leaf_start = id.rfind('/').map_or(0, |i| i + 1);
        match id[leaf_start..].rfind('.') {
            Some(dot) if dot > 0 => id.insert_str(leaf_start + dot, &format!("_{hash}")),
            _ => id.push_str(&format!("_{hash}")),
        }
    }
    id
}

/// Split on either separator, keeping only names that are safe on disk.
fn safe_components(path: &str) -> Vec<String> {
    let normalized = path.replace('\\', "/");
    Path::new(&normalized)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .map(|s| {
            s.chars()
                .map(|c| match c {
                    '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
                    c if c.is_control() => '_',
                    c => c,
                })
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// `stem + suffix + .ext + .extra`
fn splice_name(leaf: &str, suffix: &str, extra: Option<&str>) -> String {
    let (stem, ext) = match leaf.rfind('.') {
        Some(dot) if dot > 0 => (&leaf[..dot], Some(&leaf[dot + 1..])),
        _ => (leaf, None),
    };
    let mut name = format!("{stem}{suffix}");
    if let Some(ext) = ext.filter(|e| !e.is_empty()) {
        name.push('.');
        name.push_str(ext);
    }
    if let Some(extra) = extra.filter(|e| !e.is_empty()) {
        name.push('.');
        name.push_str(extra.trim_start_matches('.'));
    }
    name
}
