//! Deciding whether an image reference is a local file, a same-site URL or truly remote.

use crate::fs_port::FileSystemPort;
use crate::site_context::SiteContext;
use facet::Facet;
use reqwest::Url;
use std::sync::Arc;
use tracing::debug;

/// A classified image reference.
///
/// Local sources carry a canonical `path` and its public `url`.
/// Uncopied remote sources carry the same URL in both fields.
#[derive(Clone, Debug, PartialEq, Eq, Facet)]
pub struct ImageSource {
    #[facet(rename = "isLocal")]
    pub is_local: bool,
    pub path: String,
    pub url: String,
}

impl ImageSource {
    pub fn local(path: String, url: String) -> Self {
        Self {
            is_local: true,
            path,
            url,
        }
    }

    pub fn remote(url: &str) -> Self {
        Self {
            is_local: false,
            path: url.to_string(),
            url: url.to_string(),
        }
    }

    /// Whichever of url/path identifies the source best in messages.
    #[must_use]
    pub fn reference(&self) -> &str {
        if self.url.is_empty() { &self.path } else { &self.url }
    }
}

#[derive(Clone, Debug)]
pub struct SourceClassifier {
    fs: Arc<dyn FileSystemPort>,
    site: SiteContext,
}

impl SourceClassifier {
    pub fn new(fs: Arc<dyn FileSystemPort>, site: SiteContext) -> Self {
        Self { fs, site }
    }

    /// Classify `raw`. Never fails: anything ambiguous is treated as a remote URL.
    pub fn classify(&self, raw: &str) -> ImageSource {
        let raw = raw.trim();
        if raw.is_empty() {
            return ImageSource::remote(raw);
        }

        // Don't touch the filesystem when it is clearly a URL.
        let looks_like_url = raw.starts_with("http://") || raw.starts_with("https://");
        if !looks_like_url && let Some(path) = self.fs.real_path(raw) {
            let url = self.fs.path_to_url(&path);
            debug!(raw, path = %path.display(), "Classified as local path");
            return ImageSource::local(path.display().to_string(), url);
        }

        let normalized = raw.replace(' ', "+");
        let Some(candidate) = self.parse_candidate(&normalized) else {
            debug!(raw, "Unparseable source, treating as remote");
            return ImageSource::remote(&normalized);
        };

        if self.is_url_local(&candidate) {
            let url = &candidate.url;
            let path = self.fs.url_to_path(url.path());
            let public = match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            };
            debug!(raw, path = %path.display(), "Classified as same-site URL");
            return ImageSource::local(path.display().to_string(), public);
        }

        debug!(raw, "Classified as remote URL");
        if candidate.joined {
            ImageSource::remote(candidate.url.as_str())
        } else {
            // absolute URLs keep the caller's spelling
            ImageSource::remote(&normalized)
        }
    }

    /// Parse as an absolute URL, or resolve a relative one against the site base.
    fn parse_candidate(&self, candidate: &str) -> Option<Candidate> {
        match Url::parse(candidate) {
            Ok(url) => Some(Candidate {
                host: written_host(candidate).to_string(),
                joined: false,
                url,
            }),
            Err(_) => self.site.base_url.join(candidate).ok().map(|url| Candidate {
                host: written_host(candidate).to_string(),
                joined: true,
                url,
            }),
        }
    }

    fn is_url_local(&self, candidate: &Candidate) -> bool {
        let url = &candidate.url;
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        // Query-bearing requests are always processed as remote.
        if url.query().is_some_and(|q| !q.is_empty()) {
            return false;
        }
        if candidate.host.is_empty() {
            return true;
        }
        // Case-sensitive, on the host as the caller wrote it.
        let site_host = strip_www(self.site.base_url.host_str().unwrap_or_default());
        strip_www(&candidate.host) == site_host
    }
}

struct Candidate {
    url: Url,
    /// Host exactly as spelled in the reference; empty when it inherits the site's.
    host: String,
    /// Resolved against the site base URL.
    joined: bool,
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// The authority's host, without userinfo or port, in its original spelling.
fn written_host(reference: &str) -> &str {
    let scheme_end = reference.find("://").filter(|&i| {
        let scheme = &reference[..i];
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });
    let after_scheme = match scheme_end {
        Some(i) => &reference[i + 3..],
        None => match reference.strip_prefix("//") {
            Some(rest) => rest,
            None => return "",
        },
    };
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    if host_port.starts_with('[') {
        return host_port
            .find(']')
            .map_or(host_port, |end| &host_port[..=end]);
    }
    match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => host_port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_port::LocalFileSystem;
    use std::path::Path;
    use tempfile::tempdir;

    fn classifier(root: &Path, base: &str) -> (SourceClassifier, Arc<LocalFileSystem>) {
        let base = Url::parse(base).unwrap();
        let fs = Arc::new(LocalFileSystem::new(root, base.clone()));
        let site = SiteContext { base_url: base };
        (SourceClassifier::new(fs.clone(), site), fs)
    }

    #[test]
    fn www_is_ignored_when_comparing_hosts() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, fs) = classifier(td.path(), "https://www.example.com/");
        let s = c.classify("https://example.com/img.png");
        assert!(s.is_local);
        assert_eq!(s.url, "/img.png");
        assert_eq!(Path::new(&s.path), fs.site_root().join("img.png"));
        Ok(())
    }

    #[test]
    fn query_string_forces_remote() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, _) = classifier(td.path(), "https://www.example.com/");
        let s = c.classify("https://example.com/img.png?v=2");
        assert!(!s.is_local);
        assert_eq!(s.path, s.url);
        assert_eq!(s.url, "https://example.com/img.png?v=2");
        Ok(())
    }

    #[test]
    fn foreign_host_is_remote_and_spaces_become_plus() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, _) = classifier(td.path(), "https://example.com/");
        let s = c.classify("https://cdn.other.org/my photo.jpg");
        assert_eq!(s, ImageSource::remote("https://cdn.other.org/my+photo.jpg"));
        Ok(())
    }

    #[test]
    fn existing_file_is_local_path() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, fs) = classifier(td.path(), "https://example.com/");
        std::fs::create_dir_all(td.path().join("images"))?;
        std::fs::write(td.path().join("images").join("a.png"), b"png")?;

        let s = c.classify("images/a.png");
        assert!(s.is_local);
        assert_eq!(Path::new(&s.path), fs.site_root().join("images").join("a.png"));
        assert_eq!(s.url, "/images/a.png");
        Ok(())
    }

    #[test]
    fn hostless_url_is_local() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, fs) = classifier(td.path(), "https://example.com/");
        let s = c.classify("/images/missing%20file.png");
        assert!(s.is_local);
        assert_eq!(s.url, "/images/missing%20file.png");
        assert_eq!(
            Path::new(&s.path),
            fs.site_root().join("images").join("missing file.png")
        );
        Ok(())
    }

    #[test]
    fn hostless_url_with_query_is_remote_absolute() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, _) = classifier(td.path(), "https://example.com/");
        let s = c.classify("/thumb.php?id=4");
        assert!(!s.is_local);
        assert_eq!(s.url, "https://example.com/thumb.php?id=4");
        Ok(())
    }

    #[test]
    fn protocol_relative_foreign_host_is_remote() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, _) = classifier(td.path(), "https://example.com/");
        let s = c.classify("//cdn.other.org/a.png");
        assert!(!s.is_local);
        assert_eq!(s.url, "https://cdn.other.org/a.png");
        Ok(())
    }

    #[test]
    fn host_comparison_is_case_sensitive() -> eyre::Result<()> {
        let td = tempdir()?;
        let (c, _) = classifier(td.path(), "https://www.example.com/");
        let mixed = c.classify("https://Example.COM/img.png");
        assert!(!mixed.is_local);
        assert_eq!(mixed.url, "https://Example.COM/img.png");
        assert!(!c.classify("https://WWW.example.com/img.png").is_local);
        assert!(c.classify("https://www.example.com:8443/img.png").is_local);
        Ok(())
    }

    #[test]
    fn written_host_keeps_spelling_and_drops_port() {
        assert_eq!(written_host("https://user@Cdn.Test:8080/a?b"), "Cdn.Test");
        assert_eq!(written_host("//www.example.com/a.png"), "www.example.com");
        assert_eq!(written_host("http://[::1]:80/x"), "[::1]");
        assert_eq!(written_host("/local/path.png"), "");
        assert_eq!(written_host("/mirror/http://cdn.test/a.png"), "");
    }

    #[test]
    fn http_prefix_skips_filesystem_lookup() -> eyre::Result<()> {
        let td = tempdir()?;
        // a file literally named like the URL must not be picked up
        let (c, _) = classifier(td.path(), "https://example.com/");
        let s = c.classify("http://cdn.other.org/x.png");
        assert!(!s.is_local);
        Ok(())
    }
}
