use async_trait::async_trait;
use reqwest::Url;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::tempdir;
use thumbinfo::Result;
use thumbinfo::ThumbError;
use thumbinfo::fs_port::FileSystemPort;
use thumbinfo::fs_port::LocalFileSystem;
use thumbinfo::http::HttpRangePort;
use thumbinfo::http::RangeResponse;
use thumbinfo::materialize::RemoteFileMaterializer;
use thumbinfo::safe_name::CacheLayout;
use thumbinfo::safe_name::PathNameSanitizer;

/// Streams a body in small chunks with pauses so downloads overlap.
#[derive(Debug)]
struct ChunkedDownload {
    body: Vec<u8>,
    started: AtomicUsize,
}

#[async_trait]
impl HttpRangePort for ChunkedDownload {
    async fn get_range(&self, url: &str, _start: u64, _end: u64) -> Result<RangeResponse> {
        Err(ThumbError::transfer(url, "ranges are not served here"))
    }

    async fn download(&self, url: &str, sink: &mut (dyn Write + Send)) -> Result<u64> {
        self.started.fetch_add(1, Ordering::SeqCst);
        for chunk in self.body.chunks(256) {
            sink.write_all(chunk)
                .map_err(|e| ThumbError::transfer(url, e.to_string()))?;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        Ok(self.body.len() as u64)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_materialization_yields_one_intact_file() -> eyre::Result<()> {
    let td = tempdir()?;
    let fs: Arc<dyn FileSystemPort> = Arc::new(LocalFileSystem::new(
        td.path(),
        Url::parse("https://www.example.com/")?,
    ));
    let body: Vec<u8> = b"thumbinfo-body-".iter().copied().cycle().take(8192).collect();
    let http = Arc::new(ChunkedDownload {
        body: body.clone(),
        started: AtomicUsize::new(0),
    });
    let sanitizer = PathNameSanitizer::new(fs.clone(), CacheLayout::Hierarchical, true);
    let materializer = RemoteFileMaterializer::new(fs.clone(), http.clone(), sanitizer);
    let remote_dir = fs.site_root().join("remote");

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let m = materializer.clone();
        let dir = remote_dir.clone();
        tasks.push(tokio::spawn(async move {
            m.materialize("https://cdn.test/big/photo.jpg", &dir).await
        }));
    }
    let mut paths = Vec::new();
    for task in tasks {
        paths.push(task.await??);
    }

    let expected = remote_dir.join("cdn.test").join("big").join("photo.jpg");
    assert!(paths.iter().all(|p| *p == expected));
    assert_eq!(std::fs::read(&expected)?, body);
    assert!(http.started.load(Ordering::SeqCst) >= 1);

    // nothing but the file and its placeholder is left in the directory
    let mut names: Vec<String> = std::fs::read_dir(expected.parent().unwrap())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    assert_eq!(names, vec!["index.html".to_string(), "photo.jpg".to_string()]);
    Ok(())
}
