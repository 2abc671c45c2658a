//! HTTP range collaborator and response-header interpretation.

use crate::error::Result;
use crate::error::ThumbError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::RANGE;
use reqwest::header::USER_AGENT;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// Raw result of a range request: status line plus `name: value` lines, and the body.
#[derive(Clone, Debug, Default)]
pub struct RangeResponse {
    pub header_lines: Vec<String>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait HttpRangePort: std::fmt::Debug + Send + Sync {
    /// GET `url` with `Range: bytes=<start>-<end>` (inclusive).
    async fn get_range(&self, url: &str, start: u64, end: u64) -> Result<RangeResponse>;

    /// Stream the whole resource into `sink`, returning the byte count.
    async fn download(&self, url: &str, sink: &mut (dyn Write + Send)) -> Result<u64>;
}

static STATUS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"HTTP/[0-9.]+\s+([0-9]+)").expect("status line pattern is valid"));

/// Header lines flattened into a lower-cased name map, plus the numeric status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub status: Option<u16>,
    pub fields: BTreeMap<String, String>,
}

impl ResponseHeaders {
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut out = Self::default();
        for line in lines {
            let line = line.as_ref();
            match line.split_once(':') {
                Some((name, value)) => {
                    out.fields
                        .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => {
                    if let Some(code) = STATUS_LINE
                        .captures(line)
                        .and_then(|c| c.get(1))
                        .and_then(|m| m.as_str().parse().ok())
                    {
                        out.status = Some(code);
                    }
                }
            }
        }
        out
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Total resource size implied by the response, when it can be trusted.
    ///
    /// `206` with a `Content-Range` carrying a total, or `200` with a numeric
    /// `Content-Length` (the server ignored the range and sent everything).
    /// Zero is treated as unknown.
    #[must_use]
    pub fn total_size(&self) -> Option<u64> {
        let size = match self.status? {
            206 => {
                let range = self.get("content-range")?;
                if !range.contains("bytes") {
                    return None;
                }
                let (_, total) = range.split_once('/')?;
                total.trim().parse::<u64>().ok()
            }
            200 => self.get("content-length")?.trim().parse::<u64>().ok(),
            _ => None,
        };
        size.filter(|s| *s > 0)
    }
}

/// [`HttpRangePort`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestRangeClient {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for ReqwestRangeClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl ReqwestRangeClient {
    pub fn new(client: reqwest::Client) -> Self {
        let git_rev = option_env!("GIT_REVISION").unwrap_or("unknown");
        let user_agent = format!(
            "{} v{} (rev {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            git_rev
        );
        Self { client, user_agent }
    }
}

#[async_trait]
impl HttpRangePort for ReqwestRangeClient {
    async fn get_range(&self, url: &str, start: u64, end: u64) -> Result<RangeResponse> {
        let mut resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(RANGE, format!("bytes={start}-{end}"))
            .send()
            .await
            .map_err(|e| ThumbError::transfer(url, e.to_string()))?;

        let mut header_lines = vec![format!("{:?} {}", resp.version(), resp.status())];
        for (name, value) in resp.headers() {
            header_lines.push(format!(
                "{}: {}",
                name.as_str(),
                value.to_str().unwrap_or_default()
            ));
        }

        // Servers that ignore Range would otherwise hand us the whole file.
        let limit = usize::try_from(end.saturating_sub(start).saturating_add(1))
            .unwrap_or(usize::MAX);
        let mut body = Vec::new();
        while body.len() < limit {
            let Some(chunk) = resp
                .chunk()
                .await
                .map_err(|e| ThumbError::transfer(url, e.to_string()))?
            else {
                break;
            };
            let take = chunk.len().min(limit - body.len());
            body.extend_from_slice(&chunk[..take]);
        }
        debug!(url, status = %resp.status(), bytes = body.len(), "Range probe complete");

        Ok(RangeResponse { header_lines, body })
    }

    async fn download(&self, url: &str, sink: &mut (dyn Write + Send)) -> Result<u64> {
        let mut resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| ThumbError::transfer(url, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ThumbError::transfer(url, format!("HTTP status {status}")));
        }

        let mut written = 0u64;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ThumbError::transfer(url, e.to_string()))?
        {
            sink.write_all(&chunk)
                .map_err(|e| ThumbError::transfer(url, e.to_string()))?;
            written += chunk.len() as u64;
        }
        debug!(url, bytes = written, "Download complete");
        Ok(written)
    }
}

/// Run `fut` under a deadline; an elapsed deadline becomes a transfer error for `url`.
pub async fn with_timeout<T, F>(url: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ThumbError::transfer(
            url,
            format!("timed out after {}", humantime::format_duration(timeout)),
        )),
    }
}
