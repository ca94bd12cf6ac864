//! HTTP client for release artifact downloads.
//!
//! Redirects are followed by hand, one `Location` hop at a time, because
//! release hosts answer artifact GETs with a 302 to object storage and we
//! want the terminal status (404 and friends) reported exactly as the
//! server returned it.

use std::path::Path;
use std::time::Duration;

use reqwest::{header, redirect, Client, Response, StatusCode};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("redirect from {url} carried no Location header")]
    MissingLocation { url: String },

    #[error("invalid redirect target from {url}: {target}")]
    InvalidRedirect { url: String, target: String },

    #[error("too many redirects starting from {url}")]
    TooManyRedirects { url: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .user_agent(concat!("glyphd-dist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// GET a URL, following 301/302 redirects hop by hop.
    ///
    /// A terminal non-2xx status is an error carrying the status code and
    /// the URL that produced it.
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let mut target = url.to_string();

        for _ in 0..MAX_REDIRECTS {
            let response = self.client.get(&target).send().await?;
            let status = response.status();

            if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
                let location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| HttpError::MissingLocation { url: target.clone() })?;

                // Location may be relative to the redirecting URL
                target = match response.url().join(&location) {
                    Ok(next) => next.to_string(),
                    Err(_) => {
                        return Err(HttpError::InvalidRedirect {
                            url: target,
                            target: location,
                        })
                    }
                };
                continue;
            }

            if !status.is_success() {
                return Err(HttpError::Status {
                    status: status.as_u16(),
                    url: target,
                });
            }

            return Ok(response);
        }

        Err(HttpError::TooManyRedirects {
            url: url.to_string(),
        })
    }

    /// Stream a GET response body to `dest`.
    ///
    /// On any failure mid-stream the partially written file is removed
    /// before the error propagates.
    pub async fn download<F>(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<F>,
    ) -> Result<(), HttpError>
    where
        F: Fn(u64, u64),
    {
        let response = self.get(url).await?;
        let total = response.content_length().unwrap_or(0);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let result = stream_to_file(response, dest, total, progress).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }
}

async fn stream_to_file<F>(
    response: Response,
    dest: &Path,
    total: u64,
    progress: Option<F>,
) -> Result<(), HttpError>
where
    F: Fn(u64, u64),
{
    use futures_util::StreamExt;

    let mut file = File::create(dest).await?;
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(ref callback) = progress {
            callback(downloaded, total);
        }
    }

    file.flush().await?;
    Ok(())
}
