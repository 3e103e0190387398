use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads binary assets such as card portraits.
pub trait AssetFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AssetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Replaces characters that are invalid in file names on common platforms.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}

/// Downloads `url` into `dir` as `<card_id>_<name>.png` and returns the written path.
pub fn save_portrait<F: AssetFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    dir: &Path,
    card_id: i64,
    card_name: &str,
) -> Result<PathBuf, AssetError> {
    let bytes = fetcher.fetch(url)?;
    std::fs::create_dir_all(dir)?;

    let path = dir.join(format!("{}_{}.png", card_id, sanitize_file_name(card_name)));
    std::fs::write(&path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Saved portrait");
    Ok(path)
}
