use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::path::{Component, Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum BackgroundError {
    #[error("File size must be less than {0}MB")]
    TooLarge(u64),

    #[error("Please select a valid image file")]
    NotAnImage,

    #[error("Background image data is malformed")]
    MalformedDataUrl,

    #[error("Background image path is not allowed")]
    InvalidPath,

    #[error("Background image not found")]
    NotFound,

    #[error("Could not download background image: {0}")]
    Fetch(String),

    #[error("Could not read background image: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a design's background image comes from
#[derive(Debug, PartialEq)]
pub enum BackgroundSource<'a> {
    /// `data:image/...;base64,...` from a customer upload
    Inline { mime: &'a str, payload: &'a str },
    /// Preset image hosted elsewhere
    Remote(url::Url),
    /// Template asset relative to the assets directory
    Asset(PathBuf),
}

impl<'a> BackgroundSource<'a> {
    pub fn classify(value: &'a str) -> Result<Self, BackgroundError> {
        let value = value.trim();

        if let Some(rest) = value.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or(BackgroundError::MalformedDataUrl)?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or(BackgroundError::MalformedDataUrl)?;
            if !mime.starts_with("image/") {
                return Err(BackgroundError::NotAnImage);
            }
            return Ok(Self::Inline { mime, payload });
        }

        if value.starts_with("http://") || value.starts_with("https://") {
            let url = url::Url::parse(value).map_err(|_| BackgroundError::InvalidPath)?;
            return Ok(Self::Remote(url));
        }

        // Template paths may be written as served URLs (`/static/...`)
        let relative = value.trim_start_matches('/');
        let relative = relative.strip_prefix("static/").unwrap_or(relative);
        let path = Path::new(relative);
        let safe = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(BackgroundError::InvalidPath);
        }

        Ok(Self::Asset(path.to_path_buf()))
    }
}

/// Loads and decodes card backgrounds from any supported source
#[derive(Clone)]
pub struct BackgroundLoader {
    client: reqwest::Client,
    assets_dir: PathBuf,
    max_bytes: u64,
}

impl BackgroundLoader {
    pub fn new(client: reqwest::Client, assets_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            client,
            assets_dir: assets_dir.into(),
            max_bytes,
        }
    }

    #[tracing::instrument(skip(self, value), fields(len = value.len()))]
    pub async fn load(&self, value: &str) -> Result<DynamicImage, BackgroundError> {
        let bytes = match BackgroundSource::classify(value)? {
            BackgroundSource::Inline { payload, .. } => self.decode_inline(payload)?,
            BackgroundSource::Remote(url) => self.fetch_remote(url).await?,
            BackgroundSource::Asset(path) => self.read_asset(&path).await?,
        };

        tracing::debug!(bytes = bytes.len(), "Background image loaded");

        decode_image(&bytes)
    }

    fn too_large(&self) -> BackgroundError {
        BackgroundError::TooLarge(self.max_bytes / (1024 * 1024))
    }

    fn decode_inline(&self, payload: &str) -> Result<Vec<u8>, BackgroundError> {
        // Reject oversized uploads before decoding them
        let estimated = (payload.len() as u64 / 4) * 3;
        if estimated > self.max_bytes + 3 {
            return Err(self.too_large());
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| BackgroundError::MalformedDataUrl)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(self.too_large());
        }

        Ok(bytes)
    }

    async fn fetch_remote(&self, url: url::Url) -> Result<Vec<u8>, BackgroundError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BackgroundError::Fetch(e.to_string()))?;

        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(self.too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BackgroundError::Fetch(e.to_string()))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }

    async fn read_asset(&self, relative: &Path) -> Result<Vec<u8>, BackgroundError> {
        let path = self.assets_dir.join(relative);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackgroundError::NotFound)
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(BackgroundError::NotFound);
        }
        if metadata.len() > self.max_bytes {
            return Err(self.too_large());
        }

        Ok(tokio::fs::read(&path).await?)
    }
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, BackgroundError> {
    image::guess_format(bytes).map_err(|_| BackgroundError::NotAnImage)?;
    image::load_from_memory(bytes).map_err(|_| BackgroundError::NotAnImage)
}
