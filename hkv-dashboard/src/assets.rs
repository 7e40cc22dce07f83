//! Static files for the browser poller.
//!
//! The page and script are compiled into the binary. A public directory may
//! override either file; a missing or unreadable override falls back to the
//! built-in copy.

use std::path::PathBuf;

use bytes::Bytes;
use tracing::debug;

const INDEX_HTML: &str = include_str!("../public/index.html");
const APP_JS: &str = include_str!("../public/app.js");

/// A servable static file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    Index,
    AppJs,
}

impl Asset {
    /// Maps a request path to an asset.
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" | "/index.html" => Some(Asset::Index),
            "/app.js" => Some(Asset::AppJs),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Asset::Index => "index.html",
            Asset::AppJs => "app.js",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Asset::Index => "text/html; charset=utf-8",
            Asset::AppJs => "text/javascript; charset=utf-8",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            Asset::Index => INDEX_HTML,
            Asset::AppJs => APP_JS,
        }
    }
}

/// Resolves asset bodies from an optional override directory.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    dir: Option<PathBuf>,
}

impl Assets {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Assets { dir }
    }

    /// Returns the body for `asset`.
    pub async fn load(&self, asset: Asset) -> Bytes {
        if let Some(dir) = &self.dir {
            let path = dir.join(asset.file_name());
            match tokio::fs::read(&path).await {
                Ok(contents) => return Bytes::from(contents),
                Err(e) => debug!(path = %path.display(), "asset override unavailable: {e}"),
            }
        }
        Bytes::from_static(asset.embedded().as_bytes())
    }
}
