//! Loading image sources referenced by the preview
//!
//! Images come from `data:` URIs or from `http(s)` URLs. A remote image from
//! another origin is readable only when the server opts in through
//! `Access-Control-Allow-Origin`; otherwise it would taint the capture.

use image::RgbaImage;
use log::{debug, warn};
use url::Url;

use crate::{CaptureConfig, Error, ImageDataUri, Result};

#[cfg(feature = "http")]
use reqwest::{blocking::Client, blocking::Response, header, redirect::Policy};
#[cfg(feature = "http")]
use std::io::Read;
#[cfg(feature = "http")]
use std::time::Duration;

/// Redirect hops followed before an image is reported broken.
#[cfg(feature = "http")]
pub const MAX_REDIRECTS: usize = 10;

/// Outcome of loading one image source.
#[derive(Debug, Clone)]
pub enum ImageLoad {
    /// Decoded pixels, safe to draw
    Ready(RgbaImage),
    /// Could not be loaded; drawn as a placeholder
    Broken(String),
    /// Loaded from an origin that did not allow reading its pixels
    Tainted(String),
}

/// Resolves an `<img src>` into pixels.
pub trait ImageLoader: Send {
    fn load(&self, src: &str) -> ImageLoad;
}

/// Loader for `data:` URIs and, with the `http` feature, remote URLs.
pub struct DefaultImageLoader {
    document_url: Option<Url>,
    enable_images: bool,
    max_image_bytes: usize,

    #[cfg(feature = "http")]
    client: Client,

    #[cfg(feature = "http")]
    headers: Vec<(String, String)>,
}

impl DefaultImageLoader {
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        let document_url = match &config.document_url {
            Some(u) => Some(
                Url::parse(u).map_err(|e| Error::ConfigError(format!("document_url '{}': {}", u, e)))?,
            ),
            None => None,
        };

        #[cfg(feature = "http")]
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            document_url,
            enable_images: config.enable_images,
            max_image_bytes: config.max_image_bytes,
            #[cfg(feature = "http")]
            client,
            #[cfg(feature = "http")]
            headers: config.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    /// Serialized origin of the hosting document, `"null"` when unknown.
    fn document_origin(&self) -> String {
        self.document_url
            .as_ref()
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|| "null".to_string())
    }

    fn resolve(&self, src: &str) -> std::result::Result<Url, url::ParseError> {
        match &self.document_url {
            Some(base) => base.join(src),
            None => Url::parse(src),
        }
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        match &self.document_url {
            Some(doc) => doc.origin() == url.origin(),
            None => false,
        }
    }

    fn decode(&self, bytes: &[u8]) -> ImageLoad {
        if bytes.len() > self.max_image_bytes {
            return ImageLoad::Broken(format!("image exceeds {} bytes", self.max_image_bytes));
        }
        match image::load_from_memory(bytes) {
            Ok(img) => ImageLoad::Ready(img.to_rgba8()),
            Err(e) => ImageLoad::Broken(format!("undecodable image: {}", e)),
        }
    }

    /// Fetch `url`, following redirects one hop at a time. A chain that
    /// leaves the document origin at any hop needs the final response to
    /// allow the document origin, even if it lands back on the same origin.
    #[cfg(feature = "http")]
    fn fetch(&self, url: &Url) -> ImageLoad {
        let origin = self.document_origin();
        let mut current = url.clone();
        let mut cross_origin = false;

        for _ in 0..=MAX_REDIRECTS {
            cross_origin |= !self.is_same_origin(&current);

            let mut req = self.client.get(current.as_str());
            for (k, v) in &self.headers {
                req = req.header(k.as_str(), v.as_str());
            }
            if cross_origin {
                req = req.header(header::ORIGIN, origin.as_str());
            }

            let resp = match req.send() {
                Ok(r) => r,
                Err(e) => return ImageLoad::Broken(format!("request failed: {}", e)),
            };

            if resp.status().is_redirection() {
                let next = resp
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|loc| current.join(loc).ok());
                match next {
                    Some(u) if matches!(u.scheme(), "http" | "https") => {
                        debug!("image {} redirected to {}", current, u);
                        current = u;
                        continue;
                    }
                    _ => return ImageLoad::Broken(format!("HTTP {} without a usable Location", resp.status())),
                }
            }
            if !resp.status().is_success() {
                return ImageLoad::Broken(format!("HTTP {}", resp.status()));
            }
            if cross_origin && !allows_origin(&resp, &origin) {
                return ImageLoad::Tainted(current.origin().ascii_serialization());
            }
            return self.read_body(resp);
        }
        ImageLoad::Broken(format!("more than {} redirects from {}", MAX_REDIRECTS, url))
    }

    /// Read at most `max_image_bytes + 1` bytes so an oversized body is
    /// rejected without buffering it.
    #[cfg(feature = "http")]
    fn read_body(&self, resp: Response) -> ImageLoad {
        let cap = self.max_image_bytes as u64;
        if resp.content_length().is_some_and(|len| len > cap) {
            return ImageLoad::Broken(format!("image exceeds {} bytes", self.max_image_bytes));
        }
        let mut body = Vec::new();
        if let Err(e) = resp.take(cap + 1).read_to_end(&mut body) {
            return ImageLoad::Broken(format!("failed to read body: {}", e));
        }
        self.decode(&body)
    }

    #[cfg(not(feature = "http"))]
    fn fetch(&self, url: &Url) -> ImageLoad {
        ImageLoad::Broken(format!("remote images need the `http` feature: {}", url))
    }
}

#[cfg(feature = "http")]
fn allows_origin(resp: &Response, origin: &str) -> bool {
    resp.headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let v = v.trim();
            v == "*" || v == origin
        })
        .unwrap_or(false)
}

impl ImageLoader for DefaultImageLoader {
    fn load(&self, src: &str) -> ImageLoad {
        if !self.enable_images {
            return ImageLoad::Broken("images disabled".into());
        }

        let src = src.trim();
        if src.starts_with("data:") {
            return match ImageDataUri::parse(src).and_then(|u| u.decode()) {
                Ok(bytes) => self.decode(&bytes),
                Err(e) => ImageLoad::Broken(e.to_string()),
            };
        }

        let url = match self.resolve(src) {
            Ok(u) => u,
            Err(e) => {
                debug!("image source '{}' is not a URL: {}", src, e);
                return ImageLoad::Broken(format!("invalid URL: {}", e));
            }
        };
        match url.scheme() {
            "http" | "https" => {}
            other => return ImageLoad::Broken(format!("unsupported scheme '{}'", other)),
        }

        let res = self.fetch(&url);
        if let ImageLoad::Tainted(origin) = &res {
            warn!("image {} from {} is not CORS-readable", url, origin);
        }
        res
    }
}
