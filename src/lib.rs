//! ogsnap
//!
//! Headless Open Graph preview-card capture for post drafts. A draft holds a
//! title, body text and an optional image URL; its preview is rendered
//! offscreen from those values and rasterized into a PNG `data:` URI that can
//! be published as the page's `og:image`.
//!
//! # Features
//!
//! - **Deterministic capture**: the preview is rebuilt from the current field
//!   values on every capture, never from a stale on-screen region
//! - **Async trigger**: captures run on a worker thread and complete later;
//!   the most recent trigger wins
//! - **Safe defaults**: cross-origin images without CORS headers fail the
//!   capture instead of leaking their pixels
//!
//! # Example
//!
//! ```no_run
//! use ogsnap::{CaptureConfig, PostEditor};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut editor = PostEditor::new(CaptureConfig::default()).await?;
//! editor.set_title("Hello");
//! editor.set_content("World");
//! editor.generate_preview_image();
//! editor.settle().await;
//!
//! let og_image = editor.head().render_html();
//! println!("{}", og_image);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod data_uri;
pub mod editor;
pub mod form;
pub mod loader;
pub mod meta;
pub mod preview;
pub mod rendering;

pub use capture::CaptureService;
pub use data_uri::{GeneratedImage, ImageDataUri};
pub use editor::{CaptureCompletion, PostEditor};
pub use form::{Field, PostForm};
pub use meta::{DocumentHead, HeadMetadata, MetaPublisher};
pub use preview::PreviewRegion;
pub use rendering::HeadlessRasterizer;

/// Configuration for preview capture
///
/// The defaults target the common Open Graph card size and are conservative
/// about remote content:
/// - images are fetched with a short timeout and a size cap
/// - without a `document_url`, every remote image counts as cross-origin
///
/// # Examples
///
/// ```
/// let cfg = ogsnap::CaptureConfig::default();
/// assert_eq!(cfg.viewport.width, 1200);
/// assert!(cfg.user_agent.contains("ogsnap"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Size of the captured card
    pub viewport: Viewport,
    /// URL of the page hosting the preview; defines its origin and resolves
    /// relative image URLs
    pub document_url: Option<String>,
    /// User agent string sent with image requests
    pub user_agent: String,
    /// Timeout for image fetches in milliseconds
    pub timeout_ms: u64,
    /// Extra HTTP headers sent with image requests
    pub headers: HashMap<String, String>,
    /// Whether to load images at all; disabled images render as placeholders
    pub enable_images: bool,
    /// Largest image body accepted, in bytes
    pub max_image_bytes: usize,
    /// Card colors
    pub theme: Theme,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            document_url: None,
            user_agent: format!("ogsnap/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 10000,
            headers: HashMap::new(),
            enable_images: true,
            max_image_bytes: 8 * 1024 * 1024,
            theme: Theme::default(),
        }
    }
}

impl CaptureConfig {
    /// Check the configuration before a rasterizer is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if let Some(doc) = &self.document_url {
            url::Url::parse(doc)
                .map_err(|e| Error::ConfigError(format!("document_url '{}': {}", doc, e)))?;
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
        }
    }
}

/// RGBA colors used to paint the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: [u8; 4],
    pub foreground: [u8; 4],
    pub accent: [u8; 4],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            foreground: [0, 0, 0, 255],
            accent: [200, 200, 200, 255],
        }
    }
}

/// The black-box rasterization capability: turn a preview region into an
/// encoded image.
pub trait Rasterizer {
    /// Render the region and encode it as a PNG data URI
    fn capture(&mut self, region: &PreviewRegion) -> Result<GeneratedImage>;
}

/// Create a rasterizer with the default headless backend
pub fn new_rasterizer(config: CaptureConfig) -> Result<impl Rasterizer> {
    HeadlessRasterizer::new(config)
}
