//! Headless rendering of the preview card
//!
//! markup -> `layout` -> `paint` -> `raster` -> PNG -> data URI

pub mod layout;
pub mod paint;
pub mod raster;

use log::debug;
use scraper::Html;

use crate::loader::{DefaultImageLoader, ImageLoad, ImageLoader};
use crate::rendering::layout::ElementType;
use crate::{
    CaptureConfig, Error, GeneratedImage, ImageDataUri, PreviewRegion, Rasterizer, Result, Theme,
    Viewport,
};

/// Encoded output of one render.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
    /// SHA-256 hex of the raw RGBA pixels
    pub fingerprint: String,
}

/// Render `region` into a PNG using `loader` for its image.
///
/// Fails with [`Error::TaintedCanvas`] if the image came from an origin that
/// did not allow reading it. Broken images become placeholders.
pub fn render_region(
    region: &PreviewRegion,
    viewport: Viewport,
    theme: &Theme,
    loader: &dyn ImageLoader,
) -> Result<Screenshot> {
    let document = Html::parse_document(&region.markup());
    let nodes = layout::layout_document(&document, viewport);

    let mut images = Vec::new();
    for node in nodes.iter().filter(|n| n.elem_type == ElementType::Image) {
        let src = node.source.as_deref().unwrap_or_default();
        match loader.load(src) {
            ImageLoad::Tainted(origin) => return Err(Error::TaintedCanvas(origin)),
            ImageLoad::Broken(reason) => {
                debug!("image '{}' renders as placeholder: {}", src, reason);
                images.push(ImageLoad::Broken(reason));
            }
            ready => images.push(ready),
        }
    }

    let cmds = paint::paint_layout(&nodes, viewport.width, viewport.height, theme, &images);
    let canvas = raster::rasterize(viewport.width, viewport.height, &cmds);
    raster::encode_png(&canvas)
}

/// The default [`Rasterizer`]: renders previews in-process.
pub struct HeadlessRasterizer {
    config: CaptureConfig,
    loader: Box<dyn ImageLoader>,
}

impl HeadlessRasterizer {
    pub fn new(config: CaptureConfig) -> Result<Self> {
        config.validate()?;
        let loader = DefaultImageLoader::new(&config)?;
        Ok(Self {
            config,
            loader: Box::new(loader),
        })
    }

    /// Use a custom image loader instead of the default one.
    pub fn with_loader(config: CaptureConfig, loader: Box<dyn ImageLoader>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, loader })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

impl Rasterizer for HeadlessRasterizer {
    fn capture(&mut self, region: &PreviewRegion) -> Result<GeneratedImage> {
        let shot = render_region(region, self.config.viewport, &self.config.theme, self.loader.as_ref())?;
        if shot.png_data.is_empty() {
            return Err(Error::RenderError("encoder produced no data".into()));
        }
        debug!(
            "captured revision {} as {}x{} png ({} bytes, {})",
            region.revision,
            shot.width,
            shot.height,
            shot.png_data.len(),
            &shot.fingerprint[..12]
        );
        Ok(GeneratedImage {
            data_uri: ImageDataUri::from_png(&shot.png_data),
            width: shot.width,
            height: shot.height,
            fingerprint: shot.fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TaintingLoader;

    impl ImageLoader for TaintingLoader {
        fn load(&self, _src: &str) -> ImageLoad {
            ImageLoad::Tainted("https://cdn.example".into())
        }
    }

    fn small() -> CaptureConfig {
        CaptureConfig {
            viewport: Viewport { width: 320, height: 168 },
            ..Default::default()
        }
    }

    #[test]
    fn capture_returns_png_data_uri() {
        let mut r = HeadlessRasterizer::new(small()).unwrap();
        let img = r.capture(&PreviewRegion::new("Hello", "World", "")).unwrap();
        assert!(img.data_uri.as_str().starts_with("data:image/png;base64,"));
        assert_eq!((img.width, img.height), (320, 168));
        let png = img.data_uri.decode().unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn same_content_same_fingerprint() {
        let mut r = HeadlessRasterizer::new(small()).unwrap();
        let region = PreviewRegion::new("Hello", "World", "");
        let a = r.capture(&region).unwrap();
        let b = r.capture(&region).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        let c = r.capture(&PreviewRegion::new("Hello", "World!", "")).unwrap();
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn tainted_image_fails_capture() {
        let mut r = HeadlessRasterizer::with_loader(small(), Box::new(TaintingLoader)).unwrap();
        let err = r
            .capture(&PreviewRegion::new("t", "c", "https://cdn.example/a.png"))
            .unwrap_err();
        assert!(matches!(err, Error::TaintedCanvas(_)));
    }

    #[test]
    fn loader_not_consulted_without_image() {
        let mut r = HeadlessRasterizer::with_loader(small(), Box::new(TaintingLoader)).unwrap();
        assert!(r.capture(&PreviewRegion::new("t", "c", "")).is_ok());
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let cfg = CaptureConfig {
            viewport: Viewport { width: 0, height: 0 },
            ..Default::default()
        };
        assert!(HeadlessRasterizer::new(cfg).is_err());
    }
}
