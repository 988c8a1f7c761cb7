//! Publishing the captured image as page metadata

use crate::preview::escape_html;
use crate::GeneratedImage;

pub const OG_IMAGE: &str = "og:image";
pub const OG_IMAGE_TYPE: &str = "og:image:type";
pub const OG_IMAGE_WIDTH: &str = "og:image:width";
pub const OG_IMAGE_HEIGHT: &str = "og:image:height";

const OG_IMAGE_PROPERTIES: [&str; 4] = [OG_IMAGE, OG_IMAGE_TYPE, OG_IMAGE_WIDTH, OG_IMAGE_HEIGHT];

/// Head-metadata injector: property/content pairs reflected into the
/// document head.
pub trait HeadMetadata {
    /// Set `name` to `value`, replacing any existing entry of that name
    fn set_meta_property(&mut self, name: &str, value: &str);

    /// Remove the entry for `name` if present
    fn clear_meta_property(&mut self, name: &str);

    /// Current value of `name`
    fn meta_property(&self, name: &str) -> Option<&str>;
}

/// In-memory document head. Entries keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct DocumentHead {
    entries: Vec<(String, String)>,
}

impl DocumentHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `<meta property=".." content="..">` lines, one per entry.
    pub fn render_html(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| {
                format!(
                    "<meta property=\"{}\" content=\"{}\">",
                    escape_html(name),
                    escape_html(value)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl HeadMetadata for DocumentHead {
    fn set_meta_property(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    fn clear_meta_property(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    fn meta_property(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps the `og:image` entries in step with the generated image.
pub struct MetaPublisher;

impl MetaPublisher {
    /// Present image: set `og:image` and its type/size. Absent (or empty)
    /// image: remove all of them.
    pub fn publish(head: &mut dyn HeadMetadata, image: Option<&GeneratedImage>) {
        match image.filter(|img| !img.data_uri.as_str().is_empty()) {
            Some(img) => {
                head.set_meta_property(OG_IMAGE, img.data_uri.as_str());
                head.set_meta_property(OG_IMAGE_TYPE, img.data_uri.mime());
                head.set_meta_property(OG_IMAGE_WIDTH, &img.width.to_string());
                head.set_meta_property(OG_IMAGE_HEIGHT, &img.height.to_string());
            }
            None => {
                for name in OG_IMAGE_PROPERTIES {
                    head.clear_meta_property(name);
                }
            }
        }
    }
}
