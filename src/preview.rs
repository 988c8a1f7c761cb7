//! The capture region: a card built from a snapshot of the draft fields

/// Element id of the card root in [`PreviewRegion::markup`].
pub const PREVIEW_ROOT_ID: &str = "og-preview";

/// Field values frozen at the moment a preview was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewRegion {
    pub title: String,
    pub content: String,
    pub image_url: String,
    /// Form revision the snapshot was taken at
    pub revision: u64,
}

impl PreviewRegion {
    pub fn new(title: impl Into<String>, content: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_url: image_url.into(),
            revision: 0,
        }
    }

    /// The image element is rendered only for a non-empty URL.
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }

    /// HTML for the card. Text is escaped, so the parsed document reads back
    /// exactly the field values.
    pub fn markup(&self) -> String {
        let mut html = String::with_capacity(128 + self.title.len() + self.content.len());
        html.push_str("<!DOCTYPE html><html><head><title>Preview</title></head><body>");
        html.push_str(&format!("<div id=\"{}\">", PREVIEW_ROOT_ID));
        html.push_str("<h1>");
        html.push_str(&escape_html(&self.title));
        html.push_str("</h1><p>");
        html.push_str(&escape_html(&self.content));
        html.push_str("</p>");
        if self.has_image() {
            html.push_str(&format!("<img src=\"{}\" alt=\"\">", escape_html(&self.image_url)));
        }
        html.push_str("</div></body></html>");
        html
    }
}

/// Escape text for use in element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
