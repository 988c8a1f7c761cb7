/// Block layout for the preview card

use crate::preview::PREVIEW_ROOT_ID;
use crate::Viewport;
use scraper::{Html, Selector};

/// Glyph cell size before scaling (font8x8)
pub const GLYPH: u32 = 8;
/// Outer padding of the card
pub const CARD_PADDING: u32 = 48;
pub const TITLE_SCALE: u32 = 4;
pub const CONTENT_SCALE: u32 = 2;
/// Image boxes smaller than this are not laid out
pub const MIN_IMAGE_BOX: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        self.rect.width.saturating_sub(self.box_model.border * 2 + self.box_model.padding * 2)
    }

    pub fn content_height(&self) -> u32 {
        self.rect.height.saturating_sub(self.box_model.border * 2 + self.box_model.padding * 2)
    }

    /// Top-left corner of the content area
    pub fn content_origin(&self) -> (i32, i32) {
        let inset = (self.box_model.border + self.box_model.padding) as i32;
        (self.rect.x + inset, self.rect.y + inset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Title,
    Paragraph,
    Image,
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    /// Wrapped text, one line per `\n`; empty for images
    pub text: String,
    pub elem_type: ElementType,
    pub scale: u32,
    /// `src` attribute for image nodes
    pub source: Option<String>,
}

/// Lay out the preview card found in `document`.
/// - Title (`h1`) at scale 4, content (`p`) at scale 2, both word-wrapped
/// - The image, if any, takes the remaining height
/// - Blocks that would start below the card are dropped
pub fn layout_document(document: &Html, viewport: Viewport) -> Vec<LayoutNode> {
    let mut nodes = Vec::new();
    let inner_w = viewport.width.saturating_sub(CARD_PADDING * 2);
    let bottom = viewport.height.saturating_sub(CARD_PADDING);
    let mut y = CARD_PADDING;

    let root = format!("#{}", PREVIEW_ROOT_ID);
    let (Some(h1_sel), Some(p_sel), Some(img_sel)) = (
        Selector::parse(&format!("{} h1", root)).ok(),
        Selector::parse(&format!("{} p", root)).ok(),
        Selector::parse(&format!("{} img", root)).ok(),
    ) else {
        return nodes;
    };

    let blocks = [
        (&h1_sel, ElementType::Title, TITLE_SCALE, 8u32, 24u32),
        (&p_sel, ElementType::Paragraph, CONTENT_SCALE, 6u32, 16u32),
    ];
    for (sel, elem_type, scale, padding, margin) in blocks {
        let Some(el) = document.select(sel).next() else {
            continue;
        };
        let raw = el.text().collect::<String>();
        if raw.trim().is_empty() || y >= bottom {
            continue;
        }

        let content_w = inner_w.saturating_sub(padding * 2);
        let chars_per_line = ((content_w / (GLYPH * scale)) as usize).max(1);
        let lines = wrap_text(&raw, chars_per_line);
        let line_h = GLYPH * scale + scale * 2;
        let box_h = lines.len() as u32 * line_h + padding * 2;

        nodes.push(LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: CARD_PADDING as i32,
                    y: y as i32,
                    width: inner_w,
                    height: box_h,
                },
                box_model: BoxModel {
                    margin,
                    border: 0,
                    padding,
                },
            },
            text: lines.join("\n"),
            elem_type,
            scale,
            source: None,
        });
        y += box_h + margin;
    }

    if let Some(img) = document.select(&img_sel).next() {
        let src = img.value().attr("src").unwrap_or_default().to_string();
        let box_h = bottom.saturating_sub(y);
        if box_h >= MIN_IMAGE_BOX && inner_w >= MIN_IMAGE_BOX {
            nodes.push(LayoutNode {
                lb: LayoutBox {
                    rect: Rect {
                        x: CARD_PADDING as i32,
                        y: y as i32,
                        width: inner_w,
                        height: box_h,
                    },
                    box_model: BoxModel {
                        margin: 0,
                        border: 1,
                        padding: 0,
                    },
                },
                text: String::new(),
                elem_type: ElementType::Image,
                scale: 1,
                source: Some(src),
            });
        }
    }

    nodes
}

/// Greedy word wrap. Explicit newlines start a new line; words longer than
/// a line are split.
pub fn wrap_text(text: &str, chars_per_line: usize) -> Vec<String> {
    let width = chars_per_line.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut cur = String::new();
        let mut cur_len = 0usize;
        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(width) {
                let chunk_len = chunk.len();
                if cur_len > 0 && cur_len + 1 + chunk_len > width {
                    lines.push(std::mem::take(&mut cur));
                    cur_len = 0;
                }
                if cur_len > 0 {
                    cur.push(' ');
                    cur_len += 1;
                }
                cur.extend(chunk);
                cur_len += chunk_len;
            }
        }
        lines.push(cur);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
