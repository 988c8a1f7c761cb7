/// Display list for the preview card

use image::RgbaImage;

use crate::loader::ImageLoad;
use crate::rendering::layout::{ElementType, LayoutNode};
use crate::Theme;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: [u8; 4],
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        rgba: [u8; 4],
    },
    /// Draw `pixels` scaled to fit the box, keeping the aspect ratio
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        pixels: RgbaImage,
    },
    /// Placeholder for an image that failed to load
    BrokenImage {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: [u8; 4],
    },
}

/// Build the display list. `images` holds one load result per image node,
/// in layout order; a missing entry paints as broken.
pub fn paint_layout(
    nodes: &[LayoutNode],
    width: u32,
    height: u32,
    theme: &Theme,
    images: &[ImageLoad],
) -> Vec<PaintCommand> {
    let mut cmds = vec![PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width,
        height,
        rgba: theme.background,
    }];

    let mut image_iter = images.iter();
    for node in nodes {
        let (cx, cy) = node.lb.content_origin();
        match node.elem_type {
            ElementType::Title | ElementType::Paragraph => {
                let line_h = (8 * node.scale + node.scale * 2) as i32;
                for (i, line) in node.text.lines().enumerate() {
                    if line.is_empty() {
                        continue;
                    }
                    cmds.push(PaintCommand::Text {
                        x: cx,
                        y: cy + i as i32 * line_h,
                        text: line.to_string(),
                        scale: node.scale,
                        rgba: theme.foreground,
                    });
                }
            }
            ElementType::Image => {
                let r = &node.lb.rect;
                // frame
                cmds.push(PaintCommand::SolidRect {
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                    rgba: theme.accent,
                });
                cmds.push(PaintCommand::SolidRect {
                    x: cx,
                    y: cy,
                    width: node.lb.content_width(),
                    height: node.lb.content_height(),
                    rgba: theme.background,
                });
                match image_iter.next() {
                    Some(ImageLoad::Ready(pixels)) => cmds.push(PaintCommand::Image {
                        x: cx,
                        y: cy,
                        width: node.lb.content_width(),
                        height: node.lb.content_height(),
                        pixels: pixels.clone(),
                    }),
                    _ => cmds.push(PaintCommand::BrokenImage {
                        x: cx,
                        y: cy,
                        width: node.lb.content_width(),
                        height: node.lb.content_height(),
                        rgba: theme.accent,
                    }),
                }
            }
        }
    }
    cmds
}
