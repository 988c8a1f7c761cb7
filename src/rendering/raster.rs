/// Software rasterizer for the paint command list

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::rendering::layout::GLYPH;
use crate::rendering::paint::PaintCommand;
use crate::rendering::Screenshot;
use crate::Result;

/// Execute `commands` in order on a transparent canvas.
pub fn rasterize(width: u32, height: u32, commands: &[PaintCommand]) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                fill_rect(&mut img, *x, *y, *width, *height, Rgba(*rgba));
            }
            PaintCommand::Text { x, y, text, scale, rgba } => {
                draw_text_line(&mut img, *x, *y, text, Rgba(*rgba), *scale);
            }
            PaintCommand::Image { x, y, width, height, pixels } => {
                draw_fitted_image(&mut img, *x, *y, *width, *height, pixels);
            }
            PaintCommand::BrokenImage { x, y, width, height, rgba } => {
                draw_broken_image(&mut img, *x, *y, *width, *height, Rgba(*rgba));
            }
        }
    }
    img
}

/// Encode the canvas as PNG and fingerprint its pixels.
pub fn encode_png(img: &RgbaImage) -> Result<Screenshot> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(Screenshot {
        width: img.width(),
        height: img.height(),
        png_data: out.into_inner(),
        fingerprint: crate::data_uri::pixel_fingerprint(img.as_raw()),
    })
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = src[3] as u32;
    if a == 255 {
        return src;
    }
    if a == 0 {
        return dst;
    }
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv) / 255) as u8;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (a + dst[3] as u32 * inv / 255).min(255) as u8,
    ])
}

fn blend_at(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let dst = *img.get_pixel(x as u32, y as u32);
    img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
}

fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width as i32).min(img.width() as i32);
    let y1 = (y + height as i32).min(img.height() as i32);
    for py in y0..y1 {
        for px in x0..x1 {
            blend_at(img, px, py, color);
        }
    }
}

fn glyph_for(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// Draw one line of text. Each set glyph bit becomes a `scale`-sided square;
/// bit 0 of a row is the leftmost column.
fn draw_text_line(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let cell = scale.max(1);
    let advance = (GLYPH * cell) as i32;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph_for(ch) else {
            continue;
        };
        let gx = x + i as i32 * advance;
        for (row, mut bits) in rows.into_iter().enumerate() {
            let py = y + (row as u32 * cell) as i32;
            let mut col = 0u32;
            while bits != 0 {
                if bits & 1 == 1 {
                    fill_rect(img, gx + (col * cell) as i32, py, cell, cell, color);
                }
                bits >>= 1;
                col += 1;
            }
        }
    }
}

fn draw_fitted_image(img: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, pixels: &RgbaImage) {
    if width == 0 || height == 0 || pixels.width() == 0 || pixels.height() == 0 {
        return;
    }
    let sx = width as f64 / pixels.width() as f64;
    let sy = height as f64 / pixels.height() as f64;
    let s = sx.min(sy);
    let w = ((pixels.width() as f64 * s).round() as u32).clamp(1, width);
    let h = ((pixels.height() as f64 * s).round() as u32).clamp(1, height);
    let scaled = if (w, h) == pixels.dimensions() {
        pixels.clone()
    } else {
        imageops::resize(pixels, w, h, FilterType::Triangle)
    };
    let ox = x + ((width - w) / 2) as i32;
    let oy = y + ((height - h) / 2) as i32;
    for (px, py, p) in scaled.enumerate_pixels() {
        blend_at(img, ox + px as i32, oy + py as i32, *p);
    }
}

/// A framed box with a cross, sized to the slot but capped so it reads as an icon.
fn draw_broken_image(img: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
    let side = width.min(height).min(64);
    if side < 4 {
        return;
    }
    let ox = x + ((width - side) / 2) as i32;
    let oy = y + ((height - side) / 2) as i32;
    let s = side as i32;
    for i in 0..s {
        blend_at(img, ox + i, oy, color);
        blend_at(img, ox + i, oy + s - 1, color);
        blend_at(img, ox, oy + i, color);
        blend_at(img, ox + s - 1, oy + i, color);
        blend_at(img, ox + i, oy + i, color);
        blend_at(img, ox + s - 1 - i, oy + i, color);
    }
}
