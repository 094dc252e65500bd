use super::font::{glyph_bit, glyph_rows, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};
use super::{Rect, Texture};

pub type Rgba = [u8; 4];

/// Fixed-resolution RGBA render target. Everything the game draws lands here
/// first; the renderer scales it onto the window afterwards.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelSpan {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let offset = self.offset(x, y)?;
        let mut color = [0; 4];
        color.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(color)
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(span) = self.clip(rect) else {
            return;
        };
        for y in span.top..span.bottom {
            for x in span.left..span.right {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// `roundness` follows the usual 0..=1 convention: the corner radius is that
    /// fraction of half the shorter side.
    pub fn fill_rounded_rect(&mut self, rect: Rect, roundness: f32, color: Rgba) {
        let radius = roundness.clamp(0.0, 1.0) * rect.width.min(rect.height) * 0.5;
        if radius <= 0.0 {
            self.fill_rect(rect, color);
            return;
        }
        let Some(span) = self.clip(rect) else {
            return;
        };
        let inner_left = rect.x + radius;
        let inner_right = rect.right() - radius;
        let inner_top = rect.y + radius;
        let inner_bottom = rect.bottom() - radius;
        let radius_sq = radius * radius;

        for y in span.top..span.bottom {
            let cy = y as f32 + 0.5;
            let dy = (inner_top - cy).max(cy - inner_bottom).max(0.0);
            for x in span.left..span.right {
                let cx = x as f32 + 0.5;
                let dx = (inner_left - cx).max(cx - inner_right).max(0.0);
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Nearest-neighbour blit of `src` (texture pixels) into `dst` (canvas pixels).
    pub fn draw_texture(&mut self, texture: &Texture, src: Rect, dst: Rect, flip_y: bool) {
        if dst.width <= 0.0 || dst.height <= 0.0 || src.width <= 0.0 || src.height <= 0.0 {
            return;
        }
        let Some(span) = self.clip(dst) else {
            return;
        };
        let max_x = texture.width() as i64 - 1;
        let max_y = texture.height() as i64 - 1;

        for y in span.top..span.bottom {
            let mut v = (y as f32 + 0.5 - dst.y) / dst.height;
            if flip_y {
                v = 1.0 - v;
            }
            let src_y = ((src.y + v * src.height).floor() as i64).clamp(0, max_y) as u32;
            for x in span.left..span.right {
                let u = (x as f32 + 0.5 - dst.x) / dst.width;
                let src_x = ((src.x + u * src.width).floor() as i64).clamp(0, max_x) as u32;
                if let Some(color) = texture.pixel(src_x, src_y) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Draws `text` with its top-left corner at (`x`, `y`); `size` is the glyph
    /// height in canvas pixels, rounded to a whole multiple of the font height.
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba) {
        let scale = text_scale(size);
        let mut pen_x = x.round() as i32;
        let top = y.round() as i32;
        for ch in text.chars() {
            let rows = glyph_rows(ch);
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !glyph_bit(&rows, row, col) {
                        continue;
                    }
                    let px = pen_x + col * scale;
                    let py = top + row * scale;
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.blend_pixel(px + sx, py + sy, color);
                        }
                    }
                }
            }
            pen_x += (GLYPH_WIDTH + GLYPH_SPACING) * scale;
        }
    }

    pub fn draw_text_centered(&mut self, text: &str, center_x: f32, y: f32, size: f32, color: Rgba) {
        let x = center_x - Self::text_width(text, size) * 0.5;
        self.draw_text(text, x, y, size, color);
    }

    pub fn text_width(text: &str, size: f32) -> f32 {
        let count = text.chars().count() as i32;
        if count == 0 {
            return 0.0;
        }
        let scale = text_scale(size);
        ((GLYPH_WIDTH + GLYPH_SPACING) * scale * count - GLYPH_SPACING * scale) as f32
    }

    fn clip(&self, rect: Rect) -> Option<PixelSpan> {
        let span = PixelSpan {
            left: (rect.x.round() as i32).max(0),
            top: (rect.y.round() as i32).max(0),
            right: (rect.right().round() as i32).min(self.width as i32),
            bottom: (rect.bottom().round() as i32).min(self.height as i32),
        };
        (span.left < span.right && span.top < span.bottom).then_some(span)
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let alpha = color[3];
        if alpha == 0 {
            return;
        }
        let dst = &mut self.rgba[offset..offset + 4];
        if alpha == u8::MAX {
            dst.copy_from_slice(&color);
            return;
        }
        let a = alpha as u32;
        for channel in 0..3 {
            let blended = (color[channel] as u32 * a + dst[channel] as u32 * (255 - a) + 127) / 255;
            dst[channel] = blended as u8;
        }
        dst[3] = u8::MAX;
    }
}

fn text_scale(size: f32) -> i32 {
    ((size / GLYPH_HEIGHT as f32).round() as i32).max(1)
}
