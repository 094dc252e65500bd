use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::{letterbox_rect, Canvas, Rgba, Viewport};

const LETTERBOX_COLOR: Rgba = [0, 0, 0, 255];

/// Owns the window surface. The surface buffer always matches the window size;
/// the logical canvas is scaled into it on every present.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width.max(1), height.max(1), surface)
    }

    pub fn present(&mut self, canvas: &Canvas, scale: f32) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        blit_letterboxed(self.pixels.frame_mut(), self.viewport, canvas, scale);
        self.pixels.render()
    }
}

fn blit_letterboxed(frame: &mut [u8], window: Viewport, canvas: &Canvas, scale: f32) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&LETTERBOX_COLOR);
    }
    if !scale.is_finite() || scale <= 0.0 || canvas.width() == 0 || canvas.height() == 0 {
        return;
    }

    let logical = Viewport {
        width: canvas.width(),
        height: canvas.height(),
    };
    let target = letterbox_rect(window, logical, scale);
    let left = (target.x.round() as i32).max(0);
    let top = (target.y.round() as i32).max(0);
    let right = (target.right().round() as i32).min(window.width as i32);
    let bottom = (target.bottom().round() as i32).min(window.height as i32);
    if left >= right || top >= bottom {
        return;
    }

    let inv_scale = scale.recip();
    let max_src_x = canvas.width() as i32 - 1;
    let max_src_y = canvas.height() as i32 - 1;
    let src = canvas.frame();
    let frame_width = window.width as usize;
    let canvas_width = canvas.width() as usize;

    for out_y in top..bottom {
        let src_y = (((out_y as f32 + 0.5 - target.y) * inv_scale).floor() as i32)
            .clamp(0, max_src_y) as usize;
        let src_row = src_y * canvas_width * 4;
        let dst_row = out_y as usize * frame_width * 4;
        for out_x in left..right {
            let src_x = (((out_x as f32 + 0.5 - target.x) * inv_scale).floor() as i32)
                .clamp(0, max_src_x) as usize;
            let src_offset = src_row + src_x * 4;
            let dst_offset = dst_row + out_x as usize * 4;
            let Some(dst) = frame.get_mut(dst_offset..dst_offset + 4) else {
                continue;
            };
            dst.copy_from_slice(&src[src_offset..src_offset + 4]);
        }
    }
}
