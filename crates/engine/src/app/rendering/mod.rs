mod canvas;
mod font;
mod renderer;
mod texture;
mod transform;

pub use canvas::{Canvas, Rgba};
pub use renderer::Renderer;
pub use texture::Texture;
pub use transform::{
    letterbox_rect, screen_scale_for, window_to_logical, Rect, Vec2, Viewport,
};
