mod game;
mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use game::{Game, GameCommand};
pub use input::{InputSnapshot, Key};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{
    letterbox_rect, screen_scale_for, window_to_logical, Canvas, Rect, Renderer, Rgba, Texture,
    Vec2, Viewport,
};
