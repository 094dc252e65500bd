use super::{Canvas, InputSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    None,
    ToggleFullscreen,
    Exit,
}

/// A frame-driven game hosted by [`run_app`](super::run_app).
///
/// The loop calls `update` once per displayed frame with the elapsed time, then
/// `draw` into the fixed-resolution canvas, then presents the canvas at
/// `screen_scale`.
pub trait Game {
    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot) -> GameCommand;

    fn draw(&self, canvas: &mut Canvas);

    fn screen_scale(&self) -> f32;

    /// Reported in periodic loop metrics.
    fn entity_count(&self) -> usize {
        0
    }

    fn shutdown(&mut self) {}
}
