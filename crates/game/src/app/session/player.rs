use engine::{Rect, Vec2};

use super::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Player {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    pub size: f32,
    pub eyes_closed_timer: f32,
}

impl Player {
    /// Quarter of the way across, vertically centred, at rest.
    pub(crate) fn spawn(config: &SessionConfig) -> Self {
        Self {
            x: config.logical_width as f32 / 4.0,
            y: config.logical_height as f32 / 2.0,
            velocity: 0.0,
            size: config.player_size,
            eyes_closed_timer: 0.0,
        }
    }

    pub(crate) fn flap(&mut self, jump_impulse: f32, eyes_closed_seconds: f32) {
        self.velocity = jump_impulse;
        self.eyes_closed_timer = eyes_closed_seconds;
    }

    /// Velocity first, then position with the new velocity.
    pub(crate) fn integrate(&mut self, gravity: f32, dt: f32) {
        self.velocity += gravity * dt;
        self.y += self.velocity * dt;
    }

    pub(crate) fn decay_eyes(&mut self, dt: f32) {
        self.eyes_closed_timer = (self.eyes_closed_timer - dt).max(0.0);
    }

    pub(crate) fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub(crate) fn collision_box(&self, width_ratio: f32, height_ratio: f32) -> Rect {
        Rect::centered(
            self.center(),
            self.size * width_ratio,
            self.size * height_ratio,
        )
    }

    pub(crate) fn sprite_rect(&self) -> Rect {
        Rect::centered(self.center(), self.size, self.size)
    }
}
