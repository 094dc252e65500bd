use engine::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::SessionConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Pipe {
    pub x: f32,
    pub gap_center: f32,
    pub scored: bool,
}

impl Pipe {
    pub(crate) fn new(x: f32, gap_center: f32) -> Self {
        Self {
            x,
            gap_center,
            scored: false,
        }
    }

    pub(crate) fn gap_top(&self, gap: f32) -> f32 {
        self.gap_center - gap * 0.5
    }

    pub(crate) fn gap_bottom(&self, gap: f32) -> f32 {
        self.gap_center + gap * 0.5
    }

    pub(crate) fn trailing_edge(&self, width: f32) -> f32 {
        self.x + width
    }

    pub(crate) fn is_passed_by(&self, player_x: f32, width: f32) -> bool {
        player_x > self.trailing_edge(width)
    }

    pub(crate) fn is_off_screen(&self, width: f32) -> bool {
        self.x < -width
    }

    /// Hit when the box overlaps the pipe's columns and leaves the gap band.
    pub(crate) fn collides_with(&self, hitbox: Rect, width: f32, gap: f32) -> bool {
        let overlaps_columns = hitbox.right() > self.x && hitbox.x < self.trailing_edge(width);
        let outside_gap = hitbox.y < self.gap_top(gap) || hitbox.bottom() > self.gap_bottom(gap);
        overlaps_columns && outside_gap
    }
}

/// Deterministic when seeded; otherwise seeded from the OS.
#[derive(Debug, Clone)]
pub(crate) struct GameRng(StdRng);

impl GameRng {
    pub(crate) fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

/// Accumulates frame time and hands out gap centres at a fixed interval.
#[derive(Debug, Clone)]
pub(crate) struct PipeSpawner {
    timer: f32,
    interval: f32,
    min_center: f32,
    max_center: f32,
    max_shift: Option<f32>,
    last_center: Option<f32>,
    rng: GameRng,
}

impl PipeSpawner {
    pub(crate) fn new(config: &SessionConfig, rng: GameRng) -> Self {
        let half_gap = config.pipe_gap * 0.5;
        let max_center = (config.logical_height as f32 - half_gap).max(half_gap);
        Self {
            timer: 0.0,
            interval: config.pipe_spawn_interval,
            min_center: half_gap,
            max_center,
            max_shift: config.max_gap_shift,
            last_center: None,
            rng,
        }
    }

    pub(crate) fn timer(&self) -> f32 {
        self.timer
    }

    pub(crate) fn reset(&mut self) {
        self.timer = 0.0;
        self.last_center = None;
    }

    pub(crate) fn tick(&mut self, dt: f32) -> Option<f32> {
        self.timer += dt;
        if self.timer < self.interval {
            return None;
        }
        self.timer = 0.0;
        let center = self.next_gap_center();
        self.last_center = Some(center);
        Some(center)
    }

    fn next_gap_center(&mut self) -> f32 {
        let (low, high) = match (self.max_shift, self.last_center) {
            (Some(shift), Some(last)) => (
                (last - shift).max(self.min_center),
                (last + shift).min(self.max_center),
            ),
            _ => (self.min_center, self.max_center),
        };
        if high <= low {
            return low;
        }
        self.rng.0.gen_range(low..=high)
    }
}
