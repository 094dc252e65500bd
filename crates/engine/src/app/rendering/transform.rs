#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            width,
            height,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Largest uniform scale at which `logical` fits inside `window`.
pub fn screen_scale_for(window: Viewport, logical: Viewport) -> f32 {
    if logical.width == 0 || logical.height == 0 {
        return 1.0;
    }
    let scale_x = window.width as f32 / logical.width as f32;
    let scale_y = window.height as f32 / logical.height as f32;
    scale_x.min(scale_y)
}

/// Where the scaled logical frame lands inside the window, centred on both axes.
pub fn letterbox_rect(window: Viewport, logical: Viewport, scale: f32) -> Rect {
    let width = logical.width as f32 * scale;
    let height = logical.height as f32 * scale;
    Rect::new(
        (window.width as f32 - width) * 0.5,
        (window.height as f32 - height) * 0.5,
        width,
        height,
    )
}

pub fn window_to_logical(
    point_px: Vec2,
    window: Viewport,
    logical: Viewport,
    scale: f32,
) -> Option<Vec2> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let target = letterbox_rect(window, logical, scale);
    Some(Vec2::new(
        (point_px.x - target.x) / scale,
        (point_px.y - target.y) / scale,
    ))
}
