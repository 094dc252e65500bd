use super::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Up,
    W,
    Enter,
    Escape,
    P,
    Y,
    N,
    M,
    LeftAlt,
    RightAlt,
}

const KEY_COUNT: usize = 11;

impl Key {
    const fn index(self) -> usize {
        match self {
            Key::Space => 0,
            Key::Up => 1,
            Key::W => 2,
            Key::Enter => 3,
            Key::Escape => 4,
            Key::P => 5,
            Key::Y => 6,
            Key::N => 7,
            Key::M => 8,
            Key::LeftAlt => 9,
            Key::RightAlt => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct KeyStates {
    down: [bool; KEY_COUNT],
}

impl KeyStates {
    pub(crate) fn set(&mut self, key: Key, is_down: bool) {
        self.down[key.index()] = is_down;
    }

    pub(crate) fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    pub(crate) fn clear(&mut self) {
        self.down = [false; KEY_COUNT];
    }
}

/// Everything the game may ask about input for one frame.
///
/// "Pressed" means the key went down since the previous snapshot; "down" is the
/// held state. A tap is a primary mouse press or a touch start, in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    close_requested: bool,
    pressed: KeyStates,
    down: KeyStates,
    tap_position_px: Option<Vec2>,
    window_focused: bool,
    window_width: u32,
    window_height: u32,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            close_requested: false,
            pressed: KeyStates::default(),
            down: KeyStates::default(),
            tap_position_px: None,
            window_focused: true,
            window_width: 0,
            window_height: 0,
        }
    }
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        close_requested: bool,
        pressed: KeyStates,
        down: KeyStates,
        tap_position_px: Option<Vec2>,
        window_focused: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            close_requested,
            pressed,
            down,
            tap_position_px,
            window_focused,
            window_width,
            window_height,
        }
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.pressed.is_down(key)
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.down.is_down(key)
    }

    pub fn any_key_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|key| self.key_pressed(*key))
    }

    pub fn tapped(&self) -> bool {
        self.tap_position_px.is_some()
    }

    pub fn tap_position_px(&self) -> Option<Vec2> {
        self.tap_position_px
    }

    pub fn window_focused(&self) -> bool {
        self.window_focused
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Marks `key` as pressed this frame (and therefore held).
    pub fn with_key_pressed(mut self, key: Key) -> Self {
        self.pressed.set(key, true);
        self.down.set(key, true);
        self
    }

    pub fn with_key_down(mut self, key: Key, is_down: bool) -> Self {
        self.down.set(key, is_down);
        self
    }

    pub fn with_tap_at(mut self, position_px: Vec2) -> Self {
        self.tap_position_px = Some(position_px);
        self
    }

    pub fn with_close_requested(mut self, close_requested: bool) -> Self {
        self.close_requested = close_requested;
        self
    }

    pub fn with_window_focused(mut self, window_focused: bool) -> Self {
        self.window_focused = window_focused;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}
