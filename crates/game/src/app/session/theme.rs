use engine::{Assets, Rgba, Texture};

use super::config::Variant;

const SKY_BLUE: Rgba = [102, 191, 255, 255];
const PIPE_GREEN: Rgba = [0, 228, 48, 255];
const PIPE_CAP_GREEN: Rgba = [0, 158, 47, 255];
const PLAYER_YELLOW: Rgba = [253, 249, 0, 255];
const TEXT_YELLOW: Rgba = [243, 216, 63, 255];
const PANEL_BLACK: Rgba = [0, 0, 0, 220];
const EYE_BLACK: Rgba = [20, 20, 20, 255];

#[derive(Debug, Clone)]
pub(crate) enum PipeLook {
    Textured(Texture),
    Flat { body: Rgba, cap: Rgba },
}

#[derive(Debug, Clone)]
pub(crate) enum PlayerLook {
    Textured { eyes_open: Texture, eyes_closed: Texture },
    Flat { body: Rgba, eye: Rgba },
}

/// Everything variant-specific about how a session looks.
#[derive(Debug, Clone)]
pub(crate) struct Theme {
    pub sky: Rgba,
    pub background: Option<Texture>,
    pub pipe: PipeLook,
    pub player: PlayerLook,
    pub text: Rgba,
    pub panel: Rgba,
}

impl Theme {
    pub(crate) fn flat() -> Self {
        Self {
            sky: SKY_BLUE,
            background: None,
            pipe: PipeLook::Flat {
                body: PIPE_GREEN,
                cap: PIPE_CAP_GREEN,
            },
            player: PlayerLook::Flat {
                body: PLAYER_YELLOW,
                eye: EYE_BLACK,
            },
            text: TEXT_YELLOW,
            panel: PANEL_BLACK,
        }
    }

    /// Missing textures degrade piecewise to the flat look.
    pub(crate) fn load(variant: Variant, assets: &mut Assets) -> Self {
        let mut theme = Self::flat();
        if variant == Variant::Square {
            return theme;
        }

        theme.background = assets.texture("background");
        if let Some(texture) = assets.texture("pipe") {
            theme.pipe = PipeLook::Textured(texture);
        }
        let eyes_open = assets.texture("player");
        let eyes_closed = assets.texture("player_eyes_closed");
        if let Some(eyes_open) = eyes_open {
            theme.player = PlayerLook::Textured {
                eyes_closed: eyes_closed.unwrap_or_else(|| eyes_open.clone()),
                eyes_open,
            };
        }
        theme
    }

    pub(crate) fn texture_count(&self) -> usize {
        let background = usize::from(self.background.is_some());
        let pipe = usize::from(matches!(self.pipe, PipeLook::Textured(_)));
        let player = if matches!(self.player, PlayerLook::Textured { .. }) {
            2
        } else {
            0
        };
        background + pipe + player
    }
}
