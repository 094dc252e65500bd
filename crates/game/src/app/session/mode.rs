/// Where the session is in its lifecycle. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    FirstRun,
    Playing,
    Paused,
    GameOver,
}

/// The single mode the player sees, resolved from [`ModeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiMode {
    FirstRun,
    Playing,
    Paused,
    LostFocus,
    GameOver,
    ExitConfirm,
}

/// Phase plus the two overlays that can appear on top of any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ModeState {
    pub phase: Phase,
    pub exit_confirm: bool,
    pub focus_lost: bool,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            phase: Phase::FirstRun,
            exit_confirm: false,
            focus_lost: false,
        }
    }
}

impl ModeState {
    /// ExitConfirm > FirstRun > Paused > LostFocus > GameOver > Playing.
    pub(crate) fn ui_mode(&self) -> UiMode {
        if self.exit_confirm {
            return UiMode::ExitConfirm;
        }
        match self.phase {
            Phase::FirstRun => UiMode::FirstRun,
            Phase::Paused => UiMode::Paused,
            _ if self.focus_lost => UiMode::LostFocus,
            Phase::GameOver => UiMode::GameOver,
            Phase::Playing => UiMode::Playing,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.ui_mode() == UiMode::Playing
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Pause toggling is blocked by exit confirmation, focus loss and game over.
    pub(crate) fn can_toggle_pause(&self) -> bool {
        !self.exit_confirm
            && !self.focus_lost
            && matches!(self.phase, Phase::Playing | Phase::Paused)
    }
}
