//! The game session: one state machine that owns the player, the pipes, the
//! score and the UI mode, advanced once per frame by the engine loop.

mod config;
mod draw;
mod highscore;
mod mode;
mod pipes;
mod player;
mod theme;

#[cfg(test)]
mod tests;

use engine::{
    screen_scale_for, window_to_logical, AudioBackend, Canvas, Game, GameCommand, InputSnapshot,
    Key, Rect, Sound, Viewport,
};
use tracing::{debug, info};

pub(crate) use config::{load_config, Platform, SessionConfig, Variant};
pub(crate) use highscore::{HighScoreFile, HighScoreStore, HIGH_SCORE_FILE};
pub(crate) use theme::Theme;

use mode::{ModeState, Phase, UiMode};
use pipes::{GameRng, Pipe, PipeSpawner};
use player::Player;

const FLAP_KEYS: [Key; 3] = [Key::Space, Key::Up, Key::W];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UiOutcome {
    command: GameCommand,
    skip_frame: bool,
}

impl Default for UiOutcome {
    fn default() -> Self {
        Self {
            command: GameCommand::None,
            skip_frame: false,
        }
    }
}

pub(crate) struct Session {
    config: SessionConfig,
    platform: Platform,
    theme: Theme,
    audio: Box<dyn AudioBackend>,
    high_scores: Box<dyn HighScoreStore>,
    mode: ModeState,
    player: Player,
    pipes: Vec<Pipe>,
    spawner: PipeSpawner,
    score: u32,
    high_score: u32,
    speed_level: u32,
    pipe_speed: f32,
    background_scroll: f32,
    background_width: f32,
    game_over_delay: f32,
    screen_scale: f32,
    music_muted: bool,
}

impl Session {
    pub(crate) fn new(
        config: SessionConfig,
        platform: Platform,
        theme: Theme,
        audio: Box<dyn AudioBackend>,
        mut high_scores: Box<dyn HighScoreStore>,
    ) -> Self {
        let high_score = high_scores.load();
        let background_width = match &theme.background {
            Some(texture) => {
                texture.width() as f32 * config.logical_height as f32 / texture.height() as f32
            }
            None => config.logical_width as f32,
        };
        info!(
            variant = config.variant.title(),
            platform = ?platform,
            high_score,
            textures = theme.texture_count(),
            "session_created"
        );
        Self {
            player: Player::spawn(&config),
            spawner: PipeSpawner::new(&config, GameRng::new(config.seed)),
            pipe_speed: config.base_pipe_speed,
            config,
            platform,
            theme,
            audio,
            high_scores,
            mode: ModeState::default(),
            pipes: Vec::new(),
            score: 0,
            high_score,
            speed_level: 0,
            background_scroll: 0.0,
            background_width,
            game_over_delay: 0.0,
            screen_scale: 1.0,
            music_muted: false,
        }
    }

    fn logical_viewport(&self) -> Viewport {
        Viewport {
            width: self.config.logical_width,
            height: self.config.logical_height,
        }
    }

    fn refresh_screen_scale(&mut self, window_size: (u32, u32)) {
        let (width, height) = window_size;
        if width == 0 || height == 0 {
            return;
        }
        self.screen_scale = screen_scale_for(Viewport { width, height }, self.logical_viewport());
    }

    fn step(&mut self, dt: f32, input: &InputSnapshot) -> GameCommand {
        if dt <= 0.0 {
            return GameCommand::None;
        }
        self.refresh_screen_scale(input.window_size());

        let ui = self.update_ui(input);
        if ui.skip_frame || ui.command == GameCommand::Exit {
            return ui.command;
        }

        let running = self.mode.is_running();
        let already_game_over = self.mode.ui_mode() == UiMode::GameOver;
        if running {
            self.background_scroll =
                (self.background_scroll + self.config.background_scroll_speed * dt)
                    % self.background_width;
        }
        self.sync_music(running);

        if running {
            self.simulate(dt, input);
        }
        if already_game_over {
            self.update_game_over(dt, input);
        }
        ui.command
    }

    fn update_ui(&mut self, input: &InputSnapshot) -> UiOutcome {
        let mut outcome = UiOutcome::default();
        let escape = input.key_pressed(Key::Escape);

        if input.close_requested() || (escape && !self.mode.exit_confirm) {
            if !self.mode.exit_confirm {
                self.mode.exit_confirm = true;
                info!("exit_requested");
            }
            return outcome;
        }

        let alt_down = input.key_down(Key::LeftAlt) || input.key_down(Key::RightAlt);
        if self.platform == Platform::Desktop && alt_down && input.key_pressed(Key::Enter) {
            outcome.command = GameCommand::ToggleFullscreen;
        }

        let mut started_this_frame = false;
        if self.mode.phase == Phase::FirstRun && !self.mode.exit_confirm {
            let start = match self.platform {
                Platform::Touch => input.tapped(),
                Platform::Desktop => input.key_down(Key::Enter) && !alt_down,
            };
            if start {
                self.mode.phase = Phase::Playing;
                started_this_frame = true;
                info!("game_started");
            }
        }

        if self.mode.exit_confirm {
            if input.key_pressed(Key::Y) {
                info!(score = self.score, high_score = self.high_score, "exit_confirmed");
                outcome.command = GameCommand::Exit;
                return outcome;
            }
            if input.key_pressed(Key::N) || escape {
                self.mode.exit_confirm = false;
                info!("exit_cancelled");
            }
        }

        let focus_lost = !input.window_focused();
        if focus_lost != self.mode.focus_lost {
            debug!(focus_lost, "window_focus_changed");
        }
        self.mode.focus_lost = focus_lost;

        if self.mode.can_toggle_pause() && input.key_pressed(Key::P) {
            self.toggle_pause();
        }

        if self.platform == Platform::Touch
            && !started_this_frame
            && self.mode.can_toggle_pause()
            && input.tapped()
        {
            let toggles = match self.mode.phase {
                Phase::Playing => self.tap_in_pause_band(input),
                Phase::Paused => true,
                _ => false,
            };
            if toggles {
                self.toggle_pause();
                outcome.skip_frame = true;
            }
        }

        if input.key_pressed(Key::M) {
            self.music_muted = !self.music_muted;
            info!(muted = self.music_muted, "music_toggled");
        }

        outcome
    }

    fn toggle_pause(&mut self) {
        match self.mode.phase {
            Phase::Playing => {
                self.mode.phase = Phase::Paused;
                info!(score = self.score, "paused");
            }
            Phase::Paused => {
                self.mode.phase = Phase::Playing;
                info!("resumed");
            }
            Phase::FirstRun | Phase::GameOver => {}
        }
    }

    fn tap_in_pause_band(&self, input: &InputSnapshot) -> bool {
        let Some(tap_px) = input.tap_position_px() else {
            return false;
        };
        let (width, height) = input.window_size();
        let window = Viewport { width, height };
        let Some(point) =
            window_to_logical(tap_px, window, self.logical_viewport(), self.screen_scale)
        else {
            return false;
        };
        let band_height = self.config.logical_height as f32 * self.config.pause_tap_band;
        Rect::new(0.0, 0.0, self.config.logical_width as f32, band_height).contains(point)
    }

    fn sync_music(&mut self, running: bool) {
        let wanted = running && !self.music_muted;
        let playing = self.audio.is_music_playing();
        if wanted && !playing {
            self.audio.play_music();
        } else if !wanted && playing {
            self.audio.stop_music();
        }
    }

    fn flap_requested(&self, input: &InputSnapshot) -> bool {
        match self.platform {
            Platform::Desktop => input.any_key_pressed(&FLAP_KEYS),
            Platform::Touch => input.tapped(),
        }
    }

    fn handle_input(&mut self, input: &InputSnapshot) {
        if !self.flap_requested(input) {
            return;
        }
        self.player
            .flap(self.config.jump_impulse, self.config.eyes_closed_seconds);
        self.audio.play(Sound::Fly);
    }

    fn simulate(&mut self, dt: f32, input: &InputSnapshot) {
        self.handle_input(input);
        self.player.integrate(self.config.gravity, dt);

        let hitbox = self.player.collision_box(
            self.config.collision_width_ratio,
            self.config.collision_height_ratio,
        );
        if hitbox.y < 0.0 || hitbox.bottom() > self.config.logical_height as f32 {
            self.game_over();
            return;
        }

        if let Some(gap_center) = self.spawner.tick(dt) {
            self.pipes
                .push(Pipe::new(self.config.logical_width as f32, gap_center));
        }

        let pipe_width = self.config.pipe_width;
        let pipe_gap = self.config.pipe_gap;
        for index in 0..self.pipes.len() {
            let passed = {
                let pipe = &mut self.pipes[index];
                pipe.x -= self.pipe_speed * dt;
                let passed = !pipe.scored && pipe.is_passed_by(self.player.x, pipe_width);
                pipe.scored |= passed;
                passed
            };
            if passed {
                self.award_point();
            }
            if !self.mode.is_game_over()
                && self.pipes[index].collides_with(hitbox, pipe_width, pipe_gap)
            {
                self.game_over();
            }
        }

        self.pipes.retain(|pipe| !pipe.is_off_screen(pipe_width));
        self.player.decay_eyes(dt);
    }

    fn award_point(&mut self) {
        self.score += 1;
        self.audio.play(Sound::Score);
        self.update_pipe_speed();
        self.capture_high_score();
    }

    fn update_pipe_speed(&mut self) {
        let level = self.score / self.config.points_per_level;
        if level <= self.speed_level {
            return;
        }
        self.speed_level = level;
        self.pipe_speed =
            self.config.base_pipe_speed + level as f32 * self.config.speed_increment_per_level;
        info!(level, pipe_speed = self.pipe_speed, "speed_level_up");
    }

    fn capture_high_score(&mut self) {
        if self.score <= self.high_score {
            return;
        }
        self.high_score = self.score;
        self.high_scores.save(self.high_score);
        info!(high_score = self.high_score, "new_high_score");
    }

    fn game_over(&mut self) {
        self.mode.phase = Phase::GameOver;
        self.game_over_delay = self.config.game_over_delay_seconds;
        self.capture_high_score();
        self.audio.stop_all_sounds();
        self.audio.play(Sound::Hit);
        info!(
            score = self.score,
            high_score = self.high_score,
            level = self.speed_level,
            "game_over"
        );
    }

    fn update_game_over(&mut self, dt: f32, input: &InputSnapshot) {
        self.game_over_delay = (self.game_over_delay - dt).max(0.0);
        if self.game_over_delay > 0.0 {
            return;
        }
        let alt_down = input.key_down(Key::LeftAlt) || input.key_down(Key::RightAlt);
        let restart = match self.platform {
            Platform::Touch => input.tapped(),
            Platform::Desktop => input.key_pressed(Key::Enter) && !alt_down,
        };
        if restart {
            self.reset();
        }
    }

    pub(crate) fn reset(&mut self) {
        self.mode = ModeState {
            phase: Phase::Playing,
            exit_confirm: false,
            focus_lost: false,
        };
        self.player = Player::spawn(&self.config);
        self.pipes.clear();
        self.spawner.reset();
        self.score = 0;
        self.speed_level = 0;
        self.pipe_speed = self.config.base_pipe_speed;
        self.game_over_delay = 0.0;
        if self.audio.is_music_playing() {
            self.audio.stop_music();
        }
        info!(high_score = self.high_score, "session_reset");
    }

    fn ui_mode(&self) -> UiMode {
        self.mode.ui_mode()
    }
}

impl Game for Session {
    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot) -> GameCommand {
        self.step(dt_seconds, input)
    }

    fn draw(&self, canvas: &mut Canvas) {
        draw::draw_session(self, canvas);
    }

    fn screen_scale(&self) -> f32 {
        self.screen_scale
    }

    fn entity_count(&self) -> usize {
        self.pipes.len()
    }

    fn shutdown(&mut self) {
        self.audio.stop_all_sounds();
        self.audio.stop_music();
        info!(high_score = self.high_score, "session_closed");
    }
}
