use std::cell::RefCell;
use std::rc::Rc;

use engine::{AudioBackend, Game, GameCommand, InputSnapshot, Key, Sound, Vec2};

use super::mode::{ModeState, Phase, UiMode};
use super::pipes::Pipe;
use super::player::Player;
use super::{HighScoreStore, Platform, Session, SessionConfig, Theme};

const WINDOW: (u32, u32) = (1280, 720);
const DT: f32 = 0.016;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioEvent {
    Play(Sound),
    StopAll,
    MusicOn,
    MusicOff,
}

struct RecordingAudio {
    log: Rc<RefCell<Vec<AudioEvent>>>,
    music_playing: bool,
}

impl AudioBackend for RecordingAudio {
    fn play(&mut self, sound: Sound) {
        self.log.borrow_mut().push(AudioEvent::Play(sound));
    }

    fn stop_all_sounds(&mut self) {
        self.log.borrow_mut().push(AudioEvent::StopAll);
    }

    fn play_music(&mut self) {
        self.music_playing = true;
        self.log.borrow_mut().push(AudioEvent::MusicOn);
    }

    fn stop_music(&mut self) {
        self.music_playing = false;
        self.log.borrow_mut().push(AudioEvent::MusicOff);
    }

    fn is_music_playing(&self) -> bool {
        self.music_playing
    }
}

struct MemoryHighScore {
    initial: u32,
    saves: Rc<RefCell<Vec<u32>>>,
}

impl HighScoreStore for MemoryHighScore {
    fn load(&mut self) -> u32 {
        self.saves.borrow().last().copied().unwrap_or(self.initial)
    }

    fn save(&mut self, high_score: u32) {
        self.saves.borrow_mut().push(high_score);
    }
}

struct Harness {
    session: Session,
    config: SessionConfig,
    audio: Rc<RefCell<Vec<AudioEvent>>>,
    saves: Rc<RefCell<Vec<u32>>>,
}

impl Harness {
    fn new(platform: Platform, initial_high_score: u32) -> Self {
        let config = SessionConfig {
            seed: Some(7),
            ..SessionConfig::square()
        };
        let audio = Rc::new(RefCell::new(Vec::new()));
        let saves = Rc::new(RefCell::new(Vec::new()));
        let session = Session::new(
            config.clone(),
            platform,
            Theme::flat(),
            Box::new(RecordingAudio {
                log: Rc::clone(&audio),
                music_playing: false,
            }),
            Box::new(MemoryHighScore {
                initial: initial_high_score,
                saves: Rc::clone(&saves),
            }),
        );
        Self {
            session,
            config,
            audio,
            saves,
        }
    }

    fn desktop() -> Self {
        Self::new(Platform::Desktop, 0)
    }

    fn update(&mut self, dt: f32, input: InputSnapshot) -> GameCommand {
        self.session.update(dt, &input)
    }

    fn idle(&mut self) -> GameCommand {
        self.update(DT, frame())
    }

    fn press(&mut self, key: Key) -> GameCommand {
        self.update(DT, frame().with_key_pressed(key))
    }

    /// Leaves the welcome screen and puts the player back at its spawn point.
    fn start(&mut self) {
        match self.session.platform {
            Platform::Desktop => self.press(Key::Enter),
            Platform::Touch => self.update(DT, frame().with_tap_at(Vec2::new(640.0, 600.0))),
        };
        assert_eq!(self.session.ui_mode(), UiMode::Playing);
        self.session.player = Player::spawn(&self.config);
        self.audio.borrow_mut().clear();
    }

    fn audio_events(&self) -> Vec<AudioEvent> {
        self.audio.borrow().clone()
    }

    fn observe(&self) -> Observed {
        let session = &self.session;
        Observed {
            mode: session.mode,
            player: session.player,
            pipes: session.pipes.clone(),
            score: session.score,
            high_score: session.high_score,
            speed_level: session.speed_level,
            pipe_speed: session.pipe_speed,
            background_scroll: session.background_scroll,
            game_over_delay: session.game_over_delay,
            screen_scale: session.screen_scale,
            music_muted: session.music_muted,
            spawn_timer: session.spawner.timer(),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Observed {
    mode: ModeState,
    player: Player,
    pipes: Vec<Pipe>,
    score: u32,
    high_score: u32,
    speed_level: u32,
    pipe_speed: f32,
    background_scroll: f32,
    game_over_delay: f32,
    screen_scale: f32,
    music_muted: bool,
    spawn_timer: f32,
}

fn frame() -> InputSnapshot {
    InputSnapshot::empty().with_window_size(WINDOW)
}

fn pipe_in_gap_of(player: &Player, x: f32) -> Pipe {
    Pipe::new(x, player.y)
}

#[test]
fn session_loads_high_score_and_waits_on_welcome_screen() {
    let mut harness = Harness::new(Platform::Desktop, 12);
    assert_eq!(harness.session.high_score, 12);
    assert_eq!(harness.session.ui_mode(), UiMode::FirstRun);

    let before = harness.session.player;
    harness.idle();
    assert_eq!(harness.session.player, before);
    assert_eq!(harness.session.ui_mode(), UiMode::FirstRun);
}

#[test]
fn zero_dt_changes_nothing() {
    let mut harness = Harness::desktop();
    harness.start();
    harness.session.pipes.push(Pipe::new(900.0, 300.0));
    let before = harness.observe();
    let audio_before = harness.audio_events();

    let input = frame()
        .with_key_pressed(Key::Space)
        .with_key_pressed(Key::Escape)
        .with_window_size((2560, 1440));
    let command = harness.update(0.0, input);

    assert_eq!(command, GameCommand::None);
    assert_eq!(harness.observe(), before);
    assert_eq!(harness.audio_events(), audio_before);
}

#[test]
fn enter_held_starts_the_game_on_desktop() {
    let mut harness = Harness::desktop();
    harness.update(DT, frame().with_key_down(Key::Enter, true));
    assert_eq!(harness.session.mode.phase, Phase::Playing);
}

#[test]
fn gravity_updates_velocity_before_position() {
    let mut harness = Harness::desktop();
    harness.start();
    let start = harness.session.player;

    harness.idle();

    let gravity = harness.config.gravity;
    let expected_velocity = start.velocity + gravity * DT;
    let expected_y = start.y + expected_velocity * DT;
    assert_eq!(harness.session.player.velocity, expected_velocity);
    assert_eq!(harness.session.player.y, expected_y);
}

#[test]
fn flap_applies_jump_once_per_press() {
    let mut harness = Harness::desktop();
    harness.start();
    let jump = harness.config.jump_impulse;
    let gravity = harness.config.gravity;

    harness.press(Key::Space);
    let mut expected = jump;
    expected += gravity * DT;
    assert_eq!(harness.session.player.velocity, expected);
    assert!(harness.session.player.eyes_closed_timer > 0.0);
    assert_eq!(harness.audio_events(), [AudioEvent::Play(Sound::Fly)]);

    harness.update(DT, frame().with_key_down(Key::Space, true));
    expected += gravity * DT;
    assert_eq!(harness.session.player.velocity, expected);
    assert_eq!(harness.audio_events().len(), 1);
}

#[test]
fn up_and_w_also_flap() {
    for key in [Key::Up, Key::W] {
        let mut harness = Harness::desktop();
        harness.start();
        harness.press(key);
        assert!(harness.session.player.velocity < 0.0);
    }
}

#[test]
fn flap_is_ignored_while_paused() {
    let mut harness = Harness::desktop();
    harness.start();
    harness.press(Key::P);
    assert_eq!(harness.session.ui_mode(), UiMode::Paused);
    let before = harness.session.player;

    harness.press(Key::Space);

    assert_eq!(harness.session.player, before);
    harness.press(Key::P);
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
}

#[test]
fn passing_a_pipe_scores_once_and_saves_high_score() {
    let mut harness = Harness::desktop();
    harness.start();
    let player = harness.session.player;
    let pipe_x = player.x - harness.config.pipe_width - 1.0;
    harness.session.pipes.push(pipe_in_gap_of(&player, pipe_x));

    harness.idle();
    assert_eq!(harness.session.score, 1);
    assert!(harness.session.pipes[0].scored);
    assert_eq!(harness.session.high_score, 1);
    assert_eq!(*harness.saves.borrow(), [1]);
    assert!(harness
        .audio_events()
        .contains(&AudioEvent::Play(Sound::Score)));

    harness.idle();
    assert_eq!(harness.session.score, 1);
    assert_eq!(harness.session.mode.phase, Phase::Playing);
}

#[test]
fn pipe_ahead_of_player_is_not_scored() {
    let mut harness = Harness::desktop();
    harness.start();
    let player = harness.session.player;
    harness
        .session
        .pipes
        .push(pipe_in_gap_of(&player, player.x - harness.config.pipe_width + 10.0));

    harness.idle();
    assert_eq!(harness.session.score, 0);
    assert!(!harness.session.pipes[0].scored);
}

fn pass_pipe_at_score(harness: &mut Harness, score_before: u32) {
    harness.session.score = score_before;
    harness.session.player = Player::spawn(&harness.config);
    let player = harness.session.player;
    let pipe_x = player.x - harness.config.pipe_width - 1.0;
    harness.session.pipes.clear();
    harness.session.pipes.push(pipe_in_gap_of(&player, pipe_x));
    harness.idle();
}

#[test]
fn speed_level_steps_every_ten_points() {
    let mut harness = Harness::desktop();
    harness.start();
    let base = harness.config.base_pipe_speed;

    pass_pipe_at_score(&mut harness, 9);
    assert_eq!(harness.session.score, 10);
    assert_eq!(harness.session.speed_level, 1);
    assert_eq!(harness.session.pipe_speed, base + 50.0);

    pass_pipe_at_score(&mut harness, 18);
    assert_eq!(harness.session.score, 19);
    assert_eq!(harness.session.speed_level, 1);
    assert_eq!(harness.session.pipe_speed, base + 50.0);

    pass_pipe_at_score(&mut harness, 19);
    assert_eq!(harness.session.speed_level, 2);
    assert_eq!(harness.session.pipe_speed, base + 100.0);
}

#[test]
fn falling_out_of_the_screen_ends_the_game_and_leaves_pipes_alone() {
    let mut harness = Harness::new(Platform::Desktop, 3);
    harness.start();
    harness.session.score = 5;
    harness.session.player.y = harness.config.logical_height as f32 - 5.0;
    harness.session.pipes.push(Pipe::new(1000.0, 300.0));
    let pipes_before = harness.session.pipes.clone();

    harness.idle();

    assert_eq!(harness.session.ui_mode(), UiMode::GameOver);
    assert_eq!(harness.session.pipes, pipes_before);
    assert_eq!(harness.session.high_score, 5);
    assert_eq!(*harness.saves.borrow(), [5]);
    let events = harness.audio_events();
    assert_eq!(
        &events[events.len() - 2..],
        [AudioEvent::StopAll, AudioEvent::Play(Sound::Hit)]
    );
}

#[test]
fn flying_above_the_screen_ends_the_game() {
    let mut harness = Harness::desktop();
    harness.start();
    harness.session.player.y = 10.0;
    harness.press(Key::Space);
    assert!(harness.session.mode.is_game_over());
}

#[test]
fn game_over_without_new_record_does_not_save() {
    let mut harness = Harness::new(Platform::Desktop, 50);
    harness.start();
    harness.session.score = 4;
    harness.session.player.y = 2000.0;
    harness.idle();
    assert!(harness.session.mode.is_game_over());
    assert_eq!(harness.session.high_score, 50);
    assert!(harness.saves.borrow().is_empty());
}

#[test]
fn touching_a_pipe_outside_the_gap_ends_the_game() {
    let mut harness = Harness::desktop();
    harness.start();
    let player = harness.session.player;
    harness.session.pipes.push(Pipe::new(player.x - 10.0, 100.0));

    harness.idle();
    assert!(harness.session.mode.is_game_over());

    let before = harness.observe();
    harness.idle();
    harness.press(Key::Space);
    assert!(harness.session.mode.is_game_over());
    assert_eq!(harness.session.player, before.player);
    assert_eq!(harness.session.pipes, before.pipes);
}

#[test]
fn pipes_inside_the_gap_do_not_collide() {
    let mut harness = Harness::desktop();
    harness.start();
    let player = harness.session.player;
    harness.session.pipes.push(pipe_in_gap_of(&player, player.x - 10.0));
    harness.idle();
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
}

#[test]
fn pipes_are_removed_only_once_fully_off_screen() {
    let mut harness = Harness::desktop();
    harness.start();
    let width = harness.config.pipe_width;
    let step = harness.config.base_pipe_speed * 0.001;
    let mut leaving = Pipe::new(-width + step * 0.5, 300.0);
    leaving.scored = true;
    let mut staying = Pipe::new(-width + step * 2.0, 300.0);
    staying.scored = true;
    harness.session.pipes.extend([leaving, staying]);

    harness.update(0.001, frame());

    assert_eq!(harness.session.pipes.len(), 1);
    assert!(harness.session.pipes[0].x >= -width);
}

#[test]
fn pipes_spawn_at_the_right_edge_every_interval() {
    let mut harness = Harness::desktop();
    harness.start();

    // With a half-second step a flap exactly cancels gravity, so the player hovers.
    for _ in 0..3 {
        harness.update(0.5, frame().with_key_pressed(Key::Space));
        assert!(harness.session.pipes.is_empty());
    }
    harness.update(0.5, frame().with_key_pressed(Key::Space));

    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
    assert_eq!(harness.session.pipes.len(), 1);
    let pipe = harness.session.pipes[0];
    let expected_x = harness.config.logical_width as f32 - harness.config.base_pipe_speed * 0.5;
    assert_eq!(pipe.x, expected_x);
    let half_gap = harness.config.pipe_gap * 0.5;
    assert!(pipe.gap_center >= half_gap);
    assert!(pipe.gap_center <= harness.config.logical_height as f32 - half_gap);
    assert_eq!(harness.session.spawner.timer(), 0.0);
}

#[test]
fn restart_waits_for_the_game_over_delay() {
    let mut harness = Harness::desktop();
    harness.start();
    harness.session.score = 3;
    harness.session.pipes.push(Pipe::new(1000.0, 300.0));
    harness.session.player.y = 2000.0;
    harness.idle();
    assert_eq!(harness.session.ui_mode(), UiMode::GameOver);

    harness.update(0.25, frame().with_key_pressed(Key::Enter));
    assert_eq!(harness.session.ui_mode(), UiMode::GameOver);

    harness.update(0.25, frame().with_key_pressed(Key::Enter));
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
    assert_eq!(harness.session.score, 0);
    assert_eq!(harness.session.speed_level, 0);
    assert!(harness.session.pipes.is_empty());
    assert_eq!(harness.session.player, Player::spawn(&harness.config));
    assert_eq!(harness.session.high_score, 3);
}

#[test]
fn restart_countdown_freezes_behind_focus_loss_and_exit_confirmation() {
    let mut harness = Harness::desktop();
    harness.start();
    harness.session.player.y = 2000.0;
    harness.idle();
    let delay = harness.config.game_over_delay_seconds;
    assert_eq!(harness.session.game_over_delay, delay);

    harness.update(0.4, frame().with_window_focused(false));
    assert_eq!(harness.session.ui_mode(), UiMode::LostFocus);
    assert_eq!(harness.session.game_over_delay, delay);

    harness.update(0.4, frame().with_key_pressed(Key::Escape));
    harness.update(0.4, frame());
    assert_eq!(harness.session.ui_mode(), UiMode::ExitConfirm);
    assert_eq!(harness.session.game_over_delay, delay);

    harness.update(0.25, frame().with_key_pressed(Key::N));
    assert_eq!(harness.session.ui_mode(), UiMode::GameOver);
    assert_eq!(harness.session.game_over_delay, delay - 0.25);

    harness.update(0.25, frame().with_key_pressed(Key::Enter));
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
}

#[test]
fn reset_restores_defaults_and_stops_music() {
    let mut harness = Harness::desktop();
    harness.start();
    assert!(harness.session.audio.is_music_playing());

    harness.session.score = 25;
    harness.session.speed_level = 2;
    harness.session.pipe_speed = 999.0;
    harness.session.pipes.push(Pipe::new(500.0, 300.0));
    harness.session.reset();

    assert_eq!(harness.session.score, 0);
    assert_eq!(harness.session.speed_level, 0);
    assert_eq!(harness.session.pipe_speed, harness.config.base_pipe_speed);
    assert!(harness.session.pipes.is_empty());
    assert_eq!(harness.session.spawner.timer(), 0.0);
    assert_eq!(harness.audio_events().last(), Some(&AudioEvent::MusicOff));
}

#[test]
fn escape_asks_before_exiting() {
    let mut harness = Harness::desktop();
    harness.start();

    assert_eq!(harness.press(Key::Escape), GameCommand::None);
    assert_eq!(harness.session.ui_mode(), UiMode::ExitConfirm);
    let frozen = harness.session.player;
    harness.idle();
    assert_eq!(harness.session.player, frozen);

    harness.press(Key::N);
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);

    harness.press(Key::Escape);
    harness.press(Key::Escape);
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);

    harness.press(Key::Escape);
    assert_eq!(harness.press(Key::Y), GameCommand::Exit);
}

#[test]
fn window_close_request_opens_exit_confirmation() {
    let mut harness = Harness::desktop();
    harness.update(DT, frame().with_close_requested(true));
    assert_eq!(harness.session.ui_mode(), UiMode::ExitConfirm);
    assert_eq!(harness.press(Key::Y), GameCommand::Exit);
}

#[test]
fn alt_enter_toggles_fullscreen_without_starting() {
    let mut harness = Harness::desktop();
    let chord = frame()
        .with_key_down(Key::LeftAlt, true)
        .with_key_pressed(Key::Enter);
    assert_eq!(harness.update(DT, chord), GameCommand::ToggleFullscreen);
    assert_eq!(harness.session.ui_mode(), UiMode::FirstRun);

    harness.start();
    let chord = frame()
        .with_key_down(Key::RightAlt, true)
        .with_key_pressed(Key::Enter);
    assert_eq!(harness.update(DT, chord), GameCommand::ToggleFullscreen);
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
}

#[test]
fn losing_focus_freezes_play_and_blocks_pause() {
    let mut harness = Harness::desktop();
    harness.start();
    let before = harness.session.player;

    harness.update(DT, frame().with_window_focused(false));
    assert_eq!(harness.session.ui_mode(), UiMode::LostFocus);
    assert_eq!(harness.session.player, before);

    harness.update(
        DT,
        frame()
            .with_window_focused(false)
            .with_key_pressed(Key::P),
    );
    assert_eq!(harness.session.mode.phase, Phase::Playing);

    harness.idle();
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
}

#[test]
fn pause_key_is_ignored_after_game_over() {
    let mut harness = Harness::desktop();
    harness.start();
    harness.session.player.y = 2000.0;
    harness.idle();
    harness.press(Key::P);
    assert_eq!(harness.session.ui_mode(), UiMode::GameOver);
}

#[test]
fn music_follows_running_state_and_mute_toggle() {
    let mut harness = Harness::desktop();
    harness.start();
    assert!(harness.session.audio.is_music_playing());
    harness.idle();
    assert!(harness.audio_events().is_empty());

    harness.press(Key::P);
    assert_eq!(harness.audio_events().last(), Some(&AudioEvent::MusicOff));

    harness.press(Key::M);
    harness.press(Key::P);
    harness.idle();
    assert_eq!(harness.audio_events().last(), Some(&AudioEvent::MusicOff));

    harness.press(Key::M);
    assert_eq!(harness.audio_events().last(), Some(&AudioEvent::MusicOn));
}

#[test]
fn screen_scale_tracks_window_and_survives_minimise() {
    let mut harness = Harness::desktop();
    harness.update(DT, InputSnapshot::empty().with_window_size((2560, 1440)));
    assert_eq!(harness.session.screen_scale(), 2.0);

    harness.update(DT, InputSnapshot::empty().with_window_size((0, 0)));
    assert_eq!(harness.session.screen_scale(), 2.0);

    harness.update(DT, InputSnapshot::empty().with_window_size((640, 720)));
    assert_eq!(harness.session.screen_scale(), 0.5);
}

#[test]
fn touch_tap_in_top_band_pauses_without_flapping() {
    let mut harness = Harness::new(Platform::Touch, 0);
    harness.start();
    let before = harness.session.player;

    harness.update(DT, frame().with_tap_at(Vec2::new(640.0, 50.0)));
    assert_eq!(harness.session.ui_mode(), UiMode::Paused);
    assert_eq!(harness.session.player, before);

    harness.update(DT, frame().with_tap_at(Vec2::new(640.0, 600.0)));
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
    assert_eq!(harness.session.player, before);

    harness.update(DT, frame().with_tap_at(Vec2::new(640.0, 600.0)));
    let mut expected = harness.config.jump_impulse;
    expected += harness.config.gravity * DT;
    assert_eq!(harness.session.player.velocity, expected);
}

#[test]
fn touch_tap_that_starts_the_game_flaps_even_inside_the_pause_band() {
    let mut harness = Harness::new(Platform::Touch, 0);
    assert_eq!(harness.session.ui_mode(), UiMode::FirstRun);

    harness.update(DT, frame().with_tap_at(Vec2::new(640.0, 50.0)));

    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
    assert!(harness.session.player.velocity < 0.0);
    assert!(harness.audio_events().contains(&AudioEvent::Play(Sound::Fly)));
}

#[test]
fn alt_enter_is_ignored_on_touch() {
    let mut harness = Harness::new(Platform::Touch, 0);
    let chord = frame()
        .with_key_down(Key::LeftAlt, true)
        .with_key_pressed(Key::Enter);

    assert_eq!(harness.update(DT, chord), GameCommand::None);
    assert_eq!(harness.session.ui_mode(), UiMode::FirstRun);
}

#[test]
fn touch_tap_in_letterbox_bar_is_a_flap() {
    let mut harness = Harness::new(Platform::Touch, 0);
    harness.start();

    let tall_window = (1280, 1440);
    harness.update(
        DT,
        InputSnapshot::empty()
            .with_window_size(tall_window)
            .with_tap_at(Vec2::new(640.0, 50.0)),
    );
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
    assert!(harness.session.player.velocity < 0.0);
}

#[test]
fn touch_restart_uses_tap() {
    let mut harness = Harness::new(Platform::Touch, 0);
    harness.start();
    harness.session.player.y = 2000.0;
    harness.idle();
    assert!(harness.session.mode.is_game_over());

    harness.update(0.5, frame().with_key_pressed(Key::Enter));
    assert!(harness.session.mode.is_game_over());
    harness.update(DT, frame().with_tap_at(Vec2::new(10.0, 10.0)));
    assert_eq!(harness.session.ui_mode(), UiMode::Playing);
}

#[test]
fn background_scrolls_only_while_running() {
    let mut harness = Harness::desktop();
    harness.session.config.background_scroll_speed = 100.0;
    harness.idle();
    assert_eq!(harness.session.background_scroll, 0.0);

    harness.start();
    harness.session.background_scroll = 0.0;
    harness.update(0.5, frame().with_key_pressed(Key::Space));
    assert_eq!(harness.session.background_scroll, 50.0);

    harness.session.background_scroll = harness.session.background_width - 10.0;
    harness.update(0.5, frame().with_key_pressed(Key::Space));
    assert_eq!(harness.session.background_scroll, 40.0);
}

#[test]
fn draw_fills_the_logical_canvas() {
    let mut harness = Harness::desktop();
    harness.start();
    harness.session.pipes.push(Pipe::new(600.0, 300.0));
    let mut canvas = engine::Canvas::new(
        harness.config.logical_width,
        harness.config.logical_height,
    );

    harness.session.draw(&mut canvas);

    let sky = Theme::flat().sky;
    assert_eq!(canvas.pixel(1000, 700), Some(sky));
    assert_ne!(canvas.pixel(620, 10), Some(sky));
    assert_ne!(canvas.pixel(320, 360), Some(sky));
    assert_eq!(harness.session.entity_count(), 1);
}
