use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use super::input::KeyStates;
use super::metrics::MetricsAccumulator;
use super::{Canvas, Game, GameCommand, InputSnapshot, Key, Renderer, Vec2};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub logical_width: u32,
    pub logical_height: u32,
    pub max_frame_delta: Duration,
    pub max_render_fps: Option<u32>,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Flappy".to_string(),
            window_width: 1280,
            window_height: 720,
            logical_width: 1280,
            logical_height: 720,
            max_frame_delta: Duration::from_millis(250),
            max_render_fps: Some(144),
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut game: Box<dyn Game>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    let mut canvas = Canvas::new(config.logical_width.max(1), config.logical_height.max(1));

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let initial_size = window.inner_size();
    let mut input_collector = InputCollector::new(initial_size.width, initial_size.height);

    info!(
        logical_width = canvas.width(),
        logical_height = canvas.height(),
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    // The game decides whether a close request ends the process.
                    input_collector.mark_close_requested();
                    info!(reason = "window_close", "close_requested");
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_window_size(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(focused) => {
                    input_collector.set_focused(focused);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::Touch(touch) => {
                    input_collector.handle_touch(
                        touch.phase,
                        touch.location.x as f32,
                        touch.location.y as f32,
                    );
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);

                    let input_snapshot = input_collector.snapshot_for_frame();
                    match game.update(frame_dt.as_secs_f32(), &input_snapshot) {
                        GameCommand::None => {}
                        GameCommand::ToggleFullscreen => toggle_fullscreen(&window),
                        GameCommand::Exit => {
                            info!(reason = "game_exit", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    game.draw(&mut canvas);
                    if let Err(error) = renderer.present(&canvas, game.screen_scale()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            max_frame_time_ms = snapshot.max_frame_time_ms,
                            entity_count = game.entity_count(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                game.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn toggle_fullscreen(window: &Window) {
    let entering = window.fullscreen().is_none();
    window.set_fullscreen(entering.then_some(Fullscreen::Borderless(None)));
    info!(fullscreen = entering, "fullscreen_toggled");
}

#[derive(Debug)]
struct InputCollector {
    close_requested_edge: bool,
    keys_down: KeyStates,
    keys_pressed_edge: KeyStates,
    cursor_position_px: Option<Vec2>,
    primary_button_is_down: bool,
    tap_edge: Option<Vec2>,
    window_focused: bool,
    window_width: u32,
    window_height: u32,
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            close_requested_edge: false,
            keys_down: KeyStates::default(),
            keys_pressed_edge: KeyStates::default(),
            cursor_position_px: None,
            primary_button_is_down: false,
            tap_edge: None,
            window_focused: true,
            window_width,
            window_height,
        }
    }

    fn mark_close_requested(&mut self) {
        self.close_requested_edge = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if let Some(key) = key_from_physical(key_event.physical_key) {
            self.handle_key_state(key, key_event.state);
        }
    }

    fn handle_key_state(&mut self, key: Key, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_down.is_down(key) {
                    self.keys_pressed_edge.set(key, true);
                }
                self.keys_down.set(key, true);
            }
            ElementState::Released => self.keys_down.set(key, false),
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.primary_button_is_down {
                    self.tap_edge = Some(self.cursor_position_px.unwrap_or_default());
                }
                self.primary_button_is_down = true;
            }
            ElementState::Released => self.primary_button_is_down = false,
        }
    }

    fn handle_touch(&mut self, phase: TouchPhase, x: f32, y: f32) {
        if phase == TouchPhase::Started {
            self.tap_edge = Some(Vec2::new(x, y));
        }
    }

    fn set_focused(&mut self, focused: bool) {
        if !focused {
            // Releases never arrive for keys held while the window was left.
            self.keys_down.clear();
            self.primary_button_is_down = false;
        }
        self.window_focused = focused;
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2::new(x, y));
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    fn snapshot_for_frame(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.close_requested_edge,
            self.keys_pressed_edge,
            self.keys_down,
            self.tap_edge,
            self.window_focused,
            self.window_width,
            self.window_height,
        );
        self.close_requested_edge = false;
        self.keys_pressed_edge.clear();
        self.tap_edge = None;
        snapshot
    }
}

fn key_from_physical(key: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::Space => Some(Key::Space),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyY => Some(Key::Y),
        KeyCode::KeyN => Some(Key::N),
        KeyCode::KeyM => Some(Key::M),
        KeyCode::AltLeft => Some(Key::LeftAlt),
        KeyCode::AltRight => Some(Key::RightAlt),
        _ => None,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
