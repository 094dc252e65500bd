use engine::{Canvas, Rect, Texture, Vec2};

use super::config::Platform;
use super::mode::UiMode;
use super::pipes::Pipe;
use super::theme::{PipeLook, PlayerLook};
use super::Session;

const FLAT_CAP_HEIGHT: f32 = 30.0;
const SCORE_DIGITS: usize = 3;
const HUD_TEXT_SIZE: f32 = 30.0;
const HUD_MARGIN: f32 = 20.0;
const TITLE_TEXT_SIZE: f32 = 60.0;
const OVERLAY_TEXT_SIZE: f32 = 15.0;
const OVERLAY_LINE_HEIGHT: f32 = 30.0;
const OVERLAY_PANEL_WIDTH: f32 = 560.0;
const OVERLAY_ROUNDNESS: f32 = 0.76;

/// One half of a pipe: the stretched column and its lip next to the gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PipeSegment {
    pub body: Rect,
    pub cap: Rect,
    pub flip_y: bool,
}

pub(super) fn draw_session(session: &Session, canvas: &mut Canvas) {
    let theme = &session.theme;
    canvas.clear(theme.sky);

    if let Some(background) = &theme.background {
        for dst in background_segments(
            session.background_scroll,
            session.background_width,
            canvas.width() as f32,
            canvas.height() as f32,
        ) {
            canvas.draw_texture(background, full_rect(background), dst, false);
        }
    }

    for pipe in &session.pipes {
        draw_pipe(session, pipe, canvas);
    }
    draw_player(session, canvas);
    draw_hud(session, canvas);
    draw_overlay(session, canvas);
}

/// Destination rects for the scrolling background, each one a full copy of the
/// texture scaled to the screen height. Two when the view wraps, one otherwise.
pub(super) fn background_segments(
    scroll: f32,
    scaled_width: f32,
    screen_width: f32,
    screen_height: f32,
) -> Vec<Rect> {
    if scaled_width <= 0.0 {
        return Vec::new();
    }
    let offset = scroll.rem_euclid(scaled_width);
    let mut segments = Vec::with_capacity(2);
    let mut x = -offset;
    while x < screen_width {
        segments.push(Rect::new(x, 0.0, scaled_width, screen_height));
        x += scaled_width;
    }
    segments
}

/// Top half first (drawn flipped so its lip faces down into the gap), then the
/// bottom half.
pub(super) fn pipe_segments(
    pipe: &Pipe,
    width: f32,
    gap: f32,
    screen_height: f32,
    cap_height: f32,
) -> [PipeSegment; 2] {
    let top_length = pipe.gap_top(gap).max(0.0);
    let top_cap = cap_height.min(top_length);
    let top = PipeSegment {
        body: Rect::new(pipe.x, 0.0, width, top_length - top_cap),
        cap: Rect::new(pipe.x, top_length - top_cap, width, top_cap),
        flip_y: true,
    };

    let bottom_start = pipe.gap_bottom(gap).min(screen_height);
    let bottom_length = screen_height - bottom_start;
    let bottom_cap = cap_height.min(bottom_length);
    let bottom = PipeSegment {
        body: Rect::new(
            pipe.x,
            bottom_start + bottom_cap,
            width,
            bottom_length - bottom_cap,
        ),
        cap: Rect::new(pipe.x, bottom_start, width, bottom_cap),
        flip_y: false,
    };
    [top, bottom]
}

/// The top quarter of a pipe texture is its lip; the rest is the column.
fn pipe_texture_split(texture: &Texture) -> (Rect, Rect) {
    let width = texture.width() as f32;
    let height = texture.height() as f32;
    let cap_rows = (height / 4.0).floor().max(1.0).min(height);
    (
        Rect::new(0.0, 0.0, width, cap_rows),
        Rect::new(0.0, cap_rows, width, (height - cap_rows).max(1.0)),
    )
}

fn draw_pipe(session: &Session, pipe: &Pipe, canvas: &mut Canvas) {
    let config = &session.config;
    let screen_height = config.logical_height as f32;
    match &session.theme.pipe {
        PipeLook::Textured(texture) => {
            let (cap_src, body_src) = pipe_texture_split(texture);
            let cap_height = config.pipe_width * cap_src.height / cap_src.width;
            for segment in pipe_segments(
                pipe,
                config.pipe_width,
                config.pipe_gap,
                screen_height,
                cap_height,
            ) {
                canvas.draw_texture(texture, body_src, segment.body, segment.flip_y);
                canvas.draw_texture(texture, cap_src, segment.cap, segment.flip_y);
            }
        }
        PipeLook::Flat { body, cap } => {
            for segment in pipe_segments(
                pipe,
                config.pipe_width,
                config.pipe_gap,
                screen_height,
                FLAT_CAP_HEIGHT,
            ) {
                canvas.fill_rect(segment.body, *body);
                canvas.fill_rect(segment.cap, *cap);
            }
        }
    }
}

fn eyes_closed(session: &Session) -> bool {
    session.mode.is_game_over() || session.player.eyes_closed_timer > 0.0
}

fn draw_player(session: &Session, canvas: &mut Canvas) {
    let player = &session.player;
    let sprite = player.sprite_rect();
    match &session.theme.player {
        PlayerLook::Textured {
            eyes_open,
            eyes_closed: closed,
        } => {
            let texture = if eyes_closed(session) { closed } else { eyes_open };
            canvas.draw_texture(texture, full_rect(texture), sprite, false);
        }
        PlayerLook::Flat { body, eye } => {
            canvas.fill_rect(sprite, *body);
            let eye_size = player.size * 0.2;
            let eye_center = Vec2::new(
                player.x + player.size * 0.2,
                player.y - player.size * 0.15,
            );
            let eye_height = if eyes_closed(session) {
                (player.size * 0.06).max(1.0)
            } else {
                eye_size
            };
            canvas.fill_rect(Rect::centered(eye_center, eye_size, eye_height), *eye);
        }
    }
}

/// Left-pads with zeroes up to `width`; longer numbers are left as they are.
pub(crate) fn format_with_leading_zeroes(number: u32, width: usize) -> String {
    format!("{number:0width$}")
}

fn draw_hud(session: &Session, canvas: &mut Canvas) {
    let color = session.theme.text;
    let score = format!(
        "SCORE {}",
        format_with_leading_zeroes(session.score, SCORE_DIGITS)
    );
    canvas.draw_text(&score, HUD_MARGIN, HUD_MARGIN, HUD_TEXT_SIZE, color);

    let right = format!(
        "LEVEL {}  HIGH {}",
        session.speed_level,
        format_with_leading_zeroes(session.high_score, SCORE_DIGITS)
    );
    let x = canvas.width() as f32 - HUD_MARGIN - Canvas::text_width(&right, HUD_TEXT_SIZE);
    canvas.draw_text(&right, x, HUD_MARGIN, HUD_TEXT_SIZE, color);
}

pub(super) fn overlay_lines(mode: UiMode, platform: Platform) -> &'static [&'static str] {
    match (mode, platform) {
        (UiMode::Playing, _) => &[],
        (UiMode::ExitConfirm, _) => &["Are you sure you want to exit? [Y/N]"],
        (UiMode::FirstRun, Platform::Desktop) => &[
            "Press Enter to play",
            "Space, Up or W to fly",
            "P: pause   M: music",
            "Alt+Enter: toggle fullscreen",
        ],
        (UiMode::FirstRun, Platform::Touch) => {
            &["Tap to play", "Tap the top of the screen to pause"]
        }
        (UiMode::Paused, Platform::Desktop) => &["Game paused, press P to continue"],
        (UiMode::Paused, Platform::Touch) => &["Game paused, tap to continue"],
        (UiMode::LostFocus, _) => &["Game paused, focus window to continue"],
        (UiMode::GameOver, Platform::Desktop) => &["Game over, press Enter to play again"],
        (UiMode::GameOver, Platform::Touch) => &["Game over, tap to play again"],
    }
}

fn draw_overlay(session: &Session, canvas: &mut Canvas) {
    let mode = session.ui_mode();
    let lines = overlay_lines(mode, session.platform);
    if lines.is_empty() {
        return;
    }
    let center_x = canvas.width() as f32 * 0.5;
    let center_y = canvas.height() as f32 * 0.5;
    let theme = &session.theme;

    if mode == UiMode::FirstRun {
        canvas.draw_text_centered(
            session.config.variant.title(),
            center_x,
            center_y - TITLE_TEXT_SIZE * 2.5,
            TITLE_TEXT_SIZE,
            theme.text,
        );
    }

    let panel_height = OVERLAY_LINE_HEIGHT * (lines.len() as f32 + 1.0);
    let panel = Rect::new(
        center_x - OVERLAY_PANEL_WIDTH * 0.5,
        center_y - OVERLAY_LINE_HEIGHT,
        OVERLAY_PANEL_WIDTH,
        panel_height,
    );
    canvas.fill_rounded_rect(panel, OVERLAY_ROUNDNESS, theme.panel);

    let first_line_y = panel.y + OVERLAY_LINE_HEIGHT - OVERLAY_TEXT_SIZE * 0.5;
    for (index, line) in lines.iter().enumerate() {
        canvas.draw_text_centered(
            line,
            center_x,
            first_line_y + index as f32 * OVERLAY_LINE_HEIGHT,
            OVERLAY_TEXT_SIZE,
            theme.text,
        );
    }
}

fn full_rect(texture: &Texture) -> Rect {
    Rect::new(0.0, 0.0, texture.width() as f32, texture.height() as f32)
}
