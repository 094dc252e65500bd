use std::env;
use std::path::{Path, PathBuf};

use engine::{
    resolve_app_paths, AppPaths, Assets, AudioBackend, Game, LoopConfig, NullAudio, RodioAudio,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::session::{
    load_config, HighScoreFile, Platform, Session, SessionConfig, Theme, Variant, HIGH_SCORE_FILE,
};

const VARIANT_ENV_VAR: &str = "FLAPPY_VARIANT";
const TOUCH_ENV_VAR: &str = "FLAPPY_TOUCH";
const CONFIG_FILE: &str = "flappy.json";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) game: Box<dyn Game>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");

    let paths = resolve_app_paths().unwrap_or_else(|err| {
        warn!(error = %err, "project_root_unresolved_using_current_dir");
        AppPaths::from_root(PathBuf::from("."))
    });
    let platform = Platform::from_flag(env::var(TOUCH_ENV_VAR).ok().as_deref());
    let session_config = load_session_config(&paths.root, variant_from_env());

    let mut assets = Assets::new(&paths.assets_dir);
    let theme = Theme::load(session_config.variant, &mut assets);
    let audio = open_audio(&mut assets);
    let high_scores = HighScoreFile::new(PathBuf::from(HIGH_SCORE_FILE));

    let config = LoopConfig {
        window_title: session_config.variant.title().to_string(),
        window_width: session_config.logical_width,
        window_height: session_config.logical_height,
        logical_width: session_config.logical_width,
        logical_height: session_config.logical_height,
        ..LoopConfig::default()
    };
    let game = Session::new(session_config, platform, theme, audio, Box::new(high_scores));

    AppWiring {
        config,
        game: Box::new(game),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn variant_from_env() -> Option<Variant> {
    let raw = env::var(VARIANT_ENV_VAR).ok()?;
    let variant = Variant::parse(&raw);
    if variant.is_none() {
        warn!(value = %raw, var = VARIANT_ENV_VAR, "unknown_variant_ignored");
    }
    variant
}

fn load_session_config(root: &Path, variant_override: Option<Variant>) -> SessionConfig {
    let path = root.join(CONFIG_FILE);
    match load_config(&path, variant_override) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "config_invalid_using_defaults");
            SessionConfig::preset(variant_override.unwrap_or(Variant::Kat))
        }
    }
}

fn open_audio(assets: &mut Assets) -> Box<dyn AudioBackend> {
    match RodioAudio::open(assets) {
        Ok(audio) => Box::new(audio),
        Err(err) => {
            warn!(error = %err, "audio_unavailable_running_silent");
            Box::new(NullAudio::default())
        }
    }
}
