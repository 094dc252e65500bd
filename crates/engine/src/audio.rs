use std::f32::consts::TAU;
use std::io::Cursor;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, PlayError, Sink, Source, StreamError};
use thiserror::Error;
use tracing::{debug, info};

use crate::assets::Assets;

const SAMPLE_RATE: u32 = 44_100;
const SFX_VOLUME: f32 = 0.6;
const MUSIC_VOLUME: f32 = 0.35;
const MUSIC_KEY: &str = "music";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Fly,
    Score,
    Hit,
}

impl Sound {
    pub const ALL: [Sound; 3] = [Sound::Fly, Sound::Score, Sound::Hit];

    pub fn key(self) -> &'static str {
        match self {
            Sound::Fly => "fly",
            Sound::Score => "score",
            Sound::Hit => "hit",
        }
    }

    fn index(self) -> usize {
        match self {
            Sound::Fly => 0,
            Sound::Score => 1,
            Sound::Hit => 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Stream(#[from] StreamError),
    #[error("failed to open audio sink: {0}")]
    Sink(#[from] PlayError),
}

/// Sound effects plus a single looping music track.
pub trait AudioBackend {
    fn play(&mut self, sound: Sound);

    /// Stops every sound effect currently playing; music is unaffected.
    fn stop_all_sounds(&mut self);

    fn play_music(&mut self);

    fn stop_music(&mut self);

    fn is_music_playing(&self) -> bool;
}

/// Silent backend used when no output device is available.
#[derive(Debug, Default)]
pub struct NullAudio {
    music_playing: bool,
}

impl AudioBackend for NullAudio {
    fn play(&mut self, _sound: Sound) {}

    fn stop_all_sounds(&mut self) {}

    fn play_music(&mut self) {
        self.music_playing = true;
    }

    fn stop_music(&mut self) {
        self.music_playing = false;
    }

    fn is_music_playing(&self) -> bool {
        self.music_playing
    }
}

#[derive(Debug, Clone)]
enum Clip {
    Encoded(Vec<u8>),
    Synth(Vec<f32>),
}

pub struct RodioAudio {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clips: [Clip; 3],
    music: Clip,
    active_sfx: Vec<Sink>,
    music_sink: Option<Sink>,
}

impl RodioAudio {
    pub fn open(assets: &mut Assets) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        let clips = Sound::ALL.map(|sound| load_clip(assets, sound.key(), || synth_effect(sound)));
        let music = load_clip(assets, MUSIC_KEY, synth_music_loop);
        info!(
            encoded_effects = clips
                .iter()
                .filter(|clip| matches!(clip, Clip::Encoded(_)))
                .count(),
            encoded_music = matches!(music, Clip::Encoded(_)),
            "audio_ready"
        );
        Ok(Self {
            _stream: stream,
            handle,
            clips,
            music,
            active_sfx: Vec::new(),
            music_sink: None,
        })
    }

    fn new_sink(&self, volume: f32) -> Option<Sink> {
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.set_volume(volume);
                Some(sink)
            }
            Err(error) => {
                debug!(error = %error, "audio_sink_unavailable");
                None
            }
        }
    }
}

impl AudioBackend for RodioAudio {
    fn play(&mut self, sound: Sound) {
        self.active_sfx.retain(|sink| !sink.empty());
        let Some(sink) = self.new_sink(SFX_VOLUME) else {
            return;
        };
        append_clip(&sink, &self.clips[sound.index()], false);
        self.active_sfx.push(sink);
    }

    fn stop_all_sounds(&mut self) {
        for sink in self.active_sfx.drain(..) {
            sink.stop();
        }
    }

    fn play_music(&mut self) {
        if self.music_sink.is_some() {
            return;
        }
        let Some(sink) = self.new_sink(MUSIC_VOLUME) else {
            return;
        };
        append_clip(&sink, &self.music, true);
        self.music_sink = Some(sink);
    }

    fn stop_music(&mut self) {
        if let Some(sink) = self.music_sink.take() {
            sink.stop();
        }
    }

    fn is_music_playing(&self) -> bool {
        self.music_sink.is_some()
    }
}

fn load_clip(assets: &mut Assets, key: &str, fallback: impl FnOnce() -> Vec<f32>) -> Clip {
    let Some(bytes) = assets.sound(key) else {
        return Clip::Synth(fallback());
    };
    match Decoder::new(Cursor::new(bytes.clone())) {
        Ok(_) => Clip::Encoded(bytes),
        Err(error) => {
            assets.report_unusable("sound", key, &error);
            Clip::Synth(fallback())
        }
    }
}

fn append_clip(sink: &Sink, clip: &Clip, looping: bool) {
    match clip {
        Clip::Encoded(bytes) => {
            let Ok(source) = Decoder::new(Cursor::new(bytes.clone())) else {
                return;
            };
            if looping {
                sink.append(source.repeat_infinite());
            } else {
                sink.append(source);
            }
        }
        Clip::Synth(samples) => {
            let source = SamplesBuffer::new(1, SAMPLE_RATE, samples.clone());
            if looping {
                sink.append(source.repeat_infinite());
            } else {
                sink.append(source);
            }
        }
    }
}

fn synth_effect(sound: Sound) -> Vec<f32> {
    match sound {
        Sound::Fly => sweep(400.0, 800.0, 0.12, 0.25),
        Sound::Score => {
            let mut samples = sweep(520.0, 520.0, 0.08, 0.2);
            samples.extend(sweep(680.0, 680.0, 0.1, 0.2));
            samples
        }
        Sound::Hit => sweep(400.0, 80.0, 0.5, 0.3),
    }
}

fn synth_music_loop() -> Vec<f32> {
    const NOTES: [f32; 8] = [
        261.63, 329.63, 392.0, 329.63, 293.66, 349.23, 440.0, 349.23,
    ];
    NOTES
        .iter()
        .flat_map(|&frequency| sweep(frequency, frequency, 0.25, 0.12))
        .collect()
}

/// Sine tone gliding linearly from `from_hz` to `to_hz` with a linear fade-out.
fn sweep(from_hz: f32, to_hz: f32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let count = (SAMPLE_RATE as f32 * seconds).round() as usize;
    let mut phase = 0.0f32;
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let frequency = from_hz + (to_hz - from_hz) * t;
            phase = (phase + TAU * frequency / SAMPLE_RATE as f32) % TAU;
            phase.sin() * amplitude * (1.0 - t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_keys_are_distinct_asset_keys() {
        let keys: Vec<_> = Sound::ALL.iter().map(|sound| sound.key()).collect();
        assert_eq!(keys, ["fly", "score", "hit"]);
        for (index, sound) in Sound::ALL.iter().enumerate() {
            assert_eq!(sound.index(), index);
        }
    }

    #[test]
    fn sweep_has_expected_length_and_fades_out() {
        let samples = sweep(440.0, 440.0, 0.1, 0.5);
        assert_eq!(samples.len(), 4_410);
        assert!(samples.iter().all(|sample| sample.abs() <= 0.5));
        let tail = &samples[samples.len() - 10..];
        assert!(tail.iter().all(|sample| sample.abs() < 0.01));
    }

    #[test]
    fn synthesized_effects_are_short_and_audible() {
        for sound in Sound::ALL {
            let samples = synth_effect(sound);
            assert!(!samples.is_empty());
            assert!(samples.len() <= SAMPLE_RATE as usize);
            assert!(samples.iter().any(|sample| sample.abs() > 0.05));
        }
    }

    #[test]
    fn music_loop_lasts_two_seconds() {
        assert_eq!(synth_music_loop().len(), SAMPLE_RATE as usize * 2);
    }

    #[test]
    fn missing_sound_file_falls_back_to_synth() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut assets = Assets::new(dir.path());
        let clip = load_clip(&mut assets, "fly", || vec![0.5]);
        assert!(matches!(clip, Clip::Synth(ref samples) if samples == &[0.5]));
    }

    #[test]
    fn undecodable_sound_file_falls_back_to_synth() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sounds = dir.path().join("sounds");
        std::fs::create_dir_all(&sounds).expect("mkdir");
        std::fs::write(sounds.join("hit.wav"), b"garbage").expect("write");

        let mut assets = Assets::new(dir.path());
        let clip = load_clip(&mut assets, "hit", Vec::new);
        assert!(matches!(clip, Clip::Synth(_)));
    }

    #[test]
    fn null_audio_tracks_music_transport() {
        let mut audio = NullAudio::default();
        assert!(!audio.is_music_playing());
        audio.play_music();
        audio.play(Sound::Fly);
        assert!(audio.is_music_playing());
        audio.stop_all_sounds();
        assert!(audio.is_music_playing());
        audio.stop_music();
        assert!(!audio.is_music_playing());
    }
}
