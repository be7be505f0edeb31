//! Best-effort buzz sound.
//!
//! Playback is opt-in and never affects the session: sink errors (for
//! example an autoplay policy refusing to play) are logged and dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;

/// Clip played on a buzz.
pub const BUZZ_CLIP: &str = "/static/buzz.wav";

/// Playback volume, `0.0..=1.0`.
pub const BUZZ_VOLUME: f32 = 0.2;

/// Something that can play a short clip.
///
/// Implementations must return promptly; start playback and hand it off
/// rather than waiting for the clip to finish.
pub trait AudioSink: Send + Sync + 'static {
    /// Start playing `clip` at `volume`.
    ///
    /// # Errors
    ///
    /// Any error is swallowed by [`AudioCue`]; return
    /// [`BuzzerError::Playback`](crate::BuzzerError::Playback) to have it logged.
    fn play(&self, clip: &str, volume: f32) -> Result<()>;
}

/// A sink that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl AudioSink for SilentSink {
    fn play(&self, _clip: &str, _volume: f32) -> Result<()> {
        Ok(())
    }
}

/// The opt-in buzz cue.
///
/// Clones share the opt-in flag, so the toggle can be flipped from a client
/// handle while the transport loop owns another clone.
#[derive(Clone)]
pub struct AudioCue {
    enabled: Arc<AtomicBool>,
    sink: Arc<dyn AudioSink>,
    clip: String,
    volume: f32,
}

impl AudioCue {
    /// A disabled cue playing [`BUZZ_CLIP`] at [`BUZZ_VOLUME`] through `sink`.
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(false)),
            sink,
            clip: BUZZ_CLIP.to_string(),
            volume: BUZZ_VOLUME,
        }
    }

    /// Use a different clip.
    #[must_use]
    pub fn with_clip(mut self, clip: impl Into<String>) -> Self {
        self.clip = clip.into();
        self
    }

    /// Use a different volume; clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Flip the opt-in toggle.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Whether the user has opted in.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Play the clip if the user opted in. Returns whether playback started.
    pub fn cue(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.sink.play(&self.clip, self.volume) {
            Ok(()) => true,
            Err(e) => {
                debug!(clip = %self.clip, "buzz playback failed: {e}");
                false
            }
        }
    }
}

impl Default for AudioCue {
    fn default() -> Self {
        Self::new(Arc::new(SilentSink))
    }
}

impl std::fmt::Debug for AudioCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCue")
            .field("enabled", &self.is_enabled())
            .field("clip", &self.clip)
            .field("volume", &self.volume)
            .finish()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::error::BuzzerError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        played: Mutex<Vec<(String, f32)>>,
    }

    impl AudioSink for RecordingSink {
        fn play(&self, clip: &str, volume: f32) -> Result<()> {
            self.played.lock().unwrap().push((clip.to_string(), volume));
            Ok(())
        }
    }

    struct BlockedSink;

    impl AudioSink for BlockedSink {
        fn play(&self, _clip: &str, _volume: f32) -> Result<()> {
            Err(BuzzerError::Playback("autoplay blocked".into()))
        }
    }

    #[test]
    fn disabled_cue_plays_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let cue = AudioCue::new(sink.clone());
        assert!(!cue.cue());
        assert!(sink.played.lock().unwrap().is_empty());
    }

    #[test]
    fn enabled_cue_plays_fixed_clip_quietly() {
        let sink = Arc::new(RecordingSink::default());
        let cue = AudioCue::new(sink.clone());
        cue.set_enabled(true);
        assert!(cue.cue());
        assert_eq!(
            sink.played.lock().unwrap().as_slice(),
            &[(BUZZ_CLIP.to_string(), BUZZ_VOLUME)]
        );
    }

    #[test]
    fn clones_share_toggle() {
        let cue = AudioCue::default();
        let other = cue.clone();
        other.set_enabled(true);
        assert!(cue.is_enabled());
    }

    #[test]
    fn playback_failure_is_swallowed() {
        let cue = AudioCue::new(Arc::new(BlockedSink));
        cue.set_enabled(true);
        assert!(!cue.cue());
    }

    #[test]
    fn volume_is_clamped() {
        let sink = Arc::new(RecordingSink::default());
        let cue = AudioCue::new(sink.clone()).with_volume(3.0);
        cue.set_enabled(true);
        cue.cue();
        assert_eq!(sink.played.lock().unwrap()[0].1, 1.0);
    }

    #[test]
    fn custom_clip_is_played() {
        let sink = Arc::new(RecordingSink::default());
        let cue = AudioCue::new(sink.clone()).with_clip("/static/ding.ogg");
        cue.set_enabled(true);
        assert!(cue.cue());
        assert_eq!(sink.played.lock().unwrap()[0].0, "/static/ding.ogg");
    }
}
