//! Pronunciation seam
//!
//! The engine never synthesizes audio itself. Front ends plug a [`Speaker`]
//! into a [`Pronouncer`], which adds the audio on/off toggle and treats an
//! unsupported platform as silence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsConfig {
    pub language: String,
    /// 0.5 to 2.0, 1.0 is normal speed
    pub rate: f32,
    pub pitch: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 0.8,
            pitch: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TtsError {
    #[error("text-to-speech is not supported on this platform")]
    NotSupported,
    #[error("language not supported: {0}")]
    LanguageNotSupported(String),
    #[error("speech failed: {0}")]
    SpeakFailed(String),
}

pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str, config: &TtsConfig) -> Result<(), TtsError>;

    fn stop(&self) -> Result<(), TtsError> {
        Ok(())
    }
}

/// Speaker for platforms without speech output
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSpeaker;

impl Speaker for UnsupportedSpeaker {
    fn speak(&self, _text: &str, _config: &TtsConfig) -> Result<(), TtsError> {
        Err(TtsError::NotSupported)
    }
}

pub struct Pronouncer {
    speaker: Arc<dyn Speaker>,
    config: TtsConfig,
    enabled: AtomicBool,
}

impl Pronouncer {
    pub fn new(speaker: Arc<dyn Speaker>) -> Self {
        Self::with_config(speaker, TtsConfig::default())
    }

    pub fn with_config(speaker: Arc<dyn Speaker>, config: TtsConfig) -> Self {
        Self {
            speaker,
            config,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            if let Err(e) = self.speaker.stop() {
                debug!(error = %e, "failed to stop speech");
            }
        }
    }

    /// Flips the audio toggle and returns the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::Relaxed);
        if !enabled {
            if let Err(e) = self.speaker.stop() {
                debug!(error = %e, "failed to stop speech");
            }
        }
        enabled
    }

    /// Speaks `text` when audio is on. Returns whether anything was spoken;
    /// an unsupported platform is not an error.
    pub fn pronounce(&self, text: &str) -> Result<bool, TtsError> {
        let text = text.trim();
        if !self.is_enabled() || text.is_empty() {
            return Ok(false);
        }
        match self.speaker.speak(text, &self.config) {
            Ok(()) => Ok(true),
            Err(TtsError::NotSupported) => Ok(false),
            Err(e) => {
                warn!(error = %e, "pronunciation failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<(String, f32)>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str, config: &TtsConfig) -> Result<(), TtsError> {
            self.spoken.lock().push((text.to_string(), config.rate));
            Ok(())
        }
    }

    #[test]
    fn test_pronounce_uses_slow_rate() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let pronouncer = Pronouncer::new(speaker.clone());
        assert!(pronouncer.pronounce("laconic").unwrap());
        assert_eq!(*speaker.spoken.lock(), vec![("laconic".to_string(), 0.8)]);
    }

    #[test]
    fn test_toggle_silences() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let pronouncer = Pronouncer::new(speaker.clone());
        assert!(!pronouncer.toggle());
        assert!(!pronouncer.pronounce("laconic").unwrap());
        assert!(pronouncer.toggle());
        assert!(speaker.spoken.lock().is_empty());
    }

    #[test]
    fn test_unsupported_platform_is_a_no_op() {
        let pronouncer = Pronouncer::new(Arc::new(UnsupportedSpeaker));
        assert_eq!(pronouncer.pronounce("laconic"), Ok(false));
    }
}
