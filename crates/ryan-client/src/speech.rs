//! Speech output gated by a user toggle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A text-to-speech sink.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str);
    fn cancel(&self);
    fn is_speaking(&self) -> bool;
}

/// Stand-in speaker: logs utterances and stays "speaking" for a duration
/// proportional to the text, so the orb follows the speech envelope.
pub struct SimulatedSpeaker {
    per_char: Duration,
    speaking: Arc<AtomicBool>,
    current: Mutex<Option<JoinHandle<()>>>,
    spoken: Mutex<Vec<String>>,
}

impl SimulatedSpeaker {
    pub fn new(per_char: Duration) -> Self {
        Self {
            per_char,
            speaking: Arc::new(AtomicBool::new(false)),
            current: Mutex::new(None),
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// Every utterance started so far.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Shared flag the orb driver reads each frame.
    pub fn speaking_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.speaking)
    }
}

impl Default for SimulatedSpeaker {
    fn default() -> Self {
        Self::new(Duration::from_millis(60))
    }
}

impl Speaker for SimulatedSpeaker {
    fn speak(&self, text: &str) {
        info!(target: "ryan::speech", "{}", text);
        self.spoken
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.to_string());

        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(task) = current.take() {
            task.abort();
        }
        self.speaking.store(true, Ordering::SeqCst);

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            // No runtime to time the utterance; treat it as instantaneous.
            self.speaking.store(false, Ordering::SeqCst);
            return;
        };
        let flag = Arc::clone(&self.speaking);
        let duration = self.per_char * text.chars().count() as u32;
        *current = Some(handle.spawn(async move {
            tokio::time::sleep(duration).await;
            flag.store(false, Ordering::SeqCst);
        }));
    }

    fn cancel(&self) {
        if let Some(task) = self.current.lock().unwrap_or_else(|e| e.into_inner()).take() {
            task.abort();
        }
        self.speaking.store(false, Ordering::SeqCst);
        debug!("Speech cancelled");
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// The speech toggle: nothing is spoken while disabled, and disabling
/// cancels an utterance in progress.
pub struct SpeechOutput {
    enabled: AtomicBool,
    speaker: Arc<dyn Speaker>,
}

impl SpeechOutput {
    pub fn new(speaker: Arc<dyn Speaker>, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            speaker,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!("Speech Enabled: {}", enabled);
        if !enabled && self.speaker.is_speaking() {
            self.speaker.cancel();
        }
    }

    /// Speaks `text` if enabled and non-empty. Returns whether it was spoken.
    pub fn speak(&self, text: &str) -> bool {
        if !self.is_enabled() || text.is_empty() {
            return false;
        }
        self.speaker.speak(text);
        true
    }

    pub fn is_speaking(&self) -> bool {
        self.speaker.is_speaking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn utterance_ends_after_its_duration() {
        let speaker = SimulatedSpeaker::new(Duration::from_millis(10));
        speaker.speak("hello");
        assert!(speaker.is_speaking());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!speaker.is_speaking());
        assert_eq!(speaker.spoken(), vec!["hello".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_cancels_current_utterance() {
        let speaker = Arc::new(SimulatedSpeaker::new(Duration::from_millis(100)));
        let output = SpeechOutput::new(speaker.clone(), true);
        assert!(output.speak("a long sentence"));
        assert!(output.is_speaking());

        output.set_enabled(false);
        assert!(!output.is_speaking());
        assert!(!output.speak("ignored"));
        assert_eq!(speaker.spoken().len(), 1);
    }

    #[test]
    fn empty_text_is_not_spoken() {
        let output = SpeechOutput::new(Arc::new(SimulatedSpeaker::default()), true);
        assert!(!output.speak(""));
    }
}
