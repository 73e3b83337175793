use std::time::Duration;

/// The single practice profile: settings plus the lifetime correct counter.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub num_correct: u32,
    pub default_path: String,
    /// Seconds a sentence stays visible with the fixed timer.
    pub timer_duration: u32,
    /// Milliseconds per character with the character-based timer.
    pub char_timer_value: u32,
    pub char_based_timer: bool,
    pub no_typing: bool,
    pub auto_start: bool,
    pub show_correct_sentence: bool,
    pub dark_mode: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            num_correct: 0,
            default_path: String::new(),
            timer_duration: 1,
            char_timer_value: 60,
            char_based_timer: true,
            no_typing: false,
            auto_start: false,
            show_correct_sentence: false,
            dark_mode: false,
        }
    }
}

impl User {
    /// How long `sentence` stays on screen before it is hidden.
    pub fn response_duration(&self, sentence: &str) -> Duration {
        if self.char_based_timer {
            let chars = sentence.chars().count() as u64;
            Duration::from_millis(chars * u64::from(self.char_timer_value))
        } else {
            Duration::from_secs(u64::from(self.timer_duration))
        }
    }
}
