//! Writing session tracker
//!
//! Ephemeral counters for the page being edited right now: word and
//! character counts, when content was last saved, whether the writer is
//! actively typing, and a running tally of words added today. Nothing here
//! is persisted; a new process starts from zero.
//!
//! When "writing" ends is the caller's decision (see `autosave`); the
//! tracker only records what it is told.

use chrono::{DateTime, Duration, Utc};

/// Words and time spent in the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodayStats {
    pub words: usize,
    pub duration: Duration,
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// When the session started
    pub start_time: Option<DateTime<Utc>>,
    /// When content was last persisted
    pub last_saved: Option<DateTime<Utc>>,
    /// Whether the writer is actively typing
    pub is_writing: bool,
    /// Consecutive "writing" reports since the last pause
    pub writing_streak: u32,
    /// Words added since the daily tally was reset
    pub total_words_today: usize,
    /// Word count of the page being edited
    pub word_count: usize,
    /// Character count of the page being edited
    pub char_count: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a session; clears the last-saved stamp
    pub fn start_session(&mut self) {
        self.start_time = Some(Utc::now());
        self.last_saved = None;
    }

    pub fn end_session(&mut self) {
        self.start_time = None;
        self.is_writing = false;
    }

    /// Record whether the writer is typing; a pause resets the streak
    pub fn update_writing_status(&mut self, is_writing: bool) {
        self.is_writing = is_writing;
        self.writing_streak = if is_writing {
            self.writing_streak.saturating_add(1)
        } else {
            0
        };
    }

    /// Overwrite the counts; any growth in words is added to today's tally
    pub fn update_stats(&mut self, word_count: usize, char_count: usize) {
        let words_added = word_count.saturating_sub(self.word_count);
        self.word_count = word_count;
        self.char_count = char_count;

        if words_added > 0 {
            self.update_daily_stats(words_added);
        }
    }

    pub fn mark_saved(&mut self) {
        self.last_saved = Some(Utc::now());
    }

    pub fn update_daily_stats(&mut self, words_added: usize) {
        self.total_words_today += words_added;
    }

    pub fn reset_daily_stats(&mut self) {
        self.total_words_today = 0;
        self.writing_streak = 0;
    }

    /// Time since `start_session`, zero when no session is running
    pub fn session_duration(&self) -> Duration {
        self.start_time
            .map(|start| Utc::now() - start)
            .unwrap_or_else(Duration::zero)
    }

    pub fn today_stats(&self) -> TodayStats {
        TodayStats {
            words: self.total_words_today,
            duration: self.session_duration(),
        }
    }
}
