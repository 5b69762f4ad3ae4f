//! Yawn debounce and escalation counter

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of feeding one mouth reading to the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YawnEvent {
    /// Mouth closed and was already closed
    Idle,

    /// Mouth just opened; episode started
    Opened,

    /// Mouth still open
    Held,

    /// Episode closed within the debounce window and was counted
    Counted { count: u32 },

    /// Episode lasted too long to be a yawn
    Discarded { duration_ns: u64 },

    /// Episode counted and the count reached the threshold; counter reset
    Escalated { count: u32 },
}

/// Mouth-open episode tracking for one face
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YawnEpisode {
    mouth_open: bool,
    episode_start_ns: u64,
    yawn_count: u32,
}

impl YawnEpisode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the mouth classification for a frame
    pub fn observe(&mut self, open: bool, now_ns: u64, debounce_ns: u64, threshold: u32) -> YawnEvent {
        match (self.mouth_open, open) {
            (false, false) => YawnEvent::Idle,
            (true, true) => YawnEvent::Held,
            (false, true) => {
                self.mouth_open = true;
                self.episode_start_ns = now_ns;
                debug!("Mouth-open episode started at {}ns", now_ns);
                YawnEvent::Opened
            }
            (true, false) => {
                self.mouth_open = false;
                let duration_ns = now_ns.saturating_sub(self.episode_start_ns);

                if duration_ns >= debounce_ns {
                    debug!("Mouth-open episode of {}ms discarded", duration_ns / 1_000_000);
                    return YawnEvent::Discarded { duration_ns };
                }

                self.yawn_count += 1;
                info!("Yawn counted ({}/{})", self.yawn_count, threshold);

                if self.yawn_count >= threshold {
                    let count = self.yawn_count;
                    self.yawn_count = 0;
                    YawnEvent::Escalated { count }
                } else {
                    YawnEvent::Counted { count: self.yawn_count }
                }
            }
        }
    }

    pub fn is_mouth_open(&self) -> bool {
        self.mouth_open
    }

    pub fn yawn_count(&self) -> u32 {
        self.yawn_count
    }

    /// Start of the current episode, if the mouth is open
    pub fn episode_start(&self) -> Option<u64> {
        self.mouth_open.then_some(self.episode_start_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;
    const DEBOUNCE: u64 = 2000 * MS;

    fn yawn(episode: &mut YawnEpisode, start_ms: u64, length_ms: u64, threshold: u32) -> YawnEvent {
        assert_eq!(episode.observe(true, start_ms * MS, DEBOUNCE, threshold), YawnEvent::Opened);
        episode.observe(false, (start_ms + length_ms) * MS, DEBOUNCE, threshold)
    }

    #[test]
    fn test_short_episode_counted() {
        let mut episode = YawnEpisode::new();
        assert_eq!(episode.observe(false, 0, DEBOUNCE, 3), YawnEvent::Idle);
        assert_eq!(yawn(&mut episode, 100, 1000, 3), YawnEvent::Counted { count: 1 });
        assert_eq!(episode.yawn_count(), 1);
        assert!(!episode.is_mouth_open());
    }

    #[test]
    fn test_long_episode_discarded() {
        let mut episode = YawnEpisode::new();
        assert_eq!(
            yawn(&mut episode, 0, 2500, 1),
            YawnEvent::Discarded { duration_ns: 2500 * MS }
        );
        assert_eq!(episode.yawn_count(), 0);
    }

    #[test]
    fn test_debounce_boundary() {
        let mut episode = YawnEpisode::new();
        assert!(matches!(yawn(&mut episode, 0, 2000, 3), YawnEvent::Discarded { .. }));
        assert_eq!(yawn(&mut episode, 5000, 1999, 3), YawnEvent::Counted { count: 1 });
    }

    #[test]
    fn test_escalation_resets_count() {
        let mut episode = YawnEpisode::new();
        assert_eq!(yawn(&mut episode, 0, 1000, 3), YawnEvent::Counted { count: 1 });
        assert_eq!(yawn(&mut episode, 4000, 1000, 3), YawnEvent::Counted { count: 2 });
        assert_eq!(yawn(&mut episode, 8000, 1000, 3), YawnEvent::Escalated { count: 3 });
        assert_eq!(episode.yawn_count(), 0);
    }

    #[test]
    fn test_held_mouth_keeps_episode_start() {
        let mut episode = YawnEpisode::new();
        episode.observe(true, 10 * MS, DEBOUNCE, 3);
        assert_eq!(episode.observe(true, 500 * MS, DEBOUNCE, 3), YawnEvent::Held);
        assert_eq!(episode.episode_start(), Some(10 * MS));
    }
}
