//! Landing history for a throw session
//!
//! Tracks the most recent landings and the running multiplier total.

use serde::{Deserialize, Serialize};

use crate::board::BinId;
use crate::sim::{BallId, SimEvent};

/// Maximum number of landings to keep
pub const MAX_HISTORY: usize = 50;

/// A single landing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingEntry {
    pub ball: BallId,
    pub bin: BinId,
    pub multiplier: u32,
    /// Simulation tick the landing was recorded on
    pub tick: u64,
}

/// Recent landings, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThrowHistory {
    pub entries: Vec<LandingEntry>,
    /// Sum of every multiplier recorded, including entries trimmed off
    pub total: u64,
    /// Landings recorded, including entries trimmed off
    pub landed: u64,
}

impl ThrowHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a landing; duplicates for a ball already in the history are ignored
    ///
    /// Returns true if the landing was recorded.
    pub fn record(&mut self, entry: LandingEntry) -> bool {
        if self.entries.iter().any(|e| e.ball == entry.ball) {
            log::debug!("Ignoring duplicate landing for {}", entry.ball);
            return false;
        }
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY);
        self.total += u64::from(entry.multiplier);
        self.landed += 1;
        true
    }

    /// Record every `BallLanded` in `events`, returning how many were new
    pub fn record_events<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a SimEvent>,
        tick: u64,
    ) -> usize {
        events
            .into_iter()
            .filter_map(|event| match *event {
                SimEvent::BallLanded {
                    ball,
                    bin,
                    multiplier,
                } => Some(LandingEntry {
                    ball,
                    bin,
                    multiplier,
                    tick,
                }),
                _ => None,
            })
            .filter(|&entry| self.record(entry))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&LandingEntry> {
        self.entries.first()
    }

    /// Landings per bin among the kept entries
    pub fn bin_counts(&self, bin_count: usize) -> Vec<usize> {
        let mut counts = vec![0; bin_count];
        for entry in &self.entries {
            if let Some(count) = counts.get_mut(entry.bin.index()) {
                *count += 1;
            }
        }
        counts
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landed(ball: u32, bin: usize, multiplier: u32) -> SimEvent {
        SimEvent::BallLanded {
            ball: BallId(ball),
            bin: BinId(bin),
            multiplier,
        }
    }

    #[test]
    fn test_records_landings_newest_first() {
        let mut history = ThrowHistory::new();
        let events = [
            landed(1, 4, 5),
            SimEvent::PegTouched {
                ball: BallId(2),
                row: 1,
                col: 1,
            },
            landed(2, 0, 1000),
        ];
        assert_eq!(history.record_events(&events, 7), 2);
        assert_eq!(history.total, 1005);
        assert_eq!(history.latest().unwrap().ball, BallId(2));
        assert_eq!(history.latest().unwrap().tick, 7);
    }

    #[test]
    fn test_duplicate_landings_ignored() {
        let mut history = ThrowHistory::new();
        history.record_events(&[landed(1, 3, 20)], 1);
        assert_eq!(history.record_events(&[landed(1, 3, 20)], 2), 0);
        assert_eq!(history.entries.len(), 1);
        assert_eq!(history.total, 20);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = ThrowHistory::new();
        for ball in 0..(MAX_HISTORY as u32 + 20) {
            history.record_events(&[landed(ball, 1, 2)], u64::from(ball));
        }
        assert_eq!(history.entries.len(), MAX_HISTORY);
        assert_eq!(history.landed, MAX_HISTORY as u64 + 20);
        assert_eq!(history.total, 2 * (MAX_HISTORY as u64 + 20));
        assert_eq!(history.bin_counts(3), vec![0, MAX_HISTORY, 0]);

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.total, 0);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut history = ThrowHistory::new();
        history.record_events(&[landed(9, 2, 50)], 3);
        let json = serde_json::to_string(&history).unwrap();
        let back: ThrowHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries, history.entries);
        assert_eq!(back.total, 50);
    }
}
