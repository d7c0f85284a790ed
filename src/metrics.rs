//! Per-turn latency tracking
//!
//! Each dialogue turn records how long the collaborator calls took; the
//! session keeps a sliding window of those for display and logging.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Turns kept in the sliding window
const WINDOW: usize = 20;

/// Sliding window of durations
#[derive(Clone, Debug)]
pub struct LatencyWindow {
    samples: VecDeque<Duration>,
    max_samples: usize,
}

impl LatencyWindow {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().max().copied().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new(WINDOW)
    }
}

/// Timings of a single turn, in milliseconds
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnMetrics {
    /// Audio to text
    pub transcription_ms: Option<u64>,
    /// Local + remote intent extraction
    pub extraction_ms: Option<u64>,
    /// Token resolution for the proposal
    pub resolution_ms: Option<u64>,
}

impl TurnMetrics {
    pub fn total_ms(&self) -> u64 {
        self.transcription_ms.unwrap_or(0)
            + self.extraction_ms.unwrap_or(0)
            + self.resolution_ms.unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ms) = self.transcription_ms {
            parts.push(format!("STT: {}ms", ms));
        }
        if let Some(ms) = self.extraction_ms {
            parts.push(format!("Intent: {}ms", ms));
        }
        if let Some(ms) = self.resolution_ms {
            parts.push(format!("Resolve: {}ms", ms));
        }
        parts.push(format!("Total: {}ms", self.total_ms()));
        parts.join(" | ")
    }
}

/// Measures one phase of a turn
#[derive(Debug)]
pub struct PhaseTimer {
    start: Instant,
}

impl PhaseTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Session-wide latency statistics
#[derive(Clone, Debug, Default)]
pub struct SessionMetrics {
    pub turns: u64,
    pub last_turn: TurnMetrics,
    pub extraction: LatencyWindow,
    pub resolution: LatencyWindow,
}

impl SessionMetrics {
    /// Fold a finished turn into the session statistics
    pub fn finish_turn(&mut self, turn: TurnMetrics) {
        self.turns += 1;
        if let Some(ms) = turn.extraction_ms {
            self.extraction.record(Duration::from_millis(ms));
        }
        if let Some(ms) = turn.resolution_ms {
            self.resolution.record(Duration::from_millis(ms));
        }
        self.last_turn = turn;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_window() {
        let mut window = LatencyWindow::new(3);
        for i in 1..=5 {
            window.record(Duration::from_millis(i * 10));
        }
        assert_eq!(window.count(), 3);
        assert_eq!(window.max(), Duration::from_millis(50));
        assert_eq!(window.average(), Duration::from_millis(40));
    }

    #[test]
    fn test_empty_window() {
        let window = LatencyWindow::default();
        assert_eq!(window.average(), Duration::ZERO);
        assert_eq!(window.max(), Duration::ZERO);
    }

    #[test]
    fn test_turn_summary() {
        let turn = TurnMetrics {
            transcription_ms: Some(200),
            extraction_ms: Some(150),
            resolution_ms: None,
        };
        assert_eq!(turn.total_ms(), 350);
        assert_eq!(turn.summary(), "STT: 200ms | Intent: 150ms | Total: 350ms");
    }

    #[test]
    fn test_session_metrics() {
        let mut metrics = SessionMetrics::default();
        metrics.finish_turn(TurnMetrics {
            extraction_ms: Some(100),
            resolution_ms: Some(300),
            ..TurnMetrics::default()
        });
        metrics.finish_turn(TurnMetrics {
            extraction_ms: Some(200),
            ..TurnMetrics::default()
        });
        assert_eq!(metrics.turns, 2);
        assert_eq!(metrics.extraction.average(), Duration::from_millis(150));
        assert_eq!(metrics.resolution.count(), 1);
        assert_eq!(metrics.last_turn.extraction_ms, Some(200));
    }

    #[test]
    fn test_phase_timer() {
        let timer = PhaseTimer::start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }
}
