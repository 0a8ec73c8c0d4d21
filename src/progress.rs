//! Progress Reporting
//!
//! Bulk operations announce their progress through a [`ProgressReporter`].
//! Reporting is purely observational and never affects control flow.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Receiver of progress events from bulk operations
pub trait ProgressReporter: Send + Sync {
    /// Start an indicator for `total` items
    fn create(&self, total: usize, label: &str) -> Uuid;
    /// One more item is being processed
    fn update(&self, id: Uuid, label: &str);
    /// The indicator is finished
    fn stop(&self, id: Uuid, label: &str);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn create(&self, _total: usize, _label: &str) -> Uuid {
        Uuid::new_v4()
    }

    fn update(&self, _id: Uuid, _label: &str) {}

    fn stop(&self, _id: Uuid, _label: &str) {}
}

/// A single running progress indicator
#[derive(Debug, Clone)]
pub struct Indicator {
    pub id: Uuid,
    pub label: String,
    pub total: usize,
    pub processed: usize,
    pub created_at: Instant,
    pub completed_at: Option<Instant>,
}

impl Indicator {
    fn new(total: usize, label: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.to_string(),
            total,
            processed: 0,
            created_at: Instant::now(),
            completed_at: None,
        }
    }

    /// Get duration of the indicator (or elapsed time if still running)
    pub fn duration(&self) -> Duration {
        self.completed_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.created_at)
    }

    /// Format duration for display
    pub fn duration_display(&self) -> String {
        let d = self.duration();
        if d.as_secs() < 1 {
            format!("{}ms", d.as_millis())
        } else if d.as_secs() < 60 {
            format!("{}s", d.as_secs())
        } else {
            format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
        }
    }
}

/// Emits progress as tracing events and keeps counters for running indicators
#[derive(Debug, Default)]
pub struct TracingProgress {
    indicators: Mutex<HashMap<Uuid, Indicator>>,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a running indicator
    pub fn get(&self, id: Uuid) -> Option<Indicator> {
        self.indicators
            .lock()
            .ok()
            .and_then(|map| map.get(&id).cloned())
    }

    /// Number of indicators not yet stopped
    pub fn active(&self) -> usize {
        self.indicators.lock().map(|map| map.len()).unwrap_or(0)
    }
}

impl ProgressReporter for TracingProgress {
    fn create(&self, total: usize, label: &str) -> Uuid {
        let indicator = Indicator::new(total, label);
        let id = indicator.id;
        tracing::info!("{} (0/{})", label, total);
        if let Ok(mut map) = self.indicators.lock() {
            map.insert(id, indicator);
        }
        id
    }

    fn update(&self, id: Uuid, label: &str) {
        if let Ok(mut map) = self.indicators.lock() {
            if let Some(indicator) = map.get_mut(&id) {
                indicator.processed += 1;
                tracing::info!("{} ({}/{})", label, indicator.processed, indicator.total);
                return;
            }
        }
        tracing::info!("{}", label);
    }

    fn stop(&self, id: Uuid, label: &str) {
        let removed = self
            .indicators
            .lock()
            .ok()
            .and_then(|mut map| map.remove(&id));
        match removed {
            Some(mut indicator) => {
                indicator.completed_at = Some(Instant::now());
                tracing::info!("{} ({})", label, indicator.duration_display());
            }
            None => tracing::info!("{}", label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_lifecycle() {
        let progress = TracingProgress::new();

        let id = progress.create(2, "Exporting variables...");
        assert!(progress.get(id).unwrap().completed_at.is_none());

        progress.update(id, "Exporting variable esv-a");
        progress.update(id, "Exporting variable esv-b");
        assert_eq!(progress.get(id).unwrap().processed, 2);

        progress.stop(id, "Exported 2 variables.");
        assert!(progress.get(id).is_none());
        assert_eq!(progress.active(), 0);
    }

    #[test]
    fn test_stopped_indicators_are_released() {
        let progress = TracingProgress::new();
        for _ in 0..1000 {
            let id = progress.create(1, "Processing variables...");
            progress.update(id, "Processing variables esv-a");
            progress.stop(id, "Processed 1 of 1 variables.");
        }
        assert_eq!(progress.active(), 0);

        let running = progress.create(3, "Processing providers...");
        assert_eq!(progress.active(), 1);
        progress.stop(running, "Processed 3 of 3 providers.");
        assert_eq!(progress.active(), 0);
    }

    #[test]
    fn test_unknown_indicator_is_ignored() {
        let progress = TracingProgress::new();
        let stray = Uuid::new_v4();
        progress.update(stray, "nothing");
        progress.stop(stray, "nothing");
        assert!(progress.get(stray).is_none());
    }

    #[test]
    fn test_no_progress_ids_are_unique() {
        let a = NoProgress.create(1, "a");
        let b = NoProgress.create(1, "b");
        assert_ne!(a, b);
    }
}
