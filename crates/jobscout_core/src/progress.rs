/// Final timing reported by the service when a job completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub total_time_ms: u64,
}

/// Latest progress percentage and final compute time of the current job.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressTracker {
    percentage: f64,
    total_time_ms: Option<u64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `percentage` clamped to `[0, 100]` and returns the stored value.
    pub fn update(&mut self, percentage: f64) -> f64 {
        self.percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.percentage
    }

    pub fn reset(&mut self) {
        self.percentage = 0.0;
        self.total_time_ms = None;
    }

    /// Records the compute time. The percentage is left as the service last reported it.
    pub fn finish(&mut self, summary: CompletionSummary) {
        self.total_time_ms = Some(summary.total_time_ms);
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn display_percentage(&self) -> u8 {
        self.percentage.round() as u8
    }

    pub fn total_time_ms(&self) -> Option<u64> {
        self.total_time_ms
    }
}
