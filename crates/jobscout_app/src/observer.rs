use jobscout_core::{CompletionSummary, Listing};

/// Receives session notifications from the controller.
///
/// All callbacks run on the thread that drives the controller.
pub trait SessionObserver {
    fn on_ready(&mut self, _session_id: &str) {}
    /// One accepted listing; called once per listing, in arrival order.
    fn on_result_appended(&mut self, _listing: &Listing) {}
    /// Already clamped to `[0, 100]`.
    fn on_progress(&mut self, _percentage: f64) {}
    fn on_warning(&mut self, _message: &str) {}
    fn on_completed(&mut self, _summary: &CompletionSummary) {}
    /// The submit call failed; submission can be retried.
    fn on_submission_failed(&mut self, _message: &str) {}
    /// `job_aborted` distinguishes a job that ended without completion from a plain disconnect.
    fn on_disconnected(&mut self, _job_aborted: bool) {}
}

/// Ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}
