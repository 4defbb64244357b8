use std::fmt;

use crate::view_model::{ListingView, SessionViewModel};
use crate::{
    CompletionSummary, Listing, ProgressTracker, ResultAggregator, SessionError,
    SourceResultBatch,
};

pub type JobId = u64;

/// Generation of a push channel; each open gets a new one.
pub type ChannelId = u64;

/// Shown when the service reports an error without a message.
pub const DEFAULT_WARNING: &str = "An error occurred during scraping";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    /// A submit command is outstanding.
    Submitting,
    JobInFlight,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Submitting => "submitting",
            ConnectionState::JobInFlight => "job in flight",
        };
        f.write_str(name)
    }
}

/// How the active job delivers its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    /// Results stream over the push channel of the current session.
    Streaming,
    /// Results arrive in a single response; no session is involved.
    Bulk,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub session_id: Option<String>,
    pub connection: ConnectionState,
    pub active_job: Option<JobId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    session: Session,
    mode: Option<JobMode>,
    keywords: Option<String>,
    aggregator: ResultAggregator,
    progress: ProgressTracker,
    last_warning: Option<String>,
    last_job_id: JobId,
    channel: ChannelId,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn connection(&self) -> ConnectionState {
        self.session.connection
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.session_id.as_deref()
    }

    pub fn active_job(&self) -> Option<JobId> {
        self.session.active_job
    }

    pub fn mode(&self) -> Option<JobMode> {
        self.mode
    }

    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    /// The channel whose events are currently accepted.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Validates a streaming submission and returns the trimmed keywords.
    pub fn check_submission(&self, keywords: &str) -> Result<String, SessionError> {
        let trimmed = non_empty_keywords(keywords)?;
        if self.session.connection != ConnectionState::Connected || self.session.session_id.is_none() {
            return Err(SessionError::NotReady(self.session.connection));
        }
        Ok(trimmed)
    }

    /// Validates a bulk submission, which needs no session but must not overlap a live one.
    pub fn check_bulk_submission(&self, keywords: &str) -> Result<String, SessionError> {
        let trimmed = non_empty_keywords(keywords)?;
        if self.session.connection != ConnectionState::Idle {
            return Err(SessionError::NotReady(self.session.connection));
        }
        Ok(trimmed)
    }

    pub fn is_job_live(&self) -> bool {
        matches!(
            self.session.connection,
            ConnectionState::Submitting | ConnectionState::JobInFlight
        )
    }

    pub fn view(&self) -> SessionViewModel {
        SessionViewModel {
            connection: self.session.connection,
            session_id: self.session.session_id.clone(),
            keywords: self.keywords.clone(),
            listings: self
                .aggregator
                .newest_first()
                .map(ListingView::from)
                .collect(),
            listing_count: self.aggregator.len(),
            per_source: self.aggregator.count_by_source(),
            progress_percent: self.progress.display_percentage(),
            total_time_ms: self.progress.total_time_ms(),
            warning: self.last_warning.clone(),
        }
    }

    /// Allocates the generation of a channel about to be opened.
    pub(crate) fn next_channel(&mut self) -> ChannelId {
        self.channel += 1;
        self.channel
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionState) {
        self.session.connection = connection;
    }

    pub(crate) fn set_session_id(&mut self, session_id: String) {
        self.session.session_id = Some(session_id);
    }

    /// Resets per-job state and allocates the id of the new job.
    pub(crate) fn begin_job(&mut self, mode: JobMode, keywords: String) -> JobId {
        self.last_job_id += 1;
        self.session.active_job = Some(self.last_job_id);
        self.mode = Some(mode);
        self.keywords = Some(keywords);
        self.aggregator.reset();
        self.progress.reset();
        self.last_warning = None;
        self.last_job_id
    }

    pub(crate) fn end_job(&mut self) {
        self.session.active_job = None;
        self.mode = None;
    }

    /// Clears the session; returns the released id, if any.
    pub(crate) fn clear_session(&mut self) -> Option<String> {
        let released = self.session.session_id.take();
        self.session.active_job = None;
        self.session.connection = ConnectionState::Idle;
        self.mode = None;
        released
    }

    pub(crate) fn accept_batch(&mut self, batch: SourceResultBatch) -> Vec<Listing> {
        self.aggregator.accept(batch)
    }

    pub(crate) fn apply_progress(&mut self, percentage: f64) -> f64 {
        self.progress.update(percentage)
    }

    pub(crate) fn apply_completion(&mut self, summary: CompletionSummary) {
        self.progress.finish(summary);
    }

    pub(crate) fn set_warning(&mut self, message: String) {
        self.last_warning = Some(message);
    }
}

fn non_empty_keywords(keywords: &str) -> Result<String, SessionError> {
    let trimmed = keywords.trim();
    if trimmed.is_empty() {
        return Err(SessionError::EmptyKeywords);
    }
    Ok(trimmed.to_string())
}
