use std::time::{Duration, Instant};

use jobscout_core::{
    update, AppState, ConnectionState, Effect, JobId, Msg, Notice, SessionError, SessionViewModel,
};
use jobscout_engine::EngineEvent;
use jobscout_logging::{scout_debug, scout_info};

use crate::backend::{to_msg, Backend};
use crate::observer::SessionObserver;
use crate::reconnect::{NeverReconnect, ReconnectPolicy};

/// Owns one session: the state machine, the I/O backend and the observer.
///
/// Every transition happens on the caller's thread, either from a user call
/// or while draining backend events in [`pump`](Self::pump) or
/// [`wait`](Self::wait). Dropping the controller tears the session down.
pub struct SessionController<B: Backend, O: SessionObserver> {
    state: AppState,
    backend: B,
    observer: O,
    reconnect: Box<dyn ReconnectPolicy>,
    reconnect_at: Option<Instant>,
    failed_attempts: u32,
    malformed_events: u64,
}

impl<B: Backend, O: SessionObserver> SessionController<B, O> {
    pub fn new(backend: B, observer: O) -> Self {
        Self {
            state: AppState::new(),
            backend,
            observer,
            reconnect: Box::new(NeverReconnect),
            reconnect_at: None,
            failed_attempts: 0,
            malformed_events: 0,
        }
    }

    pub fn with_reconnect(mut self, policy: Box<dyn ReconnectPolicy>) -> Self {
        self.reconnect = policy;
        self
    }

    /// Opens the push channel. No-op unless idle.
    pub fn open(&mut self) {
        self.reconnect_at = None;
        self.apply(Msg::OpenRequested);
    }

    /// Starts a streaming job on the current session.
    pub fn submit_keywords(&mut self, keywords: &str) -> Result<JobId, SessionError> {
        let keywords = self.state.check_submission(keywords)?;
        self.apply(Msg::KeywordsSubmitted(keywords));
        self.state
            .active_job()
            .ok_or(SessionError::NotReady(self.state.connection()))
    }

    /// Runs a job through the single-response endpoint. Only valid without a session.
    pub fn search_bulk(&mut self, keywords: &str) -> Result<JobId, SessionError> {
        let keywords = self.state.check_bulk_submission(keywords)?;
        self.apply(Msg::BulkSubmitted(keywords));
        self.state
            .active_job()
            .ok_or(SessionError::NotReady(self.state.connection()))
    }

    /// Closes the channel and releases the session. Safe to call at any time.
    pub fn disconnect(&mut self) {
        self.reconnect_at = None;
        self.failed_attempts = 0;
        self.apply(Msg::DisconnectRequested);
    }

    /// Applies every queued backend event without blocking. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        self.reopen_if_due();
        let mut handled = 0;
        while let Some(event) = self.backend.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Blocks up to `timeout` for the next event, then drains the rest.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        self.reopen_if_due();
        let timeout = match self.reconnect_at {
            Some(at) => timeout.min(at.saturating_duration_since(Instant::now())),
            None => timeout,
        };
        match self.backend.recv_timeout(timeout) {
            Some(event) => {
                self.handle(event);
                1 + self.pump()
            }
            None => self.pump(),
        }
    }

    pub fn handle(&mut self, event: EngineEvent) {
        if let EngineEvent::Malformed(malformed) = &event {
            // Already logged where it was parsed.
            self.malformed_events += 1;
            scout_debug!("dropped {}", malformed.event);
            return;
        }
        let lost = matches!(event, EngineEvent::ChannelLost { .. });
        let before = self.state.connection();
        if let Some(msg) = to_msg(event) {
            self.apply(msg);
        }
        if lost
            && before != ConnectionState::Idle
            && self.state.connection() == ConnectionState::Idle
        {
            self.schedule_reconnect();
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> SessionViewModel {
        self.state.view()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of push events dropped because their payload was invalid.
    pub fn malformed_events(&self) -> u64 {
        self.malformed_events
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    fn apply(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::OpenChannel { channel } => self.backend.open_channel(channel),
            Effect::CloseChannel => self.backend.close_channel(),
            Effect::SubmitJob {
                job_id,
                session_id,
                keywords,
            } => self.backend.submit_job(job_id, &session_id, &keywords),
            Effect::SubmitBulk { job_id, keywords } => self.backend.submit_bulk(job_id, &keywords),
            Effect::ReleaseSession { session_id } => self.backend.release_session(&session_id),
            Effect::Notify(notice) => self.notify(notice),
        }
    }

    fn notify(&mut self, notice: Notice) {
        match notice {
            Notice::Ready { session_id } => {
                self.failed_attempts = 0;
                self.observer.on_ready(&session_id);
            }
            Notice::ResultAppended(listing) => self.observer.on_result_appended(&listing),
            Notice::Progress(percentage) => self.observer.on_progress(percentage),
            Notice::Warning(message) => self.observer.on_warning(&message),
            Notice::Completed(summary) => self.observer.on_completed(&summary),
            Notice::SubmissionFailed(message) => self.observer.on_submission_failed(&message),
            Notice::Disconnected { job_aborted } => self.observer.on_disconnected(job_aborted),
        }
    }

    fn schedule_reconnect(&mut self) {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        match self.reconnect.next_delay(self.failed_attempts) {
            Some(delay) => {
                scout_info!(
                    "reopening channel in {:?} (attempt {})",
                    delay,
                    self.failed_attempts
                );
                self.reconnect_at = Some(Instant::now() + delay);
            }
            None => scout_debug!("no reconnect after {} failures", self.failed_attempts),
        }
    }

    fn reopen_if_due(&mut self) {
        if self.reconnect_at.is_some_and(|at| Instant::now() >= at) {
            self.reconnect_at = None;
            self.apply(Msg::OpenRequested);
        }
    }
}

impl<B: Backend, O: SessionObserver> Drop for SessionController<B, O> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
