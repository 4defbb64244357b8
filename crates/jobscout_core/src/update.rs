use jobscout_logging::{scout_debug, scout_info, scout_warn};

use crate::{AppState, ChannelMsg, ConnectionState, Effect, JobMode, Msg, Notice, DEFAULT_WARNING};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::OpenRequested => {
            if state.connection() == ConnectionState::Idle {
                let channel = state.next_channel();
                state.set_connection(ConnectionState::Connecting);
                vec![Effect::OpenChannel { channel }]
            } else {
                scout_debug!("open ignored while {}", state.connection());
                Vec::new()
            }
        }
        Msg::Channel { channel, event } => {
            if channel != state.channel() {
                scout_debug!(
                    "event from channel {} ignored; current is {}",
                    channel,
                    state.channel()
                );
                return (state, Vec::new());
            }
            return on_channel(state, event);
        }
        Msg::KeywordsSubmitted(raw) => match state.check_submission(&raw) {
            Ok(keywords) => {
                let Some(session_id) = state.session_id().map(str::to_owned) else {
                    return (state, Vec::new());
                };
                let job_id = state.begin_job(JobMode::Streaming, keywords.clone());
                state.set_connection(ConnectionState::Submitting);
                scout_info!("job {} submitted on session {}", job_id, session_id);
                vec![Effect::SubmitJob {
                    job_id,
                    session_id,
                    keywords,
                }]
            }
            Err(err) => {
                scout_debug!("submission rejected: {}", err);
                Vec::new()
            }
        },
        Msg::BulkSubmitted(raw) => match state.check_bulk_submission(&raw) {
            Ok(keywords) => {
                let job_id = state.begin_job(JobMode::Bulk, keywords.clone());
                state.set_connection(ConnectionState::JobInFlight);
                scout_info!("bulk job {} submitted", job_id);
                vec![Effect::SubmitBulk { job_id, keywords }]
            }
            Err(err) => {
                scout_debug!("bulk submission rejected: {}", err);
                Vec::new()
            }
        },
        Msg::SubmitAccepted { job_id } => {
            if state.active_job() == Some(job_id)
                && state.connection() == ConnectionState::Submitting
            {
                state.set_connection(ConnectionState::JobInFlight);
            } else {
                scout_debug!("stale acknowledgement for job {}", job_id);
            }
            Vec::new()
        }
        Msg::SubmitFailed { job_id, message } => {
            if state.active_job() != Some(job_id) || !state.is_job_live() {
                scout_debug!("stale submit failure for job {}: {}", job_id, message);
                return (state, Vec::new());
            }
            scout_warn!("job {} submission failed: {}", job_id, message);
            let back_to = match state.mode() {
                Some(JobMode::Bulk) => ConnectionState::Idle,
                _ => ConnectionState::Connected,
            };
            state.end_job();
            state.set_connection(back_to);
            vec![Effect::Notify(Notice::SubmissionFailed(message))]
        }
        Msg::BulkCompleted {
            job_id,
            batches,
            summary,
        } => {
            if state.active_job() != Some(job_id) || state.mode() != Some(JobMode::Bulk) {
                scout_debug!("stale bulk response for job {}", job_id);
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            for batch in batches {
                effects.extend(
                    state
                        .accept_batch(batch)
                        .into_iter()
                        .map(|listing| Effect::Notify(Notice::ResultAppended(listing))),
                );
            }
            state.apply_completion(summary);
            state.end_job();
            state.set_connection(ConnectionState::Idle);
            effects.push(Effect::Notify(Notice::Completed(summary)));
            effects
        }
        Msg::DisconnectRequested => {
            let was_live =
                state.connection() != ConnectionState::Idle || state.session_id().is_some();
            let mut effects = vec![Effect::CloseChannel];
            if was_live {
                let job_aborted = state.is_job_live();
                if let Some(session_id) = state.clear_session() {
                    scout_info!("releasing session {}", session_id);
                    effects.push(Effect::ReleaseSession { session_id });
                }
                effects.push(Effect::Notify(Notice::Disconnected { job_aborted }));
            }
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Applies an event from the current channel.
fn on_channel(mut state: AppState, event: ChannelMsg) -> (AppState, Vec<Effect>) {
    let effects = match event {
        ChannelMsg::Connected { session_id } => {
            if state.connection() != ConnectionState::Connecting {
                // A session id is bound once per connection; late or repeated ones are stale.
                scout_warn!(
                    "connect event ignored while {} (session {:?})",
                    state.connection(),
                    state.session_id()
                );
                return (state, Vec::new());
            }
            if session_id.trim().is_empty() {
                scout_warn!("connect event without a session id ignored");
                return (state, Vec::new());
            }
            scout_info!("session {} ready", session_id);
            state.set_session_id(session_id.clone());
            state.set_connection(ConnectionState::Connected);
            vec![Effect::Notify(Notice::Ready { session_id })]
        }
        ChannelMsg::ResultBatch(batch) => {
            if !accepts_stream_events(&state) {
                scout_debug!("batch from {} ignored while {}", batch.source, state.connection());
                return (state, Vec::new());
            }
            state
                .accept_batch(batch)
                .into_iter()
                .map(|listing| Effect::Notify(Notice::ResultAppended(listing)))
                .collect()
        }
        ChannelMsg::Progress { percentage } => {
            if !accepts_stream_events(&state) {
                scout_debug!("progress ignored while {}", state.connection());
                return (state, Vec::new());
            }
            let clamped = state.apply_progress(percentage);
            vec![Effect::Notify(Notice::Progress(clamped))]
        }
        ChannelMsg::RemoteWarning(message) => {
            if !accepts_stream_events(&state) {
                scout_debug!("warning ignored while {}: {}", state.connection(), message);
                return (state, Vec::new());
            }
            let message = if message.trim().is_empty() {
                DEFAULT_WARNING.to_string()
            } else {
                message
            };
            state.set_warning(message.clone());
            vec![Effect::Notify(Notice::Warning(message))]
        }
        ChannelMsg::Completed(summary) => {
            if !accepts_stream_events(&state) {
                scout_debug!("completion ignored while {}", state.connection());
                return (state, Vec::new());
            }
            scout_info!(
                "job {:?} completed in {} ms",
                state.active_job(),
                summary.total_time_ms
            );
            state.apply_completion(summary);
            state.end_job();
            state.set_connection(ConnectionState::Connected);
            vec![Effect::Notify(Notice::Completed(summary))]
        }
        ChannelMsg::Lost { reason } => {
            let channel_live = state.session_id().is_some()
                || matches!(
                    state.connection(),
                    ConnectionState::Connecting
                        | ConnectionState::Connected
                        | ConnectionState::Submitting
                );
            if state.mode() == Some(JobMode::Bulk) || !channel_live {
                scout_debug!("channel loss ignored: {}", reason);
                return (state, Vec::new());
            }
            let job_aborted = state.is_job_live();
            scout_warn!(
                "channel lost while {} (job aborted: {}): {}",
                state.connection(),
                job_aborted,
                reason
            );
            state.clear_session();
            vec![
                Effect::CloseChannel,
                Effect::Notify(Notice::Disconnected { job_aborted }),
            ]
        }
    };

    (state, effects)
}

fn accepts_stream_events(state: &AppState) -> bool {
    state.is_job_live() && state.mode() == Some(JobMode::Streaming)
}
