use std::time::Duration;

use jobscout_core::{
    ChannelId, ChannelMsg, CompletionSummary, JobId, Msg, ResultItem, SourceResultBatch,
};
use jobscout_engine::{ChannelEvent, EngineEvent, EngineHandle, SiteBatch};

/// The I/O side the controller drives.
pub trait Backend {
    /// Events from this channel must be reported with the same `channel`.
    fn open_channel(&self, channel: ChannelId);
    fn close_channel(&self);
    fn submit_job(&self, job_id: JobId, session_id: &str, keywords: &str);
    fn submit_bulk(&self, job_id: JobId, keywords: &str);
    /// Fire-and-forget; must not block.
    fn release_session(&self, session_id: &str);
    fn try_recv(&self) -> Option<EngineEvent>;
    fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent>;
}

impl Backend for EngineHandle {
    fn open_channel(&self, channel: ChannelId) {
        EngineHandle::open_channel(self, channel);
    }

    fn close_channel(&self) {
        EngineHandle::close_channel(self);
    }

    fn submit_job(&self, job_id: JobId, session_id: &str, keywords: &str) {
        self.submit(job_id, session_id, keywords);
    }

    fn submit_bulk(&self, job_id: JobId, keywords: &str) {
        EngineHandle::submit_bulk(self, job_id, keywords);
    }

    fn release_session(&self, session_id: &str) {
        self.release(session_id);
    }

    fn try_recv(&self) -> Option<EngineEvent> {
        EngineHandle::try_recv(self)
    }

    fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        EngineHandle::recv_timeout(self, timeout)
    }
}

/// Maps an engine event to a core message. Malformed events have no message.
pub(crate) fn to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Channel { channel, event } => Msg::Channel {
            channel,
            event: channel_msg(event),
        },
        EngineEvent::ChannelLost { channel, fault } => Msg::Channel {
            channel,
            event: ChannelMsg::Lost {
                reason: fault.to_string(),
            },
        },
        EngineEvent::SubmitAccepted { job_id } => Msg::SubmitAccepted { job_id },
        EngineEvent::SubmitFailed { job_id, error } => Msg::SubmitFailed {
            job_id,
            message: format!("Failed to start scraping: {error}"),
        },
        EngineEvent::BulkCompleted { job_id, response } => Msg::BulkCompleted {
            job_id,
            batches: response.batches.into_iter().map(map_batch).collect(),
            summary: CompletionSummary {
                total_time_ms: response.total_time_ms,
            },
        },
        EngineEvent::Malformed(_) => return None,
    };
    Some(msg)
}

fn channel_msg(event: ChannelEvent) -> ChannelMsg {
    match event {
        ChannelEvent::Connected { session_id } => ChannelMsg::Connected { session_id },
        ChannelEvent::JobData(batch) => ChannelMsg::ResultBatch(map_batch(batch)),
        ChannelEvent::Progress { percentage } => ChannelMsg::Progress { percentage },
        ChannelEvent::Error { message } => ChannelMsg::RemoteWarning(message),
        ChannelEvent::Complete { total_time_ms } => {
            ChannelMsg::Completed(CompletionSummary { total_time_ms })
        }
    }
}

fn map_batch(batch: SiteBatch) -> SourceResultBatch {
    SourceResultBatch {
        source: batch.site,
        items: batch
            .listings
            .into_iter()
            .map(|listing| ResultItem {
                title: listing.title,
                company: listing.company,
                url: listing.url,
            })
            .collect(),
    }
}
