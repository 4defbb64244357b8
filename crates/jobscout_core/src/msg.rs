use crate::{ChannelId, CompletionSummary, JobId, SourceResultBatch};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked for a push channel.
    OpenRequested,
    /// Something arrived on, or happened to, the push channel opened as `channel`.
    Channel { channel: ChannelId, event: ChannelMsg },
    /// User submitted keywords for a streaming job.
    KeywordsSubmitted(String),
    /// User submitted keywords for a single-response job.
    BulkSubmitted(String),
    /// The service acknowledged the submit command.
    SubmitAccepted { job_id: JobId },
    /// The submit command failed; the job never started.
    SubmitFailed { job_id: JobId, message: String },
    /// The single response of a bulk job.
    BulkCompleted {
        job_id: JobId,
        batches: Vec<SourceResultBatch>,
        summary: CompletionSummary,
    },
    /// User-initiated teardown.
    DisconnectRequested,
    NoOp,
}

/// Push-channel traffic. Only applied when it comes from the current channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMsg {
    /// The channel delivered its session identifier.
    Connected { session_id: String },
    /// One source's partial results.
    ResultBatch(SourceResultBatch),
    /// Completion estimate from the service.
    Progress { percentage: f64 },
    /// Non-fatal error reported by the service.
    RemoteWarning(String),
    /// The streaming job finished.
    Completed(CompletionSummary),
    /// The channel failed or ended.
    Lost { reason: String },
}
