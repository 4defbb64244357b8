use crate::{ChannelId, CompletionSummary, JobId, Listing};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenChannel { channel: ChannelId },
    SubmitJob {
        job_id: JobId,
        session_id: String,
        keywords: String,
    },
    SubmitBulk { job_id: JobId, keywords: String },
    CloseChannel,
    /// Fire-and-forget release of the server-side session.
    ReleaseSession { session_id: String },
    Notify(Notice),
}

/// Observer-facing outcome of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Ready { session_id: String },
    ResultAppended(Listing),
    Progress(f64),
    Warning(String),
    Completed(CompletionSummary),
    SubmissionFailed(String),
    /// The session ended. `job_aborted` is set when a job was live and never completed.
    Disconnected { job_aborted: bool },
}
