use thiserror::Error;

pub type JobId = u64;

/// Generation of a push channel, assigned by whoever asks for it to be opened.
pub type ChannelId = u64;

/// One result entry exactly as the service sent it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawListing {
    pub title: Option<String>,
    pub company: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBatch {
    pub site: String,
    pub listings: Vec<RawListing>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResponse {
    pub batches: Vec<SiteBatch>,
    pub total_time_ms: u64,
}

/// A validated push-channel event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected { session_id: String },
    JobData(SiteBatch),
    Progress { percentage: f64 },
    Error { message: String },
    Complete { total_time_ms: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Channel {
        channel: ChannelId,
        event: ChannelEvent,
    },
    ChannelLost {
        channel: ChannelId,
        fault: ChannelFault,
    },
    Malformed(MalformedEvent),
    SubmitAccepted { job_id: JobId },
    SubmitFailed { job_id: JobId, error: CommandError },
    BulkCompleted { job_id: JobId, response: BulkResponse },
}

/// A push-channel event whose payload could not be parsed or validated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed `{event}` event: {reason}")]
pub struct MalformedEvent {
    pub event: String,
    pub reason: String,
}

impl MalformedEvent {
    pub(crate) fn new(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            reason: reason.into(),
        }
    }
}

/// Why the push channel terminated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelFault {
    #[error("invalid channel url: {0}")]
    InvalidUrl(String),
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("channel rejected with http status {0}")]
    HttpStatus(u16),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("stream closed by server")]
    Closed,
    #[error("event larger than {limit} bytes")]
    FrameTooLarge { limit: usize },
    #[error("engine stopped")]
    EngineStopped,
}

/// Failure of a one-shot command call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
