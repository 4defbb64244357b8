//! Jobscout engine: push channel, command calls and the background runtime.
mod channel;
mod commands;
mod engine;
mod endpoint;
mod payload;
mod sse;
mod types;

pub use channel::{ChannelClient, ChannelHandler, ChannelSettings};
pub use commands::{CommandClient, CommandSettings, ReqwestCommandClient};
pub use endpoint::endpoint;
pub use engine::{EngineHandle, RELEASE_GRACE};
pub use payload::decode_event;
pub use sse::{SseDecoder, SseFrame};
pub use types::{
    BulkResponse, ChannelEvent, ChannelFault, ChannelId, CommandError, EngineEvent, JobId,
    MalformedEvent, RawListing, SiteBatch,
};
