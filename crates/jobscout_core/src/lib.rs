//! Jobscout core: pure session state machine, result aggregation and view-model helpers.
mod aggregator;
mod effect;
mod error;
mod msg;
mod progress;
mod state;
mod update;
mod view_model;

pub use aggregator::{Listing, ResultAggregator, ResultItem, SourceResultBatch};
pub use effect::{Effect, Notice};
pub use error::SessionError;
pub use msg::{ChannelMsg, Msg};
pub use progress::{CompletionSummary, ProgressTracker};
pub use state::{AppState, ChannelId, ConnectionState, JobId, JobMode, Session, DEFAULT_WARNING};
pub use update::update;
pub use view_model::{ListingView, SessionViewModel};
