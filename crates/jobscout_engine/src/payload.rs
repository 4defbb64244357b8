use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::sse::SseFrame;
use crate::{BulkResponse, ChannelEvent, MalformedEvent, RawListing, SiteBatch};

pub(crate) const EVENT_CONNECT: &str = "connect";
pub(crate) const EVENT_JOB_DATA: &str = "job_data";
pub(crate) const EVENT_PROGRESS: &str = "progress";
pub(crate) const EVENT_ERROR: &str = "error";
pub(crate) const EVENT_COMPLETE: &str = "complete";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectPayload {
    emitter_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobDataPayload {
    site: String,
    data: Vec<ListingPayload>,
}

#[derive(Debug, Deserialize)]
struct ListingPayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressPayload {
    percentage: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletePayload {
    total_time: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkPayload {
    data: Vec<JobDataPayload>,
    total_time: f64,
}

impl From<JobDataPayload> for SiteBatch {
    fn from(payload: JobDataPayload) -> Self {
        SiteBatch {
            site: payload.site,
            listings: payload
                .data
                .into_iter()
                .map(|item| RawListing {
                    title: item.title,
                    company: item.company,
                    url: item.url,
                })
                .collect(),
        }
    }
}

impl BulkPayload {
    pub(crate) fn into_response(self) -> Result<BulkResponse, String> {
        Ok(BulkResponse {
            total_time_ms: compute_time_ms(self.total_time)?,
            batches: self.data.into_iter().map(SiteBatch::from).collect(),
        })
    }
}

/// Parses and validates one push-channel frame.
///
/// Returns `Ok(None)` for event names this client does not handle.
pub fn decode_event(frame: &SseFrame) -> Result<Option<ChannelEvent>, MalformedEvent> {
    let event = match frame.event.as_str() {
        EVENT_CONNECT => {
            let payload: ConnectPayload = parse(frame)?;
            if payload.emitter_id.trim().is_empty() {
                return Err(MalformedEvent::new(&frame.event, "empty emitterId"));
            }
            ChannelEvent::Connected {
                session_id: payload.emitter_id,
            }
        }
        EVENT_JOB_DATA => {
            let payload: JobDataPayload = parse(frame)?;
            ChannelEvent::JobData(payload.into())
        }
        EVENT_PROGRESS => {
            let payload: ProgressPayload = parse(frame)?;
            ChannelEvent::Progress {
                percentage: payload.percentage,
            }
        }
        EVENT_ERROR => {
            let payload: ErrorPayload = parse(frame)?;
            ChannelEvent::Error {
                message: payload.error.unwrap_or_default(),
            }
        }
        EVENT_COMPLETE => {
            let payload: CompletePayload = parse(frame)?;
            let total_time_ms = compute_time_ms(payload.total_time)
                .map_err(|reason| MalformedEvent::new(&frame.event, reason))?;
            ChannelEvent::Complete { total_time_ms }
        }
        _ => return Ok(None),
    };
    Ok(Some(event))
}

fn parse<T: DeserializeOwned>(frame: &SseFrame) -> Result<T, MalformedEvent> {
    serde_json::from_str(&frame.data).map_err(|err| MalformedEvent::new(&frame.event, err.to_string()))
}

fn compute_time_ms(value: f64) -> Result<u64, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("totalTime must be a non-negative number, got {value}"));
    }
    Ok(value.round() as u64)
}
