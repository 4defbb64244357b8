use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use jobscout_logging::{scout_debug, scout_info, scout_trace, scout_warn};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::endpoint::endpoint;
use crate::payload::decode_event;
use crate::sse::{SseDecoder, SseFrame};
use crate::{ChannelEvent, ChannelFault, MalformedEvent, SiteBatch};

const CONNECT_PATH: &str = "connect";

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub max_event_bytes: usize,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/jobs".to_string(),
            connect_timeout: Duration::from_secs(10),
            max_event_bytes: 1024 * 1024,
        }
    }
}

/// Receives typed push-channel events. Called from the channel's reader task.
pub trait ChannelHandler: Send + Sync {
    fn on_connected(&self, session_id: String);
    fn on_result_batch(&self, batch: SiteBatch);
    fn on_progress(&self, percentage: f64);
    fn on_error(&self, message: String);
    fn on_complete(&self, total_time_ms: u64);
    /// The channel terminated without being asked to. Called at most once per `open`.
    fn on_disconnected(&self, fault: ChannelFault);
    /// A payload failed validation and was dropped.
    fn on_malformed_event(&self, event: MalformedEvent);
}

struct ActiveChannel {
    cancel: CancellationToken,
    live: Arc<AtomicBool>,
}

/// Owns at most one live push channel.
pub struct ChannelClient {
    settings: ChannelSettings,
    runtime: Handle,
    active: Option<ActiveChannel>,
}

impl ChannelClient {
    pub fn new(settings: ChannelSettings, runtime: Handle) -> Self {
        Self {
            settings,
            runtime,
            active: None,
        }
    }

    /// Starts the reader task unless one is already live.
    ///
    /// Failures are reported through [`ChannelHandler::on_disconnected`], never returned.
    pub fn open(&mut self, handler: Arc<dyn ChannelHandler>) {
        if self.is_open() {
            scout_debug!("channel already open");
            return;
        }
        if let Some(stale) = self.active.take() {
            stale.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let live = Arc::new(AtomicBool::new(true));
        self.active = Some(ActiveChannel {
            cancel: cancel.clone(),
            live: live.clone(),
        });

        let settings = self.settings.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    live.store(false, Ordering::Release);
                    scout_debug!("channel closed on request");
                }
                fault = read_channel(&settings, handler.as_ref()) => {
                    live.store(false, Ordering::Release);
                    scout_warn!("channel terminated: {}", fault);
                    handler.on_disconnected(fault);
                }
            }
        });
    }

    /// Stops the reader task. Safe to call repeatedly or when never opened.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            scout_info!("channel close requested");
        }
    }

    pub fn is_open(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.live.load(Ordering::Acquire))
    }
}

impl Drop for ChannelClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Runs the channel until it fails; the returned fault says why.
async fn read_channel(settings: &ChannelSettings, handler: &dyn ChannelHandler) -> ChannelFault {
    let url = match endpoint(&settings.base_url, &[CONNECT_PATH]) {
        Ok(url) => url,
        Err(err) => return ChannelFault::InvalidUrl(err),
    };
    let client = match reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .build()
    {
        Ok(client) => client,
        Err(err) => return ChannelFault::Connect(err.to_string()),
    };

    scout_info!("opening channel {}", url);
    let response = match client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => return ChannelFault::Connect(err.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        return ChannelFault::HttpStatus(status.as_u16());
    }

    let mut decoder = SseDecoder::new(settings.max_event_bytes);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => return ChannelFault::Stream(err.to_string()),
        };
        let frames = match decoder.feed(&chunk) {
            Ok(frames) => frames,
            Err(fault) => return fault,
        };
        for frame in frames {
            dispatch(&frame, handler);
        }
    }
    ChannelFault::Closed
}

fn dispatch(frame: &SseFrame, handler: &dyn ChannelHandler) {
    scout_trace!("frame `{}`: {} bytes", frame.event, frame.data.len());
    match decode_event(frame) {
        Ok(Some(event)) => match event {
            ChannelEvent::Connected { session_id } => handler.on_connected(session_id),
            ChannelEvent::JobData(batch) => handler.on_result_batch(batch),
            ChannelEvent::Progress { percentage } => handler.on_progress(percentage),
            ChannelEvent::Error { message } => handler.on_error(message),
            ChannelEvent::Complete { total_time_ms } => handler.on_complete(total_time_ms),
        },
        Ok(None) => scout_debug!("ignoring unknown event `{}`", frame.event),
        Err(malformed) => {
            scout_warn!("{}", malformed);
            handler.on_malformed_event(malformed);
        }
    }
}
