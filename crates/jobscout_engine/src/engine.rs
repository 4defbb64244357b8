use std::cell::{Cell, RefCell};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use jobscout_logging::{scout_debug, scout_error, scout_info, scout_warn};

use crate::channel::{ChannelClient, ChannelHandler, ChannelSettings};
use crate::commands::{CommandClient, CommandSettings, ReqwestCommandClient};
use crate::{ChannelEvent, ChannelFault, ChannelId, EngineEvent, JobId, MalformedEvent, SiteBatch};

/// How long a stopping engine waits for outstanding session releases.
pub const RELEASE_GRACE: Duration = Duration::from_secs(2);

const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

enum EngineCommand {
    OpenChannel {
        channel: ChannelId,
    },
    CloseChannel,
    Submit {
        job_id: JobId,
        session_id: String,
        keywords: String,
    },
    Release {
        session_id: String,
    },
    SubmitBulk {
        job_id: JobId,
        keywords: String,
    },
    Shutdown,
}

/// Runs all network I/O on a background thread and queues the results.
///
/// Commands never block the caller; outcomes come back through
/// [`EngineHandle::try_recv`] and [`EngineHandle::recv_timeout`].
/// Dropping the handle stops the engine in the background; use
/// [`EngineHandle::shutdown`] to wait for pending releases before exiting.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    thread: RefCell<Option<JoinHandle<()>>>,
    last_channel: Cell<ChannelId>,
    stopped: Cell<bool>,
    shut_down: Cell<bool>,
}

impl EngineHandle {
    pub fn new(channel: ChannelSettings, commands: CommandSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = match thread::Builder::new()
            .name("jobscout-engine".to_string())
            .spawn(move || run_engine(channel, commands, cmd_rx, event_tx))
        {
            Ok(worker) => Some(worker),
            Err(err) => {
                scout_error!("failed to start engine thread: {}", err);
                None
            }
        };

        Self {
            cmd_tx,
            event_rx,
            thread: RefCell::new(worker),
            last_channel: Cell::new(0),
            stopped: Cell::new(false),
            shut_down: Cell::new(false),
        }
    }

    /// Opens the push channel as generation `channel`, replacing any live one
    /// of an older generation. Its events and its loss carry that generation.
    pub fn open_channel(&self, channel: ChannelId) {
        self.last_channel.set(channel);
        self.send(EngineCommand::OpenChannel { channel });
    }

    pub fn close_channel(&self) {
        self.send(EngineCommand::CloseChannel);
    }

    pub fn submit(&self, job_id: JobId, session_id: impl Into<String>, keywords: impl Into<String>) {
        self.send(EngineCommand::Submit {
            job_id,
            session_id: session_id.into(),
            keywords: keywords.into(),
        });
    }

    /// Fire-and-forget; failures are only logged. A later [`shutdown`](Self::shutdown)
    /// waits for it.
    pub fn release(&self, session_id: impl Into<String>) {
        self.send(EngineCommand::Release {
            session_id: session_id.into(),
        });
    }

    pub fn submit_bulk(&self, job_id: JobId, keywords: impl Into<String>) {
        self.send(EngineCommand::SubmitBulk {
            job_id,
            keywords: keywords.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => self.stopped_once(),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => self.stopped_once(),
        }
    }

    /// Stops the engine and blocks for at most `grace` while outstanding
    /// session releases finish. Returns whether the engine thread exited in time.
    ///
    /// Commands sent afterwards are dropped.
    pub fn shutdown(&self, grace: Duration) -> bool {
        if self.shut_down.replace(true) {
            return true;
        }
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        let Some(worker) = self.thread.borrow_mut().take() else {
            return true;
        };

        let deadline = Instant::now() + grace;
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                scout_warn!("engine still busy after {:?}; not waiting", grace);
                return false;
            }
            thread::sleep(SHUTDOWN_POLL);
        }
        if worker.join().is_err() {
            scout_error!("engine thread panicked");
        }
        true
    }

    fn send(&self, command: EngineCommand) {
        if self.shut_down.get() {
            scout_debug!("engine shut down; command dropped");
        } else if self.cmd_tx.send(command).is_err() {
            scout_warn!("engine is not running; command dropped");
        }
    }

    /// Reports a dead engine as a loss of the last opened channel, once.
    fn stopped_once(&self) -> Option<EngineEvent> {
        if self.stopped.replace(true) {
            None
        } else {
            Some(EngineEvent::ChannelLost {
                channel: self.last_channel.get(),
                fault: ChannelFault::EngineStopped,
            })
        }
    }
}

fn run_engine(
    channel_settings: ChannelSettings,
    command_settings: CommandSettings,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            scout_error!("failed to build tokio runtime: {}", err);
            return;
        }
    };
    let commands: Arc<dyn CommandClient> = match ReqwestCommandClient::new(command_settings) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            scout_error!("failed to build http client: {}", err);
            return;
        }
    };

    let mut push = ChannelClient::new(channel_settings, runtime.handle().clone());
    let mut open_channel: Option<ChannelId> = None;
    let mut releases: Vec<tokio::task::JoinHandle<()>> = Vec::new();

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::OpenChannel { channel } => {
                if open_channel.is_some_and(|open| open != channel) {
                    push.close();
                }
                open_channel = Some(channel);
                push.open(Arc::new(QueueHandler {
                    tx: event_tx.clone(),
                    channel,
                }));
            }
            EngineCommand::CloseChannel => {
                open_channel = None;
                push.close();
            }
            EngineCommand::Submit {
                job_id,
                session_id,
                keywords,
            } => {
                let commands = commands.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = match commands.submit(&session_id, &keywords).await {
                        Ok(()) => EngineEvent::SubmitAccepted { job_id },
                        Err(error) => EngineEvent::SubmitFailed { job_id, error },
                    };
                    let _ = event_tx.send(event);
                });
            }
            EngineCommand::Release { session_id } => {
                let commands = commands.clone();
                releases.retain(|task| !task.is_finished());
                releases.push(runtime.spawn(async move {
                    match commands.release(&session_id).await {
                        Ok(()) => scout_debug!("session {} released", session_id),
                        Err(err) => scout_debug!("release of {} failed: {}", session_id, err),
                    }
                }));
            }
            EngineCommand::SubmitBulk { job_id, keywords } => {
                let commands = commands.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = match commands.scrape_bulk(&keywords).await {
                        Ok(response) => EngineEvent::BulkCompleted { job_id, response },
                        Err(error) => EngineEvent::SubmitFailed { job_id, error },
                    };
                    let _ = event_tx.send(event);
                });
            }
            EngineCommand::Shutdown => break,
        }
    }

    push.close();
    releases.retain(|task| !task.is_finished());
    if !releases.is_empty() {
        scout_info!("waiting for {} session release(s)", releases.len());
        let pending = tokio::time::timeout(RELEASE_GRACE, join_all(releases));
        if runtime.block_on(pending).is_err() {
            scout_warn!("session release still pending after {:?}", RELEASE_GRACE);
        }
    }
    // Everything left (reader, submits) is abandoned.
    runtime.shutdown_background();
}

/// Forwards channel callbacks into the engine's event queue.
struct QueueHandler {
    tx: mpsc::Sender<EngineEvent>,
    channel: ChannelId,
}

impl QueueHandler {
    fn push(&self, event: ChannelEvent) {
        let _ = self.tx.send(EngineEvent::Channel {
            channel: self.channel,
            event,
        });
    }
}

impl ChannelHandler for QueueHandler {
    fn on_connected(&self, session_id: String) {
        self.push(ChannelEvent::Connected { session_id });
    }

    fn on_result_batch(&self, batch: SiteBatch) {
        self.push(ChannelEvent::JobData(batch));
    }

    fn on_progress(&self, percentage: f64) {
        self.push(ChannelEvent::Progress { percentage });
    }

    fn on_error(&self, message: String) {
        self.push(ChannelEvent::Error { message });
    }

    fn on_complete(&self, total_time_ms: u64) {
        self.push(ChannelEvent::Complete { total_time_ms });
    }

    fn on_disconnected(&self, fault: ChannelFault) {
        let _ = self.tx.send(EngineEvent::ChannelLost {
            channel: self.channel,
            fault,
        });
    }

    fn on_malformed_event(&self, event: MalformedEvent) {
        let _ = self.tx.send(EngineEvent::Malformed(event));
    }
}
