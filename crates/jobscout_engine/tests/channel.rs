use std::sync::Arc;
use std::time::Duration;

use jobscout_engine::{
    ChannelClient, ChannelFault, ChannelHandler, ChannelSettings, MalformedEvent, RawListing,
    SiteBatch,
};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq)]
enum Recorded {
    Connected(String),
    Batch(SiteBatch),
    Progress(f64),
    Error(String),
    Complete(u64),
    Disconnected(ChannelFault),
    Malformed(MalformedEvent),
}

struct Recorder {
    tx: mpsc::UnboundedSender<Recorded>,
}

impl ChannelHandler for Recorder {
    fn on_connected(&self, session_id: String) {
        let _ = self.tx.send(Recorded::Connected(session_id));
    }
    fn on_result_batch(&self, batch: SiteBatch) {
        let _ = self.tx.send(Recorded::Batch(batch));
    }
    fn on_progress(&self, percentage: f64) {
        let _ = self.tx.send(Recorded::Progress(percentage));
    }
    fn on_error(&self, message: String) {
        let _ = self.tx.send(Recorded::Error(message));
    }
    fn on_complete(&self, total_time_ms: u64) {
        let _ = self.tx.send(Recorded::Complete(total_time_ms));
    }
    fn on_disconnected(&self, fault: ChannelFault) {
        let _ = self.tx.send(Recorded::Disconnected(fault));
    }
    fn on_malformed_event(&self, event: MalformedEvent) {
        let _ = self.tx.send(Recorded::Malformed(event));
    }
}

fn recorder() -> (Arc<dyn ChannelHandler>, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder { tx }), rx)
}

fn settings(base_url: String) -> ChannelSettings {
    ChannelSettings {
        base_url,
        connect_timeout: Duration::from_secs(2),
        ..ChannelSettings::default()
    }
}

/// Collects callbacks until the channel reports a disconnect.
async fn collect_until_disconnect(rx: &mut mpsc::UnboundedReceiver<Recorded>) -> Vec<Recorded> {
    let mut seen = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("channel callback within timeout")
            .expect("recorder alive");
        let done = matches!(next, Recorded::Disconnected(_));
        seen.push(next);
        if done {
            return seen;
        }
    }
}

const JOB_STREAM: &str = "event: connect\n\
data: {\"emitterId\":\"e1\"}\n\
\n\
: keep-alive\n\
\n\
event: job_data\n\
data: {\"site\":\"indeed\",\"data\":[{\"title\":\"SWE\",\"company\":\"Acme\"},{\"url\":\"https://no.title\"}]}\n\
\n\
event: progress\n\
data: {\"percentage\":\"half\"}\n\
\n\
event: progress\n\
data: {\"percentage\":50}\n\
\n\
event: error\n\
data: {\"error\":\"glassdoor blocked\"}\n\
\n\
event: heartbeat\n\
data: {}\n\
\n\
event: complete\n\
data: {\"totalTime\":820}\n\
\n";

#[tokio::test]
async fn channel_dispatches_typed_events_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/connect"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(JOB_STREAM, "text/event-stream"))
        .mount(&server)
        .await;

    let (handler, mut rx) = recorder();
    let mut client = ChannelClient::new(
        settings(format!("{}/api/jobs", server.uri())),
        tokio::runtime::Handle::current(),
    );
    client.open(handler);

    let seen = collect_until_disconnect(&mut rx).await;
    assert_eq!(seen.len(), 7);
    assert_eq!(seen[0], Recorded::Connected("e1".to_string()));
    assert_eq!(
        seen[1],
        Recorded::Batch(SiteBatch {
            site: "indeed".to_string(),
            listings: vec![
                RawListing {
                    title: Some("SWE".to_string()),
                    company: Some("Acme".to_string()),
                    url: None,
                },
                RawListing {
                    title: None,
                    company: None,
                    url: Some("https://no.title".to_string()),
                },
            ],
        })
    );
    assert!(matches!(&seen[2], Recorded::Malformed(event) if event.event == "progress"));
    assert_eq!(seen[3], Recorded::Progress(50.0));
    assert_eq!(seen[4], Recorded::Error("glassdoor blocked".to_string()));
    assert_eq!(seen[5], Recorded::Complete(820));
    assert_eq!(seen[6], Recorded::Disconnected(ChannelFault::Closed));
    assert!(!client.is_open());
}

#[tokio::test]
async fn channel_reports_rejected_connection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/connect"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (handler, mut rx) = recorder();
    let mut client = ChannelClient::new(
        settings(format!("{}/api/jobs", server.uri())),
        tokio::runtime::Handle::current(),
    );
    client.open(handler);

    let seen = collect_until_disconnect(&mut rx).await;
    assert_eq!(seen, vec![Recorded::Disconnected(ChannelFault::HttpStatus(503))]);
}

#[tokio::test]
async fn channel_reports_invalid_base_url() {
    let (handler, mut rx) = recorder();
    let mut client = ChannelClient::new(
        settings("not a url".to_string()),
        tokio::runtime::Handle::current(),
    );
    client.open(handler);

    let seen = collect_until_disconnect(&mut rx).await;
    assert!(matches!(
        seen.as_slice(),
        [Recorded::Disconnected(ChannelFault::InvalidUrl(_))]
    ));
}

#[tokio::test]
async fn open_is_idempotent_and_close_is_silent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/connect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_raw("event: connect\ndata: {\"emitterId\":\"e1\"}\n\n", "text/event-stream"),
        )
        .expect(0..=1)
        .mount(&server)
        .await;

    let (handler, mut rx) = recorder();
    let mut client = ChannelClient::new(settings(server.uri()), tokio::runtime::Handle::current());
    client.close();
    assert!(!client.is_open());

    client.open(handler.clone());
    assert!(client.is_open());
    client.open(handler);
    assert!(client.is_open());

    tokio::time::sleep(Duration::from_millis(100)).await;
    client.close();
    client.close();
    assert!(!client.is_open());

    // A requested close never reports a disconnect.
    let next = tokio::time::timeout(Duration::from_millis(800), rx.recv()).await;
    assert!(!matches!(next, Ok(Some(_))), "unexpected callback: {next:?}");
    drop(client);
    server.verify().await;
}
