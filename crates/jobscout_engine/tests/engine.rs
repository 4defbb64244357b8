use std::thread;
use std::time::{Duration, Instant};

use jobscout_engine::{
    ChannelEvent, ChannelFault, ChannelSettings, CommandError, CommandSettings, EngineEvent,
    EngineHandle, RELEASE_GRACE,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(server: &MockServer) -> EngineHandle {
    let base_url = format!("{}/api/jobs", server.uri());
    EngineHandle::new(
        ChannelSettings {
            base_url: base_url.clone(),
            ..ChannelSettings::default()
        },
        CommandSettings {
            base_url,
            ..CommandSettings::default()
        },
    )
}

/// Blocks until `pred` matches an event or the deadline passes.
fn wait_for(engine: &EngineHandle, pred: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            let done = pred(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }
    panic!("event not observed; saw {seen:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_queues_channel_and_command_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "event: connect\ndata: {\"emitterId\":\"e9\"}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/scrape/e9"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/scrape/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let seen = tokio::task::spawn_blocking(move || {
        engine.open_channel(1);
        let mut seen = wait_for(&engine, |event| {
            matches!(event, EngineEvent::ChannelLost { .. })
        });
        engine.submit(1, "e9", "golang");
        seen.extend(wait_for(&engine, |event| {
            matches!(event, EngineEvent::SubmitAccepted { .. })
        }));
        engine.submit(2, "gone", "golang");
        seen.extend(wait_for(&engine, |event| {
            matches!(event, EngineEvent::SubmitFailed { .. })
        }));
        seen
    })
    .await
    .expect("blocking task");

    assert_eq!(
        seen[0],
        EngineEvent::Channel {
            channel: 1,
            event: ChannelEvent::Connected {
                session_id: "e9".to_string()
            },
        }
    );
    assert_eq!(
        seen[1],
        EngineEvent::ChannelLost {
            channel: 1,
            fault: ChannelFault::Closed,
        }
    );
    assert!(seen.contains(&EngineEvent::SubmitAccepted { job_id: 1 }));
    assert!(seen.contains(&EngineEvent::SubmitFailed {
        job_id: 2,
        error: CommandError::HttpStatus(404)
    }));
}

#[tokio::test(flavor = "multi_thread")]
async fn reopened_channel_events_carry_the_new_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/connect"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "event: connect\ndata: {\"emitterId\":\"e2\"}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let seen = tokio::task::spawn_blocking(move || {
        engine.open_channel(1);
        engine.close_channel();
        engine.open_channel(2);
        wait_for(&engine, |event| {
            matches!(event, EngineEvent::ChannelLost { channel: 2, .. })
        })
    })
    .await
    .expect("blocking task");

    assert!(seen.contains(&EngineEvent::Channel {
        channel: 2,
        event: ChannelEvent::Connected {
            session_id: "e2".to_string()
        },
    }));
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_waits_for_pending_release() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/jobs/disconnect/e1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    let finished = tokio::task::spawn_blocking(move || {
        engine.release("e1");
        let finished = engine.shutdown(RELEASE_GRACE + Duration::from_secs(1));
        // Commands after shutdown go nowhere.
        engine.release("e1");
        finished
    })
    .await
    .expect("blocking task");

    assert!(finished);
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_engine_still_sends_pending_release() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/jobs/disconnect/e1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    tokio::task::spawn_blocking(move || {
        engine.release("e1");
        drop(engine);
        let deadline = Instant::now() + RELEASE_GRACE;
        while Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
    })
    .await
    .expect("blocking task");

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}
