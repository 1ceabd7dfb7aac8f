use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracks_engine::{
    ChannelEvent, ChannelSlot, ChannelState, ClientSettings, EngineEvent, EventSink, Generation,
    ProgressChannel,
};
use url::Url;

struct TestSink(mpsc::UnboundedSender<EngineEvent>);

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.0.send(event);
    }
}

fn sink() -> (Arc<dyn EventSink>, mpsc::UnboundedReceiver<EngineEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(TestSink(tx)), rx)
}

/// Accepts websocket connections forever and hands each one to `script`.
async fn serve<F, Fut>(script: F) -> Url
where
    F: Fn(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                tokio::spawn(script(ws));
            }
        }
    });
    Url::parse(&format!("ws://{addr}/ws")).unwrap()
}

async fn read_task_id(ws: &mut WebSocketStream<TcpStream>) -> String {
    match ws.next().await {
        Some(Ok(Message::Text(text))) => text.as_str().to_string(),
        other => panic!("expected task id frame, got {other:?}"),
    }
}

async fn send_text(ws: &mut WebSocketStream<TcpStream>, text: &str) {
    let _ = ws.send(Message::text(text)).await;
}

/// Keeps the server side open until the client goes away.
async fn drain(ws: &mut WebSocketStream<TcpStream>) {
    while let Some(Ok(_)) = ws.next().await {}
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> EngineEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("sink dropped")
}

/// Collects channel events up to and including `Closed`.
async fn until_closed(rx: &mut mpsc::UnboundedReceiver<EngineEvent>) -> Vec<(Generation, ChannelEvent)> {
    let mut seen = Vec::new();
    loop {
        match next_event(rx).await {
            EngineEvent::Channel { generation, event } => {
                let done = event == ChannelEvent::Closed;
                seen.push((generation, event));
                if done {
                    return seen;
                }
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test]
async fn task_id_is_sent_then_progress_is_forwarded_in_order() {
    let (ids_tx, mut ids_rx) = mpsc::unbounded_channel();
    let url = serve(move |mut ws| {
        let ids_tx = ids_tx.clone();
        async move {
            let _ = ids_tx.send(read_task_id(&mut ws).await);
            send_text(&mut ws, r#"{"progress": 30}"#).await;
            send_text(&mut ws, r#"{"progress": 70}"#).await;
            send_text(&mut ws, r#"{"status": "completed", "tracks_created": 5}"#).await;
            drain(&mut ws).await;
        }
    })
    .await;

    let (sink, mut rx) = sink();
    let mut channel = ProgressChannel::new(1);
    channel.connect(&url, "task-123".to_string(), sink);

    let events = until_closed(&mut rx).await;
    assert_eq!(
        events,
        vec![
            (1, ChannelEvent::Progress(30.0)),
            (1, ChannelEvent::Progress(70.0)),
            (1, ChannelEvent::Completed { tracks_created: 5 }),
            (1, ChannelEvent::Closed),
        ]
    );
    assert_eq!(ids_rx.recv().await.as_deref(), Some("task-123"));
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let url = serve(|mut ws| async move {
        read_task_id(&mut ws).await;
        send_text(&mut ws, "not json").await;
        send_text(&mut ws, r#"{"hello": 1}"#).await;
        send_text(&mut ws, r#"{"progress": 10}"#).await;
        send_text(&mut ws, r#"{"status": "completed", "tracks_created": 2}"#).await;
        drain(&mut ws).await;
    })
    .await;

    let (sink, mut rx) = sink();
    let mut channel = ProgressChannel::new(4);
    channel.connect(&url, "t".to_string(), sink);

    let events = until_closed(&mut rx).await;
    assert_eq!(
        events,
        vec![
            (4, ChannelEvent::Progress(10.0)),
            (4, ChannelEvent::Completed { tracks_created: 2 }),
            (4, ChannelEvent::Closed),
        ]
    );
}

#[tokio::test]
async fn reopening_drops_events_of_previous_channel() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let url = serve(move |mut ws| {
        let seen_tx = seen_tx.clone();
        async move {
            let task_id = read_task_id(&mut ws).await;
            let _ = seen_tx.send(task_id.clone());
            if task_id == "task-a" {
                // Old job keeps talking after the client moved on.
                tokio::time::sleep(Duration::from_millis(200)).await;
                send_text(&mut ws, r#"{"progress": 10}"#).await;
                send_text(&mut ws, r#"{"status": "completed", "tracks_created": 99}"#).await;
            } else {
                send_text(&mut ws, r#"{"progress": 55}"#).await;
                send_text(&mut ws, r#"{"status": "completed", "tracks_created": 1}"#).await;
            }
            drain(&mut ws).await;
        }
    })
    .await;

    let (sink, mut rx) = sink();
    let mut slot = ChannelSlot::new(url);
    slot.open(1, "task-a".to_string(), sink.clone());
    assert_eq!(seen_rx.recv().await.as_deref(), Some("task-a"));

    slot.open(2, "task-b".to_string(), sink);

    let events = until_closed(&mut rx).await;
    assert!(events.iter().all(|(generation, _)| *generation == 2));
    assert_eq!(
        events.last(),
        Some(&(2, ChannelEvent::Closed))
    );

    // Give the old connection time to misbehave.
    tokio::time::sleep(Duration::from_millis(400)).await;
    while let Ok(event) = rx.try_recv() {
        panic!("event delivered after replacement: {event:?}");
    }
}

#[tokio::test]
async fn close_twice_is_silent() {
    let (ready_tx, mut ready_rx) = mpsc::unbounded_channel();
    let url = serve(move |mut ws| {
        let ready_tx = ready_tx.clone();
        async move {
            read_task_id(&mut ws).await;
            let _ = ready_tx.send(());
            drain(&mut ws).await;
        }
    })
    .await;

    let (sink, mut rx) = sink();
    let mut channel = ProgressChannel::new(7);
    channel.connect(&url, "t".to_string(), sink);
    ready_rx.recv().await.expect("server saw task id");
    assert_eq!(channel.state(), ChannelState::Open);

    channel.close();
    channel.close();
    assert_eq!(channel.state(), ChannelState::Closed);

    match tokio::time::timeout(Duration::from_millis(300), rx.recv()).await {
        Err(_) | Ok(None) => {}
        Ok(Some(event)) => panic!("close produced a notification: {event:?}"),
    }
}

#[tokio::test]
async fn server_close_without_completion_reports_closed() {
    let url = serve(|mut ws| async move {
        read_task_id(&mut ws).await;
        send_text(&mut ws, r#"{"progress": 12.5}"#).await;
        let _ = ws.close(None).await;
    })
    .await;

    let (sink, mut rx) = sink();
    let mut channel = ProgressChannel::new(2);
    channel.connect(&url, "t".to_string(), sink);

    let events = until_closed(&mut rx).await;
    assert_eq!(
        events,
        vec![(2, ChannelEvent::Progress(12.5)), (2, ChannelEvent::Closed)]
    );
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();

    let (sink, mut rx) = sink();
    let mut channel = ProgressChannel::new(9);
    channel.connect(&url, "t".to_string(), sink);

    let events = until_closed(&mut rx).await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], (9, ChannelEvent::TransportError(_))));
    assert_eq!(events[1], (9, ChannelEvent::Closed));
}

#[tokio::test]
async fn secure_progress_url_attempts_a_tls_handshake() {
    // Plain TCP peer that hangs up straight away, so the handshake itself fails.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });
    let settings = ClientSettings::with_base_url(&format!("https://{addr}")).unwrap();
    let url = settings.progress_endpoint().unwrap();
    assert_eq!(url.scheme(), "wss");

    let (sink, mut rx) = sink();
    let mut channel = ProgressChannel::new(6);
    channel.connect(&url, "t".to_string(), sink);

    let events = until_closed(&mut rx).await;
    assert_eq!(events.len(), 2);
    match &events[0] {
        (6, ChannelEvent::TransportError(message)) => {
            assert!(
                !message.contains("TLS support not compiled in"),
                "wss is unsupported: {message}"
            );
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(events[1], (6, ChannelEvent::Closed));
}
