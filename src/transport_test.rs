use super::*;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async};

type Peer = WebSocketStream<TcpStream>;

const IDLE: Duration = Duration::from_secs(50);

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    (listener, format!("ws://{addr}"))
}

async fn accept(listener: &TcpListener) -> Peer {
    let (tcp, _) = timeout(Duration::from_secs(2), listener.accept())
        .await
        .expect("accept timed out")
        .expect("accept failed");
    accept_async(tcp).await.expect("server handshake")
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event timed out")
        .expect("event channel closed")
}

async fn assert_events_end(events: &mut mpsc::UnboundedReceiver<TransportEvent>) {
    let next = timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event channel should close");
    assert_eq!(next, None, "no events expected after close");
}

async fn next_peer_message(peer: &mut Peer) -> Option<Message> {
    timeout(Duration::from_secs(2), peer.next())
        .await
        .expect("peer recv timed out")
        .map(|msg| msg.expect("peer recv failed"))
}

// =============================================================
// Lifecycle
// =============================================================

#[tokio::test]
async fn open_emits_open_then_passes_frames_through_unexamined() {
    let (listener, url) = listen().await;
    let (handle, mut events) = open(&url, IDLE);
    let mut peer = accept(&listener).await;

    assert_eq!(next_event(&mut events).await, TransportEvent::Open);
    assert_eq!(handle.state(), ConnectionState::Open);

    peer.send(Message::Text("not even json".to_owned().into())).await.expect("peer send");
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Message(Payload::Text("not even json".to_owned()))
    );

    peer.send(Message::Binary(vec![1, 2, 3].into())).await.expect("peer send");
    assert_eq!(next_event(&mut events).await, TransportEvent::Message(Payload::Binary(vec![1, 2, 3])));
}

#[tokio::test]
async fn send_forwards_text_verbatim() {
    let (listener, url) = listen().await;
    let (handle, mut events) = open(&url, IDLE);
    let mut peer = accept(&listener).await;
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);

    handle.send(Payload::Text("  hello\nworld ".to_owned())).expect("send while open");

    match next_peer_message(&mut peer).await {
        Some(Message::Text(text)) => assert_eq!(text.as_str(), "  hello\nworld "),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn server_close_emits_single_close_and_rejects_sends() {
    let (listener, url) = listen().await;
    let (handle, mut events) = open(&url, IDLE);
    let mut peer = accept(&listener).await;
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);

    peer.close(None).await.expect("peer close");

    assert_eq!(next_event(&mut events).await, TransportEvent::Close);
    assert_events_end(&mut events).await;
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert!(matches!(
        handle.send(Payload::Text("late".to_owned())),
        Err(TransportError::NotConnected)
    ));
}

#[tokio::test]
async fn close_request_is_idempotent_and_closes_socket() {
    let (listener, url) = listen().await;
    let (handle, mut events) = open(&url, IDLE);
    let mut peer = accept(&listener).await;
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);

    handle.close();
    handle.close();

    assert_eq!(next_event(&mut events).await, TransportEvent::Close);
    assert_events_end(&mut events).await;
    assert!(matches!(next_peer_message(&mut peer).await, Some(Message::Close(_))));
}

#[tokio::test]
async fn failed_handshake_goes_straight_to_close() {
    let (listener, url) = listen().await;
    drop(listener);

    let (handle, mut events) = open(&url, IDLE);

    assert_eq!(next_event(&mut events).await, TransportEvent::Close);
    assert_events_end(&mut events).await;
    assert_eq!(handle.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn send_while_connecting_is_rejected() {
    // Listener accepts at the TCP level but never answers the handshake.
    let (_listener, url) = listen().await;
    let (handle, _events) = open(&url, IDLE);
    tokio::task::yield_now().await;

    assert_eq!(handle.state(), ConnectionState::Connecting);
    assert!(matches!(
        handle.send(Payload::Text("early".to_owned())),
        Err(TransportError::NotConnected)
    ));
}

// =============================================================
// Keep-alive
// =============================================================

#[tokio::test]
async fn keepalive_sends_single_byte_binary_each_period() {
    let (listener, url) = listen().await;
    let (_handle, mut events) = open(&url, Duration::from_millis(40));
    let mut peer = accept(&listener).await;
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);

    let mut pings = 0;
    while pings < 2 {
        match next_peer_message(&mut peer).await {
            Some(Message::Binary(bytes)) => {
                assert_eq!(bytes.as_ref(), KEEPALIVE_PAYLOAD.as_slice());
                pings += 1;
            }
            Some(Message::Ping(_) | Message::Pong(_)) => {}
            other => panic!("unexpected peer message: {other:?}"),
        }
    }
}

#[tokio::test]
async fn keepalive_stops_once_closed() {
    let (listener, url) = listen().await;
    let (handle, mut events) = open(&url, Duration::from_millis(20));
    let mut peer = accept(&listener).await;
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);

    tokio::time::sleep(Duration::from_millis(60)).await;
    handle.close();
    assert_eq!(next_event(&mut events).await, TransportEvent::Close);

    // Heartbeats may precede the close frame, never follow it.
    loop {
        match next_peer_message(&mut peer).await {
            Some(Message::Binary(_) | Message::Ping(_) | Message::Pong(_)) => {}
            Some(Message::Close(_)) => break,
            other => panic!("unexpected peer message: {other:?}"),
        }
    }
    tokio::time::sleep(Duration::from_millis(80)).await;
    while let Ok(Some(msg)) = timeout(Duration::from_millis(50), peer.next()).await {
        assert!(
            !matches!(msg, Ok(Message::Binary(_))),
            "keep-alive fired after close"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn keepalive_timer_first_tick_waits_one_full_period() {
    let start = Instant::now();
    let period = Duration::from_secs(50);
    let mut timer = keepalive_timer(period);

    timer.tick().await;
    let first = start.elapsed();
    assert!(first >= period && first < period + Duration::from_secs(1));

    timer.tick().await;
    let second = start.elapsed();
    assert!(second >= period * 2 && second < period * 2 + Duration::from_secs(1));
}
