use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use sms_session::common::{InboundMessage, SessionEvent, SmsPort, Worker, WorkerState};
use sms_session::network::{EventSink, MemoryTransport, Session, Transport};

const PORT: SmsPort = SmsPort::App(3590);
const WAIT: Duration = Duration::from_secs(5);

async fn next_event(events: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("event channel closed")
}

async fn wait_for(
    events: &mut UnboundedReceiver<SessionEvent>,
    wanted: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    loop {
        let event = next_event(events).await;
        if wanted(&event) {
            return event;
        }
    }
}

fn is_state(event: &SessionEvent, worker: Worker, state: WorkerState) -> bool {
    matches!(event, SessionEvent::WorkerState { worker: w, state: s } if *w == worker && *s == state)
}

fn drain(events: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

#[tokio::test]
async fn hello_then_goodbye_are_sent_in_order() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    session.enqueue("5550002", "Hello", PORT);
    session.enqueue("5550002", "Goodbye", PORT);

    let mut attempts = 0;
    while attempts < 2 {
        if let SessionEvent::SendAttempted { delivered, .. } = next_event(&mut events).await {
            assert!(delivered);
            attempts += 1;
        }
    }
    session.stop().await;

    let payloads: Vec<_> = session
        .transport()
        .sent()
        .into_iter()
        .map(|message| message.payload)
        .collect();
    assert_eq!(payloads, ["Hello", "Goodbye"]);
}

#[tokio::test]
async fn every_queued_message_gets_one_attempt_in_fifo_order() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    let expected: Vec<String> = (0..20).map(|i| format!("message {i}")).collect();
    for payload in &expected {
        session.enqueue("5550002", payload.clone(), PORT);
    }

    let mut attempts = 0;
    while attempts < expected.len() {
        if matches!(next_event(&mut events).await, SessionEvent::SendAttempted { .. }) {
            attempts += 1;
        }
    }
    session.stop().await;

    let sent = session.transport().sent();
    assert_eq!(sent.len(), expected.len());
    assert!(sent.iter().all(|message| message.port == PORT));
    let payloads: Vec<_> = sent.into_iter().map(|message| message.payload).collect();
    assert_eq!(payloads, expected);
    assert_eq!(
        drain(&mut events)
            .iter()
            .filter(|event| matches!(event, SessionEvent::SendAttempted { .. }))
            .count(),
        0
    );
}

#[tokio::test]
async fn stop_before_the_worker_wakes_sends_nothing() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    session.enqueue("5550002", "one", PORT);
    session.enqueue("5550002", "two", PORT);
    session.enqueue("5550002", "three", PORT);
    // The workers have not been polled yet on this runtime.
    session.stop().await;

    assert_eq!(session.transport().sent_count(), 0);
    assert_eq!(session.queued(), 0);
    let drained = drain(&mut events);
    assert!(!drained
        .iter()
        .any(|event| matches!(event, SessionEvent::SendAttempted { .. })));
    assert!(drained
        .iter()
        .any(|event| is_state(event, Worker::Sender, WorkerState::Stopped)));
}

#[tokio::test]
async fn stop_during_a_send_drops_the_rest_of_the_queue() {
    let (sink, mut events) = EventSink::channel();
    let transport = MemoryTransport::new();
    transport.close_gate();
    let mut session = Session::start(transport, PORT, sink);

    session.enqueue("5550002", "in flight", PORT);
    session.enqueue("5550002", "queued 1", PORT);
    session.enqueue("5550002", "queued 2", PORT);

    wait_for(&mut events, |event| {
        is_state(event, Worker::Sender, WorkerState::Sending)
    })
    .await;
    assert_eq!(session.queued(), 2);

    session.stop().await;
    session.transport().open_gate();

    // The in-flight send was interrupted by the close; nothing else went out.
    assert_eq!(session.transport().sent_count(), 0);
    let attempts: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::SendAttempted { delivered, .. } => Some(delivered),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, [false]);
}

#[tokio::test]
async fn stop_with_empty_queue_exits_the_wait() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    wait_for(&mut events, |event| {
        is_state(event, Worker::Sender, WorkerState::Connected)
    })
    .await;
    assert!(session.is_running());

    timeout(WAIT, session.stop()).await.expect("stop hung");
    assert!(!session.is_running());
    assert!(session.transport().is_closed());
    assert_eq!(session.transport().sent_count(), 0);

    let drained = drain(&mut events);
    assert!(drained
        .iter()
        .any(|event| is_state(event, Worker::Sender, WorkerState::Stopped)));
    assert!(drained
        .iter()
        .any(|event| is_state(event, Worker::Listener, WorkerState::Stopped)));

    // Second stop is a no-op, and a stopped session ignores new messages.
    session.stop().await;
    session.enqueue("5550002", "too late", PORT);
    assert_eq!(session.queued(), 0);
}

#[tokio::test]
async fn each_arrival_is_surfaced_exactly_once() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    for i in 0..3 {
        session
            .transport()
            .inject(InboundMessage::new("5550003", format!("inbound {i}"), PORT));
    }

    let mut received = Vec::new();
    while received.len() < 3 {
        if let SessionEvent::MessageReceived(message) = next_event(&mut events).await {
            received.push(message.payload);
        }
    }
    session.stop().await;

    assert_eq!(received, ["inbound 0", "inbound 1", "inbound 2"]);
    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, SessionEvent::MessageReceived(_))));
}

#[tokio::test]
async fn arrivals_on_other_ports_are_dropped() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    session
        .transport()
        .inject(InboundMessage::new("5550003", "for the inbox", SmsPort::Inbox));
    session
        .transport()
        .inject(InboundMessage::new("5550003", "for us", PORT));

    let event = wait_for(&mut events, |event| {
        matches!(event, SessionEvent::MessageReceived(_))
    })
    .await;
    session.stop().await;

    match event {
        SessionEvent::MessageReceived(message) => assert_eq!(message.payload, "for us"),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, SessionEvent::MessageReceived(_))));
}

#[tokio::test]
async fn received_message_status_is_posted() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    session
        .transport()
        .inject(InboundMessage::new("5550003", "Hi", PORT));

    let event = wait_for(&mut events, |event| matches!(event, SessionEvent::Status(_))).await;
    session.stop().await;

    assert_eq!(
        event,
        SessionEvent::Status("Received:\nDestination:5550003\nData:Hi\n".to_string())
    );
}

#[tokio::test]
async fn closing_the_transport_ends_the_listener_with_an_error() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    wait_for(&mut events, |event| {
        is_state(event, Worker::Listener, WorkerState::Receiving)
    })
    .await;

    // Closed underneath the session, not through stop().
    session.transport().close();
    wait_for(&mut events, |event| {
        is_state(event, Worker::Listener, WorkerState::Error)
    })
    .await;

    // The sender finds out on its next attempt.
    session.enqueue("5550002", "after close", PORT);
    wait_for(&mut events, |event| {
        is_state(event, Worker::Sender, WorkerState::Error)
    })
    .await;

    session.stop().await;
    assert_eq!(session.transport().sent_count(), 0);
}

#[tokio::test]
async fn loopback_transport_echoes_through_the_session() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::loopback(), PORT, sink);

    session.enqueue("5550002", "ping", PORT);

    let event = wait_for(&mut events, |event| {
        matches!(event, SessionEvent::MessageReceived(_))
    })
    .await;
    session.stop().await;

    match event {
        SessionEvent::MessageReceived(message) => {
            assert_eq!(message.source, "5550002");
            assert_eq!(message.payload, "ping");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn each_message_keeps_its_own_port() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    session.enqueue("5550002", "to the inbox", SmsPort::Inbox);
    session.enqueue("5550002", "to the app", PORT);
    session.enqueue("5550002", "elsewhere", SmsPort::App(16000));

    let mut attempts = 0;
    while attempts < 3 {
        if let SessionEvent::SendAttempted { .. } = next_event(&mut events).await {
            attempts += 1;
        }
    }
    session.stop().await;

    let ports: Vec<_> = session
        .transport()
        .sent()
        .into_iter()
        .map(|message| message.port)
        .collect();
    assert_eq!(ports, [SmsPort::Inbox, PORT, SmsPort::App(16000)]);
}

#[tokio::test]
async fn messages_after_a_sender_failure_are_not_queued() {
    let (sink, mut events) = EventSink::channel();
    let mut session = Session::start(MemoryTransport::new(), PORT, sink);

    session.transport().close();
    session.enqueue("5550002", "first", PORT);
    wait_for(&mut events, |event| {
        is_state(event, Worker::Sender, WorkerState::Error)
    })
    .await;
    assert!(!session.is_running());

    for i in 0..1000 {
        session.enqueue("5550002", format!("late {i}"), PORT);
    }
    assert_eq!(session.queued(), 0);

    let refused = drain(&mut events)
        .into_iter()
        .filter(|event| {
            matches!(event, SessionEvent::Status(text) if text.contains("message not queued"))
        })
        .count();
    assert_eq!(refused, 1000);

    session.stop().await;
    assert_eq!(session.transport().sent_count(), 0);
}
