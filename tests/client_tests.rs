#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Integration-style client tests.
//!
//! Drive `BuzzerClient` through scripted and live mock transports and check
//! the intents it sends, the views it renders and how it reports the end of
//! a connection.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use buzzer_client::audio::AudioSink;
use buzzer_client::close::CloseOutcome;
use buzzer_client::protocol::UpdatePayload;
use buzzer_client::{
    BuzzerError, BuzzerEvent, ButtonState, ClientMessage, CloseKind, HostClient,
    ParticipantClient, ServerMessage,
};
use serde_json::json;

use common::{
    alice, channel_pair, closed, drain_start, host_config, next_event, next_host_view,
    next_participant_view, participant_config, raw, sent_messages, text, update, MockTransport,
};

// ════════════════════════════════════════════════════════════════════
// Snapshots and keepalive
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn update_replaces_roster_and_button() {
    let (transport, _sent, _closed) = MockTransport::new(vec![text(&update(
        vec![alice().with_buzzed(true)],
        ButtonState::Buzzed,
    ))]);
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Buzzed);
    assert_eq!(view.button.label, "BUZZED");
    assert_eq!(view.roster.entries().len(), 1);
    assert_eq!(view.roster.entries()[0].class.as_str(), "buzzed");

    client.shutdown().await;
}

#[tokio::test]
async fn ping_yields_exactly_one_pong_and_no_render() {
    let (transport, sent, _closed) = MockTransport::new(vec![
        text(&ServerMessage::Ping { id: json!("x") }),
        text(&update(vec![], ButtonState::Locked)),
    ]);
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    // The first render after start belongs to the UPDATE, not the PING.
    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Locked);

    assert_eq!(
        sent_messages(&sent),
        vec![ClientMessage::Pong { id: json!("x") }]
    );

    client.shutdown().await;
}

#[tokio::test]
async fn messages_apply_in_arrival_order() {
    let (transport, _sent, _closed) = MockTransport::new(vec![
        text(&update(vec![alice().with_buzzed(true)], ButtonState::Locked)),
        text(&ServerMessage::Reset),
    ]);
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    assert_eq!(
        next_participant_view(&mut events).await.button_state,
        ButtonState::Locked
    );
    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Open);
    assert_eq!(view.roster.entries()[0].class.as_str(), "unbuzzed");

    client.shutdown().await;
}

#[tokio::test]
async fn malformed_and_unknown_messages_are_ignored() {
    let (transport, sent, _closed) = MockTransport::new(vec![
        raw("this is not json"),
        raw(r#"{"event":"CONFETTI","amount":9000}"#),
        raw(r#"{"no_event":true}"#),
        text(&update(vec![], ButtonState::Locked)),
    ]);
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Locked);
    assert!(client.is_connected());
    assert!(sent_messages(&sent).is_empty());

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Buzz guard
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn buzz_from_open_sends_and_renders_optimistically() {
    let (transport, mut server) = channel_pair();
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    tokio_test::assert_ok!(client.buzz());
    assert_eq!(server.next_intent().await, ClientMessage::Buzz);
    assert_eq!(
        next_participant_view(&mut events).await.button_state,
        ButtonState::Buzzed
    );

    // Second press: guard holds, nothing sent.
    client.press_key(' ').unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.rx.try_recv().is_err());

    // The server disagrees: another participant won; authoritative state wins.
    server.push(&update(vec![], ButtonState::Locked));
    assert_eq!(
        next_participant_view(&mut events).await.button_state,
        ButtonState::Locked
    );

    client.shutdown().await;
}

#[tokio::test]
async fn buzz_while_locked_sends_nothing() {
    let (transport, sent, _closed) =
        MockTransport::new(vec![text(&update(vec![], ButtonState::Locked))]);
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;
    next_participant_view(&mut events).await;

    client.buzz().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(sent_messages(&sent).is_empty());
    assert!(events.try_recv().is_err());

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Multiple choice
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn multiple_choice_round_trip() {
    let (transport, mut server) = channel_pair();
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    server.push(&ServerMessage::MultipleChoice {
        choices: vec!["A".into(), "B".into()],
    });
    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Locked);
    assert_eq!(view.modal.as_ref().unwrap().options, vec!["A", "B"]);
    assert!(view.scroll_locked);

    client.answer("A").unwrap();
    assert_eq!(
        server.next_intent().await,
        ClientMessage::McAnswer {
            answer: "A".into()
        }
    );
    let view = next_participant_view(&mut events).await;
    assert!(view.modal.is_none());
    assert!(!view.scroll_locked);
    assert_eq!(view.indicator.as_deref(), Some("Your Choice: A"));

    server.push(&ServerMessage::EndMultipleChoice);
    let after_end = next_participant_view(&mut events).await;
    assert_eq!(after_end, view);

    // A second answer is never sent.
    client.answer("B").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.rx.try_recv().is_err());

    client.shutdown().await;
}

#[tokio::test]
async fn server_choice_confirms_then_plain_update_clears() {
    let (transport, _sent, _closed) = MockTransport::new(vec![
        text(&ServerMessage::Update(UpdatePayload {
            button_state: Some(ButtonState::Locked),
            choice: Some("B".into()),
            choices: Some(vec!["A".into(), "B".into()]),
            ..Default::default()
        })),
        text(&update(vec![], ButtonState::Open)),
    ]);
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    let view = next_participant_view(&mut events).await;
    assert_eq!(view.indicator.as_deref(), Some("Your Choice: B"));
    assert!(view.modal.is_none());

    let view = next_participant_view(&mut events).await;
    assert!(view.indicator.is_none());

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Close classification
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn host_ended_navigates_away() {
    let (transport, _sent, _closed) = MockTransport::new(vec![closed(1000, "")]);
    let (client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    assert_eq!(
        next_event(&mut events).await,
        BuzzerEvent::Navigate("http://quiz.example/buzzer?error=4".into())
    );
    let BuzzerEvent::Closed(outcome) = next_event(&mut events).await else {
        panic!("expected Closed");
    };
    assert_eq!(outcome.kind(), CloseKind::HostEnded);
    assert!(events.recv().await.is_none());

    assert!(!client.is_connected());
    assert!(matches!(client.buzz(), Err(BuzzerError::NotConnected)));
}

#[tokio::test]
async fn user_left_disconnects_with_rejoin_banner() {
    let (transport, mut server) = channel_pair();
    let (client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    client.leave().unwrap();
    assert_eq!(server.next_intent().await, ClientMessage::Leave);
    server.close(1013, "You left.");

    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Disconnected);
    let banner = view.banner.unwrap();
    assert_eq!(banner.text, "You left.");
    assert_eq!(banner.links[0].href, "http://quiz.example/buzzer/AB12");
    assert_eq!(banner.links[1].href, "http://quiz.example/");

    let BuzzerEvent::Closed(outcome) = next_event(&mut events).await else {
        panic!("expected Closed");
    };
    assert_eq!(outcome.kind(), CloseKind::UserLeft);
}

#[tokio::test]
async fn lost_connection_shows_reason_and_code() {
    let (transport, _sent, _closed) =
        MockTransport::new(vec![closed(1011, "Connected from another location.")]);
    let (_client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Disconnected);
    assert_eq!(
        view.banner.unwrap().text,
        "Connected from another location. (1011)"
    );
    let BuzzerEvent::Closed(CloseOutcome::LostConnection { code, banner }) =
        next_event(&mut events).await
    else {
        panic!("expected LostConnection");
    };
    assert_eq!(code, 1011);
    assert_eq!(banner.links[0].href, "http://quiz.example/buzzer");
}

#[tokio::test]
async fn receive_error_is_an_abnormal_close() {
    let (transport, _sent, _closed) = MockTransport::new(vec![Err(
        BuzzerError::TransportReceive("connection reset".into()),
    )]);
    let (_client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    let view = next_participant_view(&mut events).await;
    assert_eq!(view.banner.unwrap().text, "Lost Connection (1006)");
    assert!(matches!(
        next_event(&mut events).await,
        BuzzerEvent::Closed(CloseOutcome::LostConnection { code: 1006, .. })
    ));
}

#[tokio::test]
async fn shutdown_closes_transport_and_stops() {
    let (transport, _sent, closed_flag) = MockTransport::new(vec![]);
    let (mut client, mut events) = ParticipantClient::participant(transport, participant_config());
    drain_start(&mut events).await;

    client.shutdown().await;
    assert_eq!(next_event(&mut events).await, BuzzerEvent::Stopped);
    assert!(closed_flag.load(std::sync::atomic::Ordering::Relaxed));
}

#[tokio::test]
async fn slow_consumer_still_sees_every_render() {
    let (transport, _sent, _closed) = MockTransport::new(vec![
        text(&update(vec![alice()], ButtonState::Locked)),
        closed(1006, ""),
    ]);
    let config = participant_config().with_event_channel_capacity(1);
    let (_client, mut events) = ParticipantClient::participant(transport, config);

    // Let the loop run far ahead of the reader.
    tokio::time::sleep(Duration::from_millis(100)).await;

    drain_start(&mut events).await;
    assert_eq!(
        next_participant_view(&mut events).await.button_state,
        ButtonState::Locked
    );
    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Disconnected);
    assert_eq!(view.banner.unwrap().text, "Lost Connection (1006)");
    assert!(matches!(
        next_event(&mut events).await,
        BuzzerEvent::Closed(CloseOutcome::LostConnection { code: 1006, .. })
    ));
    assert!(events.recv().await.is_none());
}

// ════════════════════════════════════════════════════════════════════
// Host
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn host_lock_toggle_is_reconciled_by_update() {
    let (transport, mut server) = channel_pair();
    let (mut client, mut events) = HostClient::host(transport, host_config());
    drain_start(&mut events).await;

    client.toggle_lock().unwrap();
    assert_eq!(server.next_intent().await, ClientMessage::ToggleLock);
    let view = next_host_view(&mut events).await;
    assert!(view.locked);
    assert_eq!(view.lock_button.label, "LOCKED");

    // The server never saw the toggle take effect.
    server.push(&update(vec![], ButtonState::Open));
    let view = next_host_view(&mut events).await;
    assert!(!view.locked);
    assert_eq!(view.lock_button.label, "UNLOCKED");

    client.shutdown().await;
}

#[tokio::test]
async fn host_intents_go_out_in_order() {
    let (transport, mut server) = channel_pair();
    let (mut client, mut events) = HostClient::host(transport, host_config());
    drain_start(&mut events).await;

    client.reset().unwrap();
    client.prompt_choices("Red\nBlue").unwrap();
    client.prompt_choices("Red\nBlue").unwrap();
    client.end_choices().unwrap();
    client.clear_choices().unwrap();

    assert_eq!(server.next_intent().await, ClientMessage::Reset);
    assert_eq!(
        server.next_intent().await,
        ClientMessage::PromptChoices {
            choices: "Red\nBlue".into()
        }
    );
    // The duplicate prompt was suppressed.
    assert_eq!(server.next_intent().await, ClientMessage::EndMc);
    assert_eq!(server.next_intent().await, ClientMessage::ClearMc);

    client.shutdown().await;
}

#[tokio::test]
async fn host_ended_navigates_to_host_landing() {
    let (transport, _sent, _closed) = MockTransport::new(vec![closed(1000, "")]);
    let (_client, mut events) = HostClient::host(transport, host_config());
    drain_start(&mut events).await;

    assert_eq!(
        next_event(&mut events).await,
        BuzzerEvent::Navigate("http://quiz.example/host?error=4".into())
    );
}

// ════════════════════════════════════════════════════════════════════
// Audio cue
// ════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct CountingSink {
    plays: Mutex<usize>,
}

impl AudioSink for CountingSink {
    fn play(&self, _clip: &str, _volume: f32) -> buzzer_client::error::Result<()> {
        *self.plays.lock().unwrap() += 1;
        Ok(())
    }
}

fn sound_update() -> ServerMessage {
    ServerMessage::Update(UpdatePayload {
        users: vec![alice().with_buzzed(true)],
        button_state: Some(ButtonState::Locked),
        sound: true,
        ..Default::default()
    })
}

#[tokio::test]
async fn sound_plays_only_when_opted_in() {
    let sink = Arc::new(CountingSink::default());
    let (transport, server) = channel_pair();
    let config = participant_config().with_audio_sink(sink.clone());
    let (mut client, mut events) = ParticipantClient::participant(transport, config);
    drain_start(&mut events).await;

    server.push(&sound_update());
    next_participant_view(&mut events).await;
    assert_eq!(*sink.plays.lock().unwrap(), 0);

    client.set_audio_enabled(true);
    server.push(&sound_update());
    next_participant_view(&mut events).await;
    assert_eq!(*sink.plays.lock().unwrap(), 1);

    client.shutdown().await;
}

struct BlockedSink;

impl AudioSink for BlockedSink {
    fn play(&self, _clip: &str, _volume: f32) -> buzzer_client::error::Result<()> {
        Err(BuzzerError::Playback("autoplay blocked".into()))
    }
}

#[tokio::test]
async fn playback_failure_does_not_disturb_session() {
    let (transport, _sent, _closed) = MockTransport::new(vec![
        text(&sound_update()),
        text(&update(vec![], ButtonState::Open)),
    ]);
    let config = participant_config()
        .with_audio_sink(Arc::new(BlockedSink))
        .with_audio_enabled(true);
    let (mut client, mut events) = ParticipantClient::participant(transport, config);
    drain_start(&mut events).await;

    next_participant_view(&mut events).await;
    let view = next_participant_view(&mut events).await;
    assert_eq!(view.button_state, ButtonState::Open);
    assert!(client.is_connected());

    client.shutdown().await;
}
