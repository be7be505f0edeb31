#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire format tests for the buzzer protocol.
//!
//! Outgoing intents are checked against the exact JSON the server expects;
//! incoming messages are parsed from fixtures shaped like real server output,
//! including fields this client does not model.

use buzzer_client::protocol::{
    ButtonState, ClientMessage, Participant, ServerMessage, UpdatePayload,
};
use buzzer_client::BuzzerError;
use serde_json::{json, Value};

fn to_value(msg: &ClientMessage) -> Value {
    serde_json::to_value(msg).expect("serialize")
}

fn parse(json: &str) -> ServerMessage {
    serde_json::from_str(json).expect("deserialize")
}

// ════════════════════════════════════════════════════════════════════
// ClientMessage
// ════════════════════════════════════════════════════════════════════

#[test]
fn unit_intents_carry_only_the_event_tag() {
    assert_eq!(to_value(&ClientMessage::Buzz), json!({"event": "BUZZ"}));
    assert_eq!(to_value(&ClientMessage::Leave), json!({"event": "LEAVE"}));
    assert_eq!(to_value(&ClientMessage::Reset), json!({"event": "RESET"}));
    assert_eq!(
        to_value(&ClientMessage::ToggleLock),
        json!({"event": "TOGGLE_LOCK"})
    );
    assert_eq!(
        to_value(&ClientMessage::ClearMc),
        json!({"event": "CLEAR_MC"})
    );
    assert_eq!(to_value(&ClientMessage::EndMc), json!({"event": "END_MC"}));
}

#[test]
fn answer_and_prompt_payloads() {
    assert_eq!(
        to_value(&ClientMessage::McAnswer {
            answer: "Blue".into()
        }),
        json!({"event": "MC_ANSWER", "answer": "Blue"})
    );
    assert_eq!(
        to_value(&ClientMessage::PromptChoices {
            choices: "Red\nBlue\nGreen".into()
        }),
        json!({"event": "PROMPT_CHOICES", "choices": "Red\nBlue\nGreen"})
    );
}

#[test]
fn pong_echoes_the_id_verbatim() {
    for id in [json!(17), json!("abc"), json!(1.5), json!(null)] {
        assert_eq!(
            to_value(&ClientMessage::Pong { id: id.clone() }),
            json!({"event": "PONG", "id": id})
        );
    }
}

#[test]
fn client_event_names_match_tags() {
    let all = [
        ClientMessage::Buzz,
        ClientMessage::Pong { id: json!(1) },
        ClientMessage::Leave,
        ClientMessage::McAnswer { answer: "A".into() },
        ClientMessage::Reset,
        ClientMessage::ToggleLock,
        ClientMessage::PromptChoices {
            choices: "A".into(),
        },
        ClientMessage::ClearMc,
        ClientMessage::EndMc,
    ];
    for msg in all {
        assert_eq!(to_value(&msg)["event"], msg.event_name());
    }
}

// ════════════════════════════════════════════════════════════════════
// ServerMessage
// ════════════════════════════════════════════════════════════════════

#[test]
fn update_fixture_with_unmodelled_fields() {
    let msg = parse(
        r#"{
            "event": "UPDATE",
            "t": 1712345678,
            "users": [
                {"name": "Alice", "avatar": "https://cdn.example/a.png", "buzzed": true, "connected": true, "choice": "B"},
                {"name": "Bob", "avatar": "https://cdn.example/b.png", "buzzed": false, "connected": false}
            ],
            "button_state": "LOCKED",
            "sound": true,
            "choice": "B",
            "choices": ["A", "B", "C"]
        }"#,
    );

    let ServerMessage::Update(update) = msg else {
        panic!("expected UPDATE, got {msg:?}");
    };
    assert_eq!(update.users.len(), 2);
    assert_eq!(
        update.users[0],
        Participant::new("Alice", "https://cdn.example/a.png")
            .with_buzzed(true)
            .with_choice("B")
    );
    assert!(!update.users[1].connected);
    assert_eq!(update.users[1].choice, None);
    assert_eq!(update.button_state, Some(ButtonState::Locked));
    assert!(update.sound);
    assert_eq!(update.choice.as_deref(), Some("B"));
    assert_eq!(update.choices.unwrap(), vec!["A", "B", "C"]);
}

#[test]
fn sparse_update_uses_defaults() {
    let msg = parse(r#"{"event":"UPDATE","users":[{"name":"Cy","avatar":"x"}]}"#);
    let ServerMessage::Update(update) = msg else {
        panic!("expected UPDATE");
    };
    let cy = &update.users[0];
    assert!(!cy.buzzed);
    assert!(cy.connected);
    assert_eq!(update.button_state, None);
    assert!(!update.sound);
    assert_eq!(update.choices, None);

    assert_eq!(
        parse(r#"{"event":"UPDATE"}"#),
        ServerMessage::Update(UpdatePayload::default())
    );
}

#[test]
fn button_states_parse_including_legacy_spelling() {
    for (wire, state) in [
        ("OPEN", ButtonState::Open),
        ("BUZZED", ButtonState::Buzzed),
        ("LOCKED", ButtonState::Locked),
        ("DISCONNECTED", ButtonState::Disconnected),
        ("DISCONNECT", ButtonState::Disconnected),
    ] {
        let parsed: ButtonState = serde_json::from_value(json!(wire)).unwrap();
        assert_eq!(parsed, state, "{wire}");
    }
    assert!(serde_json::from_value::<ButtonState>(json!("SIDEWAYS")).is_err());
}

#[test]
fn control_messages() {
    assert_eq!(parse(r#"{"event":"RESET"}"#), ServerMessage::Reset);
    assert_eq!(
        parse(r#"{"event":"END_MULTIPLE_CHOICE"}"#),
        ServerMessage::EndMultipleChoice
    );
    assert_eq!(
        parse(r#"{"event":"MULTIPLE_CHOICE","choices":["Yes","No"]}"#),
        ServerMessage::MultipleChoice {
            choices: vec!["Yes".into(), "No".into()]
        }
    );
}

#[test]
fn ping_id_keeps_its_json_type() {
    assert_eq!(
        parse(r#"{"event":"PING","id":42}"#),
        ServerMessage::Ping { id: json!(42) }
    );
    assert_eq!(
        parse(r#"{"event":"PING","id":"k-9"}"#),
        ServerMessage::Ping { id: json!("k-9") }
    );
}

#[test]
fn unknown_events_parse_as_unknown() {
    assert_eq!(
        parse(r#"{"event":"CONFETTI","amount":3}"#),
        ServerMessage::Unknown
    );
    assert_eq!(ServerMessage::Unknown.event_name(), "UNKNOWN");
}

#[test]
fn malformed_server_messages_are_errors() {
    for bad in [
        "",
        "not json",
        r#"{"users":[]}"#,
        r#"{"event":"MULTIPLE_CHOICE"}"#,
        r#"{"event":"UPDATE","users":"everyone"}"#,
        r#"["UPDATE"]"#,
    ] {
        assert!(
            serde_json::from_str::<ServerMessage>(bad).is_err(),
            "should reject {bad:?}"
        );
    }
}

#[test]
fn from_json_reports_serialization_errors() {
    assert_eq!(
        ServerMessage::from_json(r#"{"event":"RESET"}"#).unwrap(),
        ServerMessage::Reset
    );
    let err = ServerMessage::from_json(r#"{"event":"MULTIPLE_CHOICE"}"#).unwrap_err();
    assert!(matches!(err, BuzzerError::Serialization(_)), "{err:?}");
}

#[test]
fn to_json_matches_wire_shape() {
    let json = ClientMessage::McAnswer { answer: "A".into() }
        .to_json()
        .unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value, json!({"event": "MC_ANSWER", "answer": "A"}));
}
