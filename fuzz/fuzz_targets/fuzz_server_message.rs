#![no_main]

use buzzer_client::protocol::ServerMessage;
use buzzer_client::session::{HostSession, ParticipantSession, Role};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(msg) = serde_json::from_slice::<ServerMessage>(data) else {
        return;
    };

    // Whatever parses must be safe to reduce and render for both seats.
    let mut participant = ParticipantSession::default();
    let _ = participant.on_server(msg.clone());
    let _ = participant.view();

    let mut host = HostSession::default();
    let _ = host.on_server(msg);
    let _ = host.view();
});
