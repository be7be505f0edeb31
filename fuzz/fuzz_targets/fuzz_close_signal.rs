#![no_main]

use buzzer_client::close::{CloseOutcome, CloseSignal};
use buzzer_client::endpoints::{Endpoints, Seat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((head, rest)) = data.split_first_chunk::<2>() else {
        return;
    };
    let code = u16::from_be_bytes(*head);
    let reason = String::from_utf8_lossy(rest);

    let page = "https://quiz.example/buzzer/AB12";
    let Ok(endpoints) = Endpoints::from_page_url(page, Seat::Participant) else {
        return;
    };
    let signal = CloseSignal::new(code, reason);
    let outcome = CloseOutcome::for_signal(&signal, &endpoints);
    assert_eq!(outcome.kind(), signal.kind());
    if let Some(banner) = outcome.banner() {
        assert!(!banner.text.is_empty());
    }
});
