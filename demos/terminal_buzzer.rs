//! # Terminal Buzzer Example
//!
//! A participant buzzer in the terminal. Connects over WebSocket to a
//! running session and reads commands from stdin:
//!
//! - empty line or space: buzz
//! - `1`..`9`: answer the open multiple-choice prompt
//! - `s`: toggle the buzz sound (a terminal bell)
//! - `q`: leave the session
//!
//! ## Running
//!
//! ```sh
//! BUZZER_URL=http://localhost:8000/buzzer/AB12 cargo run --example terminal_buzzer
//! ```

use std::io::Write as _;
use std::sync::{Arc, Mutex};

use buzzer_client::audio::AudioSink;
use buzzer_client::{
    BuzzerEvent, ClientConfig, CloseOutcome, Endpoints, ParticipantClient, ParticipantView,
    Seat, SessionView,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Rings the terminal bell in place of playing the clip.
struct TerminalBell;

impl AudioSink for TerminalBell {
    fn play(&self, clip: &str, _volume: f32) -> buzzer_client::error::Result<()> {
        tracing::debug!(clip, "ring");
        let mut out = std::io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

fn print_view(view: &ParticipantView) {
    println!();
    println!("==[ {} ]==", view.button.label);
    if view.roster.is_empty() {
        println!("  {}", buzzer_client::roster::EMPTY_ROSTER_NOTICE);
    }
    for entry in view.roster.entries() {
        let mark = if entry.class.as_str() == "buzzed" { "*" } else { " " };
        let lost = if entry.connection_lost { " (lost)" } else { "" };
        println!(" {mark} {}{lost}", entry.display_name);
    }
    if let Some(modal) = &view.modal {
        for (i, option) in modal.options.iter().enumerate() {
            println!("  [{}] {option}", i + 1);
        }
    }
    if let Some(indicator) = &view.indicator {
        println!("  {indicator}");
    }
    if let Some(banner) = &view.banner {
        println!("  {}", banner.text);
        for link in &banner.links {
            println!("    {} {}", link.label, link.href);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let page = std::env::var("BUZZER_URL")
        .unwrap_or_else(|_| "http://localhost:8000/buzzer/DEMO".to_string());
    let endpoints = Endpoints::from_page_url(&page, Seat::Participant)?;
    let config = ClientConfig::new(endpoints).with_audio_sink(Arc::new(TerminalBell));

    let (mut client, mut events) = ParticipantClient::connect(config).await?;

    // Options of the prompt currently on screen, for digit answers.
    let options: Arc<Mutex<Vec<String>>> = Arc::default();
    let shown = Arc::clone(&options);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BuzzerEvent::Render(SessionView::Participant(view)) => {
                    if let Ok(mut shown) = shown.lock() {
                        *shown = view
                            .modal
                            .as_ref()
                            .map(|m| m.options.clone())
                            .unwrap_or_default();
                    }
                    print_view(&view);
                }
                BuzzerEvent::Navigate(url) => println!("Session ended. Continue at {url}"),
                BuzzerEvent::Closed(outcome) => {
                    if let CloseOutcome::LostConnection { code, .. } = outcome {
                        tracing::warn!(code, "connection lost");
                    }
                    break;
                }
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !client.is_connected() {
            break;
        }
        let result = match line.trim() {
            "" => client.press_key(' '),
            "q" => client.leave(),
            "s" => {
                let enabled = !client.audio_enabled();
                client.set_audio_enabled(enabled);
                println!("sound {}", if enabled { "on" } else { "off" });
                Ok(())
            }
            digits => match digits.parse::<usize>() {
                Ok(n) => {
                    let choice = options
                        .lock()
                        .ok()
                        .and_then(|o| n.checked_sub(1).and_then(|i| o.get(i).cloned()));
                    match choice {
                        Some(choice) => client.answer(choice),
                        None => Ok(()),
                    }
                }
                Err(_) => {
                    println!("unknown command: {digits}");
                    Ok(())
                }
            },
        };
        if let Err(e) = result {
            tracing::warn!("{e}");
            break;
        }
    }

    client.shutdown().await;
    printer.await?;
    Ok(())
}
