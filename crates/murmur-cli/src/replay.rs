//! Replay mode: pipe recorded inbound frames through the full session
//! pipeline and watch the paced output.
//!
//! Each stdin line is treated as one raw inbound frame. Assistant text is
//! printed character by character as the reveal scheduler releases it,
//! then a turn summary is printed.

use std::io::Write as _;
use std::time::Duration;

use anyhow::{Context, Result};
use murmur_core::config::Config;
use murmur_core::content::{self, Fragment};
use murmur_core::reveal::RevealEvent;
use murmur_core::session::Session;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config: &Config, conversation: &str, no_pacing: bool) -> Result<()> {
    let mut config = config.clone();
    if no_pacing {
        config.reveal.thinking_delay_ms = 0;
        config.reveal.char_interval_ms = 0;
    }

    let (mut session, mut events) = Session::new(&config).context("Failed to create session")?;
    session.replace_history(conversation, Vec::new());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_reveals = 0usize;
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        if !session.handle_frame(&line) {
            continue;
        }
        match session.messages().last() {
            Some(message) if message.as_assistant().is_some() => pending_reveals += 1,
            Some(message) => {
                if let Some(user) = message.as_user() {
                    println!("you> {}", user.content);
                }
            }
            None => {}
        }
    }

    drain_reveals(&mut events, pending_reveals).await;
    print_turn_summary(&mut session);
    session.shutdown();
    Ok(())
}

async fn drain_reveals(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<RevealEvent>,
    mut pending: usize,
) {
    let mut stdout = std::io::stdout();
    while pending > 0 {
        // The driver task can only stall if it panicked; don't hang forever.
        let event = tokio::time::timeout(Duration::from_secs(60), events.recv()).await;
        let Ok(Some(event)) = event else { break };
        match event {
            RevealEvent::ThinkingStarted { .. } => {
                print!("llm> ");
                let _ = stdout.flush();
            }
            RevealEvent::RevealProgress { ch, .. } => {
                print!("{ch}");
                let _ = stdout.flush();
            }
            RevealEvent::RevealCompleted { .. } => {
                println!();
                pending -= 1;
            }
        }
    }
}

fn print_turn_summary(session: &mut Session) {
    let turns = session.turns();
    println!();
    println!("{} turn(s)", turns.len());
    for (index, turn) in turns.iter().enumerate() {
        let shape = turn.selected_version().map_or_else(String::new, |version| {
            let fragments = content::render_message(&version.parts);
            let parts: Vec<&str> = fragments
                .iter()
                .map(|fragment| match fragment {
                    Fragment::Inline(_) => "inline",
                    Fragment::Section(section) => match section.kind {
                        content::SectionKind::Brief => "brief",
                        content::SectionKind::Detailed => "detailed",
                        content::SectionKind::History => "history",
                        content::SectionKind::Reasoning => "reasoning",
                        content::SectionKind::Reply => "reply",
                    },
                })
                .collect();
            format!(" [{}]", parts.join(", "))
        });
        println!(
            "  turn {index}: {} version(s), showing #{}{shape}",
            turn.versions.len(),
            turn.selected,
        );
    }
}
