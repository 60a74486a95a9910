//! Typing-reveal pacing for newly arrived assistant messages.
//!
//! Arrival timing and display timing are decoupled: a fully received
//! message is revealed through `Idle → Thinking (fixed delay) → Revealing
//! (one character per interval) → Idle`. One item reveals at a time; items
//! arriving mid-reveal are queued FIFO, never interleaved or merged.
//! Reveal cost is proportional to the message's character count; that is
//! the pacing model, not a defect.
//!
//! [`RevealQueue`] is the synchronous state machine; [`RevealScheduler`]
//! drives it on a tokio task with timer yields and a cancellation token so
//! a conversation switch aborts every in-flight timer and queued item.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Pacing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    /// Fixed delay before the first character of each item.
    pub thinking_delay: Duration,
    /// Delay between consecutive characters.
    pub char_interval: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            thinking_delay: Duration::from_millis(600),
            char_interval: Duration::from_millis(15),
        }
    }
}

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    #[default]
    Idle,
    Thinking,
    Revealing,
}

/// One queued assistant message awaiting reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReveal {
    /// Stable id of the message, when known.
    pub uid: Option<String>,
    /// Full text to reveal.
    pub text: String,
}

/// Events published while pacing a reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    ThinkingStarted {
        uid: Option<String>,
    },
    RevealProgress {
        uid: Option<String>,
        /// Characters visible so far.
        visible_chars: usize,
        /// The character revealed by this step.
        ch: char,
    },
    RevealCompleted {
        uid: Option<String>,
        text: String,
    },
}

#[derive(Debug)]
struct ActiveReveal {
    uid: Option<String>,
    text: String,
    chars: Vec<char>,
    visible: usize,
}

/// Synchronous reveal state machine.
#[derive(Debug, Default)]
pub struct RevealQueue {
    queue: VecDeque<PendingReveal>,
    active: Option<ActiveReveal>,
    phase: RevealPhase,
}

impl RevealQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// Items waiting behind the active reveal.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == RevealPhase::Idle
    }

    /// Enqueues a message. When idle, thinking starts immediately and the
    /// corresponding event is returned; otherwise the item waits its turn.
    pub fn enqueue(&mut self, item: PendingReveal) -> Option<RevealEvent> {
        self.queue.push_back(item);
        if self.phase == RevealPhase::Idle {
            self.start_next()
        } else {
            None
        }
    }

    /// Delay until the next [`advance`](Self::advance) is due; `None` when
    /// idle.
    pub fn next_delay(&self, timing: &RevealTiming) -> Option<Duration> {
        match self.phase {
            RevealPhase::Idle => None,
            RevealPhase::Thinking => Some(timing.thinking_delay),
            RevealPhase::Revealing => Some(timing.char_interval),
        }
    }

    /// Runs one timer expiry and returns the events to publish.
    pub fn advance(&mut self) -> Vec<RevealEvent> {
        match self.phase {
            RevealPhase::Idle => Vec::new(),
            RevealPhase::Thinking => {
                self.phase = RevealPhase::Revealing;
                self.step_reveal()
            }
            RevealPhase::Revealing => self.step_reveal(),
        }
    }

    /// Drops the active reveal and the whole queue (conversation switch).
    pub fn clear(&mut self) {
        self.queue.clear();
        self.active = None;
        self.phase = RevealPhase::Idle;
    }

    fn start_next(&mut self) -> Option<RevealEvent> {
        let item = self.queue.pop_front()?;
        let uid = item.uid.clone();
        self.active = Some(ActiveReveal {
            chars: item.text.chars().collect(),
            visible: 0,
            uid: item.uid,
            text: item.text,
        });
        self.phase = RevealPhase::Thinking;
        Some(RevealEvent::ThinkingStarted { uid })
    }

    fn step_reveal(&mut self) -> Vec<RevealEvent> {
        let Some(active) = self.active.as_mut() else {
            self.phase = RevealPhase::Idle;
            return Vec::new();
        };

        let mut events = Vec::new();
        if active.visible < active.chars.len() {
            let ch = active.chars[active.visible];
            active.visible += 1;
            events.push(RevealEvent::RevealProgress {
                uid: active.uid.clone(),
                visible_chars: active.visible,
                ch,
            });
        }

        if self
            .active
            .as_ref()
            .is_some_and(|active| active.visible >= active.chars.len())
        {
            if let Some(done) = self.active.take() {
                events.push(RevealEvent::RevealCompleted {
                    uid: done.uid,
                    text: done.text,
                });
            }
            self.phase = RevealPhase::Idle;
            if let Some(event) = self.start_next() {
                events.push(event);
            }
        }

        events
    }
}

#[derive(Debug)]
enum RevealCommand {
    Enqueue(PendingReveal),
    Clear,
}

/// Handle to the reveal driver task.
#[derive(Debug, Clone)]
pub struct RevealScheduler {
    commands: mpsc::UnboundedSender<RevealCommand>,
    cancel: CancellationToken,
}

impl RevealScheduler {
    /// Spawns the driver; reveal events arrive on the returned receiver.
    pub fn spawn(timing: RevealTiming) -> (Self, mpsc::UnboundedReceiver<RevealEvent>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(drive(timing, command_rx, event_tx, cancel.clone()));
        (Self { commands, cancel }, events)
    }

    /// Queues one assistant message for paced reveal.
    pub fn enqueue(&self, uid: Option<String>, text: impl Into<String>) {
        let _ = self.commands.send(RevealCommand::Enqueue(PendingReveal {
            uid,
            text: text.into(),
        }));
    }

    /// Aborts any in-flight reveal and empties the queue.
    pub fn clear(&self) {
        let _ = self.commands.send(RevealCommand::Clear);
    }

    /// Stops the driver task entirely.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn drive(
    timing: RevealTiming,
    mut commands: mpsc::UnboundedReceiver<RevealCommand>,
    events: mpsc::UnboundedSender<RevealEvent>,
    cancel: CancellationToken,
) {
    let mut queue = RevealQueue::new();
    loop {
        let delay = queue.next_delay(&timing);
        tokio::select! {
            () = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(RevealCommand::Enqueue(item)) => {
                    if let Some(event) = queue.enqueue(item)
                        && events.send(event).is_err()
                    {
                        break;
                    }
                }
                Some(RevealCommand::Clear) => {
                    queue.clear();
                    debug!("reveal queue cleared");
                }
                None => break,
            },
            () = wait(delay) => {
                for event in queue.advance() {
                    if events.send(event).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

async fn wait(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}
