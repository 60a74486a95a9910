//! Turn grouping and version selection.
//!
//! A turn is one user submission plus all of its regenerated assistant
//! versions. Grouping is a pure single forward scan over the flat message
//! list: a user message with the same content as the open turn and a retry
//! strictly greater than the running maximum continues that turn as a
//! regeneration; anything else starts a new turn.
//!
//! The retry counter is the only signal distinguishing a regeneration from
//! a deliberate duplicate resubmission, so a duplicate that arrives with an
//! incidentally higher retry is folded into the previous turn.

use std::collections::HashMap;

use super::{AssistantMessage, Message, UserMessage};

/// One user submission with its assistant response versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// The user message that opened the turn.
    pub user: UserMessage,
    /// Index of that message in the flat list; stable key for selection.
    pub user_index: usize,
    /// Number of user submissions merged into this turn (regenerations).
    pub submissions: usize,
    /// Assistant versions, ascending by retry.
    pub versions: Vec<AssistantMessage>,
    /// Index into `versions` currently shown.
    pub selected: usize,
}

impl Turn {
    /// The assistant version currently selected for display.
    pub fn selected_version(&self) -> Option<&AssistantMessage> {
        self.versions.get(self.selected)
    }
}

struct TurnBuilder {
    user: UserMessage,
    user_index: usize,
    submissions: usize,
    versions: Vec<AssistantMessage>,
    max_retry: u32,
}

impl TurnBuilder {
    fn open(user: UserMessage, user_index: usize) -> Self {
        let max_retry = user.retry;
        Self {
            user,
            user_index,
            submissions: 1,
            versions: Vec::new(),
            max_retry,
        }
    }

    /// Opens a turn for assistant messages that precede any user message.
    fn headless(index: usize) -> Self {
        Self {
            user: UserMessage {
                content: String::new(),
                retry: 0,
            },
            user_index: index,
            submissions: 0,
            versions: Vec::new(),
            max_retry: 0,
        }
    }

    fn finish(mut self) -> Turn {
        self.versions.sort_by_key(|version| version.retry);
        let selected = self.versions.len().saturating_sub(1);
        Turn {
            user: self.user,
            user_index: self.user_index,
            submissions: self.submissions,
            versions: self.versions,
            selected,
        }
    }
}

/// Groups the flat message list into turns. Pure function, linear time.
///
/// Every message lands in exactly one turn; `selected` defaults to the
/// latest version. Sticky selection is layered on top by
/// [`SelectionMemory::reconcile`].
pub fn group_turns(messages: &[Message]) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut current: Option<TurnBuilder> = None;

    for (index, message) in messages.iter().enumerate() {
        match message {
            Message::User(user) => {
                let regenerates = current.as_ref().is_some_and(|builder| {
                    builder.submissions > 0
                        && user.content == builder.user.content
                        && user.retry > builder.max_retry
                });
                if regenerates {
                    if let Some(builder) = current.as_mut() {
                        builder.max_retry = user.retry;
                        builder.submissions += 1;
                    }
                } else {
                    if let Some(builder) = current.take() {
                        turns.push(builder.finish());
                    }
                    current = Some(TurnBuilder::open(user.clone(), index));
                }
            }
            Message::Assistant(assistant) => {
                current
                    .get_or_insert_with(|| TurnBuilder::headless(index))
                    .versions
                    .push(assistant.clone());
            }
        }
    }

    if let Some(builder) = current.take() {
        turns.push(builder.finish());
    }
    turns
}

#[derive(Debug, Clone, Copy)]
struct Choice {
    /// Version count at the last reconcile; `None` until first seen there,
    /// so a manual choice made beforehand is not mistaken for growth.
    seen_versions: Option<usize>,
    selected: usize,
}

/// Sticky per-turn version selection, keyed by the turn's anchor index.
///
/// A turn defaults to its latest version on first sight and stays on the
/// chosen version afterwards, except that a version count increase always
/// forces re-selection to the newest, overriding a manual choice.
#[derive(Debug, Default)]
pub struct SelectionMemory {
    choices: HashMap<usize, Choice>,
}

impl SelectionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies remembered selections to a freshly grouped turn list.
    pub fn reconcile(&mut self, turns: &mut [Turn]) {
        for turn in turns.iter_mut() {
            let latest = turn.versions.len().saturating_sub(1);
            let choice = self.choices.entry(turn.user_index).or_insert(Choice {
                seen_versions: Some(turn.versions.len()),
                selected: latest,
            });
            if let Some(seen) = choice.seen_versions
                && turn.versions.len() > seen
            {
                choice.selected = latest;
            }
            choice.seen_versions = Some(turn.versions.len());
            choice.selected = choice.selected.min(latest);
            turn.selected = choice.selected;
        }
    }

    /// Records a manual version choice for the turn anchored at `user_index`.
    pub fn choose(&mut self, user_index: usize, version: usize) {
        let choice = self.choices.entry(user_index).or_insert(Choice {
            seen_versions: None,
            selected: version,
        });
        choice.selected = version;
    }

    /// Forgets everything (conversation switch).
    pub fn reset(&mut self) {
        self.choices.clear();
    }
}
