//! Undo/redo history.
//!
//! The history is two bounded double-ended queues of [`UndoCommand`]s. Commands record the
//! *forward* operation; undoing applies its inverse:
//!
//! | command | undo | redo |
//! |---|---|---|
//! | `Insert { text, position }` | remove the inserted span | insert again |
//! | `Remove { range, text }` | insert `text` at `range.start` | remove again |
//! | `Selection { range }` | restore `range` | restore `range` |
//!
//! Every fresh edit is recorded as a group: a `Selection` command holding the selection before
//! the edit, followed by the edit itself. [`TextDocument::undo`](crate::TextDocument::undo) and
//! [`TextDocument::redo`](crate::TextDocument::redo) always move a whole group.
//!
//! # Coalescing
//!
//! A new `Insert` is folded into the top command instead of being pushed when the top command is
//! an `Insert` ending exactly where the new one starts and the two are less than
//! `merge_timeout` apart. `Remove`s coalesce the same way when the removed spans touch
//! (backspacing or deleting forward). Coalescing never happens inside a transaction, across a
//! clean point, or right after an undo/redo or [`UndoStack::end_group`].

use crate::error::UndoHistoryError;
use crate::position::TextPosition;
use crate::range::TextRange;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::collections::vec_deque;
use std::time::Duration;

/// One recorded command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UndoCommand {
    /// `text` was inserted at `position`.
    Insert {
        /// Change id (monotonic per stack).
        id: u64,
        /// Undo group this command belongs to.
        group: u64,
        /// Inserted text (LF newlines).
        text: String,
        /// Insert position.
        position: TextPosition,
        /// Time of the (last merged) edit, relative to the document clock.
        #[serde(with = "millis")]
        timestamp: Duration,
    },
    /// `text` was removed from `range` (normalized).
    Remove {
        /// Change id (monotonic per stack).
        id: u64,
        /// Undo group this command belongs to.
        group: u64,
        /// Removed span, in coordinates before the removal.
        range: TextRange,
        /// Removed text.
        text: String,
        /// Time of the (last merged) edit, relative to the document clock.
        #[serde(with = "millis")]
        timestamp: Duration,
    },
    /// The selection was `range` at this point of the history.
    Selection {
        /// Change id (monotonic per stack).
        id: u64,
        /// Undo group this command belongs to.
        group: u64,
        /// Recorded selection.
        range: TextRange,
        /// Time of recording, relative to the document clock.
        #[serde(with = "millis")]
        timestamp: Duration,
    },
}

impl UndoCommand {
    /// Change id.
    pub fn id(&self) -> u64 {
        match self {
            Self::Insert { id, .. } | Self::Remove { id, .. } | Self::Selection { id, .. } => *id,
        }
    }

    /// Undo group id.
    pub fn group(&self) -> u64 {
        match self {
            Self::Insert { group, .. }
            | Self::Remove { group, .. }
            | Self::Selection { group, .. } => *group,
        }
    }

    /// Recording time relative to the document clock.
    pub fn timestamp(&self) -> Duration {
        match self {
            Self::Insert { timestamp, .. }
            | Self::Remove { timestamp, .. }
            | Self::Selection { timestamp, .. } => *timestamp,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Bounded undo/redo command history with time-based coalescing.
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: VecDeque<UndoCommand>,
    redo_stack: VecDeque<UndoCommand>,
    max_stack_size: usize,
    merge_timeout: Duration,
    change_id_counter: u64,
    next_group: u64,
    /// Change id of the top undo command at the last save/load.
    clean_change_id: u64,
    /// Open transaction group and nesting depth.
    transaction: Option<(u64, usize)>,
    /// Set after undo/redo or an explicit group end; blocks the next merge.
    merge_barrier: bool,
}

impl UndoStack {
    /// Create an empty history.
    pub fn new(max_stack_size: usize, merge_timeout: Duration) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_stack_size: max_stack_size.max(1),
            merge_timeout,
            change_id_counter: 0,
            next_group: 0,
            clean_change_id: 0,
            transaction: None,
            merge_barrier: false,
        }
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.clear_undo_stack();
        self.clear_redo_stack();
        self.clean_change_id = 0;
        self.merge_barrier = false;
    }

    /// Drop the undo stack.
    pub fn clear_undo_stack(&mut self) {
        self.undo_stack.clear();
    }

    /// Drop the redo stack. Called for every fresh edit.
    pub fn clear_redo_stack(&mut self) {
        self.redo_stack.clear();
    }

    /// Can undo
    pub fn has_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Can redo
    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps (groups).
    pub fn undo_depth(&self) -> usize {
        count_groups(&self.undo_stack)
    }

    /// Number of redo steps (groups).
    pub fn redo_depth(&self) -> usize {
        count_groups(&self.redo_stack)
    }

    /// Number of commands on the undo stack.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of commands on the redo stack.
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo commands, oldest first.
    pub fn undo_commands(&self) -> vec_deque::Iter<'_, UndoCommand> {
        self.undo_stack.iter()
    }

    /// Redo commands, next-to-redo last.
    pub fn redo_commands(&self) -> vec_deque::Iter<'_, UndoCommand> {
        self.redo_stack.iter()
    }

    /// Most recent undo command.
    pub fn last_undo(&self) -> Option<&UndoCommand> {
        self.undo_stack.back()
    }

    /// Maximum number of commands per stack.
    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// Change the stack bound, evicting the oldest commands if needed.
    pub fn set_max_stack_size(&mut self, max_stack_size: usize) {
        self.max_stack_size = max_stack_size.max(1);
        self.limit_undo_stack();
        Self::limit_stack(&mut self.redo_stack, self.max_stack_size);
    }

    /// Coalescing window.
    pub fn merge_timeout(&self) -> Duration {
        self.merge_timeout
    }

    /// Change the coalescing window.
    pub fn set_merge_timeout(&mut self, merge_timeout: Duration) {
        self.merge_timeout = merge_timeout;
    }

    /// Id of the most recent undo command, or 0 if the stack is empty.
    pub fn current_change_id(&self) -> u64 {
        self.undo_stack.back().map(UndoCommand::id).unwrap_or(0)
    }

    /// Returns `true` if the history is at the last clean point.
    pub fn is_clean(&self) -> bool {
        self.current_change_id() == self.clean_change_id
    }

    /// Record the current position in history as clean (saved).
    pub fn mark_clean(&mut self) {
        self.clean_change_id = self.current_change_id();
        self.end_group();
    }

    /// Stop the next edit from coalescing with the current top command.
    pub fn end_group(&mut self) {
        self.merge_barrier = true;
    }

    /// Serialize the undo history (oldest first) as a JSON array.
    pub fn to_json(&self) -> Result<String, UndoHistoryError> {
        let commands: Vec<&UndoCommand> = self.undo_stack.iter().collect();
        Ok(serde_json::to_string(&commands)?)
    }

    /// Replace the undo history with commands from [`UndoStack::to_json`] output.
    ///
    /// The redo stack is cleared. The restored history only makes sense for a document holding
    /// the same text it had when the history was serialized.
    pub fn from_json(&mut self, json: &str) -> Result<(), UndoHistoryError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut commands = Vec::with_capacity(values.len());
        for value in values {
            let kind = value.get("type").and_then(serde_json::Value::as_str);
            if !matches!(kind, Some("insert" | "remove" | "selection")) {
                return Err(UndoHistoryError::UnknownCommand(
                    kind.unwrap_or_default().to_string(),
                ));
            }
            commands.push(serde_json::from_value::<UndoCommand>(value)?);
        }
        self.clear();
        self.change_id_counter = commands.iter().map(UndoCommand::id).max().unwrap_or(0);
        self.next_group = commands
            .iter()
            .map(|c| c.group().saturating_add(1))
            .max()
            .unwrap_or(0)
            .max(self.next_group);
        self.undo_stack = commands.into();
        self.limit_undo_stack();
        self.clean_change_id = self.current_change_id();
        self.merge_barrier = true;
        Ok(())
    }

    pub(crate) fn record_insert(
        &mut self,
        text: &str,
        position: TextPosition,
        selection_before: TextRange,
        now: Duration,
    ) {
        self.clear_redo_stack();

        if self.can_merge(now)
            && let Some(UndoCommand::Insert {
                id,
                text: top_text,
                position: top_position,
                timestamp,
                ..
            }) = self.undo_stack.back_mut()
            && top_position.advanced_by(top_text) == position
        {
            top_text.push_str(text);
            *timestamp = now;
            self.change_id_counter += 1;
            *id = self.change_id_counter;
            tracing::trace!(%position, merged_len = top_text.len(), "undo: coalesced insert");
            return;
        }

        let group = self.open_group(selection_before, now);
        let id = self.next_id();
        self.push_undo(UndoCommand::Insert {
            id,
            group,
            text: text.to_string(),
            position,
            timestamp: now,
        });
    }

    pub(crate) fn record_remove(
        &mut self,
        range: TextRange,
        text: &str,
        selection_before: TextRange,
        now: Duration,
    ) {
        self.clear_redo_stack();

        if self.can_merge(now)
            && let Some(UndoCommand::Remove {
                id,
                range: top_range,
                text: top_text,
                timestamp,
                ..
            }) = self.undo_stack.back_mut()
        {
            let merged = if range.end == top_range.start {
                // Backspace: the new span sits right before the previous one.
                top_text.insert_str(0, text);
                Some(range.start)
            } else if range.start == top_range.start {
                // Delete forward: the new span starts where the previous one did.
                top_text.push_str(text);
                Some(top_range.start)
            } else {
                None
            };
            if let Some(start) = merged {
                *top_range = TextRange::new(start, start.advanced_by(top_text));
                *timestamp = now;
                self.change_id_counter += 1;
                *id = self.change_id_counter;
                tracing::trace!(range = %top_range, "undo: coalesced remove");
                return;
            }
        }

        let group = self.open_group(selection_before, now);
        let id = self.next_id();
        self.push_undo(UndoCommand::Remove {
            id,
            group,
            range,
            text: text.to_string(),
            timestamp: now,
        });
    }

    /// Start a compound edit; everything recorded until the matching
    /// [`UndoStack::end_transaction`] forms one undo step.
    pub(crate) fn begin_transaction(&mut self, selection_before: TextRange, now: Duration) {
        if let Some((_, depth)) = self.transaction.as_mut() {
            *depth += 1;
            return;
        }
        self.clear_redo_stack();
        let group = self.new_group();
        let id = self.next_id();
        self.push_undo(UndoCommand::Selection {
            id,
            group,
            range: selection_before,
            timestamp: now,
        });
        self.transaction = Some((group, 1));
    }

    pub(crate) fn end_transaction(&mut self) {
        let Some((group, depth)) = self.transaction.as_mut() else {
            return;
        };
        *depth -= 1;
        if *depth > 0 {
            return;
        }
        let group = *group;
        self.transaction = None;
        self.merge_barrier = true;

        // A transaction that recorded no edit leaves only its selection marker behind.
        if matches!(
            self.undo_stack.back(),
            Some(UndoCommand::Selection { group: g, .. }) if *g == group
        ) {
            self.undo_stack.pop_back();
        }
    }

    /// Pop the newest undo group, newest command first.
    pub(crate) fn pop_undo_group(&mut self) -> Option<Vec<UndoCommand>> {
        self.merge_barrier = true;
        pop_group(&mut self.undo_stack)
    }

    /// Pop the next redo group, oldest command first.
    pub(crate) fn pop_redo_group(&mut self) -> Option<Vec<UndoCommand>> {
        self.merge_barrier = true;
        pop_group(&mut self.redo_stack)
    }

    /// Detach the redo stack, leaving it empty.
    pub(crate) fn take_redo_stack(&mut self) -> VecDeque<UndoCommand> {
        std::mem::take(&mut self.redo_stack)
    }

    /// Put back a redo stack detached with [`UndoStack::take_redo_stack`].
    pub(crate) fn restore_redo_stack(&mut self, redo_stack: VecDeque<UndoCommand>) {
        self.redo_stack = redo_stack;
    }

    pub(crate) fn push_redo(&mut self, command: UndoCommand) {
        self.redo_stack.push_back(command);
        Self::limit_stack(&mut self.redo_stack, self.max_stack_size);
    }

    pub(crate) fn push_undo(&mut self, command: UndoCommand) {
        self.undo_stack.push_back(command);
        self.limit_undo_stack();
    }

    fn can_merge(&self, now: Duration) -> bool {
        if self.transaction.is_some() || self.merge_barrier {
            return false;
        }
        match self.undo_stack.back() {
            Some(top) => {
                top.id() != self.clean_change_id
                    && now.saturating_sub(top.timestamp()) < self.merge_timeout
            }
            None => false,
        }
    }

    fn open_group(&mut self, selection_before: TextRange, now: Duration) -> u64 {
        self.merge_barrier = false;
        if let Some((group, _)) = self.transaction {
            return group;
        }
        let group = self.new_group();
        let id = self.next_id();
        self.push_undo(UndoCommand::Selection {
            id,
            group,
            range: selection_before,
            timestamp: now,
        });
        group
    }

    fn new_group(&mut self) -> u64 {
        let group = self.next_group;
        self.next_group = self.next_group.wrapping_add(1);
        group
    }

    fn next_id(&mut self) -> u64 {
        self.change_id_counter += 1;
        self.change_id_counter
    }

    fn limit_undo_stack(&mut self) {
        let evicted = Self::limit_stack(&mut self.undo_stack, self.max_stack_size);
        if evicted > 0 {
            tracing::trace!(evicted, "undo: evicted oldest commands");
        }
    }

    /// Evict from the front until the bound holds, never leaving a partial group behind.
    fn limit_stack(stack: &mut VecDeque<UndoCommand>, max: usize) -> usize {
        let mut evicted = 0;
        while stack.len() > max {
            let Some(oldest) = stack.pop_front() else {
                break;
            };
            evicted += 1;
            while stack.len() > 1 && stack.front().map(UndoCommand::group) == Some(oldest.group()) {
                stack.pop_front();
                evicted += 1;
            }
        }
        evicted
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(10_000, Duration::from_millis(300))
    }
}

fn pop_group(stack: &mut VecDeque<UndoCommand>) -> Option<Vec<UndoCommand>> {
    let group = stack.back()?.group();
    let mut commands = Vec::new();
    while stack.back().is_some_and(|c| c.group() == group) {
        if let Some(command) = stack.pop_back() {
            commands.push(command);
        }
    }
    Some(commands)
}

fn count_groups(stack: &VecDeque<UndoCommand>) -> usize {
    let mut count = 0;
    let mut last = None;
    for command in stack {
        if last != Some(command.group()) {
            count += 1;
            last = Some(command.group());
        }
    }
    count
}
