//! Bounded undo and redo stacks.

use crate::core::config::{HistoryConfig, DEFAULT_HISTORY_DEPTH};
use crate::core::error::{EditError, EditResult};
use crate::editing::command::{Command, CommandBatch};
use crate::editing::events::ChangeEvent;
use crate::graph::ModelSystem;
use log::{debug, warn};
use std::collections::VecDeque;

/// A stack that silently drops its oldest entry when full.
#[derive(Debug, Clone)]
pub struct EditingStack {
    items: VecDeque<CommandBatch>,
    capacity: usize,
}

impl EditingStack {
    /// Create a stack holding at most `capacity` batches (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, batch: CommandBatch) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
            debug!("History full, dropped the oldest batch");
        }
        self.items.push_back(batch);
    }

    pub fn pop(&mut self) -> Option<CommandBatch> {
        self.items.pop_back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Undo and redo history of one session.
///
/// By default a new edit leaves pending redo entries in place; they are only
/// consumed by `redo`. Set `clear_redo_on_edit` to discard them instead.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    undo: EditingStack,
    redo: EditingStack,
    clear_redo_on_edit: bool,
}

impl CommandBuffer {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: EditingStack::new(depth),
            redo: EditingStack::new(depth),
            clear_redo_on_edit: false,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            clear_redo_on_edit: config.clear_redo_on_edit,
            ..Self::new(config.depth)
        }
    }

    /// Record a batch that has already been applied.
    pub fn record(&mut self, batch: CommandBatch) {
        if batch.is_empty() {
            return;
        }
        self.undo.push(batch);
        if self.clear_redo_on_edit {
            self.redo.clear();
        }
    }

    /// Record a single applied command as a batch of its own.
    pub fn record_forward(&mut self, command: Command) {
        self.record(CommandBatch::single(command));
    }

    /// Apply a batch and record it on success.
    pub fn execute(&mut self, model_system: &mut ModelSystem, batch: CommandBatch) -> EditResult<Vec<ChangeEvent>> {
        let events = batch.apply(model_system)?;
        self.record(batch);
        Ok(events)
    }

    /// Reverse the most recent batch and move it to the redo stack.
    ///
    /// If reversing fails the batch is discarded rather than pushed back.
    pub fn undo(&mut self, model_system: &mut ModelSystem) -> EditResult<Vec<ChangeEvent>> {
        let batch = self.undo.pop().ok_or(EditError::NothingToUndo)?;
        match batch.reverse(model_system) {
            Ok(events) => {
                self.redo.push(batch);
                Ok(events)
            }
            Err(error) => {
                warn!("Undo failed, dropping the batch: {}", error);
                Err(error.into())
            }
        }
    }

    /// Re-apply the most recently undone batch and move it back to the undo stack.
    pub fn redo(&mut self, model_system: &mut ModelSystem) -> EditResult<Vec<ChangeEvent>> {
        let batch = self.redo.pop().ok_or(EditError::NothingToRedo)?;
        match batch.apply(model_system) {
            Ok(events) => {
                self.undo.push(batch);
                Ok(events)
            }
            Err(error) => {
                warn!("Redo failed, dropping the batch: {}", error);
                Err(error.into())
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}
