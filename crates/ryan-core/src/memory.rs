//! Memory board: the assistant's key/value memory with single-entry editing.

use tracing::{info, warn};

use crate::protocol::{ContentMessage, Failure, MemoryItem};

pub const FETCHING_MEMORY: &str = "Fetching memory...";
pub const NO_MEMORY_ENTRIES: &str = "No memory entries found yet.";
pub const EDIT_IN_PROGRESS: &str = "Please save or cancel the current edit first.";
pub const EMPTY_VALUE: &str = "Memory value cannot be empty.";
pub const NOTHING_TO_SAVE: &str = "No memory entry is being edited.";

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryView {
    Loading,
    Entries(Vec<MemoryItem>),
    Empty,
    Error(String),
}

impl MemoryView {
    /// Placeholder text for non-entry states.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Loading => Some(FETCHING_MEMORY),
            Self::Empty => Some(NO_MEMORY_ENTRIES),
            Self::Error(msg) => Some(msg),
            Self::Entries(_) => None,
        }
    }
}

/// A request the host should send to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryCommand {
    Update { key: String, value: String },
    Delete { key: String },
}

/// What to tell the user after a write, and whether to reload the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNotice {
    pub message: String,
    pub refetch: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryBoard {
    view: MemoryView,
    editing: Option<String>,
}

impl Default for MemoryBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self {
            view: MemoryView::Loading,
            editing: None,
        }
    }

    pub fn view(&self) -> &MemoryView {
        &self.view
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn begin_load(&mut self) {
        self.view = MemoryView::Loading;
    }

    pub fn loaded(&mut self, result: Result<Vec<MemoryItem>, Failure>) {
        self.view = match result {
            Ok(items) if items.is_empty() => MemoryView::Empty,
            Ok(items) => {
                info!("Fetched {} memory entries.", items.len());
                MemoryView::Entries(items)
            }
            Err(failure) => {
                warn!("Memory fetch failed: {:?}", failure);
                MemoryView::Error(failure.describe(
                    "Error fetching memory",
                    "An error occurred while fetching memory",
                ))
            }
        };
    }

    /// Enters edit mode for `key`. Only one entry may be edited at a time.
    pub fn start_edit(&mut self, key: &str) -> Result<(), &'static str> {
        if self.editing.is_some() {
            return Err(EDIT_IN_PROGRESS);
        }
        self.editing = Some(key.to_string());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Saves the entry being edited. A blank value reverts the edit with a notice.
    pub fn save(&mut self, value: &str) -> Result<MemoryCommand, &'static str> {
        let Some(key) = self.editing.take() else {
            return Err(NOTHING_TO_SAVE);
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(EMPTY_VALUE);
        }
        Ok(MemoryCommand::Update {
            key,
            value: value.to_string(),
        })
    }

    pub fn delete(&self, key: &str) -> MemoryCommand {
        MemoryCommand::Delete {
            key: key.to_string(),
        }
    }

    /// Outcome of a `PUT /memory/{key}`. The list is reloaded either way.
    pub fn update_finished(&mut self, key: &str, result: Result<ContentMessage, Failure>) -> MemoryNotice {
        self.editing = None;
        let message = match result {
            Ok(ack) => ack
                .content
                .unwrap_or_else(|| format!("Memory entry \"{}\" updated successfully.", key)),
            Err(failure) => failure.describe(
                "Error updating memory",
                "An error occurred while updating memory",
            ),
        };
        MemoryNotice {
            message,
            refetch: true,
        }
    }

    /// Outcome of a `DELETE /memory/{key}`. Only a success reloads the list.
    pub fn delete_finished(&mut self, key: &str, result: Result<ContentMessage, Failure>) -> MemoryNotice {
        match result {
            Ok(ack) => MemoryNotice {
                message: ack
                    .content
                    .unwrap_or_else(|| format!("Memory entry \"{}\" deleted successfully.", key)),
                refetch: true,
            },
            Err(failure) => MemoryNotice {
                message: failure.describe(
                    "Error deleting memory",
                    "An error occurred while deleting memory",
                ),
                refetch: false,
            },
        }
    }
}
