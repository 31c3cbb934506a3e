use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    api::LearningApi,
    error::ApiError,
    models::{ContentItem, Module},
    session::Session,
};

#[derive(Debug, Error)]
pub enum SequencerError {
    /// An empty course, or a module without items, cannot be sequenced.
    #[error("course has no content to sequence")]
    NoContent,
    #[error("no content at module {module_index}, item {content_index}")]
    OutOfRange {
        module_index: usize,
        content_index: usize,
    },
    #[error("content item {0} is not part of this course")]
    UnknownItem(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Cursor
///
/// Position of the learner: indexes into the sorted module list and into that
/// module's sorted items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub module_index: usize,
    pub content_index: usize,
}

/// ContentSequencer
///
/// Walks a course's content in reading order. The cursor always points at an
/// existing item; moving past either end leaves it where it is.
#[derive(Debug, Clone)]
pub struct ContentSequencer {
    modules: Vec<Module>,
    cursor: Cursor,
}

impl ContentSequencer {
    pub fn new(mut modules: Vec<Module>) -> Result<Self, SequencerError> {
        if modules.is_empty() || modules.iter().any(|m| m.content_items.is_empty()) {
            return Err(SequencerError::NoContent);
        }
        // Stable: equal orders keep the backend's sequence.
        modules.sort_by_key(|m| m.order);
        for module in &mut modules {
            module.content_items.sort_by_key(|item| item.order);
        }
        Ok(Self {
            modules,
            cursor: Cursor::default(),
        })
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_module(&self) -> &Module {
        &self.modules[self.cursor.module_index]
    }

    pub fn current(&self) -> &ContentItem {
        &self.current_module().content_items[self.cursor.content_index]
    }

    /// Moves to `cursor` if it names an existing item.
    pub fn seek(&mut self, cursor: Cursor) -> Result<(), SequencerError> {
        let exists = self
            .modules
            .get(cursor.module_index)
            .is_some_and(|m| cursor.content_index < m.content_items.len());
        if !exists {
            return Err(SequencerError::OutOfRange {
                module_index: cursor.module_index,
                content_index: cursor.content_index,
            });
        }
        self.cursor = cursor;
        Ok(())
    }

    /// Advances one item, crossing into the next module at a module's end.
    /// Returns whether the cursor moved.
    pub fn next(&mut self) -> bool {
        let Cursor {
            module_index,
            content_index,
        } = self.cursor;
        if content_index + 1 < self.modules[module_index].content_items.len() {
            self.cursor.content_index += 1;
            return true;
        }
        if module_index + 1 < self.modules.len() {
            self.cursor = Cursor {
                module_index: module_index + 1,
                content_index: 0,
            };
            return true;
        }
        false
    }

    /// Steps back one item, landing on the previous module's last item when
    /// leaving the first item of a module. Returns whether the cursor moved.
    pub fn previous(&mut self) -> bool {
        let Cursor {
            module_index,
            content_index,
        } = self.cursor;
        if content_index > 0 {
            self.cursor.content_index -= 1;
            return true;
        }
        if module_index > 0 {
            let last = self.modules[module_index - 1].content_items.len() - 1;
            self.cursor = Cursor {
                module_index: module_index - 1,
                content_index: last,
            };
            return true;
        }
        false
    }

    pub fn is_at_start(&self) -> bool {
        self.cursor == Cursor::default()
    }

    pub fn is_at_end(&self) -> bool {
        let last_module = self.modules.len() - 1;
        self.cursor.module_index == last_module
            && self.cursor.content_index + 1 == self.modules[last_module].content_items.len()
    }

    /// Completed items over all items, as a percentage.
    pub fn progress(&self) -> f64 {
        let (done, total) = self
            .modules
            .iter()
            .flat_map(|m| &m.content_items)
            .fold((0usize, 0usize), |(done, total), item| {
                (done + usize::from(item.completed), total + 1)
            });
        done as f64 * 100.0 / total as f64
    }

    /// Flips the item's `completed` flag locally.
    pub fn apply_completion(&mut self, item_id: &str) -> Result<(), SequencerError> {
        let item = self
            .modules
            .iter_mut()
            .flat_map(|m| m.content_items.iter_mut())
            .find(|item| item.id == item_id)
            .ok_or_else(|| SequencerError::UnknownItem(item_id.to_string()))?;
        item.completed = true;
        Ok(())
    }

    /// Records completion with the backend; the local flag only changes once the
    /// backend has accepted it.
    pub async fn mark_complete(
        &mut self,
        api: &dyn LearningApi,
        session: &Session,
        course_id: &str,
        item_id: &str,
    ) -> Result<(), SequencerError> {
        if !self
            .modules
            .iter()
            .flat_map(|m| &m.content_items)
            .any(|item| item.id == item_id)
        {
            return Err(SequencerError::UnknownItem(item_id.to_string()));
        }
        api.complete_content(session, course_id, item_id).await?;
        self.apply_completion(item_id)
    }

    pub fn into_modules(self) -> Vec<Module> {
        self.modules
    }
}
