// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::{ChecklistId, ItemId};
use crate::model::{Checklist, ChecklistItem};

/// One in-flight inline rename. At most one row may be in edit mode at a
/// time; the draft starts as the item's current name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub item_id: ItemId,
    pub draft: String,
}

/// Local mirror of the remote checklist collection plus the selection and
/// edit-mode sub-state. Mutated only through the methods below so the
/// invariants hold at every step: `items` always belongs to `selected`,
/// `editing` always references an id present in `items`, and deleting the
/// selected checklist clears selection and items together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub checklists: Vec<Checklist>,
    pub selected: Option<ChecklistId>,
    pub items: Vec<ChecklistItem>,
    pub editing: Option<EditDraft>,
    pub pending: bool,
    pub last_error: Option<String>,
}

impl ViewState {
    /// Wholesale replacement of the checklist mirror. Selection and items are
    /// untouched; only deletion invalidates them.
    pub fn replace_checklists(&mut self, checklists: Vec<Checklist>) {
        self.checklists = checklists;
    }

    /// Commits a new selection and its freshly fetched items in one step.
    /// The previous checklist's items are discarded entirely, never merged.
    pub fn select(&mut self, id: ChecklistId, items: Vec<ChecklistItem>) {
        self.selected = Some(id);
        self.replace_items(items);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.items.clear();
        self.editing = None;
    }

    /// Wholesale replacement of the item mirror for the selected checklist.
    /// A pending edit survives only if its target id is still present.
    pub fn replace_items(&mut self, items: Vec<ChecklistItem>) {
        self.items = items;
        if let Some(edit) = &self.editing
            && !self.items.iter().any(|item| item.id == edit.item_id)
        {
            self.editing = None;
        }
    }

    /// Enters edit mode for `item`, staging its current name as the draft.
    /// Returns false without touching state when another edit is already
    /// pending or the item is not part of the current mirror.
    pub fn start_edit(&mut self, item_id: ItemId) -> bool {
        if self.editing.is_some() {
            return false;
        }
        let Some(item) = self.items.iter().find(|item| item.id == item_id) else {
            return false;
        };
        self.editing = Some(EditDraft {
            item_id,
            draft: item.name.clone(),
        });
        true
    }

    pub fn set_draft(&mut self, text: &str) {
        if let Some(edit) = &mut self.editing {
            edit.draft = text.to_owned();
        }
    }

    /// Leaves edit mode without any remote call.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Discards everything; used on logout and on authorization failure.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
