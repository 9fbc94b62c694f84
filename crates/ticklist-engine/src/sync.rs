// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use ticklist_api::{Client, RequestError};
use ticklist_app::{ChecklistId, ItemId, ViewState};

/// Owns the local mirror of the remote checklist collection and, for the
/// selected checklist, its item sub-collection. Every mutation goes through
/// the shared client and is followed by a wholesale refetch of the affected
/// collection; the mirror is never patched locally, so server-assigned
/// fields always show up immediately.
pub struct SyncEngine<'a> {
    client: &'a Client,
    state: ViewState,
}

impl<'a> SyncEngine<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Discards the mirror entirely; used on logout.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn load_checklists(&mut self) -> Result<(), RequestError> {
        self.run("failed to load checklists", |engine| {
            let checklists = engine.client.list_checklists()?;
            engine.state.replace_checklists(checklists);
            Ok(())
        })
    }

    pub fn create_checklist(&mut self, name: &str) -> Result<(), RequestError> {
        self.run("failed to create checklist", |engine| {
            let name = non_blank(name, "checklist name")?;
            engine.client.create_checklist(name)?;
            let checklists = engine.client.list_checklists()?;
            engine.state.replace_checklists(checklists);
            Ok(())
        })
    }

    /// Interactive confirmation is the caller's responsibility. Deleting the
    /// selected checklist clears the selection and its items in the same
    /// step, before the list refetch.
    pub fn delete_checklist(&mut self, id: ChecklistId) -> Result<(), RequestError> {
        self.run("failed to delete checklist", |engine| {
            engine.client.delete_checklist(id)?;
            if engine.state.selected == Some(id) {
                engine.state.clear_selection();
            }
            let checklists = engine.client.list_checklists()?;
            engine.state.replace_checklists(checklists);
            Ok(())
        })
    }

    /// Fetches first, commits second: a failed fetch leaves the previous
    /// selection and items in place. On success the prior checklist's items
    /// are discarded entirely, never merged.
    pub fn select_checklist(&mut self, id: ChecklistId) -> Result<(), RequestError> {
        self.run("failed to load checklist items", |engine| {
            let items = engine.client.list_items(id)?;
            engine.state.select(id, items);
            Ok(())
        })
    }

    pub fn create_item(&mut self, name: &str) -> Result<(), RequestError> {
        self.run("failed to create item", |engine| {
            let name = non_blank(name, "item name")?;
            let selected = engine.selected()?;
            engine.client.create_item(selected, name)?;
            engine.refresh_items(selected)
        })
    }

    pub fn toggle_item(&mut self, id: ItemId) -> Result<(), RequestError> {
        self.run("failed to update item status", |engine| {
            let selected = engine.selected()?;
            engine.client.toggle_item(selected, id)?;
            engine.refresh_items(selected)
        })
    }

    /// Interactive confirmation is the caller's responsibility.
    pub fn delete_item(&mut self, id: ItemId) -> Result<(), RequestError> {
        self.run("failed to delete item", |engine| {
            let selected = engine.selected()?;
            engine.client.delete_item(selected, id)?;
            engine.refresh_items(selected)
        })
    }

    pub fn rename_item(&mut self, id: ItemId, new_name: &str) -> Result<(), RequestError> {
        self.run("failed to rename item", |engine| {
            let name = non_blank(new_name, "item name")?;
            let selected = engine.selected()?;
            engine.client.rename_item(selected, id, name)?;
            engine.refresh_items(selected)?;
            engine.state.cancel_edit();
            Ok(())
        })
    }

    /// No-op when another row is already in edit mode.
    pub fn start_edit(&mut self, id: ItemId) -> bool {
        self.state.start_edit(id)
    }

    pub fn set_edit_draft(&mut self, text: &str) {
        self.state.set_draft(text);
    }

    pub fn cancel_edit(&mut self) {
        self.state.cancel_edit();
    }

    pub fn commit_edit(&mut self) -> Result<(), RequestError> {
        let Some(edit) = self.state.editing.clone() else {
            return Ok(());
        };
        self.rename_item(edit.item_id, &edit.draft)
    }

    fn selected(&self) -> Result<ChecklistId, RequestError> {
        self.state
            .selected
            .ok_or_else(|| RequestError::Validation("no checklist selected".to_owned()))
    }

    fn refresh_items(&mut self, id: ChecklistId) -> Result<(), RequestError> {
        let items = self.client.list_items(id)?;
        self.state.replace_items(items);
        Ok(())
    }

    /// Busy-guarded operation runner. A second user-initiated operation is
    /// rejected while one is outstanding; the busy flag is released on every
    /// exit path. Failures are recorded in `last_error` prefixed with the
    /// operation's intent, leaving the rest of the state untouched -- except
    /// for a server-side authorization failure, which is a forced logout.
    fn run<F>(&mut self, intent: &str, operation: F) -> Result<(), RequestError>
    where
        F: FnOnce(&mut Self) -> Result<(), RequestError>,
    {
        if self.state.pending {
            return Err(RequestError::Validation(
                "another operation is in progress".to_owned(),
            ));
        }

        self.state.pending = true;
        self.state.last_error = None;
        let result = operation(self);
        self.state.pending = false;

        if let Err(error) = &result {
            if matches!(error, RequestError::Auth) && self.client.credentials().get().is_some() {
                // The server rejected a token we actually sent; the session
                // is over. A missing-token precondition leaves state alone.
                if let Err(clear_error) = self.client.credentials().clear() {
                    log::warn!("failed to clear rejected credential: {clear_error:#}");
                }
                self.state.reset();
            }
            self.state.last_error = Some(format!("{intent}: {error}"));
            log::warn!("{intent}: {error}");
        }
        result
    }
}

fn non_blank<'s>(value: &'s str, what: &str) -> Result<&'s str, RequestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RequestError::Validation(format!(
            "{what} must not be empty"
        )));
    }
    Ok(trimmed)
}
