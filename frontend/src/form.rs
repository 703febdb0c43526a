use crate::error::{ApiError, Result};
use crate::sync::{require_id, Resource, ResourceId, Synchronizer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit(ResourceId),
}

/// The record currently open in a create/edit dialog.
///
/// `base` is the record the dialog was opened from, server fields and all, so an update sends
/// them back verbatim. A failed submit keeps the attempted draft and the error; nothing the
/// user typed is thrown away.
#[derive(Clone, Debug, PartialEq)]
pub struct EditForm<R: Resource> {
    pub mode: EditMode,
    pub base: R,
    pub attempted: Option<R>,
    pub error: Option<String>,
}

impl<R: Resource> EditForm<R> {
    pub fn for_create(blank: R) -> Self {
        Self {
            mode: EditMode::Create,
            base: blank,
            attempted: None,
            error: None,
        }
    }

    pub fn for_edit(record: R) -> Result<Self> {
        let id = require_id(&record)?;
        Ok(Self {
            mode: EditMode::Edit(id),
            base: record,
            attempted: None,
            error: None,
        })
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditMode::Edit(_))
    }

    /// What the inputs should show: the last attempt if there was one, else the base record.
    pub fn current(&self) -> &R {
        self.attempted.as_ref().unwrap_or(&self.base)
    }

    /// Sends the draft. `Ok` means the dialog may close; `Err` hands back the form with the
    /// draft and message kept for another try.
    pub async fn submit(self, sync: &Synchronizer<R>, draft: R) -> std::result::Result<R, Self> {
        let outcome = match self.mode {
            EditMode::Create => sync.create(&draft).await,
            EditMode::Edit(id) => sync.update(id, &draft).await,
        };
        outcome.map_err(|err| self.rejected(draft, &err))
    }

    /// A local complaint about the inputs; nothing was sent.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn rejected(mut self, draft: R, err: &ApiError) -> Self {
        self.attempted = Some(draft);
        self.error = Some(err.user_message());
        self
    }
}
